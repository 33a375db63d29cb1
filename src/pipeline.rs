// src/pipeline.rs
//
// Locator → Ingestor → Normalizer → Influenza split → Merger.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::fetch::{build_client, fetch_dataset_url, fetch_tables, LANDING_URL};
use crate::process::{apply_flu_split, merge_frames, normalize_table, RawTable, UnifiedRecord};
use crate::schema::{bind_tables, Variant};
use crate::snapshot::DatasetSource;

/// Turn the dataset document's tables into the unified record set.
///
/// Any structural mismatch fails the whole build; there are no partial
/// results.
#[instrument(level = "info", skip(tables), fields(count = tables.len()))]
pub fn build_dataset(tables: &[RawTable], variant: Variant) -> Result<Vec<UnifiedRecord>> {
    let bound = bind_tables(tables)?;

    let mut frames = Vec::with_capacity(bound.len());
    for (binding, table) in bound {
        let records = normalize_table(binding, table, variant)?;
        let records = if binding.is_influenza() {
            apply_flu_split(records)
        } else {
            records
        };
        frames.push(records);
    }

    let merged = merge_frames(frames, variant);
    info!(records = merged.len(), ?variant, "built unified dataset");
    Ok(merged)
}

/// Loads the live dataset from the publisher over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    landing: Url,
    landing_timeout: Duration,
    dataset_timeout: Duration,
    variant: Variant,
}

impl HttpSource {
    pub fn new(variant: Variant, landing_timeout: Duration, dataset_timeout: Duration) -> Result<Self> {
        let landing = Url::parse(LANDING_URL)
            .map_err(|e| PipelineError::layout(format!("invalid landing url: {e}")))?;
        Ok(Self {
            client: build_client()?,
            landing,
            landing_timeout,
            dataset_timeout,
            variant,
        })
    }

    /// Point at a different landing page, e.g. a mirror.
    pub fn with_landing(mut self, landing: Url) -> Self {
        self.landing = landing;
        self
    }
}

impl DatasetSource for HttpSource {
    async fn load(&self) -> Result<Dataset> {
        let source_url = fetch_dataset_url(&self.client, &self.landing, self.landing_timeout).await?;
        let tables = fetch_tables(&self.client, &source_url, self.dataset_timeout).await?;
        let records = build_dataset(&tables, self.variant)?;
        Ok(Dataset {
            records,
            source_url,
            fetched_at: Utc::now(),
            variant: self.variant,
            layout_version: crate::schema::LAYOUT_VERSION,
        })
    }
}
