// src/process/merge.rs

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::NormalizedRecord;
use crate::schema::{Region, Variant, Virus};

/// One row of the published dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub week_end: NaiveDate,
    pub region: Region,
    /// Canonical display name, never a raw source code.
    pub virus: String,
    pub percent_positive: Option<f64>,
    pub cases_detected: Option<f64>,
}

/// Outer-join the per-virus frames on (week_end, region) into one table,
/// sorted by week, region (canonical order) and virus display name.
///
/// A repeated (week_end, region, virus) triple keeps its first occurrence.
pub fn merge_frames<I>(frames: I, variant: Variant) -> Vec<UnifiedRecord>
where
    I: IntoIterator<Item = Vec<NormalizedRecord>>,
{
    let mut merged: BTreeMap<(NaiveDate, Region, &'static str), UnifiedRecord> = BTreeMap::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;

    for record in frames.into_iter().flatten() {
        let Some(name) = record.virus.display_name() else {
            debug!(virus = %record.virus, "no display name; not published");
            dropped += 1;
            continue;
        };
        if !variant.includes(record.region) || !publishable(&record, variant) {
            dropped += 1;
            continue;
        }

        match merged.entry((record.week_end, record.region, name)) {
            Entry::Vacant(slot) => {
                slot.insert(UnifiedRecord {
                    week_end: record.week_end,
                    region: record.region,
                    virus: name.to_string(),
                    percent_positive: record.percent_positive,
                    cases_detected: record.cases_detected,
                });
            }
            Entry::Occupied(_) => {
                warn!(
                    week_end = %record.week_end,
                    region = %record.region,
                    virus = name,
                    "duplicate record; keeping first"
                );
                duplicates += 1;
            }
        }
    }

    debug!(
        records = merged.len(),
        dropped, duplicates, "merged virus frames"
    );
    merged.into_values().collect()
}

fn publishable(record: &NormalizedRecord, variant: Variant) -> bool {
    let pct = record.percent_positive.is_some();
    let cases = record.cases_detected.is_some();
    if variant.keeps_partial_records() {
        pct || cases
    } else {
        pct && cases
    }
}

/// Display names in output order for a set of records.
pub fn virus_names(records: &[UnifiedRecord]) -> Vec<&str> {
    let mut names: Vec<&str> = records.iter().map(|r| r.virus.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Whether `name` is one of the canonical display names.
pub fn is_display_name(name: &str) -> bool {
    Virus::from_display_name(name).is_some()
}
