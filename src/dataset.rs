// src/dataset.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::process::merge::virus_names;
use crate::process::UnifiedRecord;
use crate::schema::{Region, Variant};

/// One complete, immutable load of the surveillance data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub records: Vec<UnifiedRecord>,
    pub source_url: Url,
    pub fetched_at: DateTime<Utc>,
    pub variant: Variant,
    pub layout_version: u32,
}

/// Record counts and coverage, for logs and health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub first_week: Option<NaiveDate>,
    pub last_week: Option<NaiveDate>,
    pub per_virus: BTreeMap<String, usize>,
    pub regions: Vec<Region>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_region(&self, region: Region) -> impl Iterator<Item = &UnifiedRecord> + '_ {
        self.records.iter().filter(move |r| r.region == region)
    }

    /// Display names present, in output order.
    pub fn virus_names(&self) -> Vec<&str> {
        virus_names(&self.records)
    }

    /// Regions present, in canonical order.
    pub fn regions(&self) -> Vec<Region> {
        let mut regions: Vec<Region> = self.records.iter().map(|r| r.region).collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    /// First and last week-end dates. Records are sorted by week first.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.week_end;
        let last = self.records.last()?.week_end;
        Some((first, last))
    }

    pub fn summary(&self) -> DatasetSummary {
        let mut per_virus = BTreeMap::new();
        for r in &self.records {
            *per_virus.entry(r.virus.clone()).or_insert(0) += 1;
        }
        let range = self.date_range();
        DatasetSummary {
            records: self.records.len(),
            first_week: range.map(|(f, _)| f),
            last_week: range.map(|(_, l)| l),
            per_virus,
            regions: self.regions(),
        }
    }

    pub fn log_summary(&self) {
        let s = self.summary();
        info!(
            records = s.records,
            first_week = ?s.first_week,
            last_week = ?s.last_week,
            viruses = s.per_virus.len(),
            regions = s.regions.len(),
            source = %self.source_url,
            "dataset loaded"
        );
        for (virus, count) in &s.per_virus {
            info!(virus = virus.as_str(), records = count, "virus coverage");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(day: u32, region: Region, virus: &str) -> UnifiedRecord {
        UnifiedRecord {
            week_end: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            region,
            virus: virus.to_string(),
            percent_positive: Some(1.0),
            cases_detected: Some(2.0),
        }
    }

    fn dataset(records: Vec<UnifiedRecord>) -> Dataset {
        Dataset {
            records,
            source_url: Url::parse("https://www.canada.ca/data.html").unwrap(),
            fetched_at: Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap(),
            variant: Variant::MultiRegion,
            layout_version: 1,
        }
    }

    #[test]
    fn test_summary() {
        let ds = dataset(vec![
            rec(6, Region::Can, "Adenovirus (ADV)"),
            rec(6, Region::On, "Adenovirus (ADV)"),
            rec(13, Region::On, "Influenza A"),
        ]);
        let s = ds.summary();
        assert_eq!(s.records, 3);
        assert_eq!(s.first_week, NaiveDate::from_ymd_opt(2024, 1, 6));
        assert_eq!(s.last_week, NaiveDate::from_ymd_opt(2024, 1, 13));
        assert_eq!(s.per_virus["Adenovirus (ADV)"], 2);
        assert_eq!(s.regions, vec![Region::Can, Region::On]);
        assert_eq!(ds.for_region(Region::On).count(), 2);
        assert_eq!(ds.virus_names(), ["Adenovirus (ADV)", "Influenza A"]);
    }

    #[test]
    fn test_empty_dataset() {
        let ds = dataset(Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.date_range(), None);
        assert!(ds.summary().regions.is_empty());
    }

    #[test]
    fn test_serializes_region_codes() {
        let ds = dataset(vec![rec(6, Region::Qc, "Adenovirus (ADV)")]);
        let json = serde_json::to_value(&ds).unwrap();
        assert_eq!(json["records"][0]["region"], "QC");
        assert_eq!(json["records"][0]["week_end"], "2024-01-06");
        assert_eq!(json["variant"]["kind"], "multi_region");
    }
}
