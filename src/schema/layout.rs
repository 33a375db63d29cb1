// src/schema/layout.rs
//
// Positional bindings between the dataset document's tables and the viruses
// they report. The publisher's tables are not self-describing, so every
// assumption here is checked before any data is interpreted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Region, Virus};
use crate::error::{PipelineError, Result};
use crate::process::labels;
use crate::process::RawTable;

/// Bumped whenever the bindings below change to follow the publisher.
pub const LAYOUT_VERSION: u32 = 1;

/// Tables preceding the per-virus tables (summary and notes).
pub const PREAMBLE_TABLES: usize = 4;

/// Documents with fewer tables than this cannot carry every binding.
pub const MIN_TABLE_COUNT: usize = 12;

/// One `(table position → virus)` binding. `position` counts from the first
/// table after the preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBinding {
    pub position: usize,
    pub virus: Virus,
}

impl TableBinding {
    /// Index of the bound table within the whole document.
    pub fn document_index(&self) -> usize {
        PREAMBLE_TABLES + self.position
    }

    pub fn is_influenza(&self) -> bool {
        self.virus == Virus::Influenza
    }
}

pub const BINDINGS: [TableBinding; 8] = [
    TableBinding { position: 0, virus: Virus::SarsCov2 },
    TableBinding { position: 1, virus: Virus::Influenza },
    TableBinding { position: 2, virus: Virus::Rsv },
    TableBinding { position: 3, virus: Virus::Hpiv },
    TableBinding { position: 4, virus: Virus::Adv },
    TableBinding { position: 5, virus: Virus::Hmpv },
    TableBinding { position: 6, virus: Virus::EvRv },
    TableBinding { position: 7, virus: Virus::Hcov },
];

/// Which slice of the data a run publishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "region", rename_all = "snake_case")]
pub enum Variant {
    /// One region's columns only; records need both measures to be kept.
    SingleRegion(Region),
    /// Every region block; records with one measure present are kept.
    #[default]
    MultiRegion,
}

impl Variant {
    pub fn keeps_partial_records(self) -> bool {
        matches!(self, Variant::MultiRegion)
    }

    pub fn includes(self, region: Region) -> bool {
        match self {
            Variant::SingleRegion(only) => only == region,
            Variant::MultiRegion => true,
        }
    }
}

/// Pair every binding with its table after checking the document still looks
/// like the one the bindings were written for.
pub fn bind_tables(tables: &[RawTable]) -> Result<Vec<(TableBinding, &RawTable)>> {
    if tables.len() < MIN_TABLE_COUNT {
        return Err(PipelineError::UnexpectedTableCount {
            expected: MIN_TABLE_COUNT,
            found: tables.len(),
        });
    }

    let mut bound = Vec::with_capacity(BINDINGS.len());
    for binding in BINDINGS {
        let idx = binding.document_index();
        let table = tables.get(idx).ok_or(PipelineError::UnexpectedTableCount {
            expected: idx + 1,
            found: tables.len(),
        })?;
        check_columns(binding, table)?;
        debug!(
            table = idx,
            virus = %binding.virus,
            columns = table.labels.len(),
            rows = table.rows.len(),
            "bound table"
        );
        bound.push((binding, table));
    }
    Ok(bound)
}

/// Every bound table needs a week column plus at least one case-count and one
/// positivity column, and a non-influenza table's positivity labels must name
/// the bound virus.
fn check_columns(binding: TableBinding, table: &RawTable) -> Result<()> {
    let idx = binding.document_index();
    if labels::find_week_column(&table.labels).is_none() {
        return Err(PipelineError::layout(format!(
            "table {idx} ({}) has no \"Week end\" column",
            binding.virus
        )));
    }
    if !table.labels.iter().any(|l| labels::is_case_count(l)) {
        return Err(PipelineError::layout(format!(
            "table {idx} ({}) has no column containing \"Tests\"",
            binding.virus
        )));
    }
    let positivity: Vec<&String> = table
        .labels
        .iter()
        .filter(|l| labels::is_positivity(l))
        .collect();
    if positivity.is_empty() {
        return Err(PipelineError::layout(format!(
            "table {idx} ({}) has no column ending in \"%\"",
            binding.virus
        )));
    }
    if !binding.is_influenza() {
        let expected = format!("{}%", binding.virus.code());
        if let Some(other) = positivity.iter().find(|l| {
            labels::region_prefix(l).is_some()
                || Virus::from_code(labels::positivity_code(l)) != Some(binding.virus)
        }) {
            return Err(PipelineError::layout(format!(
                "table {idx} expected {expected:?} positivity columns, found {other:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(labels: &[&str]) -> RawTable {
        RawTable::new(labels.iter().map(|s| s.to_string()).collect(), Vec::new())
    }

    fn document() -> Vec<RawTable> {
        let mut tables: Vec<RawTable> = (0..PREAMBLE_TABLES).map(|_| table(&["Notes"])).collect();
        for b in BINDINGS {
            if b.is_influenza() {
                tables.push(table(&["Week end", "ON Tests", "ON A%", "ON B%"]));
            } else {
                let pct = format!("{}%", b.virus.code());
                tables.push(table(&["Week End", "ON Tests", &pct]));
            }
        }
        tables
    }

    #[test]
    fn test_bindings_cover_every_virus_table_in_order() {
        let viruses: Vec<_> = BINDINGS.iter().map(|b| b.virus.code()).collect();
        assert_eq!(
            viruses,
            ["SARS-CoV-2", "Flu", "RSV", "HPIV", "ADV", "HMPV", "EV/RV", "HCoV"]
        );
        assert_eq!(BINDINGS[0].document_index(), 4);
        assert_eq!(BINDINGS[7].document_index(), 11);
    }

    #[test]
    fn test_bind_tables_accepts_expected_document() {
        let doc = document();
        let bound = bind_tables(&doc).unwrap();
        assert_eq!(bound.len(), 8);
        assert_eq!(bound[2].0.virus, Virus::Rsv);
    }

    #[test]
    fn test_too_few_tables() {
        let doc: Vec<RawTable> = document().into_iter().take(7).collect();
        let err = bind_tables(&doc).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnexpectedTableCount { expected: 12, found: 7 }
        ));
    }

    #[test]
    fn test_relabelled_tests_column_is_a_layout_change() {
        let mut doc = document();
        doc[6] = table(&["Week end", "ON Samples", "RSV%"]);
        let err = bind_tables(&doc).unwrap_err();
        assert!(matches!(err, PipelineError::SourceLayoutChanged { .. }));
        assert!(err.to_string().contains("Tests"));
    }

    #[test]
    fn test_shuffled_table_is_a_layout_change() {
        let mut doc = document();
        doc.swap(6, 7);
        let err = bind_tables(&doc).unwrap_err();
        assert!(matches!(err, PipelineError::SourceLayoutChanged { .. }));
    }

    #[test]
    fn test_foreign_positivity_label_is_a_layout_change() {
        let mut doc = document();
        doc[6] = table(&["Week end", "ON Tests", "RSV%", "ON RSV%"]);
        assert!(bind_tables(&doc).is_err());

        let mut doc = document();
        doc[6] = table(&["Week end", "ON Tests", "RSV%", "HMPV%.1"]);
        let err = bind_tables(&doc).unwrap_err();
        assert!(err.to_string().contains("HMPV%.1"));

        let mut doc = document();
        doc[6] = table(&["Week end", "ON Tests", "RSV%", "RSV%.1"]);
        assert!(bind_tables(&doc).is_ok());
    }

    #[test]
    fn test_variant_rules() {
        assert!(Variant::MultiRegion.keeps_partial_records());
        assert!(!Variant::SingleRegion(Region::On).keeps_partial_records());
        assert!(Variant::SingleRegion(Region::On).includes(Region::On));
        assert!(!Variant::SingleRegion(Region::On).includes(Region::Bc));
        assert_eq!(Variant::default(), Variant::MultiRegion);
    }
}
