// src/process/normalize.rs
//
// Raw per-virus tables → long-form records keyed by (week_end, region, virus).

use chrono::NaiveDate;
use tracing::{debug, instrument, trace};

use super::cells::{parse_measure, parse_week_end};
use super::labels;
use super::RawTable;
use crate::error::{PipelineError, Result};
use crate::schema::{Region, RegionCoverage, TableBinding, Variant, Virus};

/// Canonical long-form unit, still carrying the source virus code.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub week_end: NaiveDate,
    pub region: Region,
    pub virus: Virus,
    pub percent_positive: Option<f64>,
    pub cases_detected: Option<f64>,
}

/// Column positions feeding one region's records.
#[derive(Debug, Clone, PartialEq)]
struct RegionColumns {
    region: Region,
    cases: usize,
    /// One entry per virus, two (A then B) for the influenza table.
    positivity: Vec<(Virus, usize)>,
}

/// Normalize one bound table.
///
/// The multi-region variant reads every region block positionally; the
/// single-region variant picks that region's columns by label. Rows without a
/// parseable week and (region, virus) cells with neither measure produce no
/// record.
#[instrument(level = "debug", skip(table), fields(index = binding.document_index()))]
pub fn normalize_table(
    binding: TableBinding,
    table: &RawTable,
    variant: Variant,
) -> Result<Vec<NormalizedRecord>> {
    let idx = binding.document_index();
    let week_col = labels::find_week_column(&table.labels).ok_or_else(|| {
        PipelineError::column_shape(idx, binding.virus.code(), "no \"Week end\" column")
    })?;

    let plan = match variant {
        Variant::MultiRegion => wide_columns(binding, table)?,
        Variant::SingleRegion(region) => narrow_columns(binding, table, region)?
            .into_iter()
            .collect(),
    };

    let mut out = Vec::new();
    let mut skipped_rows = 0usize;
    for (row_idx, row) in table.rows.iter().enumerate() {
        let Some(week_end) = row.get(week_col).and_then(|c| parse_week_end(c)) else {
            trace!(row = row_idx, "no week end date; skipping row");
            skipped_rows += 1;
            continue;
        };
        let cell = |col: usize| row.get(col).and_then(|c| parse_measure(c));

        for cols in &plan {
            let cases = cell(cols.cases);
            if binding.is_influenza() {
                // The combined count travels as its own record until the split.
                if cases.is_some() {
                    out.push(NormalizedRecord {
                        week_end,
                        region: cols.region,
                        virus: Virus::Influenza,
                        percent_positive: None,
                        cases_detected: cases,
                    });
                }
                for &(subtype, col) in &cols.positivity {
                    if let Some(pct) = cell(col) {
                        out.push(NormalizedRecord {
                            week_end,
                            region: cols.region,
                            virus: subtype,
                            percent_positive: Some(pct),
                            cases_detected: None,
                        });
                    }
                }
            } else {
                for &(virus, col) in &cols.positivity {
                    let pct = cell(col);
                    if pct.is_none() && cases.is_none() {
                        continue;
                    }
                    out.push(NormalizedRecord {
                        week_end,
                        region: cols.region,
                        virus,
                        percent_positive: pct,
                        cases_detected: cases,
                    });
                }
            }
        }
    }

    debug!(
        records = out.len(),
        regions = plan.len(),
        skipped_rows,
        "normalized table"
    );
    Ok(out)
}

/// Region blocks in canonical order: the i-th case-count column and the i-th
/// positivity column (or A/B pair) belong to the i-th covered region.
fn wide_columns(binding: TableBinding, table: &RawTable) -> Result<Vec<RegionColumns>> {
    let idx = binding.document_index();
    let shape = |reason: String| PipelineError::column_shape(idx, binding.virus.code(), reason);

    let case_cols: Vec<usize> = positions(&table.labels, labels::is_case_count);
    let pct_cols: Vec<usize> = positions(&table.labels, labels::is_positivity);

    let coverage = RegionCoverage::from_block_count(case_cols.len()).ok_or_else(|| {
        shape(format!(
            "found {} case-count columns, expected 7 or 6 region blocks",
            case_cols.len()
        ))
    })?;
    let regions = coverage.regions();

    let per_region = if binding.is_influenza() {
        Virus::FLU_SUBTYPES.len()
    } else {
        1
    };
    if pct_cols.len() != regions.len() * per_region {
        return Err(shape(format!(
            "found {} positivity columns for {} regions, expected {}",
            pct_cols.len(),
            regions.len(),
            regions.len() * per_region
        )));
    }

    let mut plan = Vec::with_capacity(regions.len());
    for (i, &region) in regions.iter().enumerate() {
        let cases = case_cols[i];
        if let Some((named, _)) = labels::region_prefix(&table.labels[cases]) {
            if named != region {
                return Err(shape(format!(
                    "case-count column {:?} sits in the {} block",
                    table.labels[cases],
                    region.code()
                )));
            }
        }

        let positivity = if binding.is_influenza() {
            let mut pair = Vec::with_capacity(per_region);
            for (k, subtype) in Virus::FLU_SUBTYPES.into_iter().enumerate() {
                let col = pct_cols[i * per_region + k];
                let code = labels::positivity_code(&table.labels[col]);
                if code != subtype.code() {
                    return Err(shape(format!(
                        "expected alternating A/B positivity columns, found {:?} where {} {} was due",
                        table.labels[col],
                        region.code(),
                        subtype.code()
                    )));
                }
                pair.push((subtype, col));
            }
            pair
        } else {
            vec![(binding.virus, pct_cols[i])]
        };

        plan.push(RegionColumns {
            region,
            cases,
            positivity,
        });
    }

    if coverage == RegionCoverage::ExcludingTerritories {
        debug!("table omits the Territories block");
    }
    Ok(plan)
}

/// One region's columns, selected by label (`ON Tests`, `RSV%.3`, `ON A%`).
///
/// `None` when the table does not cover the region at all.
fn narrow_columns(
    binding: TableBinding,
    table: &RawTable,
    region: Region,
) -> Result<Option<RegionColumns>> {
    let idx = binding.document_index();
    let shape = |reason: String| PipelineError::column_shape(idx, binding.virus.code(), reason);

    let case_cols = positions(&table.labels, labels::is_case_count);
    let wanted = labels::case_count_label(region);
    let Some(cases) = table
        .labels
        .iter()
        .position(|l| labels::strip_suffix(l) == wanted)
    else {
        let covered = RegionCoverage::from_block_count(case_cols.len())
            .map_or(true, |c| c.regions().contains(&region));
        if covered {
            return Err(shape(format!("no {wanted:?} column")));
        }
        debug!(region = %region, "table does not cover region");
        return Ok(None);
    };

    let positivity = if binding.is_influenza() {
        let mut pair = Vec::with_capacity(2);
        for subtype in Virus::FLU_SUBTYPES {
            let label = labels::subtype_label(region, subtype.code());
            let col = table
                .labels
                .iter()
                .position(|l| labels::strip_suffix(l) == label)
                .ok_or_else(|| shape(format!("no {label:?} column")))?;
            pair.push((subtype, col));
        }
        pair
    } else {
        let candidates: Vec<usize> = positions(&table.labels, labels::is_positivity)
            .into_iter()
            .filter(|&c| labels::positivity_code(&table.labels[c]) == binding.virus.code())
            .collect();
        let col = match candidates.as_slice() {
            [only] => *only,
            many => many
                .iter()
                .copied()
                .find(|&c| labels::suffix_index(&table.labels[c]) == region.index())
                .ok_or_else(|| {
                    shape(format!(
                        "no {}% column for {} among {} candidates",
                        binding.virus.code(),
                        region.code(),
                        many.len()
                    ))
                })?,
        };
        vec![(binding.virus, col)]
    };

    Ok(Some(RegionColumns {
        region,
        cases,
        positivity,
    }))
}

fn positions(labels: &[String], pred: impl Fn(&str) -> bool) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter(|(_, l)| pred(l.as_str()))
        .map(|(i, _)| i)
        .collect()
}
