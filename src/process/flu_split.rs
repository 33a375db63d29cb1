// src/process/flu_split.rs
//
// The source reports one combined influenza count per (week, region) but
// separate A and B positivity. Subtype counts are apportioned by share of
// positivity and rounded half-to-even.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use super::NormalizedRecord;
use crate::schema::{Region, Virus};

/// Split `total` into `(A, B)` in proportion to `pct_a : pct_b`.
///
/// `None` when the shares are undefined: both percentages zero, or any input
/// negative or non-finite.
pub fn split_cases(total: f64, pct_a: f64, pct_b: f64) -> Option<(f64, f64)> {
    if !(total.is_finite() && pct_a.is_finite() && pct_b.is_finite()) {
        return None;
    }
    if total < 0.0 || pct_a < 0.0 || pct_b < 0.0 {
        return None;
    }
    let sum = pct_a + pct_b;
    if sum == 0.0 {
        return None;
    }
    let a = (total * pct_a / sum).round_ties_even();
    let b = (total * pct_b / sum).round_ties_even();
    Some((a, b))
}

/// Fill subtype case counts from the combined influenza records, then drop
/// the combined records. Records of other viruses pass through unchanged.
pub fn apply_flu_split(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    type Key = (NaiveDate, Region);

    let mut totals: HashMap<Key, f64> = HashMap::new();
    let mut shares: HashMap<Key, (Option<f64>, Option<f64>)> = HashMap::new();
    for r in &records {
        let key = (r.week_end, r.region);
        match r.virus {
            Virus::Influenza => {
                if let Some(total) = r.cases_detected {
                    totals.insert(key, total);
                }
            }
            Virus::FluA => shares.entry(key).or_default().0 = r.percent_positive,
            Virus::FluB => shares.entry(key).or_default().1 = r.percent_positive,
            _ => {}
        }
    }

    let mut undefined = 0usize;
    let mut out = Vec::with_capacity(records.len());
    for mut r in records {
        let key = (r.week_end, r.region);
        match r.virus {
            Virus::Influenza => continue,
            Virus::FluA | Virus::FluB => {
                let split = match (totals.get(&key), shares.get(&key)) {
                    (Some(&total), Some(&(Some(a), Some(b)))) => split_cases(total, a, b),
                    _ => None,
                };
                if split.is_none() {
                    undefined += 1;
                }
                r.cases_detected = split.map(|(a, b)| if r.virus == Virus::FluA { a } else { b });
            }
            _ => {}
        }
        out.push(r);
    }

    debug!(
        totals = totals.len(),
        undefined, "apportioned influenza cases to subtypes"
    );
    out
}
