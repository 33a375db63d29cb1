//! Data side of the chart contract: which series a renderer draws for a given
//! stacking toggle and region selection. No rendering happens here.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::schema::{Region, Variant};

pub const Y_AXIS_TITLE: &str = "% positive (per week)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartMode {
    /// Areas stacked on a shared week axis.
    #[default]
    Stacked,
    /// One panel per virus with independent y axes.
    Faceted,
}

impl ChartMode {
    /// The UI exposes stacking as an "unstack" switch.
    pub fn from_unstack_switch(on: bool) -> Self {
        if on {
            ChartMode::Faceted
        } else {
            ChartMode::Stacked
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub mode: ChartMode,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub week_end: NaiveDate,
    pub percent_positive: Option<f64>,
    /// Hover detail only.
    pub cases_detected: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirusSeries {
    pub virus: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub mode: ChartMode,
    pub region: Region,
    pub title: String,
    pub y_axis_title: &'static str,
    /// Ordered by virus display name.
    pub series: Vec<VirusSeries>,
}

/// Build the series for `request`.
///
/// A single-region dataset always charts its own region; the region selector
/// only applies to multi-region data. Stacked series share one week axis;
/// weeks a virus did not report carry absent positivity, and filling the
/// gap is left to the renderer.
pub fn chart_view(dataset: &Dataset, request: ChartRequest) -> ChartView {
    let region = match dataset.variant {
        Variant::SingleRegion(only) => only,
        Variant::MultiRegion => request.region,
    };

    let mut by_virus: BTreeMap<&str, Vec<ChartPoint>> = BTreeMap::new();
    for r in dataset.for_region(region) {
        by_virus.entry(r.virus.as_str()).or_default().push(ChartPoint {
            week_end: r.week_end,
            percent_positive: r.percent_positive,
            cases_detected: r.cases_detected,
        });
    }

    if request.mode == ChartMode::Stacked {
        let weeks: BTreeSet<NaiveDate> = by_virus
            .values()
            .flatten()
            .map(|p| p.week_end)
            .collect();
        for points in by_virus.values_mut() {
            *points = align(points, &weeks);
        }
    }

    let series = by_virus
        .into_iter()
        .map(|(virus, points)| VirusSeries {
            virus: virus.to_string(),
            points,
        })
        .collect();

    ChartView {
        mode: request.mode,
        region,
        title: format!("Weekly {} Respiratory Virus Report", region.display_name()),
        y_axis_title: Y_AXIS_TITLE,
        series,
    }
}

fn align(points: &[ChartPoint], weeks: &BTreeSet<NaiveDate>) -> Vec<ChartPoint> {
    let by_week: BTreeMap<NaiveDate, &ChartPoint> = points.iter().map(|p| (p.week_end, p)).collect();
    weeks
        .iter()
        .map(|&week_end| match by_week.get(&week_end) {
            Some(&p) => p.clone(),
            None => ChartPoint {
                week_end,
                percent_positive: None,
                cases_detected: None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::UnifiedRecord;
    use chrono::Utc;
    use url::Url;

    fn rec(day: u32, region: Region, virus: &str, pct: Option<f64>) -> UnifiedRecord {
        UnifiedRecord {
            week_end: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            region,
            virus: virus.to_string(),
            percent_positive: pct,
            cases_detected: Some(1.0),
        }
    }

    fn dataset(variant: Variant) -> Dataset {
        Dataset {
            records: vec![
                rec(6, Region::Can, "Adenovirus (ADV)", Some(1.0)),
                rec(6, Region::On, "Adenovirus (ADV)", Some(2.0)),
                rec(13, Region::On, "Adenovirus (ADV)", None),
                rec(13, Region::On, "Influenza A", Some(5.0)),
            ],
            source_url: Url::parse("https://www.canada.ca/data.html").unwrap(),
            fetched_at: Utc::now(),
            variant,
            layout_version: 1,
        }
    }

    #[test]
    fn test_defaults() {
        let req = ChartRequest::default();
        assert_eq!(req.mode, ChartMode::Stacked);
        assert_eq!(req.region, Region::Can);
        assert_eq!(ChartMode::from_unstack_switch(true), ChartMode::Faceted);
    }

    #[test]
    fn test_region_selection() {
        let view = chart_view(&dataset(Variant::MultiRegion), ChartRequest::default());
        assert_eq!(view.region, Region::Can);
        assert_eq!(view.title, "Weekly All Canada Respiratory Virus Report");
        assert_eq!(view.series.len(), 1);
        assert_eq!(view.series[0].points.len(), 1);
    }

    #[test]
    fn test_stacked_aligns_weeks() {
        let view = chart_view(
            &dataset(Variant::MultiRegion),
            ChartRequest {
                mode: ChartMode::Stacked,
                region: Region::On,
            },
        );
        let names: Vec<_> = view.series.iter().map(|s| s.virus.as_str()).collect();
        assert_eq!(names, ["Adenovirus (ADV)", "Influenza A"]);
        for s in &view.series {
            assert_eq!(s.points.len(), 2);
        }
        let flu = &view.series[1];
        assert_eq!(flu.points[0].week_end, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(flu.points[0].percent_positive, None);
        assert_eq!(flu.points[0].cases_detected, None);
        assert_eq!(flu.points[1].percent_positive, Some(5.0));

        // A reported week with absent positivity stays absent, not zero.
        let adv = &view.series[0];
        assert_eq!(adv.points[1].percent_positive, None);
        assert_eq!(adv.points[1].cases_detected, Some(1.0));
        assert_eq!(adv.points[0].percent_positive, Some(2.0));
    }

    #[test]
    fn test_faceted_keeps_gaps() {
        let view = chart_view(
            &dataset(Variant::MultiRegion),
            ChartRequest {
                mode: ChartMode::Faceted,
                region: Region::On,
            },
        );
        assert_eq!(view.series[1].points.len(), 1);
        assert_eq!(view.series[0].points[1].percent_positive, None);
    }

    #[test]
    fn test_single_region_ignores_selector() {
        let view = chart_view(
            &dataset(Variant::SingleRegion(Region::On)),
            ChartRequest {
                mode: ChartMode::Faceted,
                region: Region::Bc,
            },
        );
        assert_eq!(view.region, Region::On);
        assert_eq!(view.series.len(), 2);
    }
}
