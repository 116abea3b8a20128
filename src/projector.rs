//! Pure projections of a hit series into chart-ready shapes.
//!
//! Nothing here reorders or filters dates: the line chart gets exactly one
//! point per input record, in input order.

use crate::models::{Distribution, DistributionSlice, HitRecord, TrendPoint, TrendValues};
use crate::selection::RegionSelection;
use chrono::NaiveDate;

pub const TOTAL_LABEL: &str = "total";

pub fn project_trend(series: &[HitRecord], selection: &RegionSelection) -> Vec<TrendPoint> {
    series
        .iter()
        .map(|record| {
            let mut values = TrendValues::default();
            match selection {
                RegionSelection::All => values.push(TOTAL_LABEL, record.total_hits),
                RegionSelection::Subset(regions) => {
                    for region in regions {
                        values.push(region.as_str(), record.region_value(region.as_str()));
                    }
                }
            }
            TrendPoint {
                date: record.date,
                values,
            }
        })
        .collect()
}

pub fn project_distribution(
    series: &[HitRecord],
    selection: &RegionSelection,
    cursor: NaiveDate,
) -> Distribution {
    // first match wins on duplicate dates
    let Some(record) = series.iter().find(|record| record.date == cursor) else {
        return Distribution::default();
    };

    let pairs: Vec<(String, i64)> = match selection {
        RegionSelection::All => record
            .by_region
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect(),
        RegionSelection::Subset(regions) => regions
            .iter()
            .map(|region| (region.to_string(), record.region_value(region.as_str())))
            .collect(),
    };

    let total = pairs
        .iter()
        .fold(0i64, |acc, (_, value)| acc.saturating_add(*value));
    let slices = pairs
        .into_iter()
        .map(|(name, value)| DistributionSlice {
            percent: share(value, total),
            name,
            value,
        })
        .collect();

    Distribution { slices, total }
}

fn share(value: i64, total: i64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(value as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use std::collections::BTreeMap;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, total: i64, regions: &[(&str, i64)]) -> HitRecord {
        HitRecord {
            date,
            total_hits: total,
            by_region: regions
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn subset(keys: &[&str]) -> RegionSelection {
        RegionSelection::Subset(keys.iter().map(|k| Region::parse(k).unwrap()).collect())
    }

    fn sample() -> Vec<HitRecord> {
        vec![
            record(day(2024, 2, 1), 12, &[("NY", 5), ("CA", 6)]),
            record(day(2024, 1, 15), 9, &[("CA", 4), ("TX", 5)]),
            record(day(2024, 1, 20), 0, &[]),
        ]
    }

    #[test]
    fn trend_keeps_length_and_order() {
        let series = sample();
        for selection in [RegionSelection::All, subset(&["NY"]), subset(&[])] {
            let trend = project_trend(&series, &selection);
            assert_eq!(trend.len(), series.len());
            for (point, record) in trend.iter().zip(&series) {
                assert_eq!(point.date, record.date);
            }
        }
    }

    #[test]
    fn trend_all_uses_total_hits() {
        let series = sample();
        let trend = project_trend(&series, &RegionSelection::All);
        for (point, record) in trend.iter().zip(&series) {
            assert_eq!(point.values.get(TOTAL_LABEL), Some(record.total_hits));
            assert_eq!(point.values.len(), 1);
        }
    }

    #[test]
    fn trend_subset_defaults_missing_regions_to_zero() {
        let trend = project_trend(&sample(), &subset(&["TX", "NY"]));
        assert_eq!(trend[0].values.get("NY"), Some(5));
        assert_eq!(trend[0].values.get("TX"), Some(0));
        assert_eq!(trend[1].values.get("TX"), Some(5));
        assert_eq!(trend[2].values.get("NY"), Some(0));
        let labels: Vec<&str> = trend[0].values.labels().collect();
        assert_eq!(labels, vec!["TX", "NY"]);
    }

    #[test]
    fn trend_with_nothing_selected_has_no_values() {
        let trend = project_trend(&sample(), &subset(&[]));
        assert!(trend.iter().all(|point| point.values.is_empty()));
    }

    #[test]
    fn distribution_all_follows_region_key_order() {
        let dist = project_distribution(&sample(), &RegionSelection::All, day(2024, 2, 1));
        let names: Vec<&str> = dist.slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["CA", "NY"]);
        assert_eq!(dist.total, 11);
        let ca = &dist.slices[0];
        assert!((ca.percent.unwrap() - 6.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn distribution_is_empty_without_matching_date() {
        let dist = project_distribution(&sample(), &RegionSelection::All, day(2024, 3, 1));
        assert!(dist.slices.is_empty());
        assert_eq!(dist.total, 0);
    }

    #[test]
    fn distribution_subset_uses_selection_order_and_zero_default() {
        let dist = project_distribution(&sample(), &subset(&["TX", "NY"]), day(2024, 2, 1));
        assert_eq!(dist.slices.len(), 2);
        assert_eq!(dist.slices[0].name, "TX");
        assert_eq!(dist.slices[0].value, 0);
        assert_eq!(dist.slices[1].value, 5);
    }

    #[test]
    fn distribution_with_zero_total_omits_percentages() {
        let dist = project_distribution(&sample(), &subset(&["WA"]), day(2024, 1, 20));
        assert_eq!(dist.slices.len(), 1);
        assert_eq!(dist.slices[0].percent, None);
    }

    #[test]
    fn distribution_uses_first_duplicate() {
        let mut series = sample();
        series.push(record(day(2024, 2, 1), 99, &[("NY", 99)]));
        let dist = project_distribution(&series, &RegionSelection::All, day(2024, 2, 1));
        assert_eq!(dist.total, 11);
    }

    #[test]
    fn distribution_total_saturates_on_huge_counts() {
        let series = vec![record(day(2024, 2, 1), i64::MAX, &[("CA", i64::MAX), ("NY", i64::MAX)])];
        let dist = project_distribution(&series, &RegionSelection::All, day(2024, 2, 1));
        assert_eq!(dist.total, i64::MAX);
        assert_eq!(dist.slices.len(), 2);
        assert!(dist.slices.iter().all(|slice| slice.percent == Some(1.0)));
    }

    #[test]
    fn distribution_of_empty_subset_is_empty() {
        let dist = project_distribution(&sample(), &subset(&[]), day(2024, 2, 1));
        assert!(dist.slices.is_empty());
    }
}
