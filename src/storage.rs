use crate::models::{HitRecord, Region};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};

/// One observation as written by the collector: a region's hit count on a
/// day, optionally stamped with the time it was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredHit {
    pub state: String,
    pub hit: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HitLog {
    pub hits: Vec<StoredHit>,
}

/// Read-only view over the hit log, answering date-range queries.
#[derive(Debug, Default)]
pub struct HitStore {
    rows: Vec<(StoredHit, Option<DateTime<FixedOffset>>)>,
}

impl HitStore {
    pub fn from_log(log: HitLog) -> Self {
        let mut rows = Vec::with_capacity(log.hits.len());
        for mut hit in log.hits {
            let region = match Region::parse(&hit.state) {
                Ok(region) => region,
                Err(err) => {
                    warn!(
                        state = %hit.state.escape_debug(),
                        date = %hit.date,
                        "skipping hit row: {err}"
                    );
                    continue;
                }
            };
            hit.state = region.as_str().to_string();
            match parse_timestamp(&hit) {
                Ok(stamp) => rows.push((hit, stamp)),
                Err(reason) => warn!(
                    state = %hit.state,
                    date = %hit.date,
                    "skipping hit row: {reason}"
                ),
            }
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-day aggregates for `start..=end`, sorted by date. Only the latest
    /// observation of each region on a day counts.
    pub fn query_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<HitRecord> {
        let mut latest: BTreeMap<(NaiveDate, &str), (i64, Option<DateTime<FixedOffset>>)> =
            BTreeMap::new();
        for (hit, stamp) in &self.rows {
            if hit.date < start || hit.date > end {
                continue;
            }
            let key = (hit.date, hit.state.as_str());
            // `None < Some(_)`, so untimed rows lose to timed ones
            if latest.get(&key).is_none_or(|(_, seen)| stamp >= seen) {
                latest.insert(key, (hit.hit, *stamp));
            }
        }

        let mut days: BTreeMap<NaiveDate, HitRecord> = BTreeMap::new();
        for ((date, state), (hit, _)) in latest {
            let record = days.entry(date).or_insert_with(|| HitRecord {
                date,
                total_hits: 0,
                by_region: BTreeMap::new(),
            });
            record.total_hits = record.total_hits.saturating_add(hit);
            record.by_region.insert(state.to_string(), hit);
        }
        days.into_values().collect()
    }
}

fn parse_timestamp(hit: &StoredHit) -> Result<Option<DateTime<FixedOffset>>, String> {
    let Some(raw) = hit.timestamp.as_deref() else {
        return Ok(None);
    };
    if !raw.starts_with(&hit.date.format("%Y-%m-%d").to_string()) {
        return Err(format!("timestamp {raw} does not fall on {}", hit.date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(Some)
        .map_err(|err| format!("timestamp {raw} is not RFC 3339: {err}"))
}

pub async fn load_log(path: &Path) -> HitLog {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(log) => log,
            Err(err) => {
                error!("failed to parse hit log: {err}");
                HitLog::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no hit log yet, serving an empty series");
            HitLog::default()
        }
        Err(err) => {
            error!("failed to read hit log: {err}");
            HitLog::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn hit(state: &str, hit: i64, date: NaiveDate, timestamp: Option<&str>) -> StoredHit {
        StoredHit {
            state: state.to_string(),
            hit,
            date,
            timestamp: timestamp.map(str::to_string),
        }
    }

    #[test]
    fn latest_observation_per_region_wins() {
        let store = HitStore::from_log(HitLog {
            hits: vec![
                hit("CA", 1, day(1), Some("2023-01-01T10:00:00Z")),
                hit("CA", 5, day(1), Some("2023-01-01T11:00:00Z")),
                hit("NY", 3, day(1), Some("2023-01-01T12:00:00Z")),
            ],
        });

        let records = store.query_range(day(1), day(31));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_hits, 8);
        assert_eq!(records[0].region_value("CA"), 5);
        assert_eq!(records[0].region_value("NY"), 3);
    }

    #[test]
    fn untimed_rows_lose_to_timed_rows() {
        let store = HitStore::from_log(HitLog {
            hits: vec![
                hit("CA", 9, day(2), Some("2023-01-02T08:00:00Z")),
                hit("CA", 1, day(2), None),
            ],
        });
        assert_eq!(store.query_range(day(1), day(3))[0].region_value("CA"), 9);
    }

    #[test]
    fn range_is_inclusive_and_sorted() {
        let store = HitStore::from_log(HitLog {
            hits: vec![
                hit("TX", 2, day(5), None),
                hit("TX", 1, day(3), None),
                hit("TX", 4, day(9), None),
            ],
        });
        let dates: Vec<NaiveDate> = store
            .query_range(day(3), day(5))
            .iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![day(3), day(5)]);
    }

    #[test]
    fn invalid_timestamps_are_skipped() {
        let store = HitStore::from_log(HitLog {
            hits: vec![
                hit("CA", 1, day(1), Some("2023-01-02T10:00:00Z")),
                hit("CA", 1, day(1), Some("2023-01-01 nonsense")),
                hit("NY", 2, day(1), Some("2023-01-01T10:00:00+02:00")),
            ],
        });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rows_with_invalid_region_keys_are_skipped() {
        let store = HitStore::from_log(HitLog {
            hits: vec![
                hit("<img src=x onerror=alert(1)>", 7, day(4), None),
                hit("all", 2, day(4), None),
                hit(" NY ", 3, day(4), None),
            ],
        });
        assert_eq!(store.len(), 1);

        let records = store.query_range(day(4), day(4));
        let keys: Vec<&str> = records[0].by_region.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["NY"]);
        assert_eq!(records[0].total_hits, 3);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let store = HitStore::default();
        assert!(store.is_empty());
        assert!(store.query_range(day(1), day(31)).is_empty());
    }

    #[tokio::test]
    async fn missing_log_file_is_empty() {
        let mut path = std::env::temp_dir();
        path.push(format!("hit_dashboard_missing_{}.json", std::process::id()));
        assert!(load_log(&path).await.hits.is_empty());
    }
}
