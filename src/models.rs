use chrono::{Duration, NaiveDate};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// One day of hit counts as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub date: NaiveDate,
    pub total_hits: i64,
    #[serde(
        rename = "by_states",
        alias = "by_region",
        default,
        deserialize_with = "region_counts"
    )]
    pub by_region: BTreeMap<String, i64>,
}

/// Keeps only counts whose key is a valid region.
fn region_counts<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, i64>, D::Error> {
    let raw = BTreeMap::<String, i64>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match Region::parse(&key) {
            Ok(region) => Some((region.0, value)),
            Err(err) => {
                warn!(key = %key.escape_debug(), "dropping region count: {err}");
                None
            }
        })
        .collect())
}

impl HitRecord {
    pub fn region_value(&self, region: &str) -> i64 {
        self.by_region.get(region).copied().unwrap_or(0)
    }
}

/// Inclusive calendar-day range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// `days` days back from `today`, both ends included. Saturates at the
    /// earliest representable date.
    pub fn ending_at(today: NaiveDate, days: u32) -> Self {
        Self {
            start: today
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    /// Smallest window covering every record date, `None` for an empty series.
    pub fn spanning(series: &[HitRecord]) -> Option<Self> {
        let start = series.iter().map(|record| record.date).min()?;
        let end = series.iter().map(|record| record.date).max()?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Dates outside the window snap to its end.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        if self.contains(date) { date } else { self.end }
    }

    pub fn with_start(&self, start: NaiveDate) -> Option<Self> {
        Self::new(start, self.end)
    }

    pub fn with_end(&self, end: NaiveDate) -> Option<Self> {
        Self::new(self.start, end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Opaque region key such as a state code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Region(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("region must not be empty")]
    Empty,
    #[error("region is longer than {max} characters")]
    TooLong { max: usize },
    #[error("region contains unsupported character {0:?}")]
    BadChar(char),
    #[error("'all' is reserved for selecting every region")]
    Reserved,
}

impl Region {
    const MAX_LEN: usize = 32;

    pub fn parse(raw: &str) -> Result<Self, RegionError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(RegionError::Empty);
        }
        if key.chars().count() > Self::MAX_LEN {
            return Err(RegionError::TooLong { max: Self::MAX_LEN });
        }
        if let Some(bad) = key
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ')))
        {
            return Err(RegionError::BadChar(bad));
        }
        if is_all_sentinel(key) {
            return Err(RegionError::Reserved);
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_all_sentinel(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("all")
}

/// Label/value pairs of one trend point, serialized as a JSON object in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrendValues(Vec<(String, i64)>);

impl TrendValues {
    pub fn push(&mut self, label: impl Into<String>, value: i64) {
        self.0.push((label.into(), value));
    }

    pub fn get(&self, label: &str) -> Option<i64> {
        self.0
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| *value)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TrendValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub values: TrendValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: i64,
    /// Share of the distribution total, omitted when the total is zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Distribution {
    pub slices: Vec<DistributionSlice>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SelectionView {
    All,
    Subset { regions: Vec<Region> },
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub window: DateWindow,
    pub cursor: NaiveDate,
    pub selection: SelectionView,
    pub regions: Vec<Region>,
    pub loading: bool,
    /// Message of the latest failed re-fetch, if it has not been superseded
    /// by a successful one.
    pub error: Option<String>,
    pub trend: Vec<TrendPoint>,
    pub distribution: Distribution,
}

#[derive(Debug, Deserialize)]
pub struct DateRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RegionRequest {
    pub region: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(rename = "start-date")]
    pub start_date: NaiveDate,
    #[serde(rename = "end-date")]
    pub end_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        assert!(DateWindow::new(day(2024, 2, 1), day(2024, 1, 1)).is_none());
        assert!(DateWindow::new(day(2024, 1, 1), day(2024, 1, 1)).is_some());
    }

    #[test]
    fn window_clamps_outside_dates_to_end() {
        let window = DateWindow::new(day(2024, 1, 15), day(2024, 2, 1)).unwrap();
        assert_eq!(window.clamp(day(2024, 5, 1)), day(2024, 2, 1));
        assert_eq!(window.clamp(day(2023, 12, 1)), day(2024, 2, 1));
        assert_eq!(window.clamp(day(2024, 1, 20)), day(2024, 1, 20));
    }

    #[test]
    fn default_window_spans_hundred_days() {
        let window = DateWindow::ending_at(day(2024, 4, 10), 100);
        assert_eq!(window.end(), day(2024, 4, 10));
        assert_eq!(window.start(), day(2024, 1, 1));
    }

    #[test]
    fn oversized_day_count_saturates() {
        let window = DateWindow::ending_at(day(2024, 4, 10), u32::MAX);
        assert_eq!(window.start(), NaiveDate::MIN);
        assert_eq!(window.end(), day(2024, 4, 10));
    }

    #[test]
    fn record_drops_invalid_region_keys() {
        let record: HitRecord = serde_json::from_str(
            r#"{"date":"2024-01-15","total_hits":7,"by_states":{"NY":3,"<img src=x onerror=alert(1)>":4,"all":1}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = record.by_region.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["NY"]);
        assert_eq!(record.total_hits, 7);
    }

    #[test]
    fn record_reads_wire_field_name() {
        let record: HitRecord = serde_json::from_str(
            r#"{"date":"2024-01-15","total_hits":7,"by_states":{"NY":3,"CA":4}}"#,
        )
        .unwrap();
        assert_eq!(record.date, day(2024, 1, 15));
        assert_eq!(record.region_value("CA"), 4);
        assert_eq!(record.region_value("TX"), 0);
    }

    #[test]
    fn region_keys_are_validated() {
        assert_eq!(Region::parse(" NY ").unwrap().as_str(), "NY");
        assert_eq!(Region::parse(""), Err(RegionError::Empty));
        assert_eq!(Region::parse("ALL"), Err(RegionError::Reserved));
        assert_eq!(Region::parse("N/Y"), Err(RegionError::BadChar('/')));
    }

    #[test]
    fn trend_values_keep_insertion_order_in_json() {
        let mut values = TrendValues::default();
        values.push("TX", 1);
        values.push("CA", 2);
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"TX":1,"CA":2}"#);
    }
}
