use crate::cache::DEFAULT_TTL_SECS;
use crate::errors::ConfigError;
use crate::models::Region;
use chrono::Duration;
use std::{env, path::PathBuf};

pub const DEFAULT_REGIONS: [&str; 10] = ["NY", "WA", "FL", "CO", "VA", "OR", "CA", "IL", "MA", "TX"];

/// Upper bound for the start-up window, roughly a century.
pub const MAX_DEFAULT_DAYS: u32 = 36_500;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub source_url: Option<String>,
    pub cache_ttl: Duration,
    pub regions: Vec<Region>,
    pub default_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable lookup; unset and blank
    /// variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => parse(&value, "PORT", "a port number")?,
            None => 8080,
        };
        let data_path = get("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/hits.json"));
        let cache_ttl = match get("HITS_CACHE_TTL_SECS") {
            Some(value) => parse_ttl(&value)?,
            None => Duration::seconds(DEFAULT_TTL_SECS),
        };
        let default_days = match get("DASHBOARD_DEFAULT_DAYS") {
            Some(value) => parse(&value, "DASHBOARD_DEFAULT_DAYS", DAYS_EXPECTED)
                .and_then(|days: u32| {
                    if days <= MAX_DEFAULT_DAYS {
                        Ok(days)
                    } else {
                        Err(invalid("DASHBOARD_DEFAULT_DAYS", DAYS_EXPECTED, &value))
                    }
                })?,
            None => 100,
        };
        let regions = match get("DASHBOARD_REGIONS") {
            Some(value) => parse_regions(&value)?,
            None => DEFAULT_REGIONS
                .iter()
                .map(|key| Region::parse(key))
                .collect::<Result<_, _>>()
                .map_err(|source| ConfigError::Region {
                    name: "DASHBOARD_REGIONS",
                    source,
                })?,
        };

        Ok(Self {
            port,
            data_path,
            source_url: get("HITS_SOURCE_URL"),
            cache_ttl,
            regions,
            default_days,
        })
    }
}

const TTL_EXPECTED: &str = "a non-negative number of seconds";
const DAYS_EXPECTED: &str = "a number of days up to 36500";

fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    let secs: i64 = parse(value, "HITS_CACHE_TTL_SECS", TTL_EXPECTED)?;
    if secs < 0 {
        return Err(invalid("HITS_CACHE_TTL_SECS", TTL_EXPECTED, value));
    }
    Duration::try_seconds(secs).ok_or_else(|| invalid("HITS_CACHE_TTL_SECS", TTL_EXPECTED, value))
}

fn parse<T: std::str::FromStr>(
    value: &str,
    name: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(name, expected, value))
}

fn invalid(name: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    }
}

fn parse_regions(value: &str) -> Result<Vec<Region>, ConfigError> {
    let mut regions: Vec<Region> = Vec::new();
    for key in value.split(',').filter(|key| !key.trim().is_empty()) {
        let region = Region::parse(key).map_err(|source| ConfigError::Region {
            name: "DASHBOARD_REGIONS",
            source,
        })?;
        if !regions.contains(&region) {
            regions.push(region);
        }
    }
    Ok(regions)
}
