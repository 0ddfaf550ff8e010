use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use crate::error::{HeadsearchError, Result};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/search/header/";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_RESULTS_PATH: &str = "/search/";

/// Process-wide configuration read from the environment (and `.env`).
/// Falls back to the defaults when a variable holds garbage, after logging it.
pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env().unwrap_or_else(|e| {
        log::error!("{e}, falling back to defaults");
        Config::default()
    })
});

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON search endpoint, queried as `<endpoint>?q=<query>`.
    pub endpoint: String,
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub request_timeout_ms: u64,
    /// Full-page results view used on explicit submit.
    pub results_path: String,
    /// Chips offered by the "no results" empty state.
    pub example_queries: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            results_path: DEFAULT_RESULTS_PATH.to_string(),
            example_queries: ["авто", "москва", "2023", "черный"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();
        Ok(Config {
            endpoint: get_env_or_default("HEADSEARCH_ENDPOINT", DEFAULT_ENDPOINT),
            debounce_ms: parse_env("HEADSEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?,
            min_query_len: parse_env("HEADSEARCH_MIN_QUERY_LEN", DEFAULT_MIN_QUERY_LEN)?,
            request_timeout_ms: parse_env("HEADSEARCH_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
            results_path: get_env_or_default("HEADSEARCH_RESULTS_PATH", DEFAULT_RESULTS_PATH),
            example_queries: defaults.example_queries,
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| HeadsearchError::InvalidConfig { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[test]
fn test_defaults_match_live_search_constants() {
    let config = Config::default();
    assert_eq!(config.debounce(), Duration::from_millis(300));
    assert_eq!(config.request_timeout(), Duration::from_millis(5000));
    assert_eq!(config.min_query_len, 2);
    assert_eq!(config.results_path, "/search/");
}

#[test]
fn test_parse_env_rejects_garbage() {
    // SAFETY: the variable name is unique to this test.
    unsafe { env::set_var("HEADSEARCH_TEST_PARSE_GARBAGE", "three hundred") };
    let res: Result<u64> = parse_env("HEADSEARCH_TEST_PARSE_GARBAGE", 1);
    assert!(matches!(
        res,
        Err(HeadsearchError::InvalidConfig { key: "HEADSEARCH_TEST_PARSE_GARBAGE", .. })
    ));
    unsafe { env::remove_var("HEADSEARCH_TEST_PARSE_GARBAGE") };

    let res: Result<u64> = parse_env("HEADSEARCH_TEST_PARSE_MISSING", 7);
    assert_eq!(res.unwrap(), 7);
}
