use reporterstream::api::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BSKY_API_URL: &str = "https://public.api.bsky.app";
pub const USER_AGENT: &str = "BlueskyStreamEmbed/1.0";

/// `/api/stream` のクエリ。検証は reporterstream 側で行うので全部 Option のまま受ける
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    pub keywords: Option<String>,
    pub reporters: Option<String>,
    pub days: Option<String>,
}

pub type SharedState = AppState;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub bsky_api_url: String,
    pub page_limit: usize,
    pub upstream_timeout: Duration,
    pub request_deadline: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bsky_api_url: DEFAULT_BSKY_API_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            upstream_timeout: Duration::from_secs(10),
            request_deadline: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env_or("PORT", defaults.port),
            bsky_api_url: std::env::var("BSKY_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bsky_api_url),
            page_limit: env_or("STREAM_PAGE_LIMIT", defaults.page_limit).clamp(1, MAX_PAGE_LIMIT),
            upstream_timeout: Duration::from_secs(env_or(
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout.as_secs(),
            )),
            request_deadline: Duration::from_secs(env_or(
                "STREAM_DEADLINE_SECS",
                defaults.request_deadline.as_secs(),
            )),
        }
    }
}

fn env_or<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("Invalid {}={:?}, falling back to {}", key, raw, default);
            default
        }
    }
}
