//! Reads the lists Transfermarkt keeps in `window.sessionStorage`.
//!
//! The page's own script fills the storage after load, so a freshly navigated
//! page may report zero keys for a few seconds. The reader polls with an
//! exponential backoff before giving up.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    config::SessionCacheConfig,
    error::{Result, ScrapeError},
    types::{CacheRecord, Country},
};

pub const COUNTRIES_TOPIC: &str = "countries";
pub const COMPETITIONS_TOPIC: &str = "competitions";

const LENGTH_SCRIPT: &str = "return window.sessionStorage.length;";
const KEY_SCRIPT: &str = "return window.sessionStorage.key(arguments[0]);";
const GET_ITEM_SCRIPT: &str = "return window.sessionStorage.getItem(arguments[0]);";

const BACKOFF_MULTIPLIER_MS: u64 = 1_000;

/// A browser tab able to load pages and run scripts in them.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()>;
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;
}

pub struct SessionCacheReader<'a, B: BrowserSession> {
    browser: &'a B,
    config: SessionCacheConfig,
}

impl<'a, B: BrowserSession> SessionCacheReader<'a, B> {
    pub fn new(browser: &'a B, config: SessionCacheConfig) -> Self {
        Self { browser, config }
    }

    /// Navigates to `url` and waits until its session storage has keys.
    pub async fn key_count(&self, url: &str) -> Result<u64> {
        self.browser.navigate(url).await?;

        let mut attempt = 1;
        loop {
            let count = self
                .browser
                .execute_script(LENGTH_SCRIPT, Vec::new())
                .await?
                .as_u64()
                .unwrap_or(0);
            if count > 0 {
                return Ok(count);
            }
            if attempt >= self.config.max_attempts {
                return Err(ScrapeError::EmptySessionCache(url.to_string()));
            }

            let delay = self.backoff_delay(attempt);
            info!(
                "Session storage empty for {} (attempt {}), retrying in {:?}",
                url, attempt, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = BACKOFF_MULTIPLIER_MS.saturating_mul(1u64 << (attempt - 1).min(32));
        let ms = exp.max(self.config.min_wait_ms).min(self.config.max_wait_ms);
        Duration::from_millis(ms)
    }

    /// Records stored under the first key containing `topic`, in key index order.
    pub async fn read_by_topic(&self, url: &str, topic: &str) -> Result<Vec<CacheRecord>> {
        let num_keys = self.key_count(url).await?;

        for i in 0..num_keys {
            let key = self
                .browser
                .execute_script(KEY_SCRIPT, vec![json!(i)])
                .await?;
            let Some(key) = key.as_str() else {
                continue;
            };
            if key.contains(topic) {
                let raw = self
                    .browser
                    .execute_script(GET_ITEM_SCRIPT, vec![json!(key)])
                    .await?;
                return Ok(parse_records(raw.as_str().unwrap_or_default()));
            }
        }

        Err(ScrapeError::NoMatchingCacheKey {
            url: url.to_string(),
            topic: topic.to_string(),
        })
    }

    pub async fn countries(&self, url: &str) -> Result<Vec<Country>> {
        let records = self.read_by_topic(url, COUNTRIES_TOPIC).await?;
        Ok(records
            .into_iter()
            .filter_map(CacheRecord::into_country)
            .collect())
    }

    pub async fn competition_links(&self, url: &str) -> Result<Vec<CacheRecord>> {
        self.read_by_topic(url, COMPETITIONS_TOPIC).await
    }
}

/// Parses a cached JSON list. Anything unparseable becomes a single empty record.
pub fn parse_records(raw: &str) -> Vec<CacheRecord> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items.iter().map(record_from_value).collect(),
        Ok(value @ Value::Object(_)) => vec![record_from_value(&value)],
        Ok(_) | Err(_) => {
            warn!("Session storage value is not a JSON list, using an empty record");
            vec![CacheRecord::default()]
        }
    }
}

fn record_from_value(value: &Value) -> CacheRecord {
    let id = match value.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let string_field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

    CacheRecord {
        id,
        name: string_field("name"),
        link: string_field("link"),
    }
}
