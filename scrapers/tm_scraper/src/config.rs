use serde::{Deserialize, Serialize};
use std::env;

pub const TRANSFERMARKT_BASE_URL: &str = "https://www.transfermarkt.com";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimits {
    pub requests_per_second: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl ScrapingConfig {
    /// Landing page the site redirects to when the requested entity is disabled.
    pub fn redirect_default_page(&self) -> String {
        format!(
            "{}/spieler-statistik/wertvollstespieler/marktwertetop",
            self.base_url
        )
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: TRANSFERMARKT_BASE_URL.to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/64.0.3282.167 Safari/537.36"
                .to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Polling policy for `window.sessionStorage`, which the page fills after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCacheConfig {
    pub max_attempts: u32,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for SessionCacheConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_wait_ms: 4_000,
            max_wait_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebDriverConfig {
    pub url: String,
    pub browser_args: Vec<String>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".to_string(),
            browser_args: vec![
                "--headless=new".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    pub scraping: ScrapingConfig,
    pub rate_limits: RateLimits,
    pub session_cache: SessionCacheConfig,
    pub webdriver: WebDriverConfig,
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = env::var("TRANSFERMARKT_BASE_URL") {
            config.scraping.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(user_agent) = env::var("SCRAPER_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Ok(Some(timeout)) = env::var("SCRAPER_TIMEOUT_SECS").map_or(Ok(None), |t| t.parse::<u64>().map(Some)) {
            config.scraping.request_timeout_secs = timeout;
        }
        if let Ok(Some(rps)) = env::var("RATE_LIMIT_RPS").map_or(Ok(None), |r| r.parse::<u32>().map(Some)) {
            config.rate_limits.requests_per_second = rps;
        }
        if let Ok(Some(attempts)) = env::var("SESSION_CACHE_MAX_ATTEMPTS").map_or(Ok(None), |a| a.parse::<u32>().map(Some)) {
            config.session_cache.max_attempts = attempts;
        }
        if let Ok(Some(wait)) = env::var("SESSION_CACHE_MIN_WAIT_MS").map_or(Ok(None), |w| w.parse::<u64>().map(Some)) {
            config.session_cache.min_wait_ms = wait;
        }
        if let Ok(Some(wait)) = env::var("SESSION_CACHE_MAX_WAIT_MS").map_or(Ok(None), |w| w.parse::<u64>().map(Some)) {
            config.session_cache.max_wait_ms = wait;
        }
        if let Ok(url) = env::var("WEBDRIVER_URL") {
            config.webdriver.url = url.trim_end_matches('/').to_string();
        }

        config
    }
}
