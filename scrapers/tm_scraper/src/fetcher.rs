use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::StatusCode;
use scraper::Html;
use std::{num::NonZeroU32, time::Duration};
use tracing::debug;

use crate::{
    config::ScraperConfig,
    error::{Result, ScrapeError},
};

/// Retrieves the HTML of a page.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String>;

    async fn fetch_document(&self, url: &str) -> Result<Html> {
        let html = self.fetch_html(url).await?;
        Ok(Html::parse_document(&html))
    }
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    redirect_default_page: String,
}

impl HttpPageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.scraping.user_agent)
            .timeout(Duration::from_secs(config.scraping.request_timeout_secs))
            .build()?;

        // 0 disables rate limiting
        let rate_limiter = NonZeroU32::new(config.rate_limits.requests_per_second)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            rate_limiter,
            redirect_default_page: config.scraping.redirect_default_page(),
        })
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.until_ready().await;
        }

        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();

        if status != StatusCode::OK {
            return Err(ScrapeError::RetrievalFailed {
                url: url.to_string(),
                status: status.as_u16(),
                final_url,
            });
        }
        if final_url == self.redirect_default_page {
            return Err(ScrapeError::RedirectedToDisabledEntity {
                url: url.to_string(),
                final_url,
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fetcher_for(server: &mockito::ServerGuard) -> HttpPageFetcher {
        let mut config = ScraperConfig::default();
        config.scraping.base_url = server.url();
        config.rate_limits.requests_per_second = 0;
        HttpPageFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_html_returns_body_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/serie-b/startseite/wettbewerb/IT2")
            .with_status(200)
            .with_body("<html><h1>Serie B</h1></html>")
            .create_async()
            .await;

        let fetcher = fetcher_for(&server).await;
        let url = format!("{}/serie-b/startseite/wettbewerb/IT2", server.url());
        let document = fetcher.fetch_document(&url).await.unwrap();

        mock.assert_async().await;
        let h1 = crate::document::first_text(&document, "h1").unwrap();
        assert_eq!(h1.as_deref(), Some("Serie B"));
    }

    #[tokio::test]
    async fn test_fetch_html_fails_on_non_200() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server).await;
        let url = format!("{}/missing", server.url());
        match fetcher.fetch_html(&url).await {
            Err(ScrapeError::RetrievalFailed { status, final_url, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(final_url, url);
            }
            other => panic!("expected RetrievalFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_html_detects_disabled_entity_redirect() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/some-player/profil/spieler/1")
            .with_status(302)
            .with_header("location", "/spieler-statistik/wertvollstespieler/marktwertetop")
            .create_async()
            .await;
        server
            .mock("GET", "/spieler-statistik/wertvollstespieler/marktwertetop")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let fetcher = fetcher_for(&server).await;
        let url = format!("{}/some-player/profil/spieler/1", server.url());
        assert!(matches!(
            fetcher.fetch_html(&url).await,
            Err(ScrapeError::RedirectedToDisabledEntity { .. })
        ));
    }
}
