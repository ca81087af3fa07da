use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    config::WebDriverConfig,
    error::{Result, ScrapeError},
    session_cache::BrowserSession,
};

pub struct WebDriverSession {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl WebDriverSession {
    pub async fn start(config: &WebDriverConfig) -> Result<Self> {
        let client = reqwest::Client::new();
        let endpoint = config.url.trim_end_matches('/').to_string();
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": config.browser_args }
                }
            }
        });

        let response = client
            .post(format!("{}/session", endpoint))
            .json(&capabilities)
            .send()
            .await?;
        let value = unwrap_value(response.json::<Value>().await?)?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::WebDriver("No sessionId in new session response".to_string()))?
            .to_string();

        info!("Started WebDriver session {}", session_id);
        Ok(Self {
            client,
            endpoint,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn close(self) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/session/{}", self.endpoint, self.session_id))
            .send()
            .await?;
        unwrap_value(response.json::<Value>().await?)?;
        info!("Closed WebDriver session {}", self.session_id);
        Ok(())
    }

    async fn post(&self, command: &str, body: Value) -> Result<Value> {
        let url = format!("{}/session/{}/{}", self.endpoint, self.session_id, command);
        debug!("WebDriver POST {}", url);
        let response = self.client.post(url).json(&body).send().await?;
        unwrap_value(response.json::<Value>().await?)
    }
}

/// Extracts the `value` member of a WebDriver response, turning error payloads into errors.
fn unwrap_value(mut body: Value) -> Result<Value> {
    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
        return Err(ScrapeError::WebDriver(format!("{}: {}", error, message)));
    }
    Ok(value)
}

impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.post("url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.post("execute/sync", json!({ "script": script, "args": args }))
            .await
    }
}
