//! W3C WebDriver client
//!
//! Speaks the JSON-over-HTTP protocol served by `chromedriver`, `geckodriver`
//! and Selenium servers. Only the commands the form runner needs are covered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::browser::{Browser, ElementRef, Locator};
use crate::error::{ProbeError, ProbeResult};

/// Key under which W3C drivers return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Browser selection and launch options for a new session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub browser_name: String,
    pub headless: bool,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            browser_name: "chrome".to_string(),
            headless: false,
            args: Vec::new(),
        }
    }
}

impl Capabilities {
    /// `capabilities` body for `POST /session`
    pub fn to_w3c(&self) -> Value {
        let mut args = self.args.clone();
        let mut always_match = json!({ "browserName": self.browser_name });

        match self.browser_name.as_str() {
            "chrome" | "chromium" => {
                if self.headless {
                    args.push("--headless=new".to_string());
                }
                always_match["goog:chromeOptions"] = json!({ "args": args });
            }
            "firefox" => {
                if self.headless {
                    args.push("-headless".to_string());
                }
                always_match["moz:firefoxOptions"] = json!({ "args": args });
            }
            _ => {}
        }

        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

/// A live WebDriver session
pub struct WebDriverSession {
    client: Client,
    endpoint: String,
    session_id: String,
}

impl WebDriverSession {
    /// Open a session on the driver at `endpoint`
    pub async fn connect(endpoint: &str, capabilities: &Capabilities) -> ProbeResult<Self> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let url = format!("{}/session", endpoint);
        let value = send(&client, Method::POST, &url, Some(capabilities.to_w3c()))
            .await
            .map_err(|e| ProbeError::Session(format!("could not open session at {}: {}", endpoint, e)))?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ProbeError::Session("response carried no sessionId".to_string()))?
            .to_string();

        info!("WebDriver session {} opened", session_id);

        Ok(Self {
            client,
            endpoint,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> ProbeResult<Value> {
        let url = format!("{}/session/{}{}", self.endpoint, self.session_id, path);
        send(&self.client, method, &url, body).await
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        info!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map_err(|e| ProbeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> ProbeResult<ElementRef> {
        let (using, value) = locator.to_w3c();
        let found = self
            .command(Method::POST, "/element", Some(json!({ "using": using, "value": value })))
            .await
            .map_err(|e| match e {
                ProbeError::ElementNotFound(_) => ProbeError::ElementNotFound(locator.to_string()),
                other => other,
            })?;
        element_ref(&found)
    }

    async fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
        self.command(Method::POST, &format!("/element/{}/clear", element.0), Some(json!({})))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.0),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> ProbeResult<()> {
        self.command(Method::POST, &format!("/element/{}/click", element.0), Some(json!({})))
            .await?;
        Ok(())
    }

    async fn alert_text(&self) -> ProbeResult<String> {
        let value = self.command(Method::GET, "/alert/text", None).await?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| ProbeError::Protocol(format!("alert text was not a string: {}", value)))
    }

    async fn accept_alert(&self) -> ProbeResult<()> {
        self.command(Method::POST, "/alert/accept", Some(json!({}))).await?;
        Ok(())
    }

    /// Delete the session, closing the browser window
    async fn quit(&self) -> ProbeResult<()> {
        info!("Closing WebDriver session {}", self.session_id);
        self.command(Method::DELETE, "", None).await?;
        Ok(())
    }
}

/// Send one command and unwrap the `value` envelope
async fn send(client: &Client, method: Method, url: &str, body: Option<Value>) -> ProbeResult<Value> {
    debug!("WebDriver {} {}", method, url);

    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let body: Value = response.json().await?;
    unwrap_response(status, body)
}

/// Extract `value`, mapping W3C error payloads onto `ProbeError`
pub fn unwrap_response(status: StatusCode, body: Value) -> ProbeResult<Value> {
    let value = match body {
        Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
        other => {
            return Err(ProbeError::Protocol(format!(
                "unexpected response body: {}",
                other
            )))
        }
    };

    let error = value.get("error").and_then(Value::as_str);
    if status.is_success() && error.is_none() {
        return Ok(value);
    }

    let error = error.unwrap_or("unknown error").to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Err(match error.as_str() {
        "no such element" => ProbeError::ElementNotFound(message),
        "no such alert" => ProbeError::NoAlert,
        _ => {
            warn!("WebDriver returned {} ({}): {}", status, error, message);
            ProbeError::WebDriver { error, message }
        }
    })
}

/// Pull the element id out of a find-element result
pub fn element_ref(value: &Value) -> ProbeResult<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get("ELEMENT"))
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
        .ok_or_else(|| ProbeError::Protocol(format!("no element reference in {}", value)))
}
