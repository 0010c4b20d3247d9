// src/session/webdriver.rs
use std::time::Duration;

use reqwest::Method;
use serde_json::{json, Value};

use crate::session::PageSession;
use crate::utils::error::SessionError;

/// Key under which the W3C protocol nests element ids in its payloads.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal W3C WebDriver client, speaking JSON over HTTP to a running
/// driver (geckodriver, chromedriver, or a Selenium server).
///
/// Only the handful of commands the scraper needs are implemented: open and
/// delete a session, navigate, read the page source, find an element by CSS
/// selector, click it, and scroll it into view.
pub struct WebDriverSession {
    http: reqwest::Client,
    base: String,
    session_id: String,
}

impl WebDriverSession {
    /// Opens a new browser session against the driver at `server_url`.
    ///
    /// Capabilities are offered in order of preference: headless Firefox,
    /// headless Chrome, then whatever the driver gives us, so the same
    /// binary works with whichever driver is listening.
    pub async fn connect(server_url: &str) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let base = server_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "firstMatch": [
                    { "browserName": "firefox", "moz:firefoxOptions": { "args": ["-headless"] } },
                    { "browserName": "chrome", "goog:chromeOptions": { "args": ["--headless=new"] } },
                    {}
                ]
            }
        });

        let url = format!("{base}/session");
        let value = command(&http, Method::POST, &url, Some(capabilities)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SessionError::Protocol("new-session response carried no sessionId".to_string())
            })?
            .to_string();

        tracing::debug!("Opened WebDriver session {} at {}", session_id, base);
        Ok(Self {
            http,
            base,
            session_id,
        })
    }

    fn endpoint(&self, tail: &str) -> String {
        format!("{}/session/{}/{}", self.base, self.session_id, tail)
    }

    /// Resolves a control id to a driver element id.
    ///
    /// A driver-side `no such element` is translated into
    /// `ControlNotFound` naming the control, which reads a lot better than
    /// the raw driver message.
    async fn locate_control(&self, control_id: &str) -> Result<String, SessionError> {
        let selector = format!("#{control_id}");
        let body = json!({ "using": "css selector", "value": selector });
        let result = command(&self.http, Method::POST, &self.endpoint("element"), Some(body)).await;
        match result {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    SessionError::Protocol(format!(
                        "element response for '{selector}' carried no element id"
                    ))
                }),
            Err(SessionError::Driver { error, .. }) if error == "no such element" => {
                Err(SessionError::ControlNotFound(control_id.to_string()))
            }
            Err(err) => Err(err),
        }
    }
}

impl PageSession for WebDriverSession {
    async fn load(&mut self, url: &str) -> Result<(), SessionError> {
        tracing::debug!("Navigating to {}", url);
        let body = json!({ "url": url });
        command(&self.http, Method::POST, &self.endpoint("url"), Some(body)).await?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        let value = command(&self.http, Method::GET, &self.endpoint("source"), None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SessionError::Protocol("page source was not a string".to_string()))
    }

    async fn activate(&mut self, control_id: &str) -> Result<(), SessionError> {
        let element = self.locate_control(control_id).await?;
        let path = format!("element/{element}/click");
        // W3C requires a JSON body even for click, hence the empty object.
        command(&self.http, Method::POST, &self.endpoint(&path), Some(json!({}))).await?;
        Ok(())
    }

    async fn scroll_into_view(&mut self, control_id: &str) -> Result<(), SessionError> {
        let element = self.locate_control(control_id).await?;
        let body = json!({
            "script": "arguments[0].scrollIntoView({block: 'center'});",
            "args": [ { ELEMENT_KEY: element } ],
        });
        command(&self.http, Method::POST, &self.endpoint("execute/sync"), Some(body)).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        tracing::debug!("Closing WebDriver session {}", self.session_id);
        let url = format!("{}/session/{}", self.base, self.session_id);
        command(&self.http, Method::DELETE, &url, None).await?;
        Ok(())
    }
}

/// Sends one WebDriver command and unwraps the `value` envelope.
///
/// Drivers report failures as JSON bodies carrying `value.error` and
/// `value.message` alongside a non-2xx status; both fields are surfaced in
/// the returned error.
async fn command(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, SessionError> {
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();

    let mut payload: Value = match response.json().await {
        Ok(payload) => payload,
        Err(_) if !status.is_success() => return Err(SessionError::Http(status)),
        Err(err) => return Err(SessionError::Network(err)),
    };
    let value = payload.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(SessionError::Driver { error, message });
    }

    Ok(value)
}
