//! Browser automation over the W3C WebDriver HTTP protocol.
//!
//! Used for the last ChEMBL → DrugBank fallback: DrugBank's search UI is
//! driven like a user would, and the DrugBank id is read from the URL of the
//! page the search lands on.
//!
//! Requires a running driver (e.g. `chromedriver --port=9515`).
//!
//! Flow:
//!   1. open the DrugBank home page
//!   2. type the drug name into `input#query` and press Enter
//!   3. if the URL now ends in a DrugBank id, done
//!   4. otherwise we are on a listing page: click the first result and wait
//!      (bounded) for the URL to change, then read the id again
//!
//! Step 4 accepts the first listed result without matching trade names or
//! synonyms, so listing landings are reported as ambiguous.

use std::time::Duration;

use async_trait::async_trait;
use chemxref_common::entities::{normalise_id, IdentifierKind};
use chemxref_common::sandbox::SandboxClient as Client;
use chemxref_common::{Result, XrefError};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::drugbank::DRUGBANK_URL;
use crate::{BrowseSession, BrowserLauncher, Landing};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);

const SEARCH_INPUT: &str = "input#query";
const FIRST_RESULT: &str = "div.unearth-drug-search-results h2";
/// WebDriver key code for Enter.
const ENTER_KEY: char = '\u{E007}';
/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Settings shared by every session a launcher opens.
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    pub webdriver_url: String,
    pub home_url: String,
    pub headless: bool,
    pub navigation_timeout: Duration,
}

impl Default for WebDriverOptions {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            home_url: DRUGBANK_URL.to_string(),
            headless: true,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }
}

pub struct WebDriverLauncher {
    client: Client,
    options: WebDriverOptions,
}

impl WebDriverLauncher {
    pub fn new(mut client: Client, options: WebDriverOptions) -> Self {
        client.allow_url_host(&options.webdriver_url);
        Self { client, options }
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--no-sandbox"];
        if self.options.headless {
            args.push("--headless");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    #[instrument(skip(self))]
    async fn launch(&self) -> Result<Box<dyn BrowseSession>> {
        let url = format!("{}/session", self.options.webdriver_url.trim_end_matches('/'));
        let body = send(self.client.post(&url)?.json(&self.capabilities())).await?;

        let session_id = body["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| XrefError::Session("WebDriver did not return a sessionId".into()))?
            .to_string();

        info!(session_id = %session_id, "Browser session started");
        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.options.webdriver_url.trim_end_matches('/'), session_id),
            home_url: self.options.home_url.clone(),
            navigation_timeout: self.options.navigation_timeout,
            closed: false,
        }))
    }
}

/// One live browser session.
pub struct WebDriverSession {
    client: Client,
    base: String,
    home_url: String,
    navigation_timeout: Duration,
    closed: bool,
}

impl WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let endpoint = format!("{}/url", self.base);
        send(self.client.post(&endpoint)?.json(&json!({ "url": url }))).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let endpoint = format!("{}/url", self.base);
        let body = send(self.client.get(&endpoint)?).await?;
        body["value"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| XrefError::Session("WebDriver returned no current URL".into()))
    }

    async fn find_element(&self, css: &str) -> Result<String> {
        let endpoint = format!("{}/element", self.base);
        let body = send(
            self.client
                .post(&endpoint)?
                .json(&json!({ "using": "css selector", "value": css })),
        )
        .await?;
        body["value"][ELEMENT_KEY]
            .as_str()
            .map(String::from)
            .ok_or_else(|| XrefError::Session(format!("No element matches '{}'", css)))
    }

    async fn send_keys(&self, element: &str, text: &str) -> Result<()> {
        let endpoint = format!("{}/element/{}/value", self.base, element);
        send(self.client.post(&endpoint)?.json(&json!({ "text": text }))).await?;
        Ok(())
    }

    async fn click(&self, element: &str) -> Result<()> {
        let endpoint = format!("{}/element/{}/click", self.base, element);
        send(self.client.post(&endpoint)?.json(&json!({}))).await?;
        Ok(())
    }

    /// Poll until the URL differs from `previous`, bounded by the navigation
    /// timeout.
    async fn wait_for_url_change(&self, previous: &str) -> Result<String> {
        let poll = async {
            loop {
                let current = self.current_url().await?;
                if current != previous {
                    return Ok::<_, XrefError>(current);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.navigation_timeout, poll)
            .await
            .map_err(|_| {
                XrefError::Session(format!(
                    "Navigation did not complete within {:?}",
                    self.navigation_timeout
                ))
            })?
    }
}

#[async_trait]
impl BrowseSession for WebDriverSession {
    #[instrument(skip(self))]
    async fn search_and_land(&mut self, name: &str) -> Result<Option<Landing>> {
        self.navigate(&self.home_url).await?;
        let home = self.current_url().await?;

        let input = self.find_element(SEARCH_INPUT).await?;
        self.send_keys(&input, &format!("{}{}", name, ENTER_KEY)).await?;
        let landed = self.wait_for_url_change(&home).await?;

        if let Some(id) = drugbank_id_from_url(&landed) {
            debug!(drugbank_id = %id, "Search landed on a detail page");
            return Ok(Some(Landing { drugbank_id: id, via_listing: false }));
        }

        // Listing page: take the first result.
        // TODO: match alternative and trade names before accepting the first result.
        let first = match self.find_element(FIRST_RESULT).await {
            Ok(el) => el,
            Err(e) => {
                debug!(error = %e, name, "Search listing has no results");
                return Ok(None);
            }
        };
        self.click(&first).await?;
        let detail = self.wait_for_url_change(&landed).await?;

        Ok(drugbank_id_from_url(&detail).map(|id| {
            debug!(drugbank_id = %id, "Accepted first listing result");
            Landing { drugbank_id: id, via_listing: true }
        }))
    }

    async fn quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        send(self.client.delete(&self.base)?).await?;
        info!("Browser session terminated");
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!(session = %self.base, "Browser session dropped without quit()");
        }
    }
}

/// Send a WebDriver command; non-2xx answers become session errors carrying
/// the driver's message.
async fn send(request: reqwest::RequestBuilder) -> Result<Value> {
    let resp = request.send().await?;
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        let message = body["value"]["message"]
            .as_str()
            .or_else(|| body["value"]["error"].as_str())
            .unwrap_or("unknown WebDriver error");
        return Err(XrefError::Session(format!("{}: {}", status, message)));
    }
    Ok(body)
}

/// The DrugBank id in the last path segment of `url`, if there is one.
pub fn drugbank_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    match IdentifierKind::detect(last) {
        Some(IdentifierKind::DrugBank) => Some(normalise_id(last)),
        _ => None,
    }
}
