use crate::config::{EjpConfig, Zone};
use crate::ejp::types::{EjpResponse, EjpSignals};
use crate::ejp::window;
use crate::error::{EjpError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::Duration;

/// Upper bound for the whole status request
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const ALERT_TYPE_PARAM: &str = "TypeAlerte";
const ALERT_TYPE_EJP: &str = "EJP";
const CACHE_BUST_PARAM: &str = "_";

/// Client for the EJP status API
pub struct EjpClient {
    base_url: String,
    date_param: String,
    user_agent: String,
    zone: Zone,
    http: reqwest::Client,
    logger: StructuredLogger,
}

impl EjpClient {
    /// Create a client for the configured endpoint and zone
    pub fn new(config: &EjpConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let logger = get_logger_with_context(
            LogContext::new("ejp").with_field("zone", config.zone.to_string()),
        );
        Ok(Self {
            base_url: config.url.clone(),
            date_param: config.date_param.clone(),
            user_agent: config.user_agent.clone(),
            zone: config.zone,
            http,
            logger,
        })
    }

    /// Request URL for the UTC date of `now`
    ///
    /// Existing query parameters of the base URL are kept unless they collide
    /// with the date, alert type or cache-busting keys, which are replaced.
    pub fn build_url(&self, now: DateTime<Utc>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| EjpError::network(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(EjpError::network(format!(
                "Base URL cannot carry a query: {}",
                self.base_url
            )));
        }

        let replaced = [
            self.date_param.as_str(),
            ALERT_TYPE_PARAM,
            CACHE_BUST_PARAM,
        ];
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !replaced.iter().any(|r| *r == k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(&self.date_param, &now.format("%Y-%m-%d").to_string())
            .append_pair(ALERT_TYPE_PARAM, ALERT_TYPE_EJP)
            .append_pair(CACHE_BUST_PARAM, &now.timestamp().to_string());

        Ok(url)
    }

    /// Fetch and decode the status document for the UTC date of `now`
    pub async fn fetch(&self, now: DateTime<Utc>) -> Result<EjpResponse> {
        let url = self.build_url(now)?;
        self.logger.debug(&format!("GET {}", url));

        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let msg = format!("EJP API error: {}", status);
            self.logger.error(&msg);
            return Err(EjpError::network(msg));
        }

        let body = resp.text().await?;
        self.logger.trace(&format!("EJP API body: {}", body));

        let parsed: EjpResponse = serde_json::from_str(&body)
            .map_err(|e| EjpError::response_decode(format!("Unexpected EJP API body: {}", e)))?;
        Ok(parsed)
    }

    /// Fetch the status and apply the time-window rule at `now`
    pub async fn get_status_at(&self, now: DateTime<Utc>) -> Result<EjpSignals> {
        let response = self.fetch(now).await?;
        let signals = window::decide(&response, self.zone, now);
        self.logger.info(&format!(
            "EJP status at {}: today={} tomorrow={} -> {}",
            now.format("%Y-%m-%dT%H:%M:%SZ"),
            response
                .today
                .get(&self.zone)
                .map_or("missing", |s| s.as_str()),
            response
                .tomorrow
                .get(&self.zone)
                .map_or("missing", |s| s.as_str()),
            signals
        ));
        Ok(signals)
    }

    /// Fetch the status for the current instant
    pub async fn get_status(&self) -> Result<EjpSignals> {
        self.get_status_at(Utc::now()).await
    }
}
