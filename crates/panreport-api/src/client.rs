// Gateway HTTP client
//
// Wraps `reqwest::Client` with firewall-specific URL construction, key
// header injection, and dual-dialect body decoding. Endpoint knowledge lives
// in `panreport-core`; this module only knows how to issue one GET.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::payload::ReportPayload;
use crate::transport::TransportConfig;

/// Header carrying the API key. Keeps the credential out of access logs.
pub const API_KEY_HEADER: &str = "X-PAN-KEY";

/// Inclusive time window forwarded as `start-time` / `end-time`.
///
/// Both bounds are required by construction, so a one-sided range can
/// never reach the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Build a range only when both bounds are present and non-empty.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        match (start, end) {
            (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() => Some(Self::new(s, e)),
            _ => None,
        }
    }
}

/// Authenticated client for a single firewall management endpoint.
///
/// Cheap to construct; the `reqwest::Client` inside is reference-counted,
/// so callers build one per settings snapshot.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl GatewayClient {
    /// Create a client, building a fresh `reqwest::Client` from `transport`.
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        ensure_configured(base_url, &api_key)?;
        let http = transport.build_client()?;
        Self::with_client(http, base_url, api_key, transport.timeout)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// Fails with [`Error::Unconfigured`] before any I/O when the URL or
    /// key is empty.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, Error> {
        ensure_configured(base_url, &api_key)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            timeout,
        })
    }

    /// The configured base URL (without trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full request URL for an endpoint path.
    pub fn request_url(&self, path: &str, range: Option<&DateRange>) -> Result<Url, Error> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))?;
        if let Some(range) = range {
            url.query_pairs_mut()
                .append_pair("start-time", &range.start)
                .append_pair("end-time", &range.end);
        }
        Ok(url)
    }

    /// Issue a GET for `path` and decode the body.
    pub async fn fetch(
        &self,
        path: &str,
        range: Option<&DateRange>,
    ) -> Result<ReportPayload, Error> {
        let url = self.request_url(path, range)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Status {
                status: status.as_u16(),
                body: preview,
            });
        }

        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        trace!(bytes = body.len(), "response body received");

        ReportPayload::decode(&body)
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

fn ensure_configured(base_url: &str, api_key: &SecretString) -> Result<(), Error> {
    if base_url.trim().is_empty() || api_key.expose_secret().is_empty() {
        return Err(Error::Unconfigured);
    }
    Ok(())
}
