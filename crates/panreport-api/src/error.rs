use thiserror::Error;

/// Top-level error type for the `panreport-api` crate.
///
/// Covers every failure mode of a single gateway call: missing
/// configuration, transport, HTTP status, and body decoding.
/// `panreport-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Base URL or API key missing -- no request was attempted.
    #[error("API URL and key must be configured first")]
    Unconfigured,

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The API answered with a non-2xx status.
    #[error("API returned error status: {status}")]
    Status { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Body was neither JSON nor a recognizable legacy XML document.
    #[error("Error parsing response: {message}")]
    Decode { message: String },
}
