// panreport-api: Async Rust client for firewall management APIs (REST + legacy XML)

pub mod client;
pub mod error;
pub mod payload;
pub mod transport;

pub use client::{API_KEY_HEADER, DateRange, GatewayClient};
pub use error::Error;
pub use payload::{PayloadShape, ReportPayload};
pub use transport::{REQUEST_TIMEOUT, TlsMode, TransportConfig};
