//! Redirect-aware HTTP executors for the application updater.
//!
//! Two operations sit on top of one [`Transport`] seam:
//!
//! - [`HttpExecutor::download`] streams a release artefact to disk. It
//!   follows `location` redirects up to a small bound, aborts an attempt
//!   after 60 seconds without socket activity, and only places the file at
//!   its destination once the body has been fully written and verified.
//! - [`HttpExecutor::request`] talks to the release-hosting API over https,
//!   injecting the token, following up to 10 redirects, and interpreting the
//!   body as JSON, YAML (for `.yml` paths) or text.
//!
//! Nothing is retried internally; every failure surfaces as an
//! [`HttpError`] and retry policy belongs to the caller.
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use updater_http::{DownloadOptions, HttpExecutor, RequestOptions};
//!
//! # async fn demo() -> updater_http::Result<()> {
//! let executor = HttpExecutor::with_reqwest()?;
//!
//! let latest: Option<serde_json::Value> = executor
//!     .request(
//!         RequestOptions::new("api.github.com", "/repos/owner/app/releases/latest"),
//!         Some("ghp_token"),
//!         &CancellationToken::new(),
//!         |_| Ok(()),
//!     )
//!     .await?;
//!
//! let path = executor
//!     .download(
//!         "https://github.com/owner/app/releases/download/v1.2.3/app.zip",
//!         "/tmp/app.zip",
//!         &DownloadOptions::default(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod checksum;
mod config;
mod download;
mod error;
mod executor;
mod guard;
mod headers;
mod request;
mod transport;

#[cfg(test)]
mod testing;

pub use api::{ParsedBody, RequestBody};
pub use config::{
    ExecutorConfig, DEFAULT_API_MAX_REDIRECTS, DEFAULT_DOWNLOAD_MAX_REDIRECTS,
    DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_USER_AGENT,
};
pub use download::{CompletionHook, DownloadOptions, Progress, ProgressCallback};
pub use error::{ErrorEnvelope, HttpError, Result};
pub use executor::HttpExecutor;
pub use headers::Headers;
pub use request::{basic_token, RequestOptions, SafeDescription};
pub use transport::{
    OutgoingRequest, ReqwestTransport, ReqwestTransportBuilder, Transport, TransportResponse,
};
pub use tokio_util::sync::CancellationToken;
