use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::guard::IdleGuard;
use crate::request::RequestOptions;
use crate::transport::{OutgoingRequest, ReqwestTransport, Transport, TransportResponse};
use tokio_util::sync::CancellationToken;

/// Executes downloads and release API requests over a [`Transport`].
///
/// The executor holds no per-call state, so one instance can serve any
/// number of concurrent calls.
pub struct HttpExecutor<T> {
    transport: T,
    config: ExecutorConfig,
}

impl HttpExecutor<ReqwestTransport> {
    /// Executor over a default reqwest transport.
    pub fn with_reqwest() -> Result<Self> {
        Ok(Self::new(ReqwestTransport::builder().build()?))
    }
}

impl<T> HttpExecutor<T>
where
    T: Transport,
{
    /// Create an executor with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ExecutorConfig::default())
    }

    pub fn with_config(transport: T, config: ExecutorConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue one attempt and wait for its response head under a fresh guard.
    /// The guard is returned so the caller keeps reading the body under the
    /// same window.
    pub(crate) async fn attempt(
        &self,
        request: OutgoingRequest,
        cancel: &CancellationToken,
    ) -> Result<(Box<dyn TransportResponse>, IdleGuard)> {
        let url = request.options.to_url()?.to_string();
        tracing::debug!(request = %request.options.safe_describe(), "sending request");

        let guard = IdleGuard::new(url, self.config.idle_timeout(), cancel.clone());
        let response = guard.run(self.transport.send(request)).await?;
        tracing::debug!(
            url = guard.url(),
            status = response.status(),
            "received response head"
        );
        Ok((response, guard))
    }

    /// Apply the configured user agent unless the caller set one.
    pub(crate) fn with_user_agent(&self, options: RequestOptions) -> RequestOptions {
        if options.headers.contains("user-agent") {
            options
        } else {
            options.with_header("user-agent", self.config.user_agent.clone())
        }
    }
}
