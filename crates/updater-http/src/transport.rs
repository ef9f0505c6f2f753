use crate::error::Result;
use crate::headers::Headers;
use crate::request::RequestOptions;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{redirect, Client};

/// One request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub options: RequestOptions,
    pub body: Option<Bytes>,
}

impl OutgoingRequest {
    /// Request without a body.
    pub fn new(options: RequestOptions) -> Self {
        Self {
            options,
            body: None,
        }
    }
}

/// Abstraction over issuing a single HTTP request.
///
/// Implementations must not follow redirects or retry on their own. Dropping
/// the future returned by [`Transport::send`], or the response it yields,
/// aborts the underlying connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and resolve once the response head is available.
    async fn send(&self, request: OutgoingRequest) -> Result<Box<dyn TransportResponse>>;
}

/// Live response of one attempt.
#[async_trait]
pub trait TransportResponse: Send {
    fn status(&self) -> u16;

    fn status_message(&self) -> &str;

    fn headers(&self) -> &Headers;

    /// Next chunk of the body, `None` once the body is complete.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Builder for [`ReqwestTransport`].
#[derive(Default)]
pub struct ReqwestTransportBuilder {
    client: Option<Client>,
}

impl ReqwestTransportBuilder {
    /// Provide a custom reqwest client instance. It must be built with
    /// `redirect::Policy::none()` so redirects reach the executors.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder().redirect(redirect::Policy::none()).build()?,
        };

        Ok(ReqwestTransport { client })
    }
}

/// [`Transport`] backed by a reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Box<dyn TransportResponse>> {
        let OutgoingRequest { options, body } = request;
        let url = options.to_url()?;

        let mut builder = self.client.request(options.method.clone(), url);
        for (name, value) in options.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        Ok(Box::new(ReqwestResponse::new(response)))
    }
}

struct ReqwestResponse {
    status: u16,
    status_message: String,
    headers: Headers,
    inner: reqwest::Response,
}

impl ReqwestResponse {
    fn new(inner: reqwest::Response) -> Self {
        let status = inner.status();
        let mut headers = Headers::new();
        for (name, value) in inner.headers() {
            // servers put raw UTF-8 file names into `location`
            headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }

        Self {
            status: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            inner,
        }
    }
}

#[async_trait]
impl TransportResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn status_message(&self) -> &str {
        &self.status_message
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.inner.chunk().await?)
    }
}
