//! Scripted in-memory transport for executor tests.

use crate::error::{HttpError, Result};
use crate::headers::Headers;
use crate::transport::{OutgoingRequest, Transport, TransportResponse};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Default)]
pub(crate) struct MockResponse {
    status: u16,
    status_message: String,
    headers: Headers,
    chunks: Vec<Bytes>,
    head_delay: Option<Duration>,
    stall_after_chunks: Option<Duration>,
}

impl MockResponse {
    pub(crate) fn new(status: u16) -> Self {
        Self {
            status,
            status_message: reason(status).to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn ok(body: &str) -> Self {
        Self::new(200).body(body)
    }

    pub(crate) fn redirect(location: &str) -> Self {
        Self::new(302).header("location", location)
    }

    pub(crate) fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    pub(crate) fn body(mut self, body: &str) -> Self {
        self.chunks.push(Bytes::copy_from_slice(body.as_bytes()));
        self
    }

    pub(crate) fn chunks(mut self, chunks: &[&str]) -> Self {
        self.chunks
            .extend(chunks.iter().map(|c| Bytes::copy_from_slice(c.as_bytes())));
        self
    }

    /// Delay before the response head is delivered.
    pub(crate) fn head_delay(mut self, delay: Duration) -> Self {
        self.head_delay = Some(delay);
        self
    }

    /// Delay after the scripted chunks, before the body ends.
    pub(crate) fn stall_after_chunks(mut self, delay: Duration) -> Self {
        self.stall_after_chunks = Some(delay);
        self
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        307 => "Temporary Redirect",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}

/// Routes keyed by absolute URL. A route scripted once answers every
/// request to it with the same response.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<String, MockResponse>>,
    sent: Mutex<Vec<OutgoingRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, url: &str, response: MockResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    pub(crate) fn sent(&self) -> Vec<OutgoingRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Box<dyn TransportResponse>> {
        let url = request.options.to_url()?.to_string();
        self.sent.lock().unwrap().push(request);

        let scripted = self.routes.lock().unwrap().get(&url).cloned();
        let scripted = scripted.ok_or_else(|| {
            HttpError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("no route for {url}"),
            ))
        })?;

        if let Some(delay) = scripted.head_delay {
            tokio::time::sleep(delay).await;
        }

        Ok(Box::new(ScriptedBody {
            chunks: scripted.chunks.iter().cloned().collect(),
            stall: scripted.stall_after_chunks,
            response: scripted,
        }))
    }
}

struct ScriptedBody {
    response: MockResponse,
    chunks: VecDeque<Bytes>,
    stall: Option<Duration>,
}

#[async_trait]
impl TransportResponse for ScriptedBody {
    fn status(&self) -> u16 {
        self.response.status
    }

    fn status_message(&self) -> &str {
        &self.response.status_message
    }

    fn headers(&self) -> &Headers {
        &self.response.headers
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        if let Some(delay) = self.stall.take() {
            tokio::time::sleep(delay).await;
        }
        Ok(None)
    }
}
