use crate::{
    error::{ErrorEnvelope, HttpError, Result},
    executor::HttpExecutor,
    guard::IdleGuard,
    request::RequestOptions,
    transport::{OutgoingRequest, Transport, TransportResponse},
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;

/// Body of an API request, filled in by the caller's body writer.
#[derive(Debug, Default)]
pub struct RequestBody {
    bytes: Option<Bytes>,
    content_type: Option<String>,
}

impl RequestBody {
    /// Send `bytes` as the request body.
    pub fn write(&mut self, bytes: impl Into<Bytes>) {
        self.bytes = Some(bytes.into());
    }

    /// Send `value` encoded as JSON.
    pub fn json<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<()> {
        self.bytes = Some(Bytes::from(serde_json::to_vec(value)?));
        self.content_type = Some("application/json".to_string());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.as_ref().map_or(true, Bytes::is_empty)
    }
}

/// Interpreted response body of an API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// Empty body, or a 204 response.
    Empty,
    Text(String),
    Json(serde_json::Value),
    Yaml(serde_yaml::Value),
}

impl ParsedBody {
    /// Deserialize into `T`; `None` for an empty body.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<Option<T>> {
        Ok(match self {
            ParsedBody::Empty => None,
            ParsedBody::Text(text) => Some(serde_json::from_value(serde_json::Value::String(text))?),
            ParsedBody::Json(value) => Some(serde_json::from_value(value)?),
            ParsedBody::Yaml(value) => Some(serde_yaml::from_value(value)?),
        })
    }
}

impl<T> HttpExecutor<T>
where
    T: Transport,
{
    /// Perform an API call and deserialize its body. See [`HttpExecutor::request_raw`].
    pub async fn request<R, W>(
        &self,
        options: RequestOptions,
        token: Option<&str>,
        cancel: &CancellationToken,
        body_writer: W,
    ) -> Result<Option<R>>
    where
        R: DeserializeOwned,
        W: FnOnce(&mut RequestBody) -> Result<()>,
    {
        self.request_raw(options, token, cancel, body_writer)
            .await?
            .deserialize()
    }

    /// Perform an API call over https.
    ///
    /// `body_writer` fills the request body once; returning an error rejects
    /// the call before anything is sent. Redirect hops reissue the request
    /// without a body. 404 fails with [`HttpError::NotFound`] and 204
    /// resolves to [`ParsedBody::Empty`], both without reading the body.
    pub async fn request_raw<W>(
        &self,
        options: RequestOptions,
        token: Option<&str>,
        cancel: &CancellationToken,
        body_writer: W,
    ) -> Result<ParsedBody>
    where
        W: FnOnce(&mut RequestBody) -> Result<()>,
    {
        let mut options = self.with_user_agent(options.secure());
        if let Some(token) = token {
            options = options.with_token(token);
        }

        let mut body = RequestBody::default();
        body_writer(&mut body)?;
        if let Some(content_type) = body.content_type.take() {
            if !options.headers.contains("content-type") {
                options = options.with_header("content-type", content_type);
            }
        }

        let mut request = OutgoingRequest {
            options,
            body: body.bytes,
        };
        let limit = self.config().api_max_redirects;
        let mut hops = 0usize;

        loop {
            let (mut response, guard) = self.attempt(request.clone(), cancel).await?;

            match response.status() {
                404 => {
                    let options = &request.options;
                    return Err(HttpError::NotFound {
                        method: options.method.to_string(),
                        host: options.host.clone(),
                        path: options.path.clone(),
                    });
                }
                204 => return Ok(ParsedBody::Empty),
                _ => {}
            }

            if let Some(location) = response.headers().first("location").map(str::to_owned) {
                if hops >= limit {
                    return Err(HttpError::ApiRedirectLimit { limit });
                }
                hops += 1;
                tracing::debug!(from = guard.url(), to = %location, hops, "following redirect");
                // hops stay on https, the token travels with them
                request = OutgoingRequest::new(request.options.with_redirect(&location)?.secure());
                continue;
            }

            let text = read_text(&mut *response, &guard).await?;
            return parse_body(&request.options, &*response, text);
        }
    }
}

async fn read_text(response: &mut dyn TransportResponse, guard: &IdleGuard) -> Result<String> {
    let mut data = Vec::new();
    while let Some(chunk) = guard.run(response.next_chunk()).await? {
        data.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// JSON content types parse as JSON, `.yml` request paths as YAML, anything
/// else stays text. Failed statuses become an [`ErrorEnvelope`].
fn parse_body(
    options: &RequestOptions,
    response: &dyn TransportResponse,
    text: String,
) -> Result<ParsedBody> {
    let is_json = response.headers().any_contains("content-type", "json");
    let status = response.status();

    if status >= 400 {
        let description = if is_json && !text.trim().is_empty() {
            Some(serde_json::from_str(&text)?)
        } else {
            None
        };
        tracing::warn!(
            request = %options.safe_describe(),
            status,
            "API request failed"
        );
        return Err(HttpError::Api(ErrorEnvelope {
            status,
            status_message: response.status_message().to_string(),
            headers: response.headers().clone(),
            description,
        }));
    }

    if text.is_empty() {
        Ok(ParsedBody::Empty)
    } else if is_json {
        Ok(ParsedBody::Json(serde_json::from_str(&text)?))
    } else if options.path.contains(".yml") {
        Ok(ParsedBody::Yaml(serde_yaml::from_str(&text)?))
    } else {
        Ok(ParsedBody::Text(text))
    }
}
