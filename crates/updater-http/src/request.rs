use crate::error::{HttpError, Result};
use crate::headers::Headers;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Method;
use std::fmt;
use url::Url;

const REDACTED: &str = "<stripped sensitive data>";

/// Description of one outbound request.
///
/// A value describes a single attempt. Redirects and token injection build
/// new values instead of mutating the one that was already sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// URL scheme without the trailing colon (`https`).
    pub protocol: String,
    pub host: String,
    pub port: Option<u16>,
    /// Path including the query string.
    pub path: String,
    pub method: Method,
    pub headers: Headers,
}

impl RequestOptions {
    /// A `GET` against `host` and `path` over https.
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            protocol: "https".to_string(),
            host: host.into(),
            port: None,
            path: path.into(),
            method: Method::GET,
            headers: Headers::new(),
        }
    }

    /// Split an absolute URL into its request components.
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| HttpError::validation(format!("URL has no host: {url}")))?;
        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            protocol: url.scheme().to_string(),
            host: host.to_string(),
            port: url.port(),
            path,
            method: Method::GET,
            headers: Headers::new(),
        })
    }

    /// Parse `url` and split it into request components.
    pub fn parse(url: &str) -> Result<Self> {
        Self::from_url(&Url::parse(url)?)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Same request, forced onto https.
    pub fn secure(mut self) -> Self {
        self.protocol = "https".to_string();
        self
    }

    /// Attach an `authorization` header. Tokens already carrying the
    /// `Basic` scheme pass through, anything else becomes `token <value>`.
    pub fn with_token(self, token: &str) -> Self {
        let value = if token.starts_with("Basic") {
            token.to_string()
        } else {
            format!("token {token}")
        };
        self.with_header("authorization", value)
    }

    /// Reassemble the absolute URL.
    pub fn to_url(&self) -> Result<Url> {
        let authority = match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        };
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        Ok(Url::parse(&format!("{}://{authority}{path}", self.protocol))?)
    }

    /// Request for a redirect target: `location` is resolved against the
    /// current URL, and its components replace protocol, host, port and
    /// path. Method and headers are carried over.
    pub fn with_redirect(&self, location: &str) -> Result<Self> {
        let target = self.to_url()?.join(location)?;
        let parsed = Self::from_url(&target)?;
        Ok(Self {
            method: self.method.clone(),
            headers: self.headers.clone(),
            ..parsed
        })
    }

    /// Rendering safe for logs: credentials are masked.
    pub fn safe_describe(&self) -> SafeDescription<'_> {
        SafeDescription(self)
    }
}

/// Redacted [`Display`](fmt::Display) of a [`RequestOptions`].
pub struct SafeDescription<'a>(&'a RequestOptions);

impl fmt::Display for SafeDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = self.0;
        write!(f, "{} {}://{}", options.method, options.protocol, options.host)?;
        if let Some(port) = options.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&options.path)?;
        for (name, value) in options.headers.iter() {
            let value = if name == "authorization" { REDACTED } else { value };
            write!(f, " [{name}: {value}]")?;
        }
        Ok(())
    }
}

/// Build a `Basic` credential from a user name and password.
pub fn basic_token(user: &str, password: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(format!("{user}:{password}"));
    format!("Basic {encoded}")
}
