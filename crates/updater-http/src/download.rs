use crate::{
    checksum::ChecksumVerifier,
    error::{HttpError, Result},
    executor::HttpExecutor,
    guard::IdleGuard,
    headers::Headers,
    request::RequestOptions,
    transport::{OutgoingRequest, Transport, TransportResponse},
};
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::PathPersistError;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Callback receiving download progress after every written chunk.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Hook run once the destination file is complete. An error rejects the
/// download.
pub type CompletionHook = Arc<dyn Fn(&Path) -> Result<()> + Send + Sync>;

/// Transfer progress of one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes received so far.
    pub transferred: u64,
    /// Total size from `content-length` or the expected size, when known.
    pub total: Option<u64>,
}

impl Progress {
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.transferred as f64 * 100.0 / total as f64),
            None => None,
        }
    }
}

/// Options of one download, shared unchanged by every redirect hop.
#[derive(Clone, Default)]
pub struct DownloadOptions {
    /// Do not create the destination's parent directory.
    pub skip_dir_creation: bool,
    /// Extra request headers.
    pub headers: Headers,
    /// Expected SHA-512 digest, base64 encoded.
    pub sha512: Option<String>,
    /// Expected SHA-256 digest, hex encoded.
    pub sha256: Option<String>,
    /// Expected size in bytes.
    pub expected_size: Option<u64>,
    pub on_progress: Option<ProgressCallback>,
    pub on_complete: Option<CompletionHook>,
    /// Cancels whichever attempt is in flight.
    pub cancellation: CancellationToken,
}

impl DownloadOptions {
    pub fn on_progress(mut self, callback: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_complete(
        mut self,
        hook: impl Fn(&Path) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Arc::new(hook));
        self
    }

    fn verifier(&self) -> ChecksumVerifier {
        ChecksumVerifier::new(
            self.sha512.as_deref(),
            self.sha256.as_deref(),
            self.expected_size,
        )
    }

    fn report(&self, transferred: u64, total: Option<u64>) {
        if let Some(callback) = &self.on_progress {
            callback(Progress { transferred, total });
        }
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("skip_dir_creation", &self.skip_dir_creation)
            .field("headers", &self.headers)
            .field("sha512", &self.sha512)
            .field("sha256", &self.sha256)
            .field("expected_size", &self.expected_size)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl<T> HttpExecutor<T>
where
    T: Transport,
{
    /// Download `url` to `destination`, following redirects.
    ///
    /// The body streams into a temporary file next to the destination which
    /// is flushed, synced, verified and only then moved into place, so the
    /// destination never holds a partial body. Resolves with the destination
    /// path.
    pub async fn download(
        &self,
        url: &str,
        destination: impl AsRef<Path>,
        options: &DownloadOptions,
    ) -> Result<PathBuf> {
        let destination = destination.as_ref().to_path_buf();
        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !options.skip_dir_creation {
            tokio::fs::create_dir_all(&directory).await?;
        }

        let (response, guard) = self.open_download(url, options).await?;
        stream_to_file(response, &guard, &directory, &destination, options).await?;

        if let Some(hook) = &options.on_complete {
            hook(&destination)?;
        }
        tracing::debug!(url, destination = %destination.display(), "download complete");
        Ok(destination)
    }

    /// Download `url` into memory, following redirects.
    pub async fn download_to_buffer(&self, url: &str, options: &DownloadOptions) -> Result<Bytes> {
        let (mut response, guard) = self.open_download(url, options).await?;
        let total = content_length(&*response).or(options.expected_size);
        let mut verifier = options.verifier();
        let mut buffer = Vec::new();

        while let Some(chunk) = guard.run(response.next_chunk()).await? {
            verifier.update(&chunk);
            buffer.extend_from_slice(&chunk);
            options.report(buffer.len() as u64, total);
        }

        verifier.finish()?;
        Ok(Bytes::from(buffer))
    }

    /// Follow redirects until a response carries the body. Each hop gets a
    /// fresh attempt and guard; redirect bodies are never read.
    async fn open_download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<(Box<dyn TransportResponse>, IdleGuard)> {
        let mut request = RequestOptions::parse(url)?;
        for (name, value) in options.headers.iter() {
            request.headers.append(name, value);
        }
        let mut request = self.with_user_agent(request);
        let limit = self.config().download_max_redirects;
        let mut hops = 0usize;

        loop {
            let (response, guard) = self
                .attempt(OutgoingRequest::new(request.clone()), &options.cancellation)
                .await?;

            let status = response.status();
            if status >= 400 {
                return Err(HttpError::Status {
                    url: guard.url().to_string(),
                    status,
                    message: response.status_message().to_string(),
                });
            }

            let location = response.headers().first("location").map(str::to_owned);
            let Some(location) = location else {
                return Ok((response, guard));
            };
            if hops >= limit {
                return Err(HttpError::DownloadRedirectLimit { limit });
            }

            hops += 1;
            tracing::debug!(from = guard.url(), to = %location, hops, "following redirect");
            request = request.with_redirect(&location)?;
        }
    }
}

fn content_length(response: &dyn TransportResponse) -> Option<u64> {
    response
        .headers()
        .first("content-length")
        .and_then(|value| value.trim().parse().ok())
}

/// Stream the body into a temporary file in `directory`, then persist it
/// onto `destination`. The temporary file is removed on any failure.
async fn stream_to_file(
    mut response: Box<dyn TransportResponse>,
    guard: &IdleGuard,
    directory: &Path,
    destination: &Path,
    options: &DownloadOptions,
) -> Result<()> {
    let temp = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(directory)?;
    let (file, temp_path) = temp.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let total = content_length(&*response).or(options.expected_size);
    let mut verifier = options.verifier();
    let mut transferred = 0u64;

    while let Some(chunk) = guard.run(response.next_chunk()).await? {
        verifier.update(&chunk);
        guard
            .run(async { file.write_all(&chunk).await.map_err(HttpError::from) })
            .await?;
        transferred += chunk.len() as u64;
        options.report(transferred, total);
    }

    guard
        .run(async {
            file.flush().await?;
            file.sync_all().await?;
            Ok::<_, HttpError>(())
        })
        .await?;
    // Wait for in-flight writes and close the descriptor before placing.
    drop(file.into_std().await);

    verifier.finish()?;
    temp_path.persist(destination).map_err(map_persist_error)?;
    Ok(())
}

fn map_persist_error(err: PathPersistError) -> HttpError {
    HttpError::Io(err.error)
}
