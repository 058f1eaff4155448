//! Streaming HTTP fetcher.
//!
//! Opens a bounded GET request, checks the declared `Content-Length` against
//! the configured limit, and streams the body chunk-by-chunk into a local
//! file. Failure kinds are an explicit enum so the pipeline can map each one
//! to a distinct user-facing message.

use futures_util::StreamExt;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Default fetch timeout, connect through last body byte. Applied when
/// building the shared HTTP client.
pub const FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// Display name used when the URL yields no usable path segment.
pub const FALLBACK_FILE_NAME: &str = "file.bin";

/// User-facing message for failures outside the named download categories.
/// Shared with the pipeline so the text cannot drift between the two.
pub const MSG_UNEXPECTED: &str = "❌ An unexpected error occurred. Please try again later.";

/// Failure kinds of the fetch/write step.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// `Content-Length` was absent or zero; both mean "unknown/empty".
    #[error("could not determine file size (Content-Length absent or zero)")]
    UnknownSize,
    /// Declared or observed size exceeds the configured limit.
    #[error("file size {size} exceeds the configured limit {limit}")]
    TooLarge {
        /// Declared header value, or bytes seen so far when the header lied.
        size: u64,
        /// Configured maximum in bytes.
        limit: u64,
    },
    /// The request exceeded [`FETCH_TIMEOUT`].
    #[error("download timed out")]
    Timeout,
    /// Connection-level failure (DNS, refused, TLS, reset mid-body).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// Server answered with a non-success HTTP status.
    #[error("server responded with status {0}")]
    Status(StatusCode),
    /// Local file I/O failed.
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

impl DownloadError {
    /// The user-facing message for this failure category.
    ///
    /// Internal logs keep the full error detail; the user only ever sees
    /// these category texts.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::UnknownSize => "❌ Could not determine file size or empty file.",
            Self::TooLarge { .. } => "⚠️ File is too large to upload to Telegram.",
            Self::Timeout => "⏱️ Download timed out. Please try again with a faster link.",
            Self::Network(_) | Self::Status(_) => {
                "❌ Failed to fetch file. Link may be invalid or server refused connection."
            }
            Self::Io(_) => MSG_UNEXPECTED,
        }
    }
}

/// Result of a completed fetch.
#[derive(Debug, Clone, Copy)]
pub struct Fetched {
    /// Size declared by the `Content-Length` header.
    pub declared_len: u64,
    /// Bytes actually written to the destination file.
    pub bytes_written: u64,
}

/// Whether `text` looks like a direct HTTP/HTTPS link.
#[must_use]
pub fn is_direct_link(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// Derive the display filename from a URL: last path segment with the query
/// string stripped, falling back to [`FALLBACK_FILE_NAME`].
#[must_use]
pub fn display_file_name(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or_default();
    let name = last.split('?').next().unwrap_or_default();
    if name.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Build a per-invocation unique local path for `display_name` under `dir`.
///
/// Concurrent requests may derive the same display name from different (or
/// identical) URLs; the uuid suffix keeps their on-disk footprints isolated.
/// The display name stays cosmetic and is re-attached at upload time.
#[must_use]
pub fn unique_local_path(dir: &Path, display_name: &str) -> PathBuf {
    dir.join(format!("{display_name}.{}", Uuid::new_v4().simple()))
}

/// Stream `url` into `dest`, enforcing `max_size`.
///
/// The size check runs on the declared `Content-Length` before any byte is
/// written, and again on the running byte count while streaming in case the
/// header understated the body. The request deadline comes from the
/// timeout configured on `client` ([`FETCH_TIMEOUT`] in production).
///
/// # Errors
///
/// Returns a [`DownloadError`] naming the failure category; see the variant
/// docs. A partial file may remain at `dest` after a mid-stream failure and
/// is the caller's responsibility to remove.
pub async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    max_size: u64,
    dest: &Path,
) -> Result<Fetched, DownloadError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status));
    }

    let declared_len = response.content_length().unwrap_or(0);
    if declared_len == 0 {
        return Err(DownloadError::UnknownSize);
    }
    if declared_len > max_size {
        return Err(DownloadError::TooLarge {
            size: declared_len,
            limit: max_size,
        });
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        bytes_written += chunk.len() as u64;
        if bytes_written > max_size {
            return Err(DownloadError::TooLarge {
                size: bytes_written,
                limit: max_size,
            });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(Fetched {
        declared_len,
        bytes_written,
    })
}
