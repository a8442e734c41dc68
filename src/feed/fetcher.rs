//! HTTP retrieval of subject feeds.
//!
//! One GET per subject against the feed endpoint, URL templated on the
//! subject code. A failed fetch is reported by the caller and that
//! subject is skipped; it never aborts the run.

use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching one subject's feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Endpoint URL could not be built from the base URL and subject
    #[error("Invalid feed URL: {0}")]
    Url(#[from] url::ParseError),
    /// Response body was not valid UTF-8
    #[error("Feed is not valid UTF-8")]
    Encoding,
}

/// Builds the feed URL for a subject, e.g.
/// `http://export.arxiv.org/rss` + `cs.CV` →
/// `http://export.arxiv.org/rss/cs.CV`.
pub fn subject_url(base_url: &str, subject: &str) -> Result<Url, FetchError> {
    let base = base_url.trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{subject}"))?)
}

/// Fetches the raw feed document for one subject.
pub async fn fetch_subject(
    client: &reqwest::Client,
    base_url: &str,
    subject: &str,
) -> Result<String, FetchError> {
    let url = subject_url(base_url, subject)?;
    tracing::info!(subject = subject, url = %url, "Collecting subject");

    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    String::from_utf8(bytes).map_err(|_| FetchError::Encoding)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
