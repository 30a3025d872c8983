use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::error::{CotError, RetrievalStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single blocking GET. Non-success statuses come back as `Ok` with the
/// status set; only transport failures are `Err`.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, RetrievalStatus>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<HttpResponse, RetrievalStatus> {
        (**self).get(url)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub retries: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retries: 0,
        }
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    retries: usize,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, CotError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("cftc-cot/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CotError::HttpClient(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| CotError::HttpClient(err.to_string()))?;
        Ok(Self {
            client,
            retries: config.retries,
        })
    }

    fn send_with_retries(&self, url: &str) -> Result<reqwest::blocking::Response, RetrievalStatus> {
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < self.retries && is_retryable_status(status) {
                        warn!(url, status, attempt, "retrying request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < self.retries && is_retryable_error(&err) {
                        warn!(url, attempt, error = %err, "retrying request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(classify_error(&err));
                }
            }
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, RetrievalStatus> {
        let response = self.send_with_retries(url)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().map_err(|err| classify_error(&err))?;
        debug!(url, status, bytes = bytes.len(), "http response");
        Ok(HttpResponse {
            status,
            bytes: bytes.to_vec(),
        })
    }
}

fn classify_error(err: &reqwest::Error) -> RetrievalStatus {
    if err.is_timeout() {
        RetrievalStatus::TimedOut
    } else {
        RetrievalStatus::Transport(err.to_string())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let ok = HttpResponse {
            status: 204,
            bytes: Vec::new(),
        };
        let missing = HttpResponse {
            status: 404,
            bytes: b"not found".to_vec(),
        };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(!is_retryable_status(404));
    }
}
