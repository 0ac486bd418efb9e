use std::time::Duration;

use imagine_contracts::errors::GenerationError;
use reqwest::blocking::Client as HttpClient;

use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::{error_chain_text, truncate_text, RawImageResult};

/// Plain HTTP GET of a provider-hosted image.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, GenerationError>;
}

pub struct HttpImageFetcher {
    http: HttpClient,
    timeout: Duration,
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self {
            http: HttpClient::new(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .map_err(|err| GenerationError::Download {
                message: error_chain_text(&err),
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Download {
                message: format!(
                    "status {} from {url}: {}",
                    status.as_u16(),
                    truncate_text(body.trim(), 512)
                ),
            });
        }
        let bytes = response.bytes().map_err(|err| GenerationError::Download {
            message: format!("failed reading image bytes: {}", error_chain_text(&err)),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Turns any provider result into image bytes.
pub struct ImageAcquirer {
    fetcher: Box<dyn ImageFetcher>,
}

impl ImageAcquirer {
    pub fn new(fetcher: Box<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn http(timeout: Duration) -> Self {
        Self::new(Box::new(HttpImageFetcher::new().with_timeout(timeout)))
    }

    pub fn to_bytes(
        &self,
        result: RawImageResult,
        model: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        match result {
            RawImageResult::Url(url) => self.fetcher.fetch(&url),
            RawImageResult::Bytes(image) => Ok(image.bytes),
            RawImageResult::Empty => Err(GenerationError::NoData {
                model: model.to_string(),
            }),
        }
    }
}
