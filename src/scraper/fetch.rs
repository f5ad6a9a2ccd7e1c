use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use super::PageDocument;
use crate::error::{FetchError, ScrapeError};
use crate::traits::{PageSource, RetryPolicy};

/// [`PageSource`] backed by a `reqwest` client
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl Clone for HttpSource {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

/// Retries a [`PageSource`] with a fixed delay between attempts
pub struct Fetcher<S> {
    source: S,
    retry: RetryPolicy,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Fetch and parse `url`, or `None` once every attempt has failed
    pub async fn fetch(&self, url: &str) -> Option<PageDocument> {
        let body = self.fetch_body(url).await?;
        Some(PageDocument::parse(&body))
    }

    async fn fetch_body(&self, url: &str) -> Option<String> {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.source.get(url).await {
                Ok(body) => {
                    if attempt > 1 {
                        info!("Fetched {url} after {attempt} attempts");
                    }
                    return Some(body);
                }
                Err(e) => {
                    warn!("Failed to fetch {url}: {e}");

                    if attempt < max_attempts {
                        warn!(
                            "Retrying ({}/{max_attempts}) in {:?}",
                            attempt + 1,
                            self.retry.delay
                        );
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        warn!("Giving up on {url} after {max_attempts} attempts");
        None
    }
}
