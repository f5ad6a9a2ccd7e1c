//! Configuration and transport seams for the scrape pipeline

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

/// Configuration for a product-page scraper
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Display name for the website
    pub name: String,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
    /// How failed fetches are retried
    pub retry: RetryPolicy,
    /// CSS selectors describing the page layout
    pub selectors: PageSchema,
}

impl ScraperConfig {
    /// Apply `SCENTY_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are logged and the current setting is kept.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(user_agent) = lookup("SCENTY_USER_AGENT") {
            self.user_agent = user_agent;
        }

        if let Some(raw) = lookup("SCENTY_MAX_ATTEMPTS") {
            match raw.trim().parse::<u32>() {
                Ok(attempts) if attempts > 0 => self.retry.max_attempts = attempts,
                _ => tracing::warn!("Ignoring invalid SCENTY_MAX_ATTEMPTS value: {raw}"),
            }
        }

        if let Some(raw) = lookup("SCENTY_RETRY_DELAY_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.retry.delay = Duration::from_secs(secs),
                Err(_) => tracing::warn!("Ignoring invalid SCENTY_RETRY_DELAY_SECS value: {raw}"),
            }
        }

        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }
}

/// Fixed-delay retry budget for page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// CSS selectors for every field read from a product page.
///
/// `title`, `info_section` and `review_list` are resolved against the whole
/// page. Field selectors from `brand_name` to `description` are resolved inside
/// the info section, and `review_grid` onwards inside a single review block.
#[derive(Debug, Clone)]
pub struct PageSchema {
    /// Block holding the raw product title
    pub title: String,
    /// Repeated container class; the info section is one occurrence of it
    pub info_section: String,
    /// Which occurrence of `info_section` holds the product details
    pub info_section_index: usize,
    pub brand_name: String,
    pub brand_logo: String,
    pub accord: String,
    pub bottle_image: String,
    pub rating_value: String,
    pub rating_count: String,
    pub description: String,
    /// Paragraph inside `description` carrying the text
    pub description_paragraph: String,
    /// Container wrapping all review blocks
    pub review_list: String,
    pub review_box: String,
    /// Inner wrapper a review block must have to be read
    pub review_grid: String,
    pub review_body: String,
    pub review_author: String,
    pub review_date: String,
    /// Attribute of `review_date` holding the machine-readable date
    pub review_date_attr: String,
    /// Upper bound on review blocks read per page
    pub max_reviews: usize,
}

/// Source of raw page bodies.
///
/// Implementations report a failed request as a [`FetchError`]; retrying is
/// left to the caller.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the body of `url`
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}
