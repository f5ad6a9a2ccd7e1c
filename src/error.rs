/// Faults raised while turning a page into a [`crate::models::PerfumeRecord`]
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Invalid selector for {field}: {selector}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
    },
    #[error("Required field missing from page: {0}")]
    MissingField(&'static str),
    #[error("Rating count is not an integer: {0:?}")]
    InvalidRatingCount(String),
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// A single failed page request
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}
