//! Data models for scraped perfume pages and stored catalog rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audience tag parsed from a product title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    /// Both tags, used when a title names no audience
    pub const UNISEX: [Self; 2] = [Self::Men, Self::Women];

    /// Case-insensitive match against `men` / `women`
    pub fn from_word(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("men") {
            Some(Self::Men)
        } else if word.eq_ignore_ascii_case("women") {
            Some(Self::Women)
        } else {
            None
        }
    }
}

/// A single review block from a product page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub author: Option<String>,
    /// ISO-8601 date text as published by the page
    pub date: Option<String>,
    pub body: Option<String>,
}

/// Reviews found on a page.
///
/// `NoReviews` means the review container itself was missing and serializes
/// as `null`, which keeps it distinct from an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewList {
    Found(Vec<ReviewRecord>),
    NoReviews,
}

impl ReviewList {
    pub fn as_slice(&self) -> &[ReviewRecord] {
        match self {
            Self::Found(reviews) => reviews,
            Self::NoReviews => &[],
        }
    }
}

/// A perfume scraped from its product page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfumeRecord {
    pub name: String,
    pub gender: Vec<Gender>,
    pub brand: String,
    #[serde(rename = "brandImageURL")]
    pub brand_image_url: Option<String>,
    pub accords: Vec<String>,
    #[serde(rename = "bottleImageURL")]
    pub bottle_image_url: Option<String>,
    /// Numeric text exactly as shown on the page
    pub rating: String,
    #[serde(rename = "ratingCount")]
    pub rating_count: i64,
    pub description: String,
    pub reviews: ReviewList,
}

/// Result of running the scrape pipeline against one URL
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Perfume(PerfumeRecord),
    /// The page was fetched but has no info section
    NoInformation,
    /// Every fetch attempt failed
    Unreachable,
}

/// A perfume row as persisted in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPerfume {
    pub id: i64,
    pub name: String,
    pub gender: Vec<Gender>,
    pub brand: String,
    pub accords: Vec<String>,
    #[serde(rename = "brandImageURL")]
    pub brand_image_url: Option<String>,
    #[serde(rename = "bottleImageURL")]
    pub bottle_image_url: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: i64,
    pub description: String,
    pub scraped_at: DateTime<Utc>,
}

/// A review row as persisted in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReview {
    pub perfume_id: i64,
    pub author: Option<String>,
    pub date: Option<String>,
    pub body: Option<String>,
}

/// Id and name of a perfume, used in rankings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerfumeRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandCount {
    pub brand: String,
    pub count: i64,
}

/// Aggregate numbers over the whole catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfumeStats {
    pub perfume_count: i64,
    pub average_rating: Option<f64>,
    pub average_rating_count: f64,
    pub top_rated: Option<PerfumeRef>,
    pub bottom_rated: Option<PerfumeRef>,
    pub brand_distribution: Vec<BrandCount>,
}
