use anyhow::Result;
use tracing::{info, warn};

use crate::database::{Database, SaveOutcome};
use crate::models::{PerfumeStats, ScrapeOutcome, StoredPerfume, StoredReview};
use crate::scraper::{HttpSource, Scraper};
use crate::traits::PageSource;

/// Outcome of adding a perfume page to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { id: i64, name: String },
    AlreadyStored { id: i64, name: String },
    /// The page could not be fetched or held no perfume information
    Unavailable,
}

/// Scrapes perfume pages into the catalog database and answers queries over it
pub struct PerfumeCatalog<S = HttpSource> {
    scraper: Scraper<S>,
    database: Database,
}

impl<S: PageSource> PerfumeCatalog<S> {
    pub fn new(scraper: Scraper<S>, database: Database) -> Self {
        Self { scraper, database }
    }

    pub async fn add_from_url(&self, url: &str) -> Result<AddOutcome> {
        let record = match self.scraper.scrape_all(url).await? {
            ScrapeOutcome::Perfume(record) => record,
            ScrapeOutcome::NoInformation => {
                warn!("No perfume information at {url}");
                return Ok(AddOutcome::Unavailable);
            }
            ScrapeOutcome::Unreachable => {
                warn!("Could not fetch {url}");
                return Ok(AddOutcome::Unavailable);
            }
        };

        let outcome = match self.database.save_perfume(&record).await? {
            SaveOutcome::Inserted(id) => {
                info!("Added {} to catalog", record.name);
                AddOutcome::Added {
                    id,
                    name: record.name,
                }
            }
            SaveOutcome::AlreadyStored(id) => {
                info!("{} is already in the catalog", record.name);
                AddOutcome::AlreadyStored {
                    id,
                    name: record.name,
                }
            }
        };

        Ok(outcome)
    }

    pub async fn get(&self, name: &str) -> Result<Option<StoredPerfume>> {
        self.database.find_by_name(name).await
    }

    pub async fn remove(&self, name: &str) -> Result<Option<i64>> {
        self.database.delete_by_name(name).await
    }

    pub async fn all(&self) -> Result<Vec<StoredPerfume>> {
        self.database.list_all().await
    }

    pub async fn clear(&self) -> Result<u64> {
        self.database.delete_all().await
    }

    pub async fn random(&self) -> Result<Option<StoredPerfume>> {
        self.database.random().await
    }

    pub async fn top(&self, limit: u32) -> Result<Vec<StoredPerfume>> {
        self.database.top_rated(limit).await
    }

    pub async fn stats(&self) -> Result<Option<PerfumeStats>> {
        self.database.stats().await
    }

    pub async fn reviews(&self, perfume_id: i64) -> Result<Vec<StoredReview>> {
        self.database.reviews_for(perfume_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::ScriptedSource;
    use crate::scrapers::fragrantica;
    use crate::traits::RetryPolicy;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::time::Duration;

    async fn catalog(source: ScriptedSource) -> PerfumeCatalog<ScriptedSource> {
        let mut config = fragrantica::config();
        config.retry = RetryPolicy {
            max_attempts: 2,
            delay: Duration::ZERO,
        };

        let scraper = Scraper::with_source(config, source).unwrap();
        PerfumeCatalog::new(scraper, Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_add_then_add_again() {
        let html = fs::read_to_string("tests/htmls/perfume.html").expect("Invalid file path");
        let catalog = catalog(ScriptedSource::serving(&html, 2)).await;

        let first = catalog.add_from_url("https://example.test/p.html").await.unwrap();
        let AddOutcome::Added { id, name } = first else {
            panic!("expected an insert, got {first:?}");
        };
        assert_eq!(name, "Sauvage Christian Dior");

        let second = catalog.add_from_url("https://example.test/p.html").await.unwrap();
        assert_eq!(
            second,
            AddOutcome::AlreadyStored {
                id,
                name: "Sauvage Christian Dior".to_string(),
            }
        );

        assert_eq!(catalog.reviews(id).await.unwrap().len(), 3);
        let stored = catalog.get("Sauvage Christian Dior").await.unwrap().unwrap();
        assert_eq!(stored.rating, Some(4.12));
    }

    #[tokio::test]
    async fn test_unreachable_and_empty_pages_store_nothing() {
        let catalog = catalog(ScriptedSource::new(vec![
            Err(crate::error::FetchError::Status(502)),
            Err(crate::error::FetchError::Status(502)),
            Ok("<html><body>moved</body></html>".to_string()),
        ]))
        .await;

        assert_eq!(
            catalog.add_from_url("https://example.test/a").await.unwrap(),
            AddOutcome::Unavailable
        );
        assert_eq!(
            catalog.add_from_url("https://example.test/b").await.unwrap(),
            AddOutcome::Unavailable
        );
        assert!(catalog.all().await.unwrap().is_empty());
    }
}
