use scraper::{ElementRef, Html};
use tracing::info;

use crate::error::ScrapeError;
use crate::models::ScrapeOutcome;
use crate::traits::{PageSource, ScraperConfig};

pub mod extract;
pub mod fetch;
pub mod info;
pub mod reviews;

#[cfg(test)]
pub(crate) mod testing;

pub use extract::CompiledSchema;
pub use fetch::{Fetcher, HttpSource};
pub use info::InfoOutcome;

/// One fetched page, parsed once and dropped after extraction
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

/// Fetches a product page and turns it into a [`ScrapeOutcome`]
pub struct Scraper<S = HttpSource> {
    name: String,
    fetcher: Fetcher<S>,
    schema: CompiledSchema,
}

impl Scraper<HttpSource> {
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        let source = HttpSource::new(&config.user_agent)?;
        Self::with_source(config, source)
    }
}

impl<S: PageSource> Scraper<S> {
    pub fn with_source(config: ScraperConfig, source: S) -> Result<Self, ScrapeError> {
        let schema = CompiledSchema::compile(&config.selectors)?;

        Ok(Self {
            name: config.name,
            fetcher: Fetcher::new(source, config.retry),
            schema,
        })
    }

    /// Fetch `url` and extract its perfume record.
    ///
    /// Exhausted fetch retries give [`ScrapeOutcome::Unreachable`]; a page
    /// without an info section gives [`ScrapeOutcome::NoInformation`]. Parse
    /// faults are returned as errors and never retried.
    pub async fn scrape_all(&self, url: &str) -> Result<ScrapeOutcome, ScrapeError> {
        info!("Scraping {url} from {}", self.name);

        let Some(document) = self.fetcher.fetch(url).await else {
            return Ok(ScrapeOutcome::Unreachable);
        };

        let outcome = match info::parse_info(&document, &self.schema)? {
            InfoOutcome::Record(record) => {
                info!(
                    "Scraped {} ({} reviews)",
                    record.name,
                    record.reviews.as_slice().len()
                );
                ScrapeOutcome::Perfume(record)
            }
            InfoOutcome::NoInformation => ScrapeOutcome::NoInformation,
        };

        Ok(outcome)
    }
}
