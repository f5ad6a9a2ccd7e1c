pub mod database;
pub mod error;
pub mod models;
pub mod perfume_catalog;
pub mod scraper;
pub mod scrapers;
pub mod traits;

pub use error::{FetchError, ScrapeError};
pub use perfume_catalog::{AddOutcome, PerfumeCatalog};
