use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{debug, info};

use crate::models::{
    BrandCount, PerfumeRecord, PerfumeRef, PerfumeStats, StoredPerfume, StoredReview,
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:database/scenty.db";

const PERFUME_COLUMNS: &str = "id, name, gender, brand, accords, brand_image_url, \
    bottle_image_url, rating, rating_count, description, scraped_at";

/// Outcome of storing a scraped perfume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(i64),
    /// A perfume with the same name was already stored under this id
    AlreadyStored(i64),
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database file for {db_url}");
            if let Some(parent) = sqlite_file_parent(db_url) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePool::connect(db_url).await?;
        Self::migrate(pool).await
    }

    /// A private in-memory database, dropped with the pool
    pub async fn in_memory() -> Result<Self> {
        // Every connection to `sqlite::memory:` opens a fresh database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    /// Store a perfume and its reviews, unless one with the same name exists.
    ///
    /// The unique index on `name` settles concurrent saves of the same perfume:
    /// exactly one insert wins and the others see its id.
    pub async fn save_perfume(&self, record: &PerfumeRecord) -> Result<SaveOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r"
            INSERT INTO perfumes (name, gender, brand, accords, brand_image_url,
                bottle_image_url, rating, rating_count, description, scraped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(&record.name)
        .bind(serde_json::to_string(&record.gender)?)
        .bind(&record.brand)
        .bind(serde_json::to_string(&record.accords)?)
        .bind(&record.brand_image_url)
        .bind(&record.bottle_image_url)
        .bind(record.rating.trim().parse::<f64>().ok())
        .bind(record.rating_count)
        .bind(&record.description)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            let id: i64 = sqlx::query_scalar("SELECT id FROM perfumes WHERE name = ?")
                .bind(&record.name)
                .fetch_one(&mut *tx)
                .await?;
            tx.commit().await?;

            debug!("{} already stored as {id}", record.name);
            return Ok(SaveOutcome::AlreadyStored(id));
        }

        let id = inserted.last_insert_rowid();

        for review in record.reviews.as_slice() {
            sqlx::query("INSERT INTO reviews (perfume_id, author, date, body) VALUES (?, ?, ?, ?)")
                .bind(id)
                .bind(&review.author)
                .bind(&review.date)
                .bind(&review.body)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            "Stored {} as {id} with {} reviews",
            record.name,
            record.reviews.as_slice().len()
        );
        Ok(SaveOutcome::Inserted(id))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<StoredPerfume>> {
        let row = sqlx::query(&format!(
            "SELECT {PERFUME_COLUMNS} FROM perfumes WHERE name = ? ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(perfume_from_row).transpose()
    }

    /// Remove a perfume and its reviews, returning the removed id
    pub async fn delete_by_name(&self, name: &str) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM perfumes WHERE name = ? ORDER BY id LIMIT 1")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(id) = id else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM reviews WHERE perfume_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM perfumes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Deleted {name} ({id})");
        Ok(Some(id))
    }

    pub async fn list_all(&self) -> Result<Vec<StoredPerfume>> {
        let rows = sqlx::query(&format!("SELECT {PERFUME_COLUMNS} FROM perfumes ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(perfume_from_row).collect()
    }

    /// Remove every perfume and review, returning how many perfumes were removed
    pub async fn delete_all(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reviews").execute(&mut *tx).await?;
        let removed = sqlx::query("DELETE FROM perfumes")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!("Deleted {removed} perfumes");
        Ok(removed)
    }

    pub async fn random(&self) -> Result<Option<StoredPerfume>> {
        let row = sqlx::query(&format!(
            "SELECT {PERFUME_COLUMNS} FROM perfumes ORDER BY RANDOM() LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(perfume_from_row).transpose()
    }

    /// Highest rated perfumes first; unrated perfumes sort last
    pub async fn top_rated(&self, limit: u32) -> Result<Vec<StoredPerfume>> {
        let rows = sqlx::query(&format!(
            "SELECT {PERFUME_COLUMNS} FROM perfumes ORDER BY rating IS NULL, rating DESC, id LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(perfume_from_row).collect()
    }

    /// Catalog-wide aggregates, or `None` when nothing is stored
    pub async fn stats(&self) -> Result<Option<PerfumeStats>> {
        let totals = sqlx::query(
            "SELECT COUNT(*) AS perfume_count, AVG(rating) AS average_rating, \
             AVG(rating_count) AS average_rating_count FROM perfumes",
        )
        .fetch_one(&self.pool)
        .await?;

        let perfume_count: i64 = totals.try_get("perfume_count")?;
        if perfume_count == 0 {
            return Ok(None);
        }

        let average_rating: Option<f64> = totals.try_get("average_rating")?;
        let average_rating_count: Option<f64> = totals.try_get("average_rating_count")?;

        let top_rated = self.ranked("DESC").await?;
        let bottom_rated = self.ranked("ASC").await?;

        let brand_distribution = sqlx::query(
            "SELECT brand, COUNT(*) AS value_count FROM perfumes \
             GROUP BY brand ORDER BY value_count DESC, brand",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> Result<BrandCount> {
            Ok(BrandCount {
                brand: row.try_get("brand")?,
                count: row.try_get("value_count")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(PerfumeStats {
            perfume_count,
            average_rating: average_rating.map(round2),
            average_rating_count: round2(average_rating_count.unwrap_or_default()),
            top_rated,
            bottom_rated,
            brand_distribution,
        }))
    }

    async fn ranked(&self, order: &'static str) -> Result<Option<PerfumeRef>> {
        let row = sqlx::query(&format!(
            "SELECT id, name FROM perfumes WHERE rating IS NOT NULL \
             ORDER BY rating {order}, id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<PerfumeRef> {
            Ok(PerfumeRef {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        })
        .transpose()
    }

    pub async fn reviews_for(&self, perfume_id: i64) -> Result<Vec<StoredReview>> {
        let rows = sqlx::query(
            "SELECT perfume_id, author, date, body FROM reviews WHERE perfume_id = ? ORDER BY rowid",
        )
        .bind(perfume_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<StoredReview> {
                Ok(StoredReview {
                    perfume_id: row.try_get("perfume_id")?,
                    author: row.try_get("author")?,
                    date: row.try_get("date")?,
                    body: row.try_get("body")?,
                })
            })
            .collect()
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

fn perfume_from_row(row: &SqliteRow) -> Result<StoredPerfume> {
    let gender: String = row.try_get("gender")?;
    let accords: String = row.try_get("accords")?;

    Ok(StoredPerfume {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        gender: serde_json::from_str(&gender).context("Malformed gender column")?,
        brand: row.try_get("brand")?,
        accords: serde_json::from_str(&accords).context("Malformed accords column")?,
        brand_image_url: row.try_get("brand_image_url")?,
        bottle_image_url: row.try_get("bottle_image_url")?,
        rating: row.try_get("rating")?,
        rating_count: row.try_get("rating_count")?,
        description: row.try_get("description")?,
        scraped_at: row.try_get("scraped_at")?,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Directory holding the file behind a `sqlite:` URL, if it names one
fn sqlite_file_parent(db_url: &str) -> Option<&Path> {
    let path = db_url.strip_prefix("sqlite:")?.trim_start_matches("//");
    let path = path.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }

    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, ReviewList, ReviewRecord};
    use pretty_assertions::assert_eq;

    fn perfume(name: &str, brand: &str, rating: &str, rating_count: i64) -> PerfumeRecord {
        PerfumeRecord {
            name: name.to_string(),
            gender: vec![Gender::Men, Gender::Women],
            brand: brand.to_string(),
            brand_image_url: Some(format!("https://img.test/{brand}.png")),
            accords: vec!["woody".to_string(), "amber".to_string()],
            bottle_image_url: None,
            rating: rating.to_string(),
            rating_count,
            description: format!("{name} description"),
            reviews: ReviewList::Found(vec![
                ReviewRecord {
                    author: Some("a".to_string()),
                    date: Some("2023-01-01".to_string()),
                    body: Some("first".to_string()),
                },
                ReviewRecord {
                    author: None,
                    date: None,
                    body: Some("second".to_string()),
                },
            ]),
        }
    }

    #[tokio::test]
    async fn test_save_and_find_round_trips_fields() {
        let db = Database::in_memory().await.unwrap();
        let record = perfume("Aventus", "Creed", "4.35", 1200);

        let SaveOutcome::Inserted(id) = db.save_perfume(&record).await.unwrap() else {
            panic!("expected insert");
        };

        let stored = db.find_by_name("Aventus").await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.gender, vec![Gender::Men, Gender::Women]);
        assert_eq!(stored.accords, vec!["woody", "amber"]);
        assert_eq!(stored.rating, Some(4.35));
        assert_eq!(stored.rating_count, 1200);
        assert_eq!(stored.bottle_image_url, None);

        let reviews = db.reviews_for(id).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].body.as_deref(), Some("first"));
        assert_eq!(reviews[1].author, None);
    }

    #[tokio::test]
    async fn test_saving_same_name_twice_keeps_first() {
        let db = Database::in_memory().await.unwrap();
        let record = perfume("Aventus", "Creed", "4.35", 1200);

        let first = db.save_perfume(&record).await.unwrap();
        let SaveOutcome::Inserted(id) = first else {
            panic!("expected insert");
        };
        assert_eq!(
            db.save_perfume(&record).await.unwrap(),
            SaveOutcome::AlreadyStored(id)
        );
        assert_eq!(db.list_all().await.unwrap().len(), 1);
        assert_eq!(db.reviews_for(id).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_of_same_name_insert_once() {
        let dir = tempfile::tempdir().unwrap();
        let db_url = format!("sqlite:{}", dir.path().join("scenty.db").display());
        let db = Database::new(&db_url).await.unwrap();
        let record = perfume("Aventus", "Creed", "4.35", 1200);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                let record = record.clone();
                tokio::spawn(async move { db.save_perfume(&record).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        let inserted: Vec<i64> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                SaveOutcome::Inserted(id) => Some(*id),
                SaveOutcome::AlreadyStored(_) => None,
            })
            .collect();
        assert_eq!(inserted.len(), 1);

        let id = inserted[0];
        assert!(
            outcomes
                .iter()
                .all(|o| *o == SaveOutcome::Inserted(id) || *o == SaveOutcome::AlreadyStored(id)),
            "{outcomes:?}"
        );
        assert_eq!(db.list_all().await.unwrap().len(), 1);
        assert_eq!(db.reviews_for(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_reviews() {
        let db = Database::in_memory().await.unwrap();
        db.save_perfume(&perfume("Aventus", "Creed", "4.35", 1200))
            .await
            .unwrap();

        let id = db.delete_by_name("Aventus").await.unwrap().unwrap();
        assert!(db.find_by_name("Aventus").await.unwrap().is_none());
        assert!(db.reviews_for(id).await.unwrap().is_empty());
        assert_eq!(db.delete_by_name("Aventus").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unparsable_rating_is_stored_as_null() {
        let db = Database::in_memory().await.unwrap();
        db.save_perfume(&perfume("Mystery", "Unknown", "n/a", 3))
            .await
            .unwrap();

        let stored = db.find_by_name("Mystery").await.unwrap().unwrap();
        assert_eq!(stored.rating, None);
    }

    #[tokio::test]
    async fn test_top_rated_and_stats() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.stats().await.unwrap().is_none());

        db.save_perfume(&perfume("Aventus", "Creed", "4.35", 1000))
            .await
            .unwrap();
        db.save_perfume(&perfume("Silver Mountain Water", "Creed", "4.1", 500))
            .await
            .unwrap();
        db.save_perfume(&perfume("Sauvage", "Dior", "3.9", 2001))
            .await
            .unwrap();

        let top: Vec<String> = db
            .top_rated(2)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(top, vec!["Aventus", "Silver Mountain Water"]);

        let stats = db.stats().await.unwrap().unwrap();
        assert_eq!(stats.perfume_count, 3);
        assert_eq!(stats.average_rating, Some(4.12));
        assert_eq!(stats.average_rating_count, 1167.0);
        assert_eq!(stats.top_rated.map(|p| p.name).as_deref(), Some("Aventus"));
        assert_eq!(stats.bottom_rated.map(|p| p.name).as_deref(), Some("Sauvage"));
        assert_eq!(
            stats.brand_distribution,
            vec![
                BrandCount {
                    brand: "Creed".to_string(),
                    count: 2,
                },
                BrandCount {
                    brand: "Dior".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_all_and_random() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.random().await.unwrap().is_none());

        db.save_perfume(&perfume("Aventus", "Creed", "4.35", 1000))
            .await
            .unwrap();
        assert_eq!(db.random().await.unwrap().map(|p| p.name).as_deref(), Some("Aventus"));

        assert_eq!(db.delete_all().await.unwrap(), 1);
        assert!(db.list_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_file_parent() {
        assert_eq!(
            sqlite_file_parent("sqlite:database/scenty.db"),
            Some(Path::new("database"))
        );
        assert_eq!(
            sqlite_file_parent("sqlite://data/x.db?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_file_parent("sqlite:scenty.db"), None);
        assert_eq!(sqlite_file_parent("sqlite::memory:"), None);
    }
}
