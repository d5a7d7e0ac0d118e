use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sn_core::{Article, ArticleStorage, Error, Result, SelectionCommit, UpsertStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        published_at TEXT NOT NULL,
        relevance_score REAL,
        is_selected INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at)
    "#,
    // Add future migrations here
];

/// Timestamps are stored as fixed-width UTC RFC 3339 text, so string order is time order.
fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse stored date {:?}: {}", value, e)))
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Database(format!("{}: {}", context, e))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let published_at: String = row.try_get("published_at").map_err(db_error("Failed to read row"))?;
    Ok(Article {
        url: row.try_get("url").map_err(db_error("Failed to read row"))?,
        title: row.try_get("title").map_err(db_error("Failed to read row"))?,
        author: row.try_get("author").map_err(db_error("Failed to read row"))?,
        published_at: decode_timestamp(&published_at)?,
        relevance_score: row.try_get("relevance_score").map_err(db_error("Failed to read row"))?,
        is_selected: row.try_get::<i64, _>("is_selected").map_err(db_error("Failed to read row"))? != 0,
    })
}

pub struct SQLiteStorage {
    pool: SqlitePool,
    url: String,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::connect(&format!("sqlite:{}", db_path.display())).await
    }

    /// Open (creating if needed) the database at a `sqlite:` url and run migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_error("Invalid database url"))?
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        info!(url, "SQLite storage ready");

        Ok(Self { pool, url: url.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn get_db_path(&self) -> PathBuf {
        PathBuf::from(self.url.trim_start_matches("sqlite://").trim_start_matches("sqlite:"))
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn upsert_article(&self, article: &Article) -> Result<UpsertStatus> {
        let published_at = encode_timestamp(&article.published_at);
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;

        let existing = sqlx::query("SELECT title, author, published_at FROM articles WHERE url = ?")
            .bind(&article.url)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to look up article"))?;

        let status = match existing {
            None => UpsertStatus::New,
            Some(row) => {
                let title: String = row.try_get("title").map_err(db_error("Failed to read row"))?;
                let author: String = row.try_get("author").map_err(db_error("Failed to read row"))?;
                let stored_at: String = row.try_get("published_at").map_err(db_error("Failed to read row"))?;
                if title == article.title && author == article.author && stored_at == published_at {
                    return Ok(UpsertStatus::Unchanged);
                }
                UpsertStatus::Updated
            }
        };

        sqlx::query(
            r#"
            INSERT INTO articles (url, title, author, published_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                published_at = excluded.published_at
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.author)
        .bind(&published_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to store article"))?;

        tx.commit().await.map_err(db_error("Failed to commit article"))?;
        Ok(status)
    }

    async fn get_article(&self, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get article"))?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY published_at DESC, url ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list articles"))?;
        rows.iter().map(row_to_article).collect()
    }

    async fn articles_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE published_at >= ? AND published_at <= ?
            ORDER BY published_at DESC, url ASC
            "#,
        )
        .bind(encode_timestamp(&start))
        .bind(encode_timestamp(&end))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to query articles by date"))?;
        rows.iter().map(row_to_article).collect()
    }

    async fn selected_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE is_selected = 1
            ORDER BY relevance_score DESC, published_at DESC, url ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to get selected articles"))?;
        rows.iter().map(row_to_article).collect()
    }

    async fn apply_selection(&self, commit: &SelectionCommit) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;

        for (url, score) in &commit.scores {
            let updated = sqlx::query("UPDATE articles SET relevance_score = ? WHERE url = ?")
                .bind(*score)
                .bind(url)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to write score"))?;
            if updated.rows_affected() == 0 {
                return Err(Error::Storage(format!("Unknown article in selection: {}", url)));
            }
        }

        sqlx::query("UPDATE articles SET is_selected = 0 WHERE is_selected = 1")
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to clear selection"))?;

        for url in &commit.winners {
            let updated = sqlx::query("UPDATE articles SET is_selected = 1 WHERE url = ?")
                .bind(url)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to mark selection"))?;
            if updated.rows_affected() == 0 {
                return Err(Error::Storage(format!("Unknown article in selection: {}", url)));
            }
        }

        tx.commit().await.map_err(db_error("Failed to commit selection"))?;
        debug!(scored = commit.scores.len(), selected = commit.winners.len(), "Applied selection");
        Ok(())
    }
}
