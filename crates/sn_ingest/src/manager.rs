use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use sn_core::{Article, ArticleStorage, Error, RawArticle, Result, UpsertStatus};

use crate::logging::Logger;
use crate::pipeline::clean;
use crate::sources::ArticleSource;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub dropped: usize,
    /// Sources that could not be fetched, with the reason.
    pub failed_sources: Vec<(String, String)>,
    #[serde(skip)]
    pub stored: Vec<(Article, UpsertStatus)>,
}

impl IngestReport {
    pub fn stored_count(&self) -> usize {
        self.new + self.updated + self.unchanged
    }

    fn record(&mut self, article: Article, status: UpsertStatus) {
        match status {
            UpsertStatus::New => self.new += 1,
            UpsertStatus::Updated => self.updated += 1,
            UpsertStatus::Unchanged => self.unchanged += 1,
        }
        self.stored.push((article, status));
    }

    fn merge(&mut self, other: IngestReport) {
        self.new += other.new;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.dropped += other.dropped;
        self.failed_sources.extend(other.failed_sources);
        self.stored.extend(other.stored);
    }
}

pub struct IngestManager {
    storage: Arc<dyn ArticleStorage>,
    sources: Vec<Box<dyn ArticleSource>>,
    logger: Logger,
}

impl IngestManager {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self {
            storage,
            sources: Vec::new(),
            logger: Logger::new().with_prefix("📥".to_string()),
        }
    }

    pub fn add_source(&mut self, source: Box<dyn ArticleSource>) {
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Clean and upsert a batch of raw items. Items that fail cleaning are
    /// counted as dropped; a storage failure aborts the batch.
    pub async fn ingest_raw(&self, source: &str, items: Vec<RawArticle>) -> Result<IngestReport> {
        let logger = self.logger.clone().with_prefix(format!("[{}]", source));
        let fetched_at = Utc::now();
        let mut report = IngestReport::default();

        for raw in &items {
            match clean(raw, fetched_at) {
                Ok(article) => {
                    let status = self.storage.upsert_article(&article).await?;
                    report.record(article, status);
                }
                Err(reason) => {
                    logger.debug(&format!("Dropped item: {}", reason));
                    report.dropped += 1;
                }
            }
        }

        if report.stored_count() == 0 && report.dropped > 0 {
            logger.warn(&format!("Every item was dropped ({})", report.dropped));
        }
        logger.info(&format!(
            "{} new, {} updated, {} unchanged, {} dropped",
            report.new, report.updated, report.unchanged, report.dropped
        ));
        Ok(report)
    }

    /// Fetch and store an unregistered source.
    pub async fn ingest_from(&self, source: &dyn ArticleSource) -> Result<IngestReport> {
        let items = source.fetch().await?;
        self.ingest_raw(source.name(), items).await
    }

    /// Fetch one registered source by name.
    pub async fn ingest_source(&self, name: &str) -> Result<IngestReport> {
        let source = self
            .sources
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::Ingestion(format!("No source named {}", name)))?;
        self.ingest_from(source.as_ref()).await
    }

    /// Fetch every registered source concurrently. A source that fails to
    /// fetch is reported and skipped; storage failures abort the run.
    pub async fn ingest_all(&self) -> Result<IngestReport> {
        let fetches = self.sources.iter().map(|source| async move {
            (source.name().to_string(), source.fetch().await)
        });

        let mut report = IngestReport::default();
        for (name, fetched) in join_all(fetches).await {
            match fetched {
                Ok(items) => report.merge(self.ingest_raw(&name, items).await?),
                Err(e) => {
                    self.logger
                        .clone()
                        .with_prefix(format!("[{}]", name))
                        .error(&format!("Failed to fetch: {}", e));
                    report.failed_sources.push((name, e.to_string()));
                }
            }
        }

        self.logger.clone().with_new_prefixes("📦".to_string()).info(&format!(
            "{} sources: {} stored, {} dropped, {} failed",
            self.sources.len(),
            report.stored_count(),
            report.dropped,
            report.failed_sources.len()
        ));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sn_storage::InMemoryStorage;

    struct StaticSource {
        name: &'static str,
        items: Vec<RawArticle>,
    }

    #[async_trait]
    impl ArticleSource for StaticSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<Vec<RawArticle>> {
            Ok(self.items.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl ArticleSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch(&self) -> Result<Vec<RawArticle>> {
            Err(Error::Ingestion("connection refused".to_string()))
        }
    }

    fn item(title: &str, url: &str) -> RawArticle {
        RawArticle {
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            author: None,
            publication_date: Some("2025-06-01T08:00:00Z".to_string()),
        }
    }

    #[tokio::test]
    async fn test_ingest_raw_counts_statuses() {
        let storage = Arc::new(InMemoryStorage::new());
        let manager = IngestManager::new(storage.clone());

        let report = manager
            .ingest_raw("test", vec![item("A", "https://e.com/a"), item("B", "https://e.com/b"), RawArticle::default()])
            .await
            .unwrap();
        assert_eq!((report.new, report.updated, report.unchanged, report.dropped), (2, 0, 0, 1));

        let report = manager
            .ingest_raw("test", vec![item("A", "https://e.com/a"), item("B renamed", "https://e.com/b")])
            .await
            .unwrap();
        assert_eq!((report.new, report.updated, report.unchanged), (0, 1, 1));
        assert_eq!(report.stored_count(), 2);

        let stored = storage.list_articles().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|a| a.title == "B renamed"));
    }

    #[tokio::test]
    async fn test_ingest_all_skips_failing_sources() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut manager = IngestManager::new(storage.clone());
        manager.add_source(Box::new(StaticSource {
            name: "static",
            items: vec![item("Memory Care Openings", "https://e.com/a")],
        }));
        manager.add_source(Box::new(BrokenSource));
        assert_eq!(manager.source_names(), vec!["static", "broken"]);

        let report = manager.ingest_all().await.unwrap();
        assert_eq!(report.new, 1);
        assert_eq!(report.failed_sources.len(), 1);
        assert_eq!(report.failed_sources[0].0, "broken");
        assert_eq!(storage.list_articles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_source_by_name() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut manager = IngestManager::new(storage);
        manager.add_source(Box::new(StaticSource {
            name: "static",
            items: vec![item("A", "https://e.com/a")],
        }));

        assert_eq!(manager.ingest_source("static").await.unwrap().new, 1);
        assert!(matches!(manager.ingest_source("missing").await, Err(Error::Ingestion(_))));
        assert!(matches!(
            manager.ingest_source("static").await.map(|r| r.unchanged),
            Ok(1)
        ));
    }
}
