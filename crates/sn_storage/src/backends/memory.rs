use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sn_core::{Article, ArticleStorage, Error, Result, SelectionCommit, UpsertStatus};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_article(&mut self, article: &Article) -> UpsertStatus {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.url == article.url) {
            if existing.same_content(article) {
                return UpsertStatus::Unchanged;
            }
            existing.title = article.title.clone();
            existing.author = article.author.clone();
            existing.published_at = article.published_at;
            UpsertStatus::Updated
        } else {
            let mut stored = article.clone();
            stored.relevance_score = None;
            stored.is_selected = false;
            self.articles.push(stored);
            UpsertStatus::New
        }
    }

    pub fn get_article(&self, url: &str) -> Option<Article> {
        self.articles.iter().find(|a| a.url == url).cloned()
    }

    fn newest_first<'a>(articles: impl Iterator<Item = &'a Article>) -> Vec<Article> {
        let mut articles: Vec<Article> = articles.cloned().collect();
        articles.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.url.cmp(&b.url))
        });
        articles
    }

    pub fn list_articles(&self) -> Vec<Article> {
        Self::newest_first(self.articles.iter())
    }

    pub fn articles_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Article> {
        Self::newest_first(
            self.articles
                .iter()
                .filter(|a| start <= a.published_at && a.published_at <= end),
        )
    }

    pub fn selected_articles(&self) -> Vec<Article> {
        let mut selected: Vec<Article> = self.articles.iter().filter(|a| a.is_selected).cloned().collect();
        selected.sort_by(|a, b| {
            let score = |x: &Article| x.relevance_score.unwrap_or(f64::MIN);
            score(b)
                .total_cmp(&score(a))
                .then_with(|| b.published_at.cmp(&a.published_at))
                .then_with(|| a.url.cmp(&b.url))
        });
        selected
    }

    /// All-or-nothing: every url is checked before anything is written.
    pub fn apply_selection(&mut self, commit: &SelectionCommit) -> Result<()> {
        let missing = commit
            .scores
            .iter()
            .map(|(url, _)| url)
            .chain(commit.winners.iter())
            .find(|url| !self.articles.iter().any(|a| &a.url == *url));
        if let Some(url) = missing {
            return Err(Error::Storage(format!("Unknown article in selection: {}", url)));
        }

        for (url, score) in &commit.scores {
            if let Some(article) = self.articles.iter_mut().find(|a| &a.url == url) {
                article.relevance_score = Some(*score);
            }
        }
        for article in self.articles.iter_mut() {
            article.is_selected = commit.winners.contains(&article.url);
        }
        debug!(scored = commit.scores.len(), selected = commit.winners.len(), "Applied selection");
        Ok(())
    }
}

/// Process-local store. Each method takes the lock once, so a selection
/// commit is never observed half applied.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    store: RwLock<MemoryStore>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn upsert_article(&self, article: &Article) -> Result<UpsertStatus> {
        let mut store = self.store.write().await;
        Ok(store.upsert_article(article))
    }

    async fn get_article(&self, url: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.get_article(url))
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list_articles())
    }

    async fn articles_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.articles_between(start, end))
    }

    async fn selected_articles(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.selected_articles())
    }

    async fn apply_selection(&self, commit: &SelectionCommit) -> Result<()> {
        let mut store = self.store.write().await;
        store.apply_selection(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = InMemoryStorage::new();
        let article = Article::new("https://e.com/a", "Memory Care Openings", at(1)).with_author("Jane Doe");

        assert_eq!(storage.upsert_article(&article).await.unwrap(), UpsertStatus::New);
        let stored = storage.get_article("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(stored, article);
        assert!(storage.get_article("https://e.com/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_title_without_duplicate() {
        let storage = InMemoryStorage::new();
        let article = Article::new("https://e.com/a", "Old Title", at(1));
        storage.upsert_article(&article).await.unwrap();

        let renamed = Article::new("https://e.com/a", "New Title", at(1));
        assert_eq!(storage.upsert_article(&renamed).await.unwrap(), UpsertStatus::Updated);
        assert_eq!(storage.upsert_article(&renamed).await.unwrap(), UpsertStatus::Unchanged);

        let all = storage.list_articles().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New Title");
    }

    #[tokio::test]
    async fn test_upsert_keeps_score_and_flag() {
        let storage = InMemoryStorage::new();
        storage.upsert_article(&Article::new("https://e.com/a", "Title", at(1))).await.unwrap();
        storage
            .apply_selection(&SelectionCommit {
                scores: vec![("https://e.com/a".to_string(), 0.9)],
                winners: vec!["https://e.com/a".to_string()],
            })
            .await
            .unwrap();

        storage.upsert_article(&Article::new("https://e.com/a", "Retitled", at(1))).await.unwrap();
        let stored = storage.get_article("https://e.com/a").await.unwrap().unwrap();
        assert_eq!(stored.title, "Retitled");
        assert_eq!(stored.relevance_score, Some(0.9));
        assert!(stored.is_selected);
    }

    #[tokio::test]
    async fn test_articles_between_is_inclusive() {
        let storage = InMemoryStorage::new();
        for day in 1..=5 {
            let article = Article::new(format!("https://e.com/{}", day), "Title", at(day));
            storage.upsert_article(&article).await.unwrap();
        }
        let found = storage.articles_between(at(2), at(4)).await.unwrap();
        let urls: Vec<_> = found.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://e.com/4", "https://e.com/3", "https://e.com/2"]);

        let none = storage
            .articles_between(at(5) + Duration::seconds(1), at(5) + Duration::days(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_apply_selection_replaces_generation() {
        let storage = InMemoryStorage::new();
        for day in 1..=3 {
            let article = Article::new(format!("https://e.com/{}", day), "Title", at(day));
            storage.upsert_article(&article).await.unwrap();
        }
        storage
            .apply_selection(&SelectionCommit {
                scores: vec![("https://e.com/1".to_string(), 0.5)],
                winners: vec!["https://e.com/1".to_string()],
            })
            .await
            .unwrap();
        storage
            .apply_selection(&SelectionCommit {
                scores: vec![("https://e.com/2".to_string(), 0.4), ("https://e.com/3".to_string(), 0.8)],
                winners: vec!["https://e.com/3".to_string(), "https://e.com/2".to_string()],
            })
            .await
            .unwrap();

        let selected = storage.selected_articles().await.unwrap();
        let urls: Vec<_> = selected.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://e.com/3", "https://e.com/2"]);
        let first = storage.get_article("https://e.com/1").await.unwrap().unwrap();
        assert!(!first.is_selected);
        assert_eq!(first.relevance_score, Some(0.5));
    }

    #[tokio::test]
    async fn test_apply_selection_with_unknown_url_changes_nothing() {
        let storage = InMemoryStorage::new();
        storage.upsert_article(&Article::new("https://e.com/1", "Title", at(1))).await.unwrap();
        let err = storage
            .apply_selection(&SelectionCommit {
                scores: vec![("https://e.com/1".to_string(), 0.5)],
                winners: vec!["https://e.com/ghost".to_string()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        let stored = storage.get_article("https://e.com/1").await.unwrap().unwrap();
        assert_eq!(stored.relevance_score, None);
    }
}
