use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::types::{Article, SelectionCommit, UpsertStatus};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert an article, or update the content fields of the one already stored under its url.
    /// Score and selection fields of an existing record are left alone.
    async fn upsert_article(&self, article: &Article) -> Result<UpsertStatus>;

    /// Look up a single article by url
    async fn get_article(&self, url: &str) -> Result<Option<Article>>;

    /// All articles, newest first
    async fn list_articles(&self) -> Result<Vec<Article>>;

    /// Articles published within `[start, end]`, both ends inclusive, newest first
    async fn articles_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Article>>;

    /// The current selection generation, highest score first
    async fn selected_articles(&self) -> Result<Vec<Article>>;

    /// Write scores and replace the selection generation in one atomic step.
    /// Every article outside `commit.winners` ends up with `is_selected = false`.
    async fn apply_selection(&self, commit: &SelectionCommit) -> Result<()>;
}
