//! Selection runs against an article store.
//!
//! A run moves through
//! `Idle → Filtering → Scoring → Selecting → Committing → Idle`.
//! Scores and the winner set are computed completely in memory; the store only
//! sees one [`SelectionCommit`], applied atomically. A failure before that
//! point ends in `RolledBack` with the store untouched.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sn_core::{Article, ArticleStorage, Error, Result};
use tracing::{debug, info, warn};

use crate::engine::{Ranking, RankingEngine};
use crate::relevance::RelevanceScorer;
use crate::window::{DateWindow, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Filtering,
    Scoring,
    Selecting,
    Committing,
    RolledBack,
}

impl fmt::Display for SelectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionPhase::Idle => "idle",
            SelectionPhase::Filtering => "filtering",
            SelectionPhase::Scoring => "scoring",
            SelectionPhase::Selecting => "selecting",
            SelectionPhase::Committing => "committing",
            SelectionPhase::RolledBack => "rolled-back",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Length of the trailing window used when no dates are given.
    pub window_days: i64,
    pub keywords: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            keywords: RelevanceScorer::default().keywords().to_vec(),
        }
    }
}

/// Result of a successful run. An empty `articles` list means nothing was
/// published inside the window.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub window: DateWindow,
    pub candidates: usize,
    pub articles: Vec<Article>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

pub struct ArticleSelector {
    storage: Arc<dyn ArticleStorage>,
    engine: RankingEngine,
    window_days: i64,
}

impl fmt::Debug for ArticleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleSelector")
            .field("storage", &"<dyn ArticleStorage>")
            .field("engine", &self.engine)
            .field("window_days", &self.window_days)
            .finish()
    }
}

impl ArticleSelector {
    pub fn new(storage: Arc<dyn ArticleStorage>, config: SelectorConfig) -> Result<Self> {
        if !(1..=MAX_WINDOW_DAYS).contains(&config.window_days) {
            return Err(Error::InvalidParameter(format!(
                "window_days must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS, config.window_days
            )));
        }
        let scorer = RelevanceScorer::new(config.keywords)?;
        Ok(Self {
            storage,
            engine: RankingEngine::new(scorer),
            window_days: config.window_days,
        })
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    /// Select the top `limit` articles for the window described by the optional
    /// `YYYY-MM-DD` dates. Parameters are validated before the store is read.
    pub async fn select(
        &self,
        limit: usize,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Selection> {
        self.select_at(limit, start_date, end_date, Utc::now()).await
    }

    /// [`ArticleSelector::select`] with an explicit notion of "now".
    pub async fn select_at(
        &self,
        limit: usize,
        start_date: Option<&str>,
        end_date: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Selection> {
        let limit = RankingEngine::validate_limit(limit)?;
        let window = DateWindow::from_dates(start_date, end_date, now, self.window_days)?;
        self.select_window(limit, window).await
    }

    pub async fn select_window(&self, limit: usize, window: DateWindow) -> Result<Selection> {
        let limit = RankingEngine::validate_limit(limit)?;
        let mut phase = SelectionPhase::Idle;

        advance(&mut phase, SelectionPhase::Filtering);
        let candidates = self
            .storage
            .articles_between(window.start(), window.end())
            .await?;

        let ranking = if candidates.is_empty() {
            info!(start = %window.start(), end = %window.end(), "No articles published in window");
            Ranking::default()
        } else {
            advance(&mut phase, SelectionPhase::Scoring);
            match self.engine.rank(candidates, &window, limit) {
                Ok(ranking) => ranking,
                Err(e) => {
                    advance(&mut phase, SelectionPhase::RolledBack);
                    warn!(error = %e, "Scoring failed, nothing written");
                    advance(&mut phase, SelectionPhase::Idle);
                    return Err(Error::scoring(e));
                }
            }
        };

        // An empty ranking still commits: the previous generation is cleared.
        advance(&mut phase, SelectionPhase::Selecting);
        let commit = ranking.commit();

        advance(&mut phase, SelectionPhase::Committing);
        if let Err(e) = self.storage.apply_selection(&commit).await {
            advance(&mut phase, SelectionPhase::RolledBack);
            warn!(error = %e, "Selection commit failed");
            advance(&mut phase, SelectionPhase::Idle);
            return Err(match e {
                Error::Storage(_) => e,
                other => Error::Storage(other.to_string()),
            });
        }

        let candidates = ranking.candidates();
        let articles = ranking.into_selected();
        info!(limit, candidates, selected = articles.len(), "Selected top articles");
        advance(&mut phase, SelectionPhase::Idle);

        Ok(Selection { window, candidates, articles })
    }
}

fn advance(phase: &mut SelectionPhase, next: SelectionPhase) {
    debug!(from = %phase, to = %next, "Selection phase");
    *phase = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use sn_core::{SelectionCommit, UpsertStatus};
    use sn_storage::InMemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    async fn seeded() -> Arc<InMemoryStorage> {
        let storage = Arc::new(InMemoryStorage::new());
        for (url, title, age) in [
            ("https://e.com/1", "Memory Care Expansion", 0),
            ("https://e.com/2", "Senior Housing Investment", 1),
            ("https://e.com/3", "Local Election Results", 2),
        ] {
            let article = Article::new(url, title, now() - Duration::days(age));
            storage.upsert_article(&article).await.unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn test_select_marks_winners() {
        let storage = seeded().await;
        let selector = ArticleSelector::new(storage.clone(), SelectorConfig::default()).unwrap();
        let selection = selector.select_at(2, None, None, now()).await.unwrap();

        assert_eq!(selection.candidates, 3);
        assert_eq!(selection.articles.len(), 2);
        let selected = storage.selected_articles().await.unwrap();
        let urls: Vec<_> = selected.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://e.com/2", "https://e.com/1"]);

        let loser = storage.get_article("https://e.com/3").await.unwrap().unwrap();
        assert!(!loser.is_selected);
        assert!(loser.relevance_score.is_some());
    }

    #[tokio::test]
    async fn test_zero_limit_fails_before_reading() {
        let storage = seeded().await;
        let selector = ArticleSelector::new(storage.clone(), SelectorConfig::default()).unwrap();
        let err = selector.select_at(0, None, None, now()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(storage
            .list_articles()
            .await
            .unwrap()
            .iter()
            .all(|a| !a.is_selected && a.relevance_score.is_none()));
    }

    #[tokio::test]
    async fn test_empty_window_clears_previous_generation() {
        let storage = seeded().await;
        let selector = ArticleSelector::new(storage.clone(), SelectorConfig::default()).unwrap();
        selector.select_at(1, None, None, now()).await.unwrap();
        assert_eq!(storage.selected_articles().await.unwrap().len(), 1);

        let selection = selector
            .select_at(5, Some("2020-01-01"), Some("2020-01-31"), now())
            .await
            .unwrap();
        assert!(selection.is_empty());
        assert_eq!(selection.candidates, 0);
        assert!(storage.selected_articles().await.unwrap().is_empty());
    }

    #[test]
    fn test_config_validation() {
        let storage: Arc<dyn ArticleStorage> = Arc::new(InMemoryStorage::new());
        let config = SelectorConfig { window_days: 0, ..SelectorConfig::default() };
        assert!(ArticleSelector::new(storage.clone(), config).is_err());
        let config = SelectorConfig { window_days: 100_000_000, ..SelectorConfig::default() };
        assert!(matches!(
            ArticleSelector::new(storage.clone(), config),
            Err(Error::InvalidParameter(_))
        ));
        let config = SelectorConfig { window_days: MAX_WINDOW_DAYS, ..SelectorConfig::default() };
        assert!(ArticleSelector::new(storage.clone(), config).is_ok());
        let config = SelectorConfig { keywords: vec![], ..SelectorConfig::default() };
        assert!(ArticleSelector::new(storage, config).is_err());
    }

    /// Store whose commits always fail, counting how many were attempted.
    struct FailingCommitStorage {
        inner: InMemoryStorage,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ArticleStorage for FailingCommitStorage {
        async fn upsert_article(&self, article: &Article) -> Result<UpsertStatus> {
            self.inner.upsert_article(article).await
        }

        async fn get_article(&self, url: &str) -> Result<Option<Article>> {
            self.inner.get_article(url).await
        }

        async fn list_articles(&self) -> Result<Vec<Article>> {
            self.inner.list_articles().await
        }

        async fn articles_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Article>> {
            self.inner.articles_between(start, end).await
        }

        async fn selected_articles(&self) -> Result<Vec<Article>> {
            self.inner.selected_articles().await
        }

        async fn apply_selection(&self, _commit: &SelectionCommit) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(Error::Database("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces_storage_error() {
        let storage = Arc::new(FailingCommitStorage {
            inner: InMemoryStorage::new(),
            attempts: AtomicUsize::new(0),
        });
        let article = Article::new("https://e.com/1", "Memory Care", now());
        storage.upsert_article(&article).await.unwrap();

        let selector = ArticleSelector::new(storage.clone(), SelectorConfig::default()).unwrap();
        let err = selector.select_at(1, None, None, now()).await.unwrap_err();
        assert!(matches!(err, Error::Storage(ref m) if m.contains("disk full")));
        assert_eq!(storage.attempts.load(Ordering::SeqCst), 1);
        assert!(storage.selected_articles().await.unwrap().is_empty());
    }
}
