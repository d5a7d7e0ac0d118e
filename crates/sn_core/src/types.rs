use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author recorded when a source does not name one.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A stored news article. `url` is the natural key.
///
/// All timestamps are UTC. Sources that publish local or offset-less times are
/// normalised at ingestion, so comparisons never mix regimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    /// Composite score from the last selection run that saw this article.
    pub relevance_score: Option<f64>,
    pub is_selected: bool,
}

impl Article {
    pub fn new(url: impl Into<String>, title: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            author: UNKNOWN_AUTHOR.to_string(),
            published_at,
            relevance_score: None,
            is_selected: false,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// True when the ingestion-owned fields match.
    pub fn same_content(&self, other: &Article) -> bool {
        self.title == other.title
            && self.author == other.author
            && self.published_at == other.published_at
    }
}

/// An article record as emitted by a crawler feed, before cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, alias = "publishedAt", alias = "published_at")]
    pub publication_date: Option<String>,
}

/// Outcome of storing an article under its url.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertStatus {
    New,
    Updated,
    Unchanged,
}

/// What the digest collaborator receives for each selected article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub title: String,
    pub url: String,
    pub relevance_score: f64,
}

impl From<&Article> for DigestEntry {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            relevance_score: article.relevance_score.unwrap_or_default(),
        }
    }
}

/// Batch write produced by one selection run.
///
/// `scores` covers every article in the filtered window; `winners` lists the
/// urls of the new selection generation in rank order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCommit {
    pub scores: Vec<(String, f64)>,
    pub winners: Vec<String>,
}
