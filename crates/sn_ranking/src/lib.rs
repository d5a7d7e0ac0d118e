//! Article ranking: keyword relevance, recency and top-N selection.

pub mod engine;
pub mod recency;
pub mod relevance;
pub mod selector;
pub mod text;
pub mod tfidf;
pub mod window;

pub use engine::{composite_score, Ranking, RankingEngine, ScoredArticle, RECENCY_WEIGHT, RELEVANCE_WEIGHT};
pub use relevance::{RelevanceScorer, INDUSTRY_KEYWORDS};
pub use selector::{ArticleSelector, Selection, SelectionPhase, SelectorConfig};
pub use window::{DateWindow, DATE_FORMAT, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};

pub mod prelude {
    pub use super::{ArticleSelector, DateWindow, RankingEngine, RelevanceScorer, Selection, SelectorConfig};
    pub use sn_core::{Article, Error, Result};
}
