//! Composite ranking of a candidate batch.
//!
//! ```text
//! candidates ──► window filter ──► recency (min/max span)
//!                      │
//!                      └──────────► relevance (keyword tf-idf)
//!                                        │
//!            score = 0.7 · relevance + 0.3 · recency
//!                                        │
//!            sort: score ↓, published_at ↓, url ↑  ──► top `limit`
//! ```
//!
//! Everything here is synchronous and side-effect free; persisting the result
//! is the job of [`crate::selector::ArticleSelector`].

use std::cmp::Ordering;

use serde::Serialize;
use sn_core::{Article, Error, Result, SelectionCommit};

use crate::recency::recency_scores;
use crate::relevance::RelevanceScorer;
use crate::window::DateWindow;

pub const RELEVANCE_WEIGHT: f64 = 0.7;
pub const RECENCY_WEIGHT: f64 = 0.3;

pub fn composite_score(relevance: f64, recency: f64) -> f64 {
    RELEVANCE_WEIGHT * relevance + RECENCY_WEIGHT * recency
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredArticle {
    pub article: Article,
    pub relevance: f64,
    pub recency: f64,
    pub score: f64,
}

/// Every windowed candidate in rank order, plus the cut-off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    ranked: Vec<ScoredArticle>,
    limit: usize,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Number of windowed candidates that were scored.
    pub fn candidates(&self) -> usize {
        self.ranked.len()
    }

    pub fn ranked(&self) -> &[ScoredArticle] {
        &self.ranked
    }

    /// The top `limit` entries, or all of them when there are fewer.
    pub fn selected(&self) -> &[ScoredArticle] {
        &self.ranked[..self.limit.min(self.ranked.len())]
    }

    /// Scores for every candidate and the winners, ready for storage.
    pub fn commit(&self) -> SelectionCommit {
        SelectionCommit {
            scores: self
                .ranked
                .iter()
                .map(|s| (s.article.url.clone(), s.score))
                .collect(),
            winners: self.selected().iter().map(|s| s.article.url.clone()).collect(),
        }
    }

    /// Selected articles carrying their fresh score and selection flag.
    pub fn into_selected(mut self) -> Vec<Article> {
        self.ranked.truncate(self.limit);
        self.ranked
            .into_iter()
            .map(|s| {
                let mut article = s.article;
                article.relevance_score = Some(s.score);
                article.is_selected = true;
                article
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    scorer: RelevanceScorer,
}

impl RankingEngine {
    pub fn new(scorer: RelevanceScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn validate_limit(limit: usize) -> Result<usize> {
        if limit == 0 {
            return Err(Error::InvalidParameter("limit must be a positive integer".to_string()));
        }
        Ok(limit)
    }

    /// Rank the candidates that fall inside `window` and cut the list at `limit`.
    ///
    /// An empty window yields an empty [`Ranking`], not an error.
    pub fn rank(&self, candidates: Vec<Article>, window: &DateWindow, limit: usize) -> Result<Ranking> {
        let limit = Self::validate_limit(limit)?;

        let retained: Vec<Article> = candidates
            .into_iter()
            .filter(|a| window.contains(a.published_at))
            .collect();
        if retained.is_empty() {
            return Ok(Ranking { ranked: Vec::new(), limit });
        }

        let dates: Vec<_> = retained.iter().map(|a| a.published_at).collect();
        let recency = recency_scores(&dates);

        let titles: Vec<&str> = retained.iter().map(|a| a.title.as_str()).collect();
        let relevance = self.scorer.score(&titles)?;

        let mut ranked: Vec<ScoredArticle> = retained
            .into_iter()
            .zip(relevance)
            .zip(recency)
            .map(|((article, relevance), recency)| ScoredArticle {
                article,
                relevance,
                recency,
                score: composite_score(relevance, recency),
            })
            .collect();

        for scored in &ranked {
            if !scored.score.is_finite() {
                return Err(Error::Input(format!(
                    "non-finite score for {}",
                    scored.article.url
                )));
            }
        }

        ranked.sort_by(rank_order);
        Ok(Ranking { ranked, limit })
    }
}

/// Higher score first, then the more recent article, then url for a total order.
fn rank_order(a: &ScoredArticle, b: &ScoredArticle) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.article.published_at.cmp(&a.article.published_at))
        .then_with(|| a.article.url.cmp(&b.article.url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn article(url: &str, title: &str, published_at: DateTime<Utc>) -> Article {
        Article::new(url, title, published_at)
    }

    fn window() -> DateWindow {
        DateWindow::trailing_days(now(), 7).unwrap()
    }

    #[test]
    fn test_weights() {
        assert_eq!(composite_score(1.0, 0.0), 0.7);
        assert_eq!(composite_score(0.0, 1.0), 0.3);
        assert_eq!(RELEVANCE_WEIGHT + RECENCY_WEIGHT, 1.0);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let engine = RankingEngine::default();
        let err = engine.rank(vec![], &window(), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_empty_window_is_empty_ranking() {
        let engine = RankingEngine::default();
        let stale = article("https://e.com/old", "Memory Care", now() - Duration::days(30));
        let ranking = engine.rank(vec![stale], &window(), 5).unwrap();
        assert!(ranking.is_empty());
        assert!(ranking.selected().is_empty());
        assert_eq!(ranking.commit(), SelectionCommit::default());
    }

    #[test]
    fn test_relevance_beats_recency_tie() {
        let engine = RankingEngine::default();
        let candidates = vec![
            article("https://e.com/1", "Senior Living Trends 2025", now()),
            article("https://e.com/2", "Assisted Care Tips", now() - Duration::days(3)),
            article("https://e.com/3", "Unrelated Sports Recap", now()),
        ];
        let ranking = engine.rank(candidates, &window(), 2).unwrap();

        let urls: Vec<_> = ranking.selected().iter().map(|s| s.article.url.as_str()).collect();
        assert_eq!(urls, vec!["https://e.com/1", "https://e.com/2"]);
        assert_eq!(ranking.candidates(), 3);
        assert_eq!(ranking.ranked()[2].relevance, 0.0);
        assert_eq!(ranking.ranked()[2].recency, 1.0);
        assert_eq!(ranking.ranked()[1].recency, 0.0);
    }

    #[test]
    fn test_limit_larger_than_candidates() {
        let engine = RankingEngine::default();
        let candidates = vec![
            article("https://e.com/a", "Nursing Staff Shortage", now() - Duration::days(1)),
            article("https://e.com/b", "Memory Care Design", now()),
        ];
        let ranking = engine.rank(candidates, &window(), 10).unwrap();
        assert_eq!(ranking.selected().len(), 2);
        let selected = ranking.into_selected();
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|a| a.is_selected && a.relevance_score.is_some()));
    }

    #[test]
    fn test_ties_break_on_recency_then_url() {
        let engine = RankingEngine::default();
        let at = now() - Duration::hours(2);
        let candidates = vec![
            article("https://e.com/z", "Football Recap", at),
            article("https://e.com/a", "Football Recap", at),
            article("https://e.com/m", "Football Recap", at),
        ];
        let ranking = engine.rank(candidates, &window(), 3).unwrap();
        let urls: Vec<_> = ranking.ranked().iter().map(|s| s.article.url.as_str()).collect();
        assert_eq!(urls, vec!["https://e.com/a", "https://e.com/m", "https://e.com/z"]);
        assert!(ranking.ranked().iter().all(|s| s.score == 0.3));
    }

    #[test]
    fn test_commit_scores_every_candidate() {
        let engine = RankingEngine::default();
        let candidates = vec![
            article("https://e.com/1", "Senior Housing Investment", now()),
            article("https://e.com/2", "Wellness Programs for Residents", now() - Duration::days(1)),
            article("https://e.com/3", "Stock Market Today", now() - Duration::days(2)),
        ];
        let commit = engine.rank(candidates, &window(), 1).unwrap().commit();
        assert_eq!(commit.scores.len(), 3);
        assert_eq!(commit.winners, vec!["https://e.com/1".to_string()]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let engine = RankingEngine::default();
        let candidates = vec![
            article("https://e.com/1", "Retirement Community Opens", now() - Duration::days(2)),
            article("https://e.com/2", "Elderly Care Technology", now() - Duration::days(1)),
            article("https://e.com/3", "Healthcare Policy Update", now()),
        ];
        let first = engine.rank(candidates.clone(), &window(), 2).unwrap();
        let second = engine.rank(candidates, &window(), 2).unwrap();
        assert_eq!(first, second);
    }
}
