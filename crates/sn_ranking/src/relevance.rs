//! Title relevance against the industry keyword list.
//!
//! The keyword phrases are joined into a single reference document. A fresh
//! vector space is fitted over every title plus that reference on each call,
//! and each title is scored by its cosine similarity to the reference.
//!
//! [`RelevanceScorer::score`] then rescales the batch so the closest title
//! scores 1. Absolute cosine values against an 18-phrase reference are small
//! (rarely above 0.3 for a short headline), which would let the 0.3 recency
//! weight swamp relevance entirely; rescaling puts both signals on the same
//! `[0, 1]` footing before they are combined.

use sn_core::{Error, Result};

use crate::tfidf::TfidfVectorizer;

/// Default vocabulary of the senior living industry.
pub const INDUSTRY_KEYWORDS: &[&str] = &[
    "senior living",
    "retirement",
    "assisted living",
    "memory care",
    "senior housing",
    "healthcare",
    "nursing",
    "elderly",
    "aging",
    "community",
    "wellness",
    "care",
    "facility",
    "residents",
    "technology",
    "innovation",
    "development",
    "investment",
];

#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    keywords: Vec<String>,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self {
            keywords: INDUSTRY_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl RelevanceScorer {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(Error::Input("keyword list is empty".to_string()));
        }
        Ok(Self { keywords })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn reference_text(&self) -> String {
        self.keywords.join(" ")
    }

    /// Raw cosine similarity of each title to the keyword reference.
    pub fn similarities<S: AsRef<str>>(&self, titles: &[S]) -> Result<Vec<f64>> {
        validate_titles(titles)?;

        let reference = self.reference_text();
        let mut corpus: Vec<&str> = titles.iter().map(AsRef::as_ref).collect();
        corpus.push(&reference);

        let vectorizer = TfidfVectorizer::fit(&corpus);
        let reference_vector = vectorizer.transform(&reference);

        Ok(titles
            .iter()
            .map(|title| vectorizer.transform(title.as_ref()).cosine(&reference_vector))
            .collect())
    }

    /// One relevance score per title in `[0, 1]`, relative to the best title in the batch.
    /// A batch with no keyword overlap at all scores 0 everywhere.
    ///
    /// These are not absolute cosine values: the best title always scores 1, even
    /// when it shares a single generic keyword. Use [`RelevanceScorer::similarities`]
    /// for the raw cosine.
    pub fn score<S: AsRef<str>>(&self, titles: &[S]) -> Result<Vec<f64>> {
        let similarities = self.similarities(titles)?;
        let best = similarities.iter().copied().fold(0.0f64, f64::max);
        if best <= 0.0 {
            return Ok(vec![0.0; similarities.len()]);
        }
        Ok(similarities.into_iter().map(|s| s / best).collect())
    }
}

fn validate_titles<S: AsRef<str>>(titles: &[S]) -> Result<()> {
    if titles.is_empty() {
        return Err(Error::Input("no titles to score".to_string()));
    }
    if let Some(position) = titles.iter().position(|t| t.as_ref().trim().is_empty()) {
        return Err(Error::Input(format!("title at position {} is blank", position)));
    }
    Ok(())
}
