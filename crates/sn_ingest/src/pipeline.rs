//! Cleaning of raw feed items into storable articles.
//!
//! Items without a title or a valid http(s) url are dropped. Every accepted
//! timestamp is converted to UTC here; offset-less values are taken to already
//! be UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use sn_core::{Article, RawArticle, UNKNOWN_AUTHOR};
use url::Url;

/// Why a raw item was not turned into an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingTitle,
    MissingUrl,
    InvalidUrl(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::MissingTitle => write!(f, "missing title"),
            DropReason::MissingUrl => write!(f, "missing url"),
            DropReason::InvalidUrl(url) => write!(f, "invalid url {:?}", url),
        }
    }
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a feed timestamp into UTC.
///
/// Accepts RFC 3339 (including a `Z` suffix), RFC 2822, offset-less ISO
/// datetimes and bare `YYYY-MM-DD` dates.
pub fn parse_publication_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Clean one raw item. `fetched_at` stands in for missing or unreadable dates.
pub fn clean(raw: &RawArticle, fetched_at: DateTime<Utc>) -> Result<Article, DropReason> {
    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(DropReason::MissingTitle)?;

    let url = raw
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(DropReason::MissingUrl)?;
    let parsed = Url::parse(url).map_err(|_| DropReason::InvalidUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DropReason::InvalidUrl(url.to_string()));
    }

    let author = raw
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR);

    let published_at = raw
        .publication_date
        .as_deref()
        .and_then(parse_publication_date)
        .unwrap_or(fetched_at);

    Ok(Article::new(url, title, published_at).with_author(author))
}
