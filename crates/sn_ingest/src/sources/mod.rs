use async_trait::async_trait;
use serde::Deserialize;
use sn_core::{Error, RawArticle, Result};
use url::Url;

pub mod http_feed;
pub mod json_feed;

pub use http_feed::HttpFeedSource;
pub use json_feed::JsonFeedSource;

/// Produces raw article records for the ingestion pipeline.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Human readable name, also used as the log prefix
    fn name(&self) -> &str;

    /// Fetch every item the source currently offers
    async fn fetch(&self) -> Result<Vec<RawArticle>>;
}

/// Feeds are either a bare array of items (crawler exports) or an object with
/// an `articles` array (news search APIs).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    Items(Vec<RawArticle>),
    Wrapped { articles: Vec<RawArticle> },
}

pub fn parse_feed(body: &str) -> Result<Vec<RawArticle>> {
    let document: FeedDocument = serde_json::from_str(body)
        .map_err(|e| Error::Ingestion(format!("Unrecognised feed document: {}", e)))?;
    Ok(match document {
        FeedDocument::Items(items) => items,
        FeedDocument::Wrapped { articles } => articles,
    })
}

/// Build a source from a configured location: http(s) urls are fetched,
/// anything else is read as a file path.
pub fn from_location(location: &str) -> Result<Box<dyn ArticleSource>> {
    let location = location.trim();
    if location.is_empty() {
        return Err(Error::Ingestion("Empty feed location".to_string()));
    }
    match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Box::new(HttpFeedSource::new(url))),
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| Error::Ingestion(format!("Invalid file url: {}", location)))?;
            Ok(Box::new(JsonFeedSource::new(path)))
        }
        Ok(url) if url.scheme().len() > 1 => Err(Error::Ingestion(format!(
            "Unsupported feed scheme: {}",
            url.scheme()
        ))),
        _ => Ok(Box::new(JsonFeedSource::new(location))),
    }
}
