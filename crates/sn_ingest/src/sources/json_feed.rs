use std::path::PathBuf;

use async_trait::async_trait;
use sn_core::{RawArticle, Result};

use super::{parse_feed, ArticleSource};

/// A feed export on disk, such as the JSON written by a crawler run.
#[derive(Debug, Clone)]
pub struct JsonFeedSource {
    path: PathBuf,
    name: String,
}

impl JsonFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

#[async_trait]
impl ArticleSource for JsonFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawArticle>> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        parse_feed(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_core::Error;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_reads_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.json");
        std::fs::write(
            &path,
            r#"[{"title": "Memory Care Openings", "url": "https://e.com/a", "author": "Staff", "publication_date": "2025-06-01T08:00:00+00:00"}]"#,
        )
        .unwrap();

        let source = JsonFeedSource::new(&path);
        let items = source.fetch().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].author.as_deref(), Some("Staff"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let source = JsonFeedSource::new(dir.path().join("absent.json"));
        assert!(matches!(source.fetch().await, Err(Error::Io(_))));
    }
}
