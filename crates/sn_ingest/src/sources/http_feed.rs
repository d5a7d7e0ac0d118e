use std::time::Duration;

use async_trait::async_trait;
use sn_core::{RawArticle, Result};
use tracing::debug;
use url::Url;

use super::{parse_feed, ArticleSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A JSON feed served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    url: Url,
    name: String,
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(url: Url) -> Self {
        let name = url.to_string();
        Self {
            url,
            name,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ArticleSource for HttpFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawArticle>> {
        debug!(url = %self.url, "Fetching feed");
        let body = self
            .client
            .get(self.url.clone())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_feed(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_url() {
        let source = HttpFeedSource::new(Url::parse("https://feeds.test/senior.json").unwrap());
        assert_eq!(source.name(), "https://feeds.test/senior.json");
        assert_eq!(source.url().host_str(), Some("feeds.test"));
    }
}
