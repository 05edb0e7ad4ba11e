use anyhow::{Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::HnError;
use crate::models::{Item, SearchResponse, User};
use crate::rate_limit::RateLimiter;

/// Ranked story id lists published by the Firebase API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryFeed {
    Top,
    New,
    Ask,
}

impl StoryFeed {
    fn endpoint(self) -> &'static str {
        match self {
            StoryFeed::Top => "topstories.json",
            StoryFeed::New => "newstories.json",
            StoryFeed::Ask => "askstories.json",
        }
    }
}

/// Query parameters for the Algolia search endpoint.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub tags: Option<String>,
    pub numeric_filters: Option<String>,
    pub hits_per_page: u32,
}

/// Shared HTTP client for the Hacker News Firebase and Algolia APIs.
///
/// Every request goes through the same [`RateLimiter`], including requests
/// issued concurrently by a fan-out.
#[derive(Clone)]
pub struct HnClient {
    api_base: Url,
    search_base: Url,
    web_base: String,
    limiter: Arc<RateLimiter>,
    client: reqwest::Client,
}

impl HnClient {
    pub fn new(config: &Config) -> Result<Self> {
        let limiter = RateLimiter::new(Duration::from_millis(config.rate_limit.min_interval_ms));
        Self::with_limiter(config, Arc::new(limiter))
    }

    pub fn with_limiter(config: &Config, limiter: Arc<RateLimiter>) -> Result<Self> {
        let hn = &config.hacker_news;
        let client = reqwest::Client::builder()
            .user_agent(hn.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_base: parse_base(&hn.api_base)?,
            search_base: parse_base(&hn.search_base)?,
            web_base: hn.web_base.clone(),
            limiter,
            client,
        })
    }

    pub fn web_base(&self) -> &str {
        &self.web_base
    }

    /// Fetch `url` through the rate limiter and decode the body as JSON.
    pub async fn fetch_json(&self, url: Url) -> Result<Value, HnError> {
        self.limiter.acquire().await;
        log::debug!("HnClient: GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| HnError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("HnClient: {} returned {}", url, status);
            return Err(HnError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| HnError::Transport {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            log::warn!("HnClient: {} sent a non-JSON body: {}", url, e);
            HnError::Decode(format!("{}: {}", url, e))
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, HnError> {
        let value = self.fetch_json(url).await?;
        serde_json::from_value(value).map_err(|e| HnError::Decode(e.to_string()))
    }

    /// Ordered story ids for `feed`, best first.
    pub async fn story_ids(&self, feed: StoryFeed) -> Result<Vec<u64>, HnError> {
        let url = join(&self.api_base, &[feed.endpoint()]);
        let ids: Option<Vec<u64>> = self.fetch(url).await?;
        Ok(ids.unwrap_or_default())
    }

    /// The item exactly as the API returns it.
    pub async fn raw_item(&self, id: u64) -> Result<Value, HnError> {
        let url = join(&self.api_base, &["item", &format!("{}.json", id)]);
        match self.fetch_json(url).await? {
            Value::Null => Err(HnError::NotFound {
                kind: "item",
                id: id.to_string(),
            }),
            value => Ok(value),
        }
    }

    pub async fn item(&self, id: u64) -> Result<Item, HnError> {
        let value = self.raw_item(id).await?;
        serde_json::from_value(value).map_err(|e| HnError::Decode(format!("item {}: {}", id, e)))
    }

    pub async fn user(&self, username: &str) -> Result<User, HnError> {
        let url = join(&self.api_base, &["user", &format!("{}.json", username)]);
        let user: Option<User> = self.fetch(url).await?;
        user.ok_or_else(|| HnError::NotFound {
            kind: "user",
            id: username.to_string(),
        })
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, HnError> {
        let mut url = join(&self.search_base, &["search"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &query.query);
            pairs.append_pair("hitsPerPage", &query.hits_per_page.to_string());
            if let Some(tags) = &query.tags {
                pairs.append_pair("tags", tags);
            }
            if let Some(filters) = &query.numeric_filters {
                pairs.append_pair("numericFilters", filters);
            }
        }
        self.fetch(url).await
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid base URL: {}", raw))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("Base URL cannot carry a path: {}", raw);
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`.
fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    /// Client pointed at a mock server, with no spacing between requests.
    pub(crate) fn test_client(server: &Server) -> HnClient {
        let mut config = Config::default();
        config.hacker_news.api_base = format!("{}/v0", server.url());
        config.hacker_news.search_base = format!("{}/api/v1", server.url());
        config.rate_limit.min_interval_ms = 0;
        HnClient::new(&config).unwrap()
    }

    #[test]
    fn test_join_encodes_segments() {
        let base = Url::parse("https://hacker-news.firebaseio.com/v0").unwrap();
        let url = join(&base, &["user", "a b/c.json"]);
        assert_eq!(
            url.as_str(),
            "https://hacker-news.firebaseio.com/v0/user/a%20b%2Fc.json"
        );

        let root = Url::parse("http://127.0.0.1:1234/").unwrap();
        assert_eq!(
            join(&root, &["topstories.json"]).as_str(),
            "http://127.0.0.1:1234/topstories.json"
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        let mut config = Config::default();
        config.hacker_news.api_base = "not a url".to_string();
        assert!(HnClient::new(&config).is_err());

        config.hacker_news.api_base = "mailto:someone@example.com".to_string();
        assert!(HnClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_story_ids() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/topstories.json")
            .with_header("content-type", "application/json")
            .with_body("[3, 1, 2]")
            .create_async()
            .await;

        let client = test_client(&server);
        let ids = client.story_ids(StoryFeed::Top).await.unwrap();
        assert_eq!(ids, vec![3, 1, 2]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/item/1.json")
            .with_status(500)
            .create_async()
            .await;

        let client = test_client(&server);
        let err = client.raw_item(1).await.unwrap_err();
        assert!(matches!(err, HnError::Http { status: 500 }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_null_item_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/item/999999999.json")
            .with_body("null")
            .create_async()
            .await;

        let client = test_client(&server);
        let err = client.item(999999999).await.unwrap_err();
        assert!(matches!(err, HnError::NotFound { kind: "item", .. }));
    }

    #[tokio::test]
    async fn test_null_user_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/user/ghost.json")
            .with_body("null")
            .create_async()
            .await;

        let client = test_client(&server);
        let err = client.user("ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "user ghost not found");
    }

    #[tokio::test]
    async fn test_search_passes_filters_through() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "rust async".into()),
                Matcher::UrlEncoded("hitsPerPage".into(), "5".into()),
                Matcher::UrlEncoded("tags".into(), "show_hn".into()),
                Matcher::UrlEncoded("numericFilters".into(), "points>100,num_comments>50".into()),
            ]))
            .with_body(r#"{"nbHits": 0, "hits": []}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let response = client
            .search(&SearchQuery {
                query: "rust async".to_string(),
                tags: Some("show_hn".to_string()),
                numeric_filters: Some("points>100,num_comments>50".to_string()),
                hits_per_page: 5,
            })
            .await
            .unwrap();

        assert_eq!(response.nb_hits, Some(0));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/newstories.json")
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = test_client(&server);
        let err = client.story_ids(StoryFeed::New).await.unwrap_err();
        assert!(matches!(err, HnError::Decode(_)));
    }

    #[tokio::test]
    async fn test_html_item_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/item/1.json")
            .with_header("content-type", "text/html")
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = test_client(&server);
        let err = client.raw_item(1).await.unwrap_err();
        assert!(matches!(err, HnError::Decode(_)));
        assert!(err.to_string().starts_with("unexpected response body: "));
        assert!(err.to_string().contains("/v0/item/1.json"));
    }
}
