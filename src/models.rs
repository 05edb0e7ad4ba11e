use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Longest excerpt of free text (story text, user bio) included in tool output.
pub const MAX_TEXT_CHARS: usize = 500;

/// An item from `/item/{id}.json`.
///
/// Only the fields the tools project are modeled; everything is optional
/// because stories, comments, jobs and polls populate different subsets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Item {
    pub id: u64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: Option<i64>,
    pub by: Option<String>,
    /// Unix seconds.
    pub time: Option<i64>,
    pub descendants: Option<i64>,
    pub text: Option<String>,
}

/// A profile from `/user/{name}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    pub id: String,
    pub karma: Option<i64>,
    pub about: Option<String>,
    pub created: Option<i64>,
    pub submitted: Option<Vec<u64>>,
}

/// Response body of the Algolia `/search` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "nbHits")]
    pub nb_hits: Option<u64>,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// A single search hit. Story and comment hits fill different fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    pub story_title: Option<String>,
    pub url: Option<String>,
    pub story_url: Option<String>,
    pub author: Option<String>,
    pub points: Option<i64>,
    pub num_comments: Option<i64>,
    pub created_at: Option<String>,
    #[serde(rename = "objectID")]
    pub object_id: Option<String>,
}

/// Projection returned by `get_top_stories`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStory {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendants: Option<i64>,
    pub hn_url: String,
}

impl TopStory {
    pub fn from_item(item: Item, web_base: &str) -> Self {
        Self {
            hn_url: permalink(web_base, item.id),
            id: item.id,
            title: item.title,
            url: item.url,
            score: item.score,
            by: item.by,
            time: item.time.and_then(iso_timestamp),
            descendants: item.descendants,
        }
    }
}

/// Projection returned by `get_new_stories`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStory {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

impl From<Item> for NewStory {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            title: item.title,
            url: item.url,
            score: item.score,
            by: item.by,
        }
    }
}

/// Projection returned by `get_ask_hn`. Ask posts have no URL; the body is
/// excerpted instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskStory {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<Item> for AskStory {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            title: item.title,
            score: item.score,
            by: item.by,
            descendants: item.descendants,
            text: item.text.map(|t| truncate_chars(&t, MAX_TEXT_CHARS)),
        }
    }
}

/// Result of the `search` tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub hits: Vec<SearchHitSummary>,
}

impl From<SearchResponse> for SearchResult {
    fn from(response: SearchResponse) -> Self {
        Self {
            total: response.nb_hits,
            hits: response.hits.into_iter().map(SearchHitSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_comments: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "objectID", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl From<SearchHit> for SearchHitSummary {
    fn from(hit: SearchHit) -> Self {
        Self {
            title: non_empty(hit.title).or(hit.story_title),
            url: non_empty(hit.url).or(hit.story_url),
            author: hit.author,
            points: hit.points,
            num_comments: hit.num_comments,
            created_at: hit.created_at,
            object_id: hit.object_id,
        }
    }
}

/// Result of the `get_user` tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub karma: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Number of submitted items, not the ids themselves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted: Option<usize>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            karma: user.karma,
            about: user.about.map(|a| truncate_chars(&a, MAX_TEXT_CHARS)),
            created: user.created.and_then(iso_timestamp),
            submitted: user.submitted.map(|s| s.len()),
        }
    }
}

/// Discussion page for an item on the web site.
pub fn permalink(web_base: &str, id: u64) -> String {
    format!("{}/item?id={}", web_base.trim_end_matches('/'), id)
}

/// Keep at most `max` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Format Unix seconds as an ISO-8601 UTC timestamp with millisecond precision.
pub fn iso_timestamp(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

// Algolia sends "" as well as null for missing story fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> Item {
        Item {
            id: 8863,
            title: Some("My YC app: Dropbox".to_string()),
            url: Some("http://www.getdropbox.com/u/2/screencast.html".to_string()),
            score: Some(111),
            by: Some("dhouston".to_string()),
            time: Some(1175714200),
            descendants: Some(71),
            text: None,
        }
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        let text = "é".repeat(600);
        let truncated = truncate_chars(&text, MAX_TEXT_CHARS);
        assert_eq!(truncated.chars().count(), 500);
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(iso_timestamp(1175714200).unwrap(), "2007-04-04T19:16:40.000Z");
        assert_eq!(iso_timestamp(0).unwrap(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_top_story_projection() {
        let top = TopStory::from_item(story(), "https://news.ycombinator.com/");
        assert_eq!(top.hn_url, "https://news.ycombinator.com/item?id=8863");
        assert_eq!(top.time.as_deref(), Some("2007-04-04T19:16:40.000Z"));
        assert_eq!(top.descendants, Some(71));

        let json = serde_json::to_value(&top).unwrap();
        assert_eq!(json["hnUrl"], "https://news.ycombinator.com/item?id=8863");
        assert_eq!(json["by"], "dhouston");
    }

    #[test]
    fn test_new_story_omits_missing_fields() {
        let item = Item {
            id: 1,
            title: Some("untitled url".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(NewStory::from(item)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 1, "title": "untitled url" }));
    }

    #[test]
    fn test_ask_story_excerpts_text() {
        let item = Item {
            id: 2,
            title: Some("Ask HN: long question".to_string()),
            url: Some("ignored".to_string()),
            text: Some("x".repeat(900)),
            ..Default::default()
        };
        let ask = AskStory::from(item);
        assert_eq!(ask.text.unwrap().len(), 500);

        let json = serde_json::to_value(AskStory::from(story())).unwrap();
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_search_hit_prefers_story_fields() {
        let hit = SearchHit {
            title: Some("Primary".to_string()),
            story_title: Some("Parent story".to_string()),
            url: None,
            story_url: Some("https://example.com/parent".to_string()),
            num_comments: Some(3),
            object_id: Some("42".to_string()),
            ..Default::default()
        };
        let summary = SearchHitSummary::from(hit);
        assert_eq!(summary.title.as_deref(), Some("Primary"));
        assert_eq!(summary.url.as_deref(), Some("https://example.com/parent"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["numComments"], 3);
        assert_eq!(json["objectID"], "42");
    }

    #[test]
    fn test_search_hit_falls_back_on_empty_title() {
        let hit = SearchHit {
            title: Some(String::new()),
            story_title: Some("From story".to_string()),
            ..Default::default()
        };
        assert_eq!(SearchHitSummary::from(hit).title.as_deref(), Some("From story"));
    }

    #[test]
    fn test_search_response_parsing() {
        let body = serde_json::json!({
            "nbHits": 2,
            "hits": [
                { "title": "Rust 1.0", "url": "https://rust-lang.org", "author": "steveklabnik",
                  "points": 900, "num_comments": 300, "created_at": "2015-05-15T16:00:00.000Z",
                  "objectID": "9551937" },
                { "title": null, "story_title": "Rust 1.0", "story_url": "https://rust-lang.org",
                  "author": "pcwalton", "points": null, "created_at": "2015-05-15T16:05:00.000Z",
                  "objectID": "9551999", "comment_text": "congrats" }
            ]
        });
        let response: SearchResponse = serde_json::from_value(body).unwrap();
        let result = SearchResult::from(response);
        assert_eq!(result.total, Some(2));
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[1].title.as_deref(), Some("Rust 1.0"));
        assert_eq!(result.hits[1].author.as_deref(), Some("pcwalton"));
    }

    #[test]
    fn test_user_summary() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "pg",
            "karma": 155111,
            "about": "a".repeat(700),
            "created": 1160418092,
            "submitted": [1, 2, 3]
        }))
        .unwrap();
        let summary = UserSummary::from(user);
        assert_eq!(summary.about.as_ref().unwrap(), &"a".repeat(500));
        assert_eq!(summary.created.as_deref(), Some("2006-10-09T18:21:32.000Z"));
        assert_eq!(summary.submitted, Some(3));
    }
}
