use serde::Deserialize;
use serde_json::{json, Value};

use super::{bounded, parse_args, to_value, Tool};
use crate::client::{HnClient, SearchQuery};
use crate::error::ToolError;
use crate::models::SearchResult;

const DEFAULT_HITS: u32 = 10;
const MAX_HITS: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    query: String,
    tags: Option<String>,
    numeric_filters: Option<String>,
    hits_per_page: Option<i64>,
}

/// Full-text search through the Algolia index.
///
/// `tags` and `numericFilters` go to Algolia untouched; a malformed filter
/// comes back as an upstream error.
pub struct Search {
    client: HnClient,
}

impl Search {
    pub fn new(client: HnClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for Search {
    fn name(&self) -> &'static str {
        "search"
    }

    fn description(&self) -> &'static str {
        "Search Hacker News stories and comments."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms"
                },
                "tags": {
                    "type": "string",
                    "description": "Filter: 'story', 'comment', 'ask_hn', 'show_hn'"
                },
                "numericFilters": {
                    "type": "string",
                    "description": "e.g. 'points>100,num_comments>50'"
                },
                "hitsPerPage": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_HITS,
                    "default": DEFAULT_HITS,
                    "description": "Number of hits to return"
                }
            },
            "required": ["query"]
        })
    }

    async fn run(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: SearchArgs = parse_args(arguments)?;
        let hits_per_page = bounded("hitsPerPage", args.hits_per_page, DEFAULT_HITS, 1, MAX_HITS)?;

        log::info!("Tool search: query={:?} tags={:?}", args.query, args.tags);
        let response = self
            .client
            .search(&SearchQuery {
                query: args.query,
                tags: args.tags.filter(|t| !t.is_empty()),
                numeric_filters: args.numeric_filters.filter(|f| !f.is_empty()),
                hits_per_page,
            })
            .await?;

        to_value(&SearchResult::from(response))
    }
}
