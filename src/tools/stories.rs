use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{bounded, parse_args, to_value, Tool};
use crate::client::{HnClient, StoryFeed};
use crate::error::ToolError;
use crate::models::{AskStory, Item, NewStory, TopStory};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

#[derive(Debug, Deserialize)]
struct StoryListArgs {
    limit: Option<i64>,
}

/// Lists the first stories of one of the ranked feeds.
///
/// The feed's id list is fetched first, then every item is fetched
/// concurrently (at most `max_concurrent` in flight). Results keep the feed's
/// order, and any failed item fails the whole call.
pub struct StoryListTool {
    feed: StoryFeed,
    client: HnClient,
    max_concurrent: usize,
}

impl StoryListTool {
    pub fn new(feed: StoryFeed, client: HnClient, max_concurrent: usize) -> Self {
        Self {
            feed,
            client,
            max_concurrent: max_concurrent.max(1),
        }
    }

    async fn fetch_items(&self, limit: usize) -> Result<Vec<Item>, ToolError> {
        let ids = self.client.story_ids(self.feed).await?;
        let ids: Vec<u64> = ids.into_iter().take(limit).collect();
        log::info!("Tool {}: fetching {} item(s)", self.name(), ids.len());

        let items = stream::iter(ids)
            .map(|id| self.client.item(id))
            .buffered(self.max_concurrent)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(items)
    }
}

#[async_trait::async_trait]
impl Tool for StoryListTool {
    fn name(&self) -> &'static str {
        match self.feed {
            StoryFeed::Top => "get_top_stories",
            StoryFeed::New => "get_new_stories",
            StoryFeed::Ask => "get_ask_hn",
        }
    }

    fn description(&self) -> &'static str {
        match self.feed {
            StoryFeed::Top => "Get top stories from Hacker News.",
            StoryFeed::New => "Get newest stories.",
            StoryFeed::Ask => "Get Ask HN stories.",
        }
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_LIMIT,
                    "default": DEFAULT_LIMIT,
                    "description": "Number of stories to return"
                }
            }
        })
    }

    async fn run(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: StoryListArgs = parse_args(arguments)?;
        let limit = bounded("limit", args.limit, DEFAULT_LIMIT, 1, MAX_LIMIT)?;

        let items = self.fetch_items(limit as usize).await?;

        match self.feed {
            StoryFeed::Top => {
                let web_base = self.client.web_base();
                let stories: Vec<TopStory> = items
                    .into_iter()
                    .map(|item| TopStory::from_item(item, web_base))
                    .collect();
                to_value(&stories)
            }
            StoryFeed::New => {
                to_value(&items.into_iter().map(NewStory::from).collect::<Vec<_>>())
            }
            StoryFeed::Ask => {
                to_value(&items.into_iter().map(AskStory::from).collect::<Vec<_>>())
            }
        }
    }
}
