use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool};
use crate::client::HnClient;
use crate::error::ToolError;

#[derive(Debug, Deserialize)]
struct GetItemArgs {
    id: u64,
}

/// Returns an item verbatim. Stories, comments, polls, poll options and jobs
/// differ too much to share a projection.
pub struct GetItem {
    client: HnClient,
}

impl GetItem {
    pub fn new(client: HnClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetItem {
    fn name(&self) -> &'static str {
        "get_item"
    }

    fn description(&self) -> &'static str {
        "Get a specific item (story, comment, poll) by ID."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "HN item ID"
                }
            },
            "required": ["id"]
        })
    }

    async fn run(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: GetItemArgs = parse_args(arguments)?;
        log::info!("Tool get_item: id={}", args.id);
        Ok(self.client.raw_item(args.id).await?)
    }
}
