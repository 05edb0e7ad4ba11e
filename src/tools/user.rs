use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, to_value, Tool};
use crate::client::HnClient;
use crate::error::ToolError;
use crate::models::UserSummary;

#[derive(Debug, Deserialize)]
struct GetUserArgs {
    username: String,
}

/// Profile summary: karma, a bio excerpt, the creation date and how many
/// items the user has submitted.
pub struct GetUser {
    client: HnClient,
}

impl GetUser {
    pub fn new(client: HnClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetUser {
    fn name(&self) -> &'static str {
        "get_user"
    }

    fn description(&self) -> &'static str {
        "Get a user profile."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "username": {
                    "type": "string",
                    "description": "HN username (case-sensitive)"
                }
            },
            "required": ["username"]
        })
    }

    async fn run(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: GetUserArgs = parse_args(arguments)?;
        if args.username.trim().is_empty() {
            return Err(ToolError::InvalidArguments("username must not be empty".to_string()));
        }

        log::info!("Tool get_user: {}", args.username);
        let user = self.client.user(&args.username).await?;
        to_value(&UserSummary::from(user))
    }
}
