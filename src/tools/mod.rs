pub mod item;
pub mod registry;
pub mod search;
pub mod stories;
pub mod user;

pub use item::GetItem;
pub use registry::ToolRegistry;
pub use search::Search;
pub use stories::StoryListTool;
pub use user::GetUser;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

/// A named operation exposed to MCP clients.
///
/// Arguments arrive as raw JSON and are validated by the tool itself before
/// any request is made. The output is the JSON value that gets rendered into
/// the text content block.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// JSON Schema for the arguments object.
    fn input_schema(&self) -> Value;

    async fn run(&self, arguments: Value) -> Result<Value, ToolError>;
}

/// Deserialize a tool's arguments, treating a missing object as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Resolve an optional count argument against its default and inclusive bounds.
pub(crate) fn bounded(
    name: &str,
    value: Option<i64>,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, ToolError> {
    let value = value.unwrap_or(i64::from(default));
    if value < i64::from(min) || value > i64::from(max) {
        return Err(ToolError::InvalidArguments(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value as u32)
}

pub(crate) fn to_value<T: Serialize>(output: &T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(output)?)
}
