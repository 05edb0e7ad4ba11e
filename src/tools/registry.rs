//! Tool registry - owns the tool set and dispatches calls by name

use serde::Serialize;
use serde_json::Value;

use super::{GetItem, GetUser, Search, StoryListTool, Tool};
use crate::client::{HnClient, StoryFeed};
use crate::config::Config;
use crate::error::ToolError;

/// Tool entry as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with every Hacker News tool, all sharing one client.
    pub fn standard(client: HnClient, config: &Config) -> Self {
        let fan_out = config.rate_limit.max_concurrent_fetches;
        let mut registry = Self::new();

        // Ranked feeds
        registry.add_tool(Box::new(StoryListTool::new(StoryFeed::Top, client.clone(), fan_out)));
        registry.add_tool(Box::new(StoryListTool::new(StoryFeed::New, client.clone(), fan_out)));
        registry.add_tool(Box::new(StoryListTool::new(StoryFeed::Ask, client.clone(), fan_out)));

        // Lookups
        registry.add_tool(Box::new(Search::new(client.clone())));
        registry.add_tool(Box::new(GetItem::new(client.clone())));
        registry.add_tool(Box::new(GetUser::new(client)));

        registry
    }

    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Add a tool, replacing any existing tool with the same name.
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| &**t)
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        match tool.run(arguments).await {
            Ok(output) => Ok(output),
            Err(e) => {
                log::warn!("Tool {}: {}", name, e);
                Err(e)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
