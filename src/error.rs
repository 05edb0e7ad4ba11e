use thiserror::Error;

/// Failures talking to the Hacker News or Algolia APIs.
#[derive(Debug, Error)]
pub enum HnError {
    #[error("HN {status}")]
    Http { status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

/// Failures surfaced to the caller of a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Upstream(#[from] HnError),

    #[error("failed to encode result: {0}")]
    Serialization(#[from] serde_json::Error),
}
