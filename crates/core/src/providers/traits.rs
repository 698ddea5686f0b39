use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::api::{ApiResponse, AssistantRequest};

/// Backend that answers chat messages.
///
/// The widget ships with [`MockAssistantProvider`](super::mock_assistant::MockAssistantProvider);
/// a real inference client plugs in here without touching the store.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Produce a reply for `request`.
    async fn complete(&self, request: &AssistantRequest) -> Result<ApiResponse, CoreError>;
}

/// Source of the static JSON documents (`categories.json`, `prompts.json`,
/// `groups.json`).
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch and parse one document by its endpoint name, e.g. `"groups.json"`.
    async fn fetch(&self, endpoint: &str) -> Result<serde_json::Value, CoreError>;
}
