use tracing::debug;

use crate::errors::CoreError;
use crate::models::api::{ApiResponse, AssistantRequest};
use crate::providers::mock_assistant::{MockAssistantConfig, MockAssistantProvider};
use crate::providers::traits::AssistantProvider;

/// Client for the assistant backend.
///
/// Holds the provider and the widget's API key. The key can be changed in
/// place with [`set_api_key`](Self::set_api_key); the provider and any state
/// it carries are kept.
pub struct ApiService {
    provider: Box<dyn AssistantProvider>,
    api_key: Option<String>,
}

impl ApiService {
    pub fn new(provider: Box<dyn AssistantProvider>, api_key: Option<String>) -> Self {
        Self { provider, api_key }
    }

    /// Service backed by the mock assistant with the given latency.
    pub fn mock(config: MockAssistantConfig) -> Self {
        Self::new(Box::new(MockAssistantProvider::new(config)), None)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Replace the credential used for subsequent requests.
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key;
    }

    /// Ask the provider for a reply to `message`, given prior message content.
    pub async fn send_message(
        &self,
        message: &str,
        context: Vec<String>,
    ) -> Result<ApiResponse, CoreError> {
        let request = AssistantRequest {
            message: message.to_string(),
            context,
            api_key: self.api_key.clone(),
        };
        debug!(
            provider = self.provider.name(),
            context_len = request.context.len(),
            "sending message to assistant"
        );
        self.provider.complete(&request).await
    }
}

impl Default for ApiService {
    fn default() -> Self {
        Self::mock(MockAssistantConfig::default())
    }
}
