use serde::{Deserialize, Serialize};

/// Reply produced by an assistant provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub content: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

/// One request to an assistant provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantRequest {
    /// The user's new message.
    pub message: String,
    /// Content of the messages preceding it, oldest first.
    pub context: Vec<String>,
    /// Credential configured on the widget, if any.
    pub api_key: Option<String>,
}
