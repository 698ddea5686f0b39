use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::WidgetConfig;
use super::group::ChatGroup;
use super::message::{Category, Message};
use super::task::StockTask;

/// The durable part of the chat store. Everything in here is written to
/// local storage after each mutation and read back on startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub config: WidgetConfig,

    #[serde(default)]
    pub groups: Vec<ChatGroup>,

    #[serde(default)]
    pub tasks: Vec<StockTask>,

    /// Set once the welcome message has been synthesized. Survives `clear_chat`.
    #[serde(default)]
    pub has_shown_welcome: bool,
}

/// Session-only view state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub is_open: bool,
    /// True while an assistant reply is pending.
    pub is_loading: bool,
    pub current_group: Option<String>,
    pub search_query: String,
    pub selected_category: Option<Category>,
    pub show_group_panel: bool,
    pub show_task_panel: bool,
    pub selected_task: Option<Uuid>,
}
