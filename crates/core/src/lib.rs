pub mod embed;
pub mod errors;
pub mod events;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use errors::CoreError;
use events::StoreEvent;
use models::{
    catalog::{CategoryInfo, SmartPrompt, SuggestionPrompt},
    config::{ConfigPatch, WidgetConfig},
    group::{ChatGroup, GroupPatch},
    message::{Category, Message, NewMessage},
    state::{PersistedState, UiState},
    task::{NewTask, StockTask, TaskPatch, TaskStatus, TaskType, TaskWizard},
};
use services::{
    api_service::ApiService,
    data_service::{DataService, DataServiceConfig},
    group_service::GroupService,
    message_service::{MessageFilter, MessageService},
    task_service::TaskService,
};
use storage::{
    backend::{MemoryBackend, StorageBackend},
    manager::StorageManager,
};

/// How many earlier messages are sent to the assistant as context.
pub const CONTEXT_WINDOW: usize = 5;

/// Reply appended when the assistant cannot be reached.
pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I'm having trouble connecting right now. Please try again later.";

/// The chat store: single source of truth for one widget instance.
///
/// Holds the persisted state (messages, groups, tasks, configuration), the
/// session-only view state, and the services that operate on them. Every
/// command persists the durable part and publishes a [`StoreEvent`];
/// queries never mutate.
#[must_use]
pub struct ChatWidget {
    state: PersistedState,
    ui: UiState,
    message_service: MessageService,
    group_service: GroupService,
    task_service: TaskService,
    api_service: ApiService,
    data_service: DataService,
    backend: Box<dyn StorageBackend>,
    events: broadcast::Sender<StoreEvent>,
    /// Set when a mutation could not be written to storage yet.
    dirty: bool,
}

impl std::fmt::Debug for ChatWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("messages", &self.state.messages.len())
            .field("groups", &self.state.groups.len())
            .field("tasks", &self.state.tasks.len())
            .field("ui", &self.ui)
            .field("assistant", &self.api_service.provider_name())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl ChatWidget {
    /// A fresh store with in-memory storage, the mock assistant and the
    /// HTTP data service configured from the environment.
    pub fn create_new() -> Self {
        Self::build(
            PersistedState::default(),
            ApiService::default(),
            DataService::from_config(&DataServiceConfig::from_env()),
            Box::new(MemoryBackend::new()),
        )
    }

    /// Rehydrate from `backend`, starting empty if nothing was stored.
    ///
    /// Unreadable stored state is logged and replaced by defaults; use
    /// [`try_load`](Self::try_load) to observe the error instead.
    pub fn load(
        backend: Box<dyn StorageBackend>,
        api_service: ApiService,
        data_service: DataService,
    ) -> Self {
        let state = match StorageManager::load(backend.as_ref()) {
            Ok(Some(state)) => state,
            Ok(None) => PersistedState::default(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted chat state");
                PersistedState::default()
            }
        };
        Self::build(state, api_service, data_service, backend)
    }

    /// Rehydrate from `backend`, failing on unreadable stored state.
    pub fn try_load(
        backend: Box<dyn StorageBackend>,
        api_service: ApiService,
        data_service: DataService,
    ) -> Result<Self, CoreError> {
        let state = StorageManager::load(backend.as_ref())?.unwrap_or_default();
        Ok(Self::build(state, api_service, data_service, backend))
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ── Visibility & Welcome ────────────────────────────────────────

    /// Show or hide the chat window.
    ///
    /// Opening an empty store that has never greeted the user appends the
    /// configured welcome message once. Default groups are not loaded here;
    /// see [`open`](Self::open) and [`load_default_groups`](Self::load_default_groups).
    pub fn set_open(&mut self, open: bool) {
        self.ui.is_open = open;

        if open && !self.state.has_shown_welcome && self.state.messages.is_empty() {
            let welcome = self
                .state
                .config
                .welcome_message
                .clone()
                .filter(|w| !w.trim().is_empty());
            if let Some(welcome) = welcome {
                self.message_service
                    .add_welcome_message(&mut self.state, welcome);
                self.state.has_shown_welcome = true;
                self.commit(StoreEvent::MessagesChanged);
            }
        }

        self.notify(StoreEvent::ViewChanged);
    }

    /// Open the window and make sure default groups are installed.
    pub async fn open(&mut self) {
        self.set_open(true);
        self.load_default_groups().await;
    }

    /// Install default groups from the data service if there are none.
    /// Returns how many were installed.
    ///
    /// Emptiness is checked again after the fetch, so concurrent openings
    /// never install twice.
    pub async fn load_default_groups(&mut self) -> usize {
        if !self.state.groups.is_empty() {
            return 0;
        }
        let templates = self.data_service.get_default_groups().await;
        let installed = self
            .group_service
            .install_defaults(&mut self.state, templates);
        if installed > 0 {
            info!(count = installed, "installed default groups");
            self.commit(StoreEvent::GroupsChanged);
        }
        installed
    }

    // ── Messages ────────────────────────────────────────────────────

    /// Send a user message and append the assistant's reply.
    ///
    /// The assistant sees the content of up to [`CONTEXT_WINDOW`] messages
    /// that preceded this one. Assistant failures are not returned: the
    /// fixed [`APOLOGY_MESSAGE`] is appended instead. The loading flag is
    /// cleared on every path, including when this future is dropped before
    /// the reply arrives; the apology is appended in that case too. Returns
    /// the id of the appended reply.
    pub async fn send_message(&mut self, content: &str) -> Result<Uuid, CoreError> {
        if content.trim().is_empty() {
            return Err(CoreError::ValidationError("Message must not be empty".into()));
        }

        let context = self
            .message_service
            .recent_context(&self.state.messages, CONTEXT_WINDOW);
        self.message_service
            .add_message(&mut self.state, NewMessage::user(content));
        self.commit(StoreEvent::MessagesChanged);

        let mut pending = PendingReply::start(self);
        let reply = match pending.widget.api_service.send_message(content, context).await {
            Ok(response) => NewMessage::assistant(response.content),
            Err(e) => {
                warn!(provider = pending.widget.api_service.provider_name(), error = %e, "assistant request failed");
                NewMessage::assistant(APOLOGY_MESSAGE)
            }
        };
        Ok(pending.answer(reply))
    }

    /// Compose a smart prompt from the user's answers and send it.
    pub async fn send_smart_prompt(
        &mut self,
        prompt: &SmartPrompt,
        answers: &HashMap<String, String>,
    ) -> Result<Uuid, CoreError> {
        let text = prompt.compose_prompt(answers);
        self.send_message(&text).await
    }

    /// Append a message directly. Returns its id.
    ///
    /// A message filed under a group requires that group to exist.
    pub fn add_message(&mut self, message: NewMessage) -> Result<Uuid, CoreError> {
        let grouped = match message.group.as_deref() {
            Some(group_id) if self.get_group(group_id).is_none() => {
                return Err(CoreError::GroupNotFound(group_id.to_string()));
            }
            Some(_) => true,
            None => false,
        };
        let id = self.message_service.add_message(&mut self.state, message);
        if grouped {
            MessageService::recount_groups(&mut self.state);
        }
        self.commit(StoreEvent::MessagesChanged);
        Ok(id)
    }

    /// Flip a message's favorite flag. Returns the new value.
    pub fn toggle_favorite(&mut self, message_id: Uuid) -> Result<bool, CoreError> {
        let favorite = self
            .message_service
            .toggle_favorite(&mut self.state, message_id)?;
        self.commit(StoreEvent::MessagesChanged);
        Ok(favorite)
    }

    /// Tag a message. Re-adding an existing tag changes nothing.
    pub fn add_tag_to_message(&mut self, message_id: Uuid, tag: &str) -> Result<(), CoreError> {
        if self.message_service.add_tag(&mut self.state, message_id, tag)? {
            self.commit(StoreEvent::MessagesChanged);
        }
        Ok(())
    }

    pub fn remove_tag_from_message(&mut self, message_id: Uuid, tag: &str) -> Result<(), CoreError> {
        if self
            .message_service
            .remove_tag(&mut self.state, message_id, tag)?
        {
            self.commit(StoreEvent::MessagesChanged);
        }
        Ok(())
    }

    /// File a message under a group, refreshing all group counts.
    pub fn move_message_to_group(&mut self, message_id: Uuid, group_id: &str) -> Result<(), CoreError> {
        self.message_service
            .move_to_group(&mut self.state, message_id, group_id)?;
        self.commit(StoreEvent::MessagesChanged);
        self.notify(StoreEvent::GroupsChanged);
        Ok(())
    }

    /// Take a message out of its group.
    pub fn remove_message_from_group(&mut self, message_id: Uuid) -> Result<(), CoreError> {
        self.message_service
            .remove_from_group(&mut self.state, message_id)?;
        self.commit(StoreEvent::MessagesChanged);
        self.notify(StoreEvent::GroupsChanged);
        Ok(())
    }

    /// Remove every message. Groups, tasks and the welcome flag are kept.
    pub fn clear_chat(&mut self) {
        self.state.messages.clear();
        MessageService::recount_groups(&mut self.state);
        self.commit(StoreEvent::MessagesChanged);
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    #[must_use]
    pub fn get_message(&self, message_id: Uuid) -> Option<&Message> {
        self.state.messages.iter().find(|m| m.id == message_id)
    }

    /// Messages matching the current group, category and search text.
    /// All three filters must pass.
    #[must_use]
    pub fn get_filtered_messages(&self) -> Vec<&Message> {
        let filter = MessageFilter {
            group: self.ui.current_group.as_deref(),
            category: self.ui.selected_category,
            search: &self.ui.search_query,
        };
        self.message_service.filter(&self.state.messages, &filter)
    }

    #[must_use]
    pub fn get_favorite_messages(&self) -> Vec<&Message> {
        self.message_service.favorites(&self.state.messages)
    }

    /// Messages keyed by group id; ungrouped ones under `"default"`.
    #[must_use]
    pub fn get_grouped_messages(&self) -> HashMap<String, Vec<&Message>> {
        self.message_service.grouped(&self.state.messages)
    }

    // ── Groups ──────────────────────────────────────────────────────

    /// Create a group. Returns its id.
    pub fn create_group(&mut self, name: &str, description: Option<String>) -> Result<String, CoreError> {
        let id = self
            .group_service
            .create_group(&mut self.state, name, description)?;
        self.commit(StoreEvent::GroupsChanged);
        Ok(id)
    }

    pub fn update_group(&mut self, group_id: &str, patch: GroupPatch) -> Result<(), CoreError> {
        self.group_service
            .update_group(&mut self.state, group_id, patch)?;
        self.commit(StoreEvent::GroupsChanged);
        Ok(())
    }

    /// Delete a group, ungrouping its messages and clearing the group
    /// selector if it pointed here.
    pub fn delete_group(&mut self, group_id: &str) -> Result<(), CoreError> {
        self.group_service.delete_group(&mut self.state, group_id)?;
        if self.ui.current_group.as_deref() == Some(group_id) {
            self.ui.current_group = None;
            self.notify(StoreEvent::ViewChanged);
        }
        self.commit(StoreEvent::GroupsChanged);
        self.notify(StoreEvent::MessagesChanged);
        Ok(())
    }

    #[must_use]
    pub fn groups(&self) -> &[ChatGroup] {
        &self.state.groups
    }

    #[must_use]
    pub fn get_group(&self, group_id: &str) -> Option<&ChatGroup> {
        self.state.groups.iter().find(|g| g.id == group_id)
    }

    /// Live count of messages in a group.
    #[must_use]
    pub fn group_message_count(&self, group_id: &str) -> usize {
        self.group_service.message_count(&self.state, group_id)
    }

    #[must_use]
    pub fn groups_by_recent_activity(&self) -> Vec<&ChatGroup> {
        self.group_service.by_recent_activity(&self.state)
    }

    // ── Tasks ───────────────────────────────────────────────────────

    /// Create a task. Returns its id.
    pub fn create_task(&mut self, task: NewTask) -> Result<Uuid, CoreError> {
        let id = self.task_service.create_task(&mut self.state, task)?;
        self.commit(StoreEvent::TasksChanged);
        Ok(id)
    }

    /// Create the task described by a finished wizard and confirm it in chat.
    pub fn create_task_from_wizard(&mut self, wizard: TaskWizard) -> Result<Uuid, CoreError> {
        let id = self.create_task(wizard.finish()?)?;
        let confirmation = self.get_task(id).map(|task| {
            format!(
                "I've created a {} task for {}. I'll monitor this stock and notify you when your conditions are met.",
                task.task_type.description(),
                task.symbol,
            )
        });
        if let Some(confirmation) = confirmation {
            self.add_message(NewMessage::assistant(confirmation))?;
        }
        Ok(id)
    }

    /// Patch a task. `updated_at` is always refreshed.
    pub fn update_task(&mut self, task_id: Uuid, patch: TaskPatch) -> Result<(), CoreError> {
        self.task_service
            .update_task(&mut self.state, task_id, patch)?;
        self.commit(StoreEvent::TasksChanged);
        Ok(())
    }

    /// Delete a task, clearing the selection if it pointed here.
    pub fn delete_task(&mut self, task_id: Uuid) -> Result<(), CoreError> {
        self.task_service.delete_task(&mut self.state, task_id)?;
        if self.ui.selected_task == Some(task_id) {
            self.ui.selected_task = None;
            self.notify(StoreEvent::ViewChanged);
        }
        self.commit(StoreEvent::TasksChanged);
        Ok(())
    }

    #[must_use]
    pub fn tasks(&self) -> &[StockTask] {
        &self.state.tasks
    }

    #[must_use]
    pub fn get_task(&self, task_id: Uuid) -> Option<&StockTask> {
        self.state.tasks.iter().find(|t| t.id == task_id)
    }

    #[must_use]
    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<&StockTask> {
        self.task_service.by_status(&self.state.tasks, status)
    }

    #[must_use]
    pub fn get_tasks_by_type(&self, task_type: TaskType) -> Vec<&StockTask> {
        self.task_service.by_type(&self.state.tasks, task_type)
    }

    // ── View State ──────────────────────────────────────────────────

    #[must_use]
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ui.is_open
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.ui.is_loading
    }

    #[must_use]
    pub fn has_shown_welcome(&self) -> bool {
        self.state.has_shown_welcome
    }

    /// Restrict the filtered view to one group, or clear the restriction.
    pub fn set_current_group(&mut self, group_id: Option<String>) -> Result<(), CoreError> {
        if let Some(id) = group_id.as_deref() {
            if self.get_group(id).is_none() {
                return Err(CoreError::GroupNotFound(id.to_string()));
            }
        }
        self.ui.current_group = group_id;
        self.notify(StoreEvent::ViewChanged);
        Ok(())
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.ui.search_query = query.into();
        self.notify(StoreEvent::ViewChanged);
    }

    pub fn set_selected_category(&mut self, category: Option<Category>) {
        self.ui.selected_category = category;
        self.notify(StoreEvent::ViewChanged);
    }

    pub fn set_show_group_panel(&mut self, show: bool) {
        self.ui.show_group_panel = show;
        self.notify(StoreEvent::ViewChanged);
    }

    pub fn set_show_task_panel(&mut self, show: bool) {
        self.ui.show_task_panel = show;
        self.notify(StoreEvent::ViewChanged);
    }

    /// Select a task for the detail view, or clear the selection.
    pub fn set_selected_task(&mut self, task_id: Option<Uuid>) -> Result<(), CoreError> {
        if let Some(id) = task_id {
            if self.get_task(id).is_none() {
                return Err(CoreError::TaskNotFound(id.to_string()));
            }
        }
        self.ui.selected_task = task_id;
        self.notify(StoreEvent::ViewChanged);
        Ok(())
    }

    #[must_use]
    pub fn selected_task(&self) -> Option<&StockTask> {
        self.ui.selected_task.and_then(|id| self.get_task(id))
    }

    // ── Configuration ───────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &WidgetConfig {
        &self.state.config
    }

    /// Merge a partial configuration.
    ///
    /// A new API key is handed to the existing assistant client; without one
    /// the previous key stays in effect.
    pub fn update_config(&mut self, patch: ConfigPatch) {
        if let Some(key) = patch.api_key.as_ref() {
            self.api_service.set_api_key(Some(key.clone()));
        }
        self.state.config.apply(patch);
        self.commit(StoreEvent::ConfigChanged);
    }

    #[must_use]
    pub fn api_service(&self) -> &ApiService {
        &self.api_service
    }

    // ── Static Data ─────────────────────────────────────────────────

    #[must_use]
    pub fn data_service(&self) -> &DataService {
        &self.data_service
    }

    pub async fn get_categories(&self) -> Vec<CategoryInfo> {
        self.data_service.get_categories().await
    }

    pub async fn get_suggestion_prompts(&self) -> Vec<SuggestionPrompt> {
        self.data_service.get_suggestion_prompts().await
    }

    pub async fn get_smart_prompts(&self) -> Vec<SmartPrompt> {
        self.data_service.get_smart_prompts().await
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Write the durable state to storage now.
    pub fn save(&mut self) -> Result<(), CoreError> {
        StorageManager::save(self.backend.as_ref(), &self.state)?;
        self.dirty = false;
        Ok(())
    }

    /// `true` if the last automatic save failed and changes are only in memory.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Pretty JSON snapshot of the durable state.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.state)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize chat state: {e}")))
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(
        state: PersistedState,
        mut api_service: ApiService,
        data_service: DataService,
        backend: Box<dyn StorageBackend>,
    ) -> Self {
        if let Some(key) = state.config.api_key.clone() {
            api_service.set_api_key(Some(key));
        }

        Self {
            state,
            ui: UiState::default(),
            message_service: MessageService::new(),
            group_service: GroupService::new(),
            task_service: TaskService::new(),
            api_service,
            data_service,
            backend,
            events: events::channel(),
            dirty: false,
        }
    }

    /// Persist after a durable mutation and announce it.
    fn commit(&mut self, event: StoreEvent) {
        self.dirty = true;
        if let Err(e) = self.save() {
            warn!(error = %e, "failed to persist chat state");
        }
        self.notify(event);
    }

    fn set_loading(&mut self, loading: bool) {
        self.ui.is_loading = loading;
        self.notify(StoreEvent::LoadingChanged(loading));
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// An assistant reply in flight.
///
/// Dropping it clears the loading flag. If no reply was recorded by then
/// (the send was cancelled mid-request), the apology is appended first so
/// the user message is never left unanswered.
struct PendingReply<'a> {
    widget: &'a mut ChatWidget,
    answered: bool,
}

impl<'a> PendingReply<'a> {
    fn start(widget: &'a mut ChatWidget) -> Self {
        widget.set_loading(true);
        Self {
            widget,
            answered: false,
        }
    }

    fn answer(&mut self, reply: NewMessage) -> Uuid {
        let id = self
            .widget
            .message_service
            .add_message(&mut self.widget.state, reply);
        self.widget.commit(StoreEvent::MessagesChanged);
        self.answered = true;
        id
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if !self.answered {
            warn!("assistant request cancelled before a reply arrived");
            self.answer(NewMessage::assistant(APOLOGY_MESSAGE));
        }
        self.widget.set_loading(false);
    }
}
