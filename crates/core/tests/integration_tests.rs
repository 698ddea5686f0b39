// ═══════════════════════════════════════════════════════════════════
// Integration Tests — ChatWidget store and WidgetHost end to end
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use finsense_widget_core::embed::WidgetHost;
use finsense_widget_core::errors::CoreError;
use finsense_widget_core::events::StoreEvent;
use finsense_widget_core::models::api::{ApiResponse, AssistantRequest};
use finsense_widget_core::models::catalog::SmartPrompt;
use finsense_widget_core::models::config::{ConfigPatch, Theme, DEFAULT_WELCOME_MESSAGE};
use finsense_widget_core::models::message::{Category, NewMessage, Role};
use finsense_widget_core::models::task::{NewTask, TaskPatch, TaskStatus, TaskType, TaskWizard};
use finsense_widget_core::providers::mock_assistant::MockAssistantConfig;
use finsense_widget_core::providers::traits::{AssistantProvider, DataSource};
use finsense_widget_core::services::api_service::ApiService;
use finsense_widget_core::services::data_service::DataService;
use finsense_widget_core::storage::backend::{MemoryBackend, StorageBackend};
use finsense_widget_core::storage::format::STORAGE_KEY;
use finsense_widget_core::{ChatWidget, APOLOGY_MESSAGE, CONTEXT_WINDOW};

// ═══════════════════════════════════════════════════════════════════
// Test Doubles
// ═══════════════════════════════════════════════════════════════════

/// Replies "echo: <message>" and remembers every request.
#[derive(Clone, Default)]
struct EchoAssistant {
    requests: Arc<Mutex<Vec<AssistantRequest>>>,
}

impl EchoAssistant {
    fn last(&self) -> AssistantRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl AssistantProvider for EchoAssistant {
    fn name(&self) -> &str {
        "Echo"
    }

    async fn complete(&self, request: &AssistantRequest) -> Result<ApiResponse, CoreError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(ApiResponse {
            content: format!("echo: {}", request.message),
            ..ApiResponse::default()
        })
    }
}

struct DownAssistant;

#[async_trait]
impl AssistantProvider for DownAssistant {
    fn name(&self) -> &str {
        "Down"
    }

    async fn complete(&self, _request: &AssistantRequest) -> Result<ApiResponse, CoreError> {
        Err(CoreError::Network("connection refused".into()))
    }
}

struct OfflineSource;

#[async_trait]
impl DataSource for OfflineSource {
    fn name(&self) -> &str {
        "Offline"
    }

    async fn fetch(&self, endpoint: &str) -> Result<serde_json::Value, CoreError> {
        Err(CoreError::Fetch {
            endpoint: endpoint.to_string(),
            status: 500,
        })
    }
}

/// Storage that refuses every write.
struct ReadOnlyBackend;

impl StorageBackend for ReadOnlyBackend {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CoreError> {
        Err(CoreError::FileIO("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

fn offline_data() -> DataService {
    DataService::new(Box::new(OfflineSource), Duration::from_secs(300))
}

fn widget_on(backend: &MemoryBackend, assistant: &EchoAssistant) -> ChatWidget {
    ChatWidget::load(
        Box::new(backend.clone()),
        ApiService::new(Box::new(assistant.clone()), None),
        offline_data(),
    )
}

fn widget() -> (ChatWidget, EchoAssistant, MemoryBackend) {
    let backend = MemoryBackend::new();
    let assistant = EchoAssistant::default();
    (widget_on(&backend, &assistant), assistant, backend)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ═══════════════════════════════════════════════════════════════════
// Welcome & Default Groups
// ═══════════════════════════════════════════════════════════════════

mod welcome {
    use super::*;

    #[test]
    fn first_open_adds_welcome_once() {
        let (mut w, _, _) = widget();
        w.set_open(true);
        assert!(w.is_open());
        assert_eq!(w.messages().len(), 1);
        let m = &w.messages()[0];
        assert_eq!(m.role, Role::Assistant);
        assert_eq!(m.content, DEFAULT_WELCOME_MESSAGE);
        assert_eq!(m.category, Category::General);
        assert!(w.has_shown_welcome());

        w.set_open(false);
        w.set_open(true);
        assert_eq!(w.messages().len(), 1);
    }

    #[test]
    fn not_repeated_after_clear() {
        let (mut w, _, _) = widget();
        w.set_open(true);
        w.clear_chat();
        w.set_open(false);
        w.set_open(true);
        assert!(w.messages().is_empty());
        assert!(w.has_shown_welcome());
    }

    #[test]
    fn skipped_when_messages_exist() {
        let (mut w, _, _) = widget();
        w.add_message(NewMessage::user("hi")).unwrap();
        w.set_open(true);
        assert_eq!(w.messages().len(), 1);
        assert!(!w.has_shown_welcome());
    }

    #[test]
    fn empty_welcome_text_disables_it() {
        let (mut w, _, _) = widget();
        w.update_config(ConfigPatch {
            welcome_message: Some(String::new()),
            ..ConfigPatch::default()
        });
        w.set_open(true);
        assert!(w.messages().is_empty());
        assert!(!w.has_shown_welcome());
    }

    #[tokio::test]
    async fn open_installs_fallback_groups_once() {
        let (mut w, _, _) = widget();
        w.open().await;
        let ids: Vec<&str> = w.groups().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["investment", "retirement"]);
        assert!(w.groups().iter().all(|g| g.message_count == 0));
        assert_eq!(w.messages().len(), 1);

        w.set_open(false);
        w.open().await;
        assert_eq!(w.groups().len(), 2);
        assert_eq!(w.load_default_groups().await, 0);
    }

    #[tokio::test]
    async fn existing_groups_are_kept() {
        let (mut w, _, _) = widget();
        w.create_group("Mine", None).unwrap();
        w.open().await;
        assert_eq!(w.groups().len(), 1);
        assert_eq!(w.groups()[0].name, "Mine");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Sending Messages
// ═══════════════════════════════════════════════════════════════════

mod sending {
    use super::*;

    #[tokio::test]
    async fn appends_user_then_assistant() {
        let (mut w, _, _) = widget();
        let reply = w.send_message("How do I budget?").await.unwrap();

        assert_eq!(w.messages().len(), 2);
        assert_eq!(w.messages()[0].role, Role::User);
        assert_eq!(w.messages()[0].content, "How do I budget?");
        assert_eq!(w.messages()[0].category, Category::General);
        assert_eq!(w.messages()[1].id, reply);
        assert_eq!(w.messages()[1].role, Role::Assistant);
        assert_eq!(w.messages()[1].content, "echo: How do I budget?");
        assert_eq!(w.messages()[1].category, Category::Budgeting);
        assert!(!w.is_loading());
        assert!(w.messages()[0].timestamp <= w.messages()[1].timestamp);
    }

    #[tokio::test]
    async fn context_is_previous_five_messages() {
        let (mut w, assistant, _) = widget();
        for i in 0..7 {
            w.add_message(NewMessage::user(format!("m{i}"))).unwrap();
        }
        w.send_message("new").await.unwrap();

        let request = assistant.last();
        assert_eq!(request.message, "new");
        assert_eq!(request.context.len(), CONTEXT_WINDOW);
        assert_eq!(request.context, vec!["m2", "m3", "m4", "m5", "m6"]);
    }

    #[tokio::test]
    async fn first_message_has_empty_context() {
        let (mut w, assistant, _) = widget();
        w.send_message("hello").await.unwrap();
        assert!(assistant.last().context.is_empty());
    }

    #[tokio::test]
    async fn failure_appends_apology() {
        let mut w = ChatWidget::load(
            Box::new(MemoryBackend::new()),
            ApiService::new(Box::new(DownAssistant), None),
            offline_data(),
        );
        let reply = w.send_message("anyone there?").await.unwrap();

        assert_eq!(w.messages().len(), 2);
        let apology = w.get_message(reply).unwrap();
        assert_eq!(apology.role, Role::Assistant);
        assert_eq!(apology.content, APOLOGY_MESSAGE);
        assert!(!w.is_loading());
    }

    #[tokio::test]
    async fn loading_flag_brackets_request() {
        let (mut w, _, _) = widget();
        let mut rx = w.subscribe();
        w.send_message("hi").await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                StoreEvent::MessagesChanged,
                StoreEvent::LoadingChanged(true),
                StoreEvent::MessagesChanged,
                StoreEvent::LoadingChanged(false),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_send_clears_loading() {
        let backend = MemoryBackend::new();
        let mut w = ChatWidget::load(
            Box::new(backend.clone()),
            ApiService::mock(MockAssistantConfig::default()),
            offline_data(),
        );
        let mut rx = w.subscribe();

        let outcome =
            tokio::time::timeout(Duration::from_millis(100), w.send_message("hello")).await;
        assert!(outcome.is_err(), "mock replies after at least 1.5s");

        assert!(!w.is_loading());
        let messages = w.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, APOLOGY_MESSAGE);
        assert_eq!(
            drain(&mut rx).last(),
            Some(&StoreEvent::LoadingChanged(false))
        );

        let reloaded = widget_on(&backend, &EchoAssistant::default());
        assert_eq!(reloaded.messages().len(), 2);
    }

    #[tokio::test]
    async fn blank_message_rejected() {
        let (mut w, _, _) = widget();
        let err = w.send_message("   ").await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(w.messages().is_empty());
    }

    #[tokio::test]
    async fn smart_prompt_sends_composed_text() {
        let (mut w, assistant, _) = widget();
        let prompt = SmartPrompt {
            id: "retire".into(),
            text: "Plan my retirement".into(),
            category: "Retirement".into(),
            context_questions: vec!["What is your age?".into()],
            icon: None,
        };
        let mut answers = HashMap::new();
        answers.insert("What is your age?".to_string(), "40".to_string());

        w.send_smart_prompt(&prompt, &answers).await.unwrap();
        let sent = assistant.last().message;
        assert!(sent.starts_with("I need help with plan my retirement."));
        assert!(sent.contains("• What is your age: 40\n"));
        assert_eq!(w.messages()[0].content, sent);
    }

    #[tokio::test]
    async fn default_mock_replies_from_pool() {
        use finsense_widget_core::providers::mock_assistant::{
            MockAssistantConfig, MockAssistantProvider,
        };
        let mut w = ChatWidget::load(
            Box::new(MemoryBackend::new()),
            ApiService::mock(MockAssistantConfig::instant()),
            offline_data(),
        );
        w.send_message("hi").await.unwrap();
        let pool: Vec<String> = MockAssistantProvider::response_pool()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert!(pool.contains(&w.messages()[1].content));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Organization: favorites, tags, groups, filters
// ═══════════════════════════════════════════════════════════════════

mod organization {
    use super::*;

    #[test]
    fn favorites_and_tags() {
        let (mut w, _, _) = widget();
        let id = w.add_message(NewMessage::user("x")).unwrap();
        assert!(w.toggle_favorite(id).unwrap());
        assert_eq!(w.get_favorite_messages().len(), 1);
        assert!(!w.toggle_favorite(id).unwrap());
        assert!(w.get_favorite_messages().is_empty());

        w.add_tag_to_message(id, "ira").unwrap();
        w.add_tag_to_message(id, "ira").unwrap();
        assert_eq!(w.get_message(id).unwrap().tags, vec!["ira".to_string()]);
        w.remove_tag_from_message(id, "ira").unwrap();
        assert!(w.get_message(id).unwrap().tags.is_empty());
    }

    #[test]
    fn add_into_missing_group_rejected() {
        let (mut w, _, _) = widget();
        let err = w
            .add_message(NewMessage {
                group: Some("ghost".into()),
                ..NewMessage::user("x")
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::GroupNotFound(ref g) if g == "ghost"));
        assert!(w.messages().is_empty());

        let group = w.create_group("Taxes", None).unwrap();
        w.add_message(NewMessage {
            group: Some(group.clone()),
            ..NewMessage::user("x")
        })
        .unwrap();
        assert_eq!(w.group_message_count(&group), 1);
        assert_eq!(w.get_group(&group).unwrap().message_count, 1);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let (mut w, _, _) = widget();
        assert!(matches!(
            w.toggle_favorite(Uuid::new_v4()),
            Err(CoreError::MessageNotFound(_))
        ));
        assert!(matches!(
            w.delete_group("nope"),
            Err(CoreError::GroupNotFound(_))
        ));
        assert!(matches!(
            w.delete_task(Uuid::new_v4()),
            Err(CoreError::TaskNotFound(_))
        ));
        assert!(w.set_current_group(Some("nope".into())).is_err());
        assert!(w.set_selected_task(Some(Uuid::new_v4())).is_err());
    }

    #[test]
    fn move_keeps_counts_consistent() {
        let (mut w, _, _) = widget();
        let g1 = w.create_group("One", None).unwrap();
        let g2 = w.create_group("Two", Some("second".into())).unwrap();
        let m1 = w.add_message(NewMessage::user("a")).unwrap();
        let m2 = w.add_message(NewMessage::user("b")).unwrap();

        w.move_message_to_group(m1, &g1).unwrap();
        w.move_message_to_group(m2, &g1).unwrap();
        assert_eq!(w.get_group(&g1).unwrap().message_count, 2);

        w.move_message_to_group(m2, &g2).unwrap();
        assert_eq!(w.get_group(&g1).unwrap().message_count, 1);
        assert_eq!(w.get_group(&g2).unwrap().message_count, 1);
        assert_eq!(w.group_message_count(&g2), 1);
        assert_eq!(w.groups_by_recent_activity()[0].id, g2);

        w.remove_message_from_group(m1).unwrap();
        assert_eq!(w.get_group(&g1).unwrap().message_count, 0);
    }

    #[test]
    fn delete_group_ungroups_and_clears_selector() {
        let (mut w, _, _) = widget();
        let g = w.create_group("Taxes", None).unwrap();
        let m = w.add_message(NewMessage::user("a")).unwrap();
        w.move_message_to_group(m, &g).unwrap();
        w.set_current_group(Some(g.clone())).unwrap();

        w.delete_group(&g).unwrap();
        assert!(w.get_group(&g).is_none());
        assert!(w.get_message(m).unwrap().group.is_none());
        assert!(w.ui().current_group.is_none());
        assert_eq!(w.get_filtered_messages().len(), 1);
    }

    #[test]
    fn clear_chat_zeroes_counts_and_keeps_groups() {
        let (mut w, _, _) = widget();
        let g = w.create_group("Taxes", None).unwrap();
        let m = w.add_message(NewMessage::user("a")).unwrap();
        w.move_message_to_group(m, &g).unwrap();
        w.create_task(NewTask::new(TaskType::CheckPrice, "AAPL")).unwrap();

        w.clear_chat();
        assert!(w.messages().is_empty());
        assert_eq!(w.groups().len(), 1);
        assert_eq!(w.groups()[0].message_count, 0);
        assert_eq!(w.tasks().len(), 1);
    }

    #[test]
    fn search_by_content_and_tag() {
        let (mut w, _, _) = widget();
        w.add_message(NewMessage::assistant("Create a monthly budget first.")).unwrap();
        let tagged = w.add_message(NewMessage::user("Where do I start?")).unwrap();
        w.add_tag_to_message(tagged, "Budget").unwrap();
        w.add_message(NewMessage::assistant("Index funds are cheap.")).unwrap();

        w.set_search_query("budget");
        assert_eq!(w.get_filtered_messages().len(), 2);

        w.set_selected_category(Some(Category::Budgeting));
        assert_eq!(w.get_filtered_messages().len(), 1);

        w.set_search_query("");
        w.set_selected_category(None);
        assert_eq!(w.get_filtered_messages().len(), 3);
    }

    #[test]
    fn grouped_view() {
        let (mut w, _, _) = widget();
        let g = w.create_group("Taxes", None).unwrap();
        let m = w.add_message(NewMessage::user("a")).unwrap();
        w.add_message(NewMessage::user("b")).unwrap();
        w.move_message_to_group(m, &g).unwrap();

        let grouped = w.get_grouped_messages();
        assert_eq!(grouped[&g].len(), 1);
        assert_eq!(grouped["default"].len(), 1);
    }

    #[test]
    fn panels_toggle() {
        let (mut w, _, _) = widget();
        w.set_show_group_panel(true);
        w.set_show_task_panel(true);
        assert!(w.ui().show_group_panel);
        assert!(w.ui().show_task_panel);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Tasks
// ═══════════════════════════════════════════════════════════════════

mod tasks {
    use super::*;

    #[test]
    fn lifecycle() {
        let (mut w, _, _) = widget();
        let id = w.create_task(NewTask::new(TaskType::CheckPrice, "aapl")).unwrap();
        assert_eq!(w.get_task(id).unwrap().symbol, "AAPL");

        w.update_task(id, TaskPatch::status(TaskStatus::Triggered)).unwrap();
        let task = w.get_task(id).unwrap();
        assert_eq!(task.status, TaskStatus::Triggered);
        assert!(task.triggered_at.is_some());
        assert_eq!(w.get_tasks_by_status(TaskStatus::Triggered).len(), 1);
        assert_eq!(w.get_tasks_by_type(TaskType::CheckPrice).len(), 1);

        w.delete_task(id).unwrap();
        assert!(w.tasks().is_empty());
    }

    #[test]
    fn delete_clears_selection() {
        let (mut w, _, _) = widget();
        let id = w.create_task(NewTask::new(TaskType::CheckPrice, "TSLA")).unwrap();
        w.set_selected_task(Some(id)).unwrap();
        assert_eq!(w.selected_task().unwrap().id, id);

        w.delete_task(id).unwrap();
        assert!(w.ui().selected_task.is_none());
        assert!(w.selected_task().is_none());
    }

    #[test]
    fn invalid_task_rejected() {
        let (mut w, _, _) = widget();
        let err = w
            .create_task(NewTask::new(TaskType::BuyOrder, "AAPL"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(w.tasks().is_empty());
    }

    #[test]
    fn wizard_creates_task_and_confirms_in_chat() {
        let (mut w, _, _) = widget();
        let mut wizard = TaskWizard::new();
        wizard.set_type(TaskType::BuyOrder);
        assert!(wizard.next());
        wizard.set_symbol("nvda");
        wizard.set_quantity(Some(4.0));
        assert!(wizard.next());

        let id = w.create_task_from_wizard(wizard).unwrap();
        assert_eq!(w.get_task(id).unwrap().symbol, "NVDA");
        let confirmation = w.messages().last().unwrap();
        assert_eq!(confirmation.role, Role::Assistant);
        assert_eq!(
            confirmation.content,
            "I've created a buy order task for NVDA. I'll monitor this stock and notify you when your conditions are met."
        );
    }

    #[test]
    fn unfinished_wizard_creates_nothing() {
        let (mut w, _, _) = widget();
        let wizard = TaskWizard::new();
        assert!(w.create_task_from_wizard(wizard).is_err());
        assert!(w.tasks().is_empty());
        assert!(w.messages().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════

mod configuration {
    use super::*;

    #[tokio::test]
    async fn api_key_reaches_assistant_and_survives_other_patches() {
        let (mut w, assistant, _) = widget();
        w.update_config(ConfigPatch {
            api_key: Some("sk-1".into()),
            ..ConfigPatch::default()
        });
        w.update_config(ConfigPatch {
            theme: Some(Theme::Dark),
            ..ConfigPatch::default()
        });
        w.send_message("hi").await.unwrap();

        assert_eq!(assistant.last().api_key.as_deref(), Some("sk-1"));
        assert_eq!(w.config().theme, Theme::Dark);
        assert_eq!(w.config().api_key.as_deref(), Some("sk-1"));
        assert_eq!(w.api_service().provider_name(), "Echo");
    }

    #[test]
    fn config_change_emits_event() {
        let (mut w, _, _) = widget();
        let mut rx = w.subscribe();
        w.update_config(ConfigPatch::default());
        assert_eq!(drain(&mut rx), vec![StoreEvent::ConfigChanged]);
    }

    #[tokio::test]
    async fn static_data_falls_back_offline() {
        let (w, _, _) = widget();
        assert_eq!(w.get_categories().await.len(), 4);
        assert_eq!(w.get_suggestion_prompts().await.len(), 3);
        assert_eq!(w.get_smart_prompts().await.len(), 1);
        assert_eq!(w.data_service().source_name(), "Offline");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Persistence
// ═══════════════════════════════════════════════════════════════════

mod persistence {
    use super::*;

    #[tokio::test]
    async fn state_survives_reload_but_view_does_not() {
        let (mut w, assistant, backend) = widget();
        w.open().await;
        w.send_message("Should I buy stock?").await.unwrap();
        let g = w.create_group("Ideas", None).unwrap();
        let first = w.messages()[1].id;
        w.move_message_to_group(first, &g).unwrap();
        w.toggle_favorite(first).unwrap();
        let task = w.create_task(NewTask::new(TaskType::CheckPrice, "AAPL")).unwrap();
        w.set_selected_task(Some(task)).unwrap();
        w.set_search_query("stock");
        assert!(backend.get(STORAGE_KEY).unwrap().is_some());
        assert!(!w.has_unsaved_changes());

        let reloaded = widget_on(&backend, &assistant);
        assert_eq!(reloaded.messages(), w.messages());
        assert_eq!(reloaded.groups(), w.groups());
        assert_eq!(reloaded.tasks(), w.tasks());
        assert!(reloaded.has_shown_welcome());
        assert_eq!(reloaded.get_message(first).unwrap().timestamp, w.messages()[1].timestamp);

        assert!(!reloaded.is_open());
        assert!(reloaded.ui().search_query.is_empty());
        assert!(reloaded.ui().selected_task.is_none());
    }

    #[test]
    fn persisted_api_key_configures_assistant() {
        let backend = MemoryBackend::new();
        let assistant = EchoAssistant::default();
        let mut w = widget_on(&backend, &assistant);
        w.update_config(ConfigPatch {
            api_key: Some("sk-2".into()),
            ..ConfigPatch::default()
        });

        let reloaded = widget_on(&backend, &assistant);
        assert_eq!(reloaded.api_service().api_key(), Some("sk-2"));
    }

    #[test]
    fn malformed_state_starts_fresh() {
        let backend = MemoryBackend::new();
        backend
            .set(STORAGE_KEY, br#"{"state":{"messages":[{"bogus":true}]},"version":0}"#)
            .unwrap();

        let assistant = EchoAssistant::default();
        let w = widget_on(&backend, &assistant);
        assert!(w.messages().is_empty());
        assert!(!w.has_shown_welcome());

        let err = ChatWidget::try_load(
            Box::new(backend.clone()),
            ApiService::new(Box::new(assistant), None),
            offline_data(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn failed_writes_leave_state_dirty() {
        let mut w = ChatWidget::load(
            Box::new(ReadOnlyBackend),
            ApiService::new(Box::new(EchoAssistant::default()), None),
            offline_data(),
        );
        w.add_message(NewMessage::user("kept in memory")).unwrap();
        assert_eq!(w.messages().len(), 1);
        assert!(w.has_unsaved_changes());
        assert!(matches!(w.save(), Err(CoreError::FileIO(_))));
    }

    #[test]
    fn to_json_exports_state() {
        let (mut w, _, _) = widget();
        w.add_message(NewMessage::user("hi")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&w.to_json().unwrap()).unwrap();
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["hasShownWelcome"], false);
    }
}

// ═══════════════════════════════════════════════════════════════════
// WidgetHost
// ═══════════════════════════════════════════════════════════════════

mod host {
    use super::*;

    fn host_on(backend: &MemoryBackend) -> WidgetHost {
        let backend = backend.clone();
        WidgetHost::new(move || {
            ChatWidget::load(
                Box::new(backend.clone()),
                ApiService::new(Box::new(EchoAssistant::default()), None),
                offline_data(),
            )
        })
    }

    #[test]
    fn init_from_data_attributes() {
        let mut host = host_on(&MemoryBackend::new());
        assert!(!host.is_mounted());

        let w = host.init_from_data_attributes([
            ("data-api-key", "sk-embed"),
            ("data-theme", "dark"),
            ("data-company-name", "Acme"),
        ]);
        assert_eq!(w.config().theme, Theme::Dark);
        assert_eq!(w.config().company_name.as_deref(), Some("Acme"));
        assert_eq!(w.api_service().api_key(), Some("sk-embed"));
        assert!(host.is_mounted());
    }

    #[test]
    fn init_replaces_existing_instance() {
        let backend = MemoryBackend::new();
        let mut host = host_on(&backend);
        host.init(ConfigPatch::default())
            .add_message(NewMessage::user("before")).unwrap();

        let w = host.init(ConfigPatch::default());
        // Same storage, so the transcript is rehydrated.
        assert_eq!(w.messages().len(), 1);
        assert!(!w.is_open());
    }

    #[test]
    fn destroy_and_update_config() {
        let mut host = host_on(&MemoryBackend::new());
        assert!(!host.destroy());
        assert!(!host.update_config(ConfigPatch::default()));

        host.init(ConfigPatch::default());
        assert!(host.update_config(ConfigPatch {
            theme: Some(Theme::Dark),
            ..ConfigPatch::default()
        }));
        assert_eq!(host.instance().unwrap().config().theme, Theme::Dark);

        assert!(host.destroy());
        assert!(host.instance().is_none());
        assert!(host.instance_mut().is_none());
    }
}
