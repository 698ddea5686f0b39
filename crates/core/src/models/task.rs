use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// What the task asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    CheckPrice,
    BuyOrder,
    SellOrder,
}

impl TaskType {
    /// Orders need a quantity; price checks do not.
    pub fn requires_quantity(&self) -> bool {
        matches!(self, TaskType::BuyOrder | TaskType::SellOrder)
    }

    /// Human wording used in chat confirmations.
    pub fn description(&self) -> &'static str {
        match self {
            TaskType::CheckPrice => "price monitoring",
            TaskType::BuyOrder => "buy order",
            TaskType::SellOrder => "sell order",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::CheckPrice => write!(f, "check_price"),
            TaskType::BuyOrder => write!(f, "buy_order"),
            TaskType::SellOrder => write!(f, "sell_order"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Monitoring,
    Triggered,
    Completed,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Monitoring => "monitoring",
            TaskStatus::Triggered => "triggered",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    StopLoss,
}

/// Price thresholds attached to a task. Stored only; nothing evaluates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_above: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_below: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_change: Option<f64>,
}

/// A stock-monitoring or order intent, independent of the chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTask {
    pub id: Uuid,

    #[serde(rename = "type")]
    pub task_type: TaskType,

    /// Ticker, always upper-case.
    pub symbol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,

    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub priority: Priority,

    pub alert_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<TaskConditions>,
}

impl StockTask {
    /// Validate `new` and stamp it with a fresh id and creation time.
    pub fn new(new: NewTask) -> Result<Self, CoreError> {
        new.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            task_type: new.task_type,
            symbol: new.symbol.trim().to_uppercase(),
            company_name: new.company_name,
            quantity: new.quantity,
            target_price: new.target_price,
            current_price: new.current_price,
            order_type: new.order_type,
            status: new.status,
            created_at: now,
            updated_at: now,
            triggered_at: None,
            notes: new.notes,
            priority: new.priority,
            alert_enabled: new.alert_enabled,
            conditions: new.conditions,
        })
    }

    /// Re-check the creation rules against the current field values.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_fields(
            self.task_type,
            &self.symbol,
            self.quantity,
            self.target_price,
            self.current_price,
        )
    }
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub task_type: TaskType,
    pub symbol: String,
    pub company_name: Option<String>,
    pub quantity: Option<f64>,
    pub target_price: Option<f64>,
    pub current_price: Option<f64>,
    pub order_type: Option<OrderType>,
    pub status: TaskStatus,
    pub notes: Option<String>,
    pub priority: Priority,
    pub alert_enabled: bool,
    pub conditions: Option<TaskConditions>,
}

impl NewTask {
    /// A pending, medium-priority task with alerts on.
    pub fn new(task_type: TaskType, symbol: impl Into<String>) -> Self {
        Self {
            task_type,
            symbol: symbol.into(),
            company_name: None,
            quantity: None,
            target_price: None,
            current_price: None,
            order_type: None,
            status: TaskStatus::Pending,
            notes: None,
            priority: Priority::Medium,
            alert_enabled: true,
            conditions: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_fields(
            self.task_type,
            &self.symbol,
            self.quantity,
            self.target_price,
            self.current_price,
        )
    }
}

/// Rules:
/// - Symbol must be non-empty
/// - Buy/sell orders need a positive, finite quantity
/// - Prices, when present, must be finite and non-negative
fn validate_fields(
    task_type: TaskType,
    symbol: &str,
    quantity: Option<f64>,
    target_price: Option<f64>,
    current_price: Option<f64>,
) -> Result<(), CoreError> {
    if symbol.trim().is_empty() {
        return Err(CoreError::ValidationError("Task symbol is required".into()));
    }

    if task_type.requires_quantity() {
        match quantity {
            Some(q) if q.is_finite() && q > 0.0 => {}
            Some(q) => {
                return Err(CoreError::ValidationError(format!(
                    "Order quantity must be positive, got {q}"
                )))
            }
            None => {
                return Err(CoreError::ValidationError(format!(
                    "A {} needs a quantity",
                    task_type.description()
                )))
            }
        }
    }

    for (label, price) in [("target price", target_price), ("current price", current_price)] {
        if let Some(p) = price {
            if !p.is_finite() || p < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "Invalid {label}: {p} (must be finite and non-negative)"
                )));
            }
        }
    }

    Ok(())
}

/// Partial update for a task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub task_type: Option<TaskType>,
    pub symbol: Option<String>,
    pub company_name: Option<Option<String>>,
    pub quantity: Option<Option<f64>>,
    pub target_price: Option<Option<f64>>,
    pub current_price: Option<Option<f64>>,
    pub order_type: Option<Option<OrderType>>,
    pub status: Option<TaskStatus>,
    pub triggered_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub alert_enabled: Option<bool>,
    pub conditions: Option<Option<TaskConditions>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Merge into `task` and refresh `updated_at`.
    ///
    /// Moving into `Triggered` stamps `triggered_at` unless the patch sets it.
    pub fn apply(self, task: &mut StockTask) {
        let now = Utc::now();
        if let Some(task_type) = self.task_type {
            task.task_type = task_type;
        }
        if let Some(symbol) = self.symbol {
            task.symbol = symbol.trim().to_uppercase();
        }
        if let Some(v) = self.company_name {
            task.company_name = v;
        }
        if let Some(v) = self.quantity {
            task.quantity = v;
        }
        if let Some(v) = self.target_price {
            task.target_price = v;
        }
        if let Some(v) = self.current_price {
            task.current_price = v;
        }
        if let Some(v) = self.order_type {
            task.order_type = v;
        }
        if let Some(status) = self.status {
            if status == TaskStatus::Triggered
                && task.status != TaskStatus::Triggered
                && self.triggered_at.is_none()
            {
                task.triggered_at = Some(now);
            }
            task.status = status;
        }
        if let Some(v) = self.triggered_at {
            task.triggered_at = v;
        }
        if let Some(v) = self.notes {
            task.notes = v;
        }
        if let Some(v) = self.priority {
            task.priority = v;
        }
        if let Some(v) = self.alert_enabled {
            task.alert_enabled = v;
        }
        if let Some(v) = self.conditions {
            task.conditions = v;
        }
        task.updated_at = now;
    }
}

/// Step of the task creation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Pick check-price / buy / sell.
    ChooseType,
    /// Ticker, plus quantity for orders.
    Instrument,
    /// Prices, conditions, priority, notes.
    Details,
}

/// Multi-step builder for a [`NewTask`].
///
/// Each step gates progress the same way the creation dialog does: the type
/// must be chosen, then a symbol (and quantity for orders) entered; details
/// are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskWizard {
    step: WizardStep,
    draft: NewTask,
}

impl Default for TaskWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::ChooseType,
            draft: NewTask {
                conditions: Some(TaskConditions::default()),
                ..NewTask::new(TaskType::CheckPrice, "")
            },
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &NewTask {
        &self.draft
    }

    /// Mutable access to the draft for filling in fields.
    pub fn draft_mut(&mut self) -> &mut NewTask {
        &mut self.draft
    }

    pub fn set_type(&mut self, task_type: TaskType) {
        self.draft.task_type = task_type;
    }

    pub fn set_symbol(&mut self, symbol: &str) {
        self.draft.symbol = symbol.to_uppercase();
    }

    pub fn set_quantity(&mut self, quantity: Option<f64>) {
        self.draft.quantity = quantity;
    }

    pub fn can_proceed(&self) -> bool {
        match self.step {
            WizardStep::ChooseType => true,
            WizardStep::Instrument => {
                let has_symbol = !self.draft.symbol.trim().is_empty();
                if self.draft.task_type.requires_quantity() {
                    has_symbol && self.draft.quantity.is_some()
                } else {
                    has_symbol
                }
            }
            WizardStep::Details => true,
        }
    }

    /// Advance one step. Returns `false` when gated or already at the end.
    pub fn next(&mut self) -> bool {
        if !self.can_proceed() {
            return false;
        }
        match self.step {
            WizardStep::ChooseType => self.step = WizardStep::Instrument,
            WizardStep::Instrument => self.step = WizardStep::Details,
            WizardStep::Details => return false,
        }
        true
    }

    /// Go back one step. Returns `false` on the first step.
    pub fn back(&mut self) -> bool {
        match self.step {
            WizardStep::ChooseType => return false,
            WizardStep::Instrument => self.step = WizardStep::ChooseType,
            WizardStep::Details => self.step = WizardStep::Instrument,
        }
        true
    }

    /// Finish the wizard, validating the draft.
    pub fn finish(self) -> Result<NewTask, CoreError> {
        self.draft.validate()?;
        Ok(self.draft)
    }
}
