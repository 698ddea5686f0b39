use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::message::Category;

/// Colors handed out to newly created groups.
pub const GROUP_PALETTE: [&str; 17] = [
    "#EF4444", "#F97316", "#F59E0B", "#EAB308", "#84CC16", "#22C55E", "#10B981", "#14B8A6",
    "#06B6D4", "#0EA5E9", "#3B82F6", "#6366F1", "#8B5CF6", "#A855F7", "#D946EF", "#EC4899",
    "#F43F5E",
];

/// Pick a color from [`GROUP_PALETTE`] at random.
pub fn random_group_color() -> String {
    GROUP_PALETTE[..]
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(GROUP_PALETTE[0])
        .to_string()
}

/// A user-defined bucket for filing messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatGroup {
    /// Fixed ids for default groups (`"investment"`), UUID strings otherwise.
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub color: String,

    /// Number of messages filed under this group. Recomputed by the store.
    #[serde(default)]
    pub message_count: usize,

    pub last_activity: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl ChatGroup {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description,
            color: random_group_color(),
            message_count: 0,
            last_activity: Utc::now(),
            category: None,
        }
    }

    /// Install a default group template with a zero count and fresh activity time.
    pub fn from_default(template: DefaultGroup) -> Self {
        Self {
            id: template.id,
            name: template.name,
            description: template.description,
            color: template.color,
            message_count: 0,
            last_activity: Utc::now(),
            category: template.category,
        }
    }
}

/// Partial update for a group. `None` leaves the field untouched.
///
/// Count and activity are derived, so they cannot be patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub category: Option<Option<Category>>,
}

impl GroupPatch {
    pub fn apply(self, group: &mut ChatGroup) {
        if let Some(name) = self.name {
            group.name = name;
        }
        if let Some(description) = self.description {
            group.description = description;
        }
        if let Some(color) = self.color {
            group.color = color;
        }
        if let Some(category) = self.category {
            group.category = category;
        }
    }
}

/// Template entry from `groups.json` (`defaultGroups`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub is_default: bool,
}
