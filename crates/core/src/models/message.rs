use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Topic label inferred from message content, used for filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Investment,
    Retirement,
    Budgeting,
    Insurance,
    Taxes,
    #[default]
    General,
}

/// Keyword table scanned in order; the first matching row wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Investment, &["invest", "stock", "portfolio"]),
    (Category::Retirement, &["retire", "401k", "ira"]),
    (Category::Budgeting, &["budget", "save", "emergency fund"]),
    (Category::Insurance, &["insurance", "coverage"]),
    (Category::Taxes, &["tax", "deduction"]),
];

impl Category {
    /// All categories, in keyword-precedence order.
    pub const ALL: [Category; 6] = [
        Category::Investment,
        Category::Retirement,
        Category::Budgeting,
        Category::Insurance,
        Category::Taxes,
        Category::General,
    ];

    /// Infer a category from free text by case-insensitive keyword scan.
    ///
    /// Matching is plain substring search, so "ira" also hits words like
    /// "aspiration". Falls back to `General` when nothing matches.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Investment => "investment",
            Category::Retirement => "retirement",
            Category::Budgeting => "budgeting",
            Category::Insurance => "insurance",
            Category::Taxes => "taxes",
            Category::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,

    pub content: String,

    pub role: Role,

    /// Creation time. Serialized as RFC 3339 and parsed back on load.
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub is_favorite: bool,

    /// Id of the group this message is filed under (non-owning).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Free-text tags, kept in insertion order without duplicates.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub category: Category,
}

impl Message {
    /// Build a message from caller-supplied fields, assigning id and timestamp.
    ///
    /// Assistant text is keyword-categorized; user text is always `General`.
    pub fn new(new: NewMessage) -> Self {
        let category = match new.role {
            Role::User => Category::General,
            Role::Assistant => Category::detect(&new.content),
        };
        Self {
            id: Uuid::new_v4(),
            content: new.content,
            role: new.role,
            timestamp: Utc::now(),
            is_favorite: new.is_favorite,
            group: new.group,
            tags: new.tags,
            category,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive match of `needle` (already lower-cased) against
    /// the content and every tag.
    pub(crate) fn matches_query(&self, needle: &str) -> bool {
        self.content.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// Caller-supplied part of a message; id, timestamp and category are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub content: String,
    pub role: Role,
    pub is_favorite: bool,
    pub group: Option<String>,
    pub tags: Vec<String>,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(content, Role::User)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(content, Role::Assistant)
    }

    fn with_role(content: impl Into<String>, role: Role) -> Self {
        Self {
            content: content.into(),
            role,
            is_favorite: false,
            group: None,
            tags: Vec::new(),
        }
    }
}
