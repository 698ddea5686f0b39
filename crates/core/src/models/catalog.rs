use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::group::DefaultGroup;

/// Display metadata for a message category (`categories.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// One-click starter prompt (`prompts.json` → `suggestionPrompts`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPrompt {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub color: Option<String>,
    pub category: String,
}

/// Guided prompt that asks context questions first (`prompts.json` → `smartPrompts`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartPrompt {
    pub id: String,
    pub text: String,
    pub category: String,
    #[serde(default)]
    pub context_questions: Vec<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl SmartPrompt {
    /// Build the message sent on behalf of the user from their answers.
    ///
    /// Questions are listed in declaration order; unanswered or blank ones
    /// are left out.
    pub fn compose_prompt(&self, answers: &HashMap<String, String>) -> String {
        let mut prompt = format!(
            "I need help with {}. Here's my situation:\n\n",
            self.text.to_lowercase()
        );
        for question in &self.context_questions {
            if let Some(answer) = answers.get(question).filter(|a| !a.trim().is_empty()) {
                prompt.push_str(&format!("• {}: {}\n", question.replacen('?', "", 1), answer));
            }
        }
        prompt.push_str(
            "\nBased on this information, please provide personalized advice and recommendations.",
        );
        prompt
    }
}

// ── Static documents ────────────────────────────────────────────────

/// `categories.json`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesDocument {
    pub categories: Vec<CategoryInfo>,
}

/// `prompts.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsDocument {
    #[serde(default)]
    pub suggestion_prompts: Option<Vec<SuggestionPrompt>>,
    #[serde(default)]
    pub smart_prompts: Option<Vec<SmartPrompt>>,
}

/// `groups.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsDocument {
    pub default_groups: Vec<DefaultGroup>,
}
