use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, warn};

use crate::errors::CoreError;
use crate::models::catalog::{
    CategoriesDocument, CategoryInfo, GroupsDocument, PromptsDocument, SmartPrompt,
    SuggestionPrompt,
};
use crate::models::group::DefaultGroup;
use crate::models::message::Category;
use crate::providers::http_source::HttpDataSource;
use crate::providers::traits::DataSource;

pub const CATEGORIES_ENDPOINT: &str = "categories.json";
pub const PROMPTS_ENDPOINT: &str = "prompts.json";
pub const GROUPS_ENDPOINT: &str = "groups.json";

pub const DEFAULT_DATA_BASE_URL: &str = "http://localhost:5173/data";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Where the static documents live and how long they stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataServiceConfig {
    pub base_url: String,
    pub cache_ttl: Duration,
}

impl Default for DataServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DATA_BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl DataServiceConfig {
    /// Build from environment variables.
    ///
    /// Optional:
    /// - `FINSENSE_DATA_BASE_URL`: default `http://localhost:5173/data`
    /// - `FINSENSE_DATA_CACHE_TTL_SECS`: default 300
    pub fn from_env() -> Self {
        let base_url = std::env::var("FINSENSE_DATA_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATA_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let ttl_secs = std::env::var("FINSENSE_DATA_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);
        Self {
            base_url,
            cache_ttl: Duration::from_secs(ttl_secs),
        }
    }
}

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Freshness of one cached document, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    pub expired: bool,
    /// Zero once expired.
    pub expires_in: Duration,
}

/// Loads the static JSON documents with a short-lived cache.
///
/// Cache strategy:
/// - A fresh entry (younger than the TTL) is returned without fetching.
/// - Otherwise the document is fetched; success replaces value and expiry.
/// - If the fetch fails, an expired entry is served instead (stale-on-error).
/// - Only when nothing was ever cached does the error reach the caller.
///
/// The typed getters go one step further and never fail: any error is
/// replaced by a small hardcoded data set.
pub struct DataService {
    source: Box<dyn DataSource>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl DataService {
    pub fn new(source: Box<dyn DataSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// HTTP-backed service for the given configuration.
    pub fn from_config(config: &DataServiceConfig) -> Self {
        Self::new(
            Box::new(HttpDataSource::new(config.base_url.clone())),
            config.cache_ttl,
        )
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch a document, honoring the cache policy described on the type.
    pub async fn fetch_with_cache(&self, endpoint: &str) -> Result<serde_json::Value, CoreError> {
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = cache.get(endpoint) {
                if Instant::now() < entry.expires_at {
                    return Ok(entry.value.clone());
                }
            }
        }

        match self.source.fetch(endpoint).await {
            Ok(value) => {
                let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
                cache.insert(
                    endpoint.to_string(),
                    CacheEntry {
                        value: value.clone(),
                        expires_at: Instant::now() + self.ttl,
                    },
                );
                Ok(value)
            }
            Err(e) => {
                error!(endpoint, source = self.source.name(), error = %e, "error fetching static data");
                let cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
                if let Some(entry) = cache.get(endpoint) {
                    warn!(endpoint, "using expired cache");
                    return Ok(entry.value.clone());
                }
                Err(e)
            }
        }
    }

    /// Suggestion prompts, or the built-in set if loading fails.
    pub async fn get_suggestion_prompts(&self) -> Vec<SuggestionPrompt> {
        match self.load::<PromptsDocument>(PROMPTS_ENDPOINT).await {
            Ok(PromptsDocument {
                suggestion_prompts: Some(prompts),
                ..
            }) => prompts,
            Ok(_) => {
                warn!("prompts document has no suggestionPrompts, using fallback");
                fallback_suggestion_prompts()
            }
            Err(e) => {
                warn!(error = %e, "failed to load suggestion prompts, using fallback");
                fallback_suggestion_prompts()
            }
        }
    }

    /// Smart prompts, or the built-in set if loading fails.
    pub async fn get_smart_prompts(&self) -> Vec<SmartPrompt> {
        match self.load::<PromptsDocument>(PROMPTS_ENDPOINT).await {
            Ok(PromptsDocument {
                smart_prompts: Some(prompts),
                ..
            }) => prompts,
            Ok(_) => {
                warn!("prompts document has no smartPrompts, using fallback");
                fallback_smart_prompts()
            }
            Err(e) => {
                warn!(error = %e, "failed to load smart prompts, using fallback");
                fallback_smart_prompts()
            }
        }
    }

    /// Category metadata, or the built-in set if loading fails.
    pub async fn get_categories(&self) -> Vec<CategoryInfo> {
        match self.load::<CategoriesDocument>(CATEGORIES_ENDPOINT).await {
            Ok(doc) => doc.categories,
            Err(e) => {
                warn!(error = %e, "failed to load categories, using fallback");
                fallback_categories()
            }
        }
    }

    /// Default group templates, or the built-in set if loading fails.
    pub async fn get_default_groups(&self) -> Vec<DefaultGroup> {
        match self.load::<GroupsDocument>(GROUPS_ENDPOINT).await {
            Ok(doc) => doc.default_groups,
            Err(e) => {
                warn!(error = %e, "failed to load default groups, using fallback");
                fallback_groups()
            }
        }
    }

    /// Drop every cached document.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Freshness of every cached document, keyed by endpoint.
    pub fn cache_status(&self) -> HashMap<String, CacheStatus> {
        let now = Instant::now();
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    CacheStatus {
                        expired: now >= entry.expires_at,
                        expires_in: entry.expires_at.saturating_duration_since(now),
                    },
                )
            })
            .collect()
    }

    async fn load<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CoreError> {
        let value = self.fetch_with_cache(endpoint).await?;
        serde_json::from_value(value).map_err(|e| {
            CoreError::Deserialization(format!("Malformed {endpoint}: {e}"))
        })
    }
}

// ── Fallback data ───────────────────────────────────────────────────

pub fn fallback_suggestion_prompts() -> Vec<SuggestionPrompt> {
    let entry = |id: &str, label: &str, icon: &str, prompt: &str, color: &str| SuggestionPrompt {
        id: id.to_string(),
        label: label.to_string(),
        icon: Some(icon.to_string()),
        prompt: prompt.to_string(),
        color: Some(color.to_string()),
        category: id.to_string(),
    };
    vec![
        entry(
            "investment",
            "Investment Advice",
            "TrendingUp",
            "I need help with investment advice. Can you guide me through creating a diversified portfolio?",
            "bg-green-50 text-green-700 border-green-200 hover:bg-green-100",
        ),
        entry(
            "retirement",
            "Retirement Planning",
            "PiggyBank",
            "I want to plan for retirement. Can you help me understand how much I should save?",
            "bg-purple-50 text-purple-700 border-purple-200 hover:bg-purple-100",
        ),
        entry(
            "budgeting",
            "Create Budget",
            "Calculator",
            "I need help creating a monthly budget. Can you guide me through the process?",
            "bg-blue-50 text-blue-700 border-blue-200 hover:bg-blue-100",
        ),
    ]
}

pub fn fallback_smart_prompts() -> Vec<SmartPrompt> {
    vec![SmartPrompt {
        id: "investment-advice".to_string(),
        text: "Get personalized investment advice".to_string(),
        category: "Investment".to_string(),
        context_questions: vec![
            "What is your current age?".to_string(),
            "What is your risk tolerance?".to_string(),
            "How much are you looking to invest?".to_string(),
        ],
        icon: Some("TrendingUp".to_string()),
    }]
}

pub fn fallback_categories() -> Vec<CategoryInfo> {
    [
        ("investment", "Investment", "#10B981", "TrendingUp"),
        ("retirement", "Retirement", "#8B5CF6", "PiggyBank"),
        ("budgeting", "Budgeting", "#F59E0B", "Calculator"),
        ("general", "General", "#6B7280", "MessageSquare"),
    ]
    .into_iter()
    .map(|(id, name, color, icon)| CategoryInfo {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        icon: Some(icon.to_string()),
    })
    .collect()
}

pub fn fallback_groups() -> Vec<DefaultGroup> {
    vec![
        DefaultGroup {
            id: "investment".to_string(),
            name: "Investment Planning".to_string(),
            description: Some("Stock market and investment strategies".to_string()),
            color: "#10B981".to_string(),
            category: Some(Category::Investment),
            is_default: true,
        },
        DefaultGroup {
            id: "retirement".to_string(),
            name: "Retirement Planning".to_string(),
            description: Some("401k, IRA, and retirement strategies".to_string()),
            color: "#8B5CF6".to_string(),
            category: Some(Category::Retirement),
            is_default: true,
        },
    ]
}
