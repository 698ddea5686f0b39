use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::api::{ApiResponse, AssistantRequest};
use super::traits::AssistantProvider;

pub const DEFAULT_MIN_DELAY_MS: u64 = 1500;
pub const DEFAULT_JITTER_MS: u64 = 1000;

/// Simulated latency of the mock assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockAssistantConfig {
    pub min_delay: Duration,
    /// Upper bound of the random extra delay added to `min_delay`.
    pub jitter: Duration,
}

impl Default for MockAssistantConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(DEFAULT_MIN_DELAY_MS),
            jitter: Duration::from_millis(DEFAULT_JITTER_MS),
        }
    }
}

impl MockAssistantConfig {
    /// Build from environment variables.
    ///
    /// Optional:
    /// - `FINSENSE_MOCK_MIN_DELAY_MS`: default 1500
    /// - `FINSENSE_MOCK_JITTER_MS`: default 1000
    pub fn from_env() -> Self {
        Self {
            min_delay: Duration::from_millis(env_parse_u64(
                "FINSENSE_MOCK_MIN_DELAY_MS",
                DEFAULT_MIN_DELAY_MS,
            )),
            jitter: Duration::from_millis(env_parse_u64(
                "FINSENSE_MOCK_JITTER_MS",
                DEFAULT_JITTER_MS,
            )),
        }
    }

    /// No delay at all. Useful for tests and demos.
    pub fn instant() -> Self {
        Self {
            min_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

struct CannedResponse {
    content: &'static str,
    suggestions: [&'static str; 3],
    follow_up_questions: [&'static str; 3],
}

const CANNED_RESPONSES: [CannedResponse; 4] = [
    CannedResponse {
        content: "Based on your query, I'd recommend diversifying your portfolio across different asset classes. Consider allocating 60% to stocks, 30% to bonds, and 10% to alternative investments for balanced growth.",
        suggestions: ["Portfolio analysis", "Risk assessment", "Investment timeline"],
        follow_up_questions: [
            "What's your current risk tolerance?",
            "How long is your investment timeline?",
            "Do you have any existing investments?",
        ],
    },
    CannedResponse {
        content: "For retirement planning, the rule of thumb is to save 10-15% of your income. With compound interest, starting early makes a significant difference. Would you like me to calculate projections based on your age and income?",
        suggestions: ["Calculate retirement needs", "401k optimization", "IRA strategies"],
        follow_up_questions: [
            "What's your current age?",
            "What's your target retirement age?",
            "How much do you currently have saved?",
        ],
    },
    CannedResponse {
        content: "Market volatility is normal. During uncertain times, focus on your long-term goals and avoid emotional decisions. Dollar-cost averaging can help reduce the impact of market fluctuations.",
        suggestions: ["Market analysis", "Risk management", "Investment strategies"],
        follow_up_questions: [
            "Are you concerned about current market conditions?",
            "What's your investment timeline?",
            "How do you typically react to market downturns?",
        ],
    },
    CannedResponse {
        content: "Emergency funds should cover 3-6 months of expenses. High-yield savings accounts or money market funds are good options for accessibility while earning some interest.",
        suggestions: ["Emergency fund calculator", "Savings strategies", "Account recommendations"],
        follow_up_questions: [
            "What are your monthly expenses?",
            "How much do you currently have saved?",
            "Do you have any dependents?",
        ],
    },
];

/// Stand-in assistant: waits a random delay, then returns one of four
/// canned financial answers.
///
/// The request content and context are ignored.
pub struct MockAssistantProvider {
    config: MockAssistantConfig,
}

impl MockAssistantProvider {
    pub fn new(config: MockAssistantConfig) -> Self {
        Self { config }
    }

    /// Number of canned responses the mock picks from.
    pub fn response_pool_size() -> usize {
        CANNED_RESPONSES.len()
    }

    /// Every reply the mock can produce, in pool order.
    pub fn response_pool() -> Vec<ApiResponse> {
        CANNED_RESPONSES.iter().map(to_response).collect()
    }
}

impl Default for MockAssistantProvider {
    fn default() -> Self {
        Self::new(MockAssistantConfig::default())
    }
}

fn to_response(canned: &CannedResponse) -> ApiResponse {
    ApiResponse {
        content: canned.content.to_string(),
        suggestions: canned.suggestions.iter().map(|s| s.to_string()).collect(),
        follow_up_questions: canned
            .follow_up_questions
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

#[async_trait]
impl AssistantProvider for MockAssistantProvider {
    fn name(&self) -> &str {
        "MockAssistant"
    }

    async fn complete(&self, _request: &AssistantRequest) -> Result<ApiResponse, CoreError> {
        // Draw everything up front: the thread-local RNG must not live across the await.
        let (delay, index) = {
            let mut rng = rand::rng();
            let jitter_ms = u64::try_from(self.config.jitter.as_millis()).unwrap_or(u64::MAX);
            let extra = if jitter_ms == 0 {
                0
            } else {
                rng.random_range(0..=jitter_ms)
            };
            (
                self.config.min_delay + Duration::from_millis(extra),
                rng.random_range(0..CANNED_RESPONSES.len()),
            )
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(to_response(&CANNED_RESPONSES[index]))
    }
}
