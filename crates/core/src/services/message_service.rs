use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::message::{Category, Message, NewMessage};
use crate::models::state::PersistedState;

/// Key under which ungrouped messages appear in [`MessageService::grouped`].
pub const UNGROUPED_KEY: &str = "default";

/// Conjunctive message filter. Unset criteria match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFilter<'a> {
    /// Exact group id.
    pub group: Option<&'a str>,
    /// Exact category.
    pub category: Option<Category>,
    /// Case-insensitive substring of the content or of any tag.
    pub search: &'a str,
}

/// Message CRUD and projections over [`PersistedState`].
///
/// No I/O. Group counts are kept in sync here whenever
/// a message changes group.
pub struct MessageService;

impl MessageService {
    pub fn new() -> Self {
        Self
    }

    /// Append a message built from `new`. Returns its id.
    pub fn add_message(&self, state: &mut PersistedState, new: NewMessage) -> Uuid {
        let message = Message::new(new);
        let id = message.id;
        state.messages.push(message);
        id
    }

    /// Append the greeting shown on first open. Always filed as general.
    pub fn add_welcome_message(&self, state: &mut PersistedState, text: String) -> Uuid {
        let mut message = Message::new(NewMessage::assistant(text));
        message.category = Category::General;
        let id = message.id;
        state.messages.push(message);
        id
    }

    /// Flip the favorite flag. Returns the new value.
    pub fn toggle_favorite(&self, state: &mut PersistedState, id: Uuid) -> Result<bool, CoreError> {
        let message = Self::find_mut(state, id)?;
        message.is_favorite = !message.is_favorite;
        Ok(message.is_favorite)
    }

    /// Add a tag. Blank tags are rejected; a tag already present is a no-op.
    /// Returns whether the tag was added.
    pub fn add_tag(&self, state: &mut PersistedState, id: Uuid, tag: &str) -> Result<bool, CoreError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(CoreError::ValidationError("Tag must not be empty".into()));
        }
        let message = Self::find_mut(state, id)?;
        if message.has_tag(tag) {
            return Ok(false);
        }
        message.tags.push(tag.to_string());
        Ok(true)
    }

    /// Remove a tag, matched after trimming like [`add_tag`](Self::add_tag).
    /// Returns whether it was present.
    pub fn remove_tag(&self, state: &mut PersistedState, id: Uuid, tag: &str) -> Result<bool, CoreError> {
        let tag = tag.trim();
        let message = Self::find_mut(state, id)?;
        let before = message.tags.len();
        message.tags.retain(|t| t != tag);
        Ok(message.tags.len() != before)
    }

    /// File a message under an existing group.
    ///
    /// Recomputes every group's count and bumps the destination's last activity.
    pub fn move_to_group(
        &self,
        state: &mut PersistedState,
        id: Uuid,
        group_id: &str,
    ) -> Result<(), CoreError> {
        if !state.groups.iter().any(|g| g.id == group_id) {
            return Err(CoreError::GroupNotFound(group_id.to_string()));
        }
        Self::find_mut(state, id)?.group = Some(group_id.to_string());

        let now = Utc::now();
        Self::recount_groups(state);
        if let Some(group) = state.groups.iter_mut().find(|g| g.id == group_id) {
            group.last_activity = now;
        }
        Ok(())
    }

    /// Take a message out of its group, if any.
    pub fn remove_from_group(&self, state: &mut PersistedState, id: Uuid) -> Result<(), CoreError> {
        Self::find_mut(state, id)?.group = None;
        Self::recount_groups(state);
        Ok(())
    }

    /// Messages passing every set criterion of `filter`, in transcript order.
    pub fn filter<'a>(&self, messages: &'a [Message], filter: &MessageFilter<'_>) -> Vec<&'a Message> {
        let needle = filter.search.to_lowercase();
        messages
            .iter()
            .filter(|m| filter.group.map_or(true, |g| m.group.as_deref() == Some(g)))
            .filter(|m| filter.category.map_or(true, |c| m.category == c))
            .filter(|m| needle.is_empty() || m.matches_query(&needle))
            .collect()
    }

    pub fn favorites<'a>(&self, messages: &'a [Message]) -> Vec<&'a Message> {
        messages.iter().filter(|m| m.is_favorite).collect()
    }

    /// Messages bucketed by group id; ungrouped ones under [`UNGROUPED_KEY`].
    pub fn grouped<'a>(&self, messages: &'a [Message]) -> HashMap<String, Vec<&'a Message>> {
        let mut buckets: HashMap<String, Vec<&Message>> = HashMap::new();
        for message in messages {
            let key = message.group.as_deref().unwrap_or(UNGROUPED_KEY);
            buckets.entry(key.to_string()).or_default().push(message);
        }
        buckets
    }

    /// Content of the last `limit` messages, oldest first.
    pub fn recent_context(&self, messages: &[Message], limit: usize) -> Vec<String> {
        let start = messages.len().saturating_sub(limit);
        messages[start..].iter().map(|m| m.content.clone()).collect()
    }

    /// Set every group's `message_count` from the current messages.
    pub(crate) fn recount_groups(state: &mut PersistedState) {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for message in &state.messages {
            if let Some(group) = message.group.as_deref() {
                *counts.entry(group).or_insert(0) += 1;
            }
        }
        for group in &mut state.groups {
            group.message_count = counts.get(group.id.as_str()).copied().unwrap_or(0);
        }
    }

    fn find_mut(state: &mut PersistedState, id: Uuid) -> Result<&mut Message, CoreError> {
        state
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CoreError::MessageNotFound(id.to_string()))
    }
}

impl Default for MessageService {
    fn default() -> Self {
        Self::new()
    }
}
