use std::collections::HashSet;
use tracing::warn;

use crate::errors::CoreError;
use crate::models::group::{ChatGroup, DefaultGroup, GroupPatch};
use crate::models::state::PersistedState;
use super::message_service::MessageService;

/// Group CRUD over [`PersistedState`].
///
/// Deleting a group never deletes messages: member messages are simply
/// ungrouped, so no message is left pointing at a missing group.
pub struct GroupService;

impl GroupService {
    pub fn new() -> Self {
        Self
    }

    /// Create a group with a random palette color. Returns its id.
    pub fn create_group(
        &self,
        state: &mut PersistedState,
        name: &str,
        description: Option<String>,
    ) -> Result<String, CoreError> {
        let name = Self::validate_name(name)?;
        let description = description.filter(|d| !d.trim().is_empty());
        let group = ChatGroup::new(name, description);
        let id = group.id.clone();
        state.groups.push(group);
        Ok(id)
    }

    /// Merge `patch` into an existing group.
    pub fn update_group(
        &self,
        state: &mut PersistedState,
        id: &str,
        mut patch: GroupPatch,
    ) -> Result<(), CoreError> {
        if let Some(name) = patch.name.take() {
            patch.name = Some(Self::validate_name(&name)?);
        }
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| CoreError::GroupNotFound(id.to_string()))?;
        patch.apply(group);
        Ok(())
    }

    /// Remove a group and ungroup its messages. Returns the removed group.
    pub fn delete_group(&self, state: &mut PersistedState, id: &str) -> Result<ChatGroup, CoreError> {
        let idx = state
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| CoreError::GroupNotFound(id.to_string()))?;
        let removed = state.groups.remove(idx);

        for message in &mut state.messages {
            if message.group.as_deref() == Some(id) {
                message.group = None;
            }
        }
        Ok(removed)
    }

    /// Install default group templates, but only into an empty collection.
    /// Returns how many groups were installed.
    ///
    /// Templates repeating an earlier id are skipped; the first one wins.
    pub fn install_defaults(&self, state: &mut PersistedState, templates: Vec<DefaultGroup>) -> usize {
        if !state.groups.is_empty() {
            return 0;
        }
        let mut seen = HashSet::new();
        state.groups = templates
            .into_iter()
            .filter(|t| {
                let fresh = seen.insert(t.id.clone());
                if !fresh {
                    warn!(id = %t.id, "skipping duplicate default group");
                }
                fresh
            })
            .map(ChatGroup::from_default)
            .collect();
        // Persisted messages may already reference the fixed default ids.
        MessageService::recount_groups(state);
        state.groups.len()
    }

    /// Live count of messages filed under `id`.
    pub fn message_count(&self, state: &PersistedState, id: &str) -> usize {
        state
            .messages
            .iter()
            .filter(|m| m.group.as_deref() == Some(id))
            .count()
    }

    /// Groups ordered by most recent activity first.
    pub fn by_recent_activity<'a>(&self, state: &'a PersistedState) -> Vec<&'a ChatGroup> {
        let mut groups: Vec<&ChatGroup> = state.groups.iter().collect();
        groups.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        groups
    }

    fn validate_name(name: &str) -> Result<String, CoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::ValidationError("Group name must not be empty".into()));
        }
        Ok(trimmed.to_string())
    }
}

impl Default for GroupService {
    fn default() -> Self {
        Self::new()
    }
}
