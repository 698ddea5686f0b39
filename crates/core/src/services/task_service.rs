use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::state::PersistedState;
use crate::models::task::{NewTask, StockTask, TaskPatch, TaskStatus, TaskType};

/// Stock task CRUD and filters over [`PersistedState`].
///
/// Status only changes through explicit patches; nothing here polls prices.
pub struct TaskService;

impl TaskService {
    pub fn new() -> Self {
        Self
    }

    /// Validate and append a task. Returns its id.
    pub fn create_task(&self, state: &mut PersistedState, new: NewTask) -> Result<Uuid, CoreError> {
        let task = StockTask::new(new)?;
        let id = task.id;
        state.tasks.push(task);
        Ok(id)
    }

    /// Merge `patch` into a task, refreshing `updated_at`.
    ///
    /// The patched task must still satisfy the creation rules; otherwise the
    /// task is left unchanged.
    pub fn update_task(
        &self,
        state: &mut PersistedState,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<(), CoreError> {
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?;

        let mut updated = task.clone();
        patch.apply(&mut updated);
        updated.validate()?;
        *task = updated;
        Ok(())
    }

    /// Remove a task. Returns the removed task.
    pub fn delete_task(&self, state: &mut PersistedState, id: Uuid) -> Result<StockTask, CoreError> {
        let idx = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?;
        Ok(state.tasks.remove(idx))
    }

    pub fn by_status<'a>(&self, tasks: &'a [StockTask], status: TaskStatus) -> Vec<&'a StockTask> {
        tasks.iter().filter(|t| t.status == status).collect()
    }

    pub fn by_type<'a>(&self, tasks: &'a [StockTask], task_type: TaskType) -> Vec<&'a StockTask> {
        tasks.iter().filter(|t| t.task_type == task_type).collect()
    }
}

impl Default for TaskService {
    fn default() -> Self {
        Self::new()
    }
}
