//! Task storage boundary.
//!
//! The real persistence layer is an external collaborator; this module
//! defines the seam the state machine writes through, plus an in-memory
//! reference implementation used by tests and embedding callers.

use crate::error::StoreError;
use crate::id::TaskId;
use crate::types::Task;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Storage seam for task documents.
///
/// Implementations must support per-document optimistic concurrency: `save`
/// compares the stored version against `expected_version` and rejects the
/// write with [`StoreError::Conflict`] when they differ.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load a task by ID.
    async fn load(&self, id: TaskId) -> Result<Task, StoreError>;

    /// Insert a new task. Fails if the ID already exists.
    async fn insert(&self, task: Task) -> Result<Task, StoreError>;

    /// Save a task using compare-and-swap on its version.
    ///
    /// On success the stored version is bumped and the updated task is
    /// returned. On a version mismatch the caller receives
    /// [`StoreError::Conflict`] and must reload before retrying.
    async fn save(&self, task: Task, expected_version: u64) -> Result<Task, StoreError>;

    /// Remove a task by ID.
    async fn remove(&self, id: TaskId) -> Result<Task, StoreError>;
}

/// In-memory task store.
#[derive(Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Arc<DashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// Number of tasks currently stored.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn load(&self, id: TaskId) -> Result<Task, StoreError> {
        self.tasks
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        use dashmap::mapref::entry::Entry;
        match self.tasks.entry(task.id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(task.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(task.clone());
                Ok(task)
            }
        }
    }

    async fn save(&self, mut task: Task, expected_version: u64) -> Result<Task, StoreError> {
        let mut entry = self
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| StoreError::NotFound(task.id.to_string()))?;

        if entry.version != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                found: entry.version,
            });
        }

        task.version = expected_version + 1;
        *entry = task.clone();
        Ok(task)
    }

    async fn remove(&self, id: TaskId) -> Result<Task, StoreError> {
        self.tasks
            .remove(&id)
            .map(|(_, task)| task)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
