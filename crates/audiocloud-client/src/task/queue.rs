//! Coalescing queue of pending spec mutations.

use audiocloud_core::protocol::{ModifyTaskSpec, ModifyTaskSpecKind};
use indexmap::IndexMap;

type CoalesceKey = (ModifyTaskSpecKind, String);

/// Commands waiting for the next flush, one per `(kind, target)`.
///
/// Enqueueing a command whose key is already present merges it into the
/// existing one field by field; first-enqueue order is preserved.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    commands: IndexMap<CoalesceKey, ModifyTaskSpec>,
}

impl CommandQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `command` into its slot, or append it.
    pub fn push(&mut self, command: ModifyTaskSpec) {
        let (kind, target) = command.coalesce_key();
        let key = (kind, target.to_string());
        match self.commands.get_mut(&key) {
            Some(existing) => {
                // Same key, so the merge cannot be refused.
                let _ = existing.merge(command);
            }
            None => {
                let _ = self.commands.insert(key, command);
            }
        }
    }

    /// Remove and return everything, in order.
    pub fn take(&mut self) -> Vec<ModifyTaskSpec> {
        std::mem::take(&mut self.commands).into_values().collect()
    }

    /// Put back commands from a failed flush beneath anything enqueued since.
    pub fn restore(&mut self, taken: Vec<ModifyTaskSpec>) {
        let newer = std::mem::take(&mut self.commands);
        for command in taken {
            self.push(command);
        }
        for command in newer.into_values() {
            self.push(command);
        }
    }

    /// Snapshot of the queued commands.
    pub fn commands(&self) -> Vec<ModifyTaskSpec> {
        self.commands.values().cloned().collect()
    }

    /// Number of distinct queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
