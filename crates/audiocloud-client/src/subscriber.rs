//! Callbacks the client raises towards the embedding application.

use audiocloud_core::errors::ClientError;
use audiocloud_core::ids::TaskId;
use audiocloud_core::protocol::TaskEvent;

/// Receiver of connectivity edges, diagnostics and task events.
///
/// Called synchronously from the client's dispatch loop, never under a lock.
/// Implementations must not block; hand work off to a channel instead.
pub trait DomainSubscriber: Send + Sync {
    /// The client went from no usable transport to at least one.
    fn on_connected(&self) {}

    /// The last usable transport closed.
    fn on_disconnected(&self) {}

    /// A transport or codec fault that no caller is waiting on.
    fn on_client_error(&self, _error: &ClientError) {}

    /// An unsolicited event for an attached task.
    fn on_task_event(&self, _task_id: &TaskId, _event: &TaskEvent) {}
}

/// Subscriber that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSubscriber;

impl DomainSubscriber for NoopSubscriber {}
