//! Per-task command queue and mutation gate.
//!
//! [`TaskClient`] batches parameter edits for one task and sends them as a
//! single `modify_task_spec` on flush. Every version-tracked mutation (flush,
//! play, render, stop) runs while holding the task's gate, so at most one is
//! in flight and each one carries the version the previous one returned.

pub mod queue;

use std::sync::Arc;

use audiocloud_core::errors::ClientError;
use audiocloud_core::ids::{MediaObjectId, MixerId, SecureKey, TaskId};
use audiocloud_core::params::{ParameterSchema, ParameterTarget, ParameterValues};
use audiocloud_core::protocol::{
    DesiredTaskPlayState, ModifyTaskSpec, PlayTask, RenderTask, TimeSegment,
};
use tracing::{debug, instrument};

use crate::aggregator::DomainClient;

use self::queue::CommandQueue;

/// Client-side handle for one task.
pub struct TaskClient {
    client: DomainClient,
    task_id: TaskId,
    secure_key: SecureKey,
    schema: Arc<ParameterSchema>,
    queue: parking_lot::Mutex<CommandQueue>,
    gate: tokio::sync::Mutex<u64>,
}

impl TaskClient {
    /// Handle for `task_id`, starting from the last known `version`.
    pub fn new(
        client: DomainClient,
        task_id: TaskId,
        secure_key: SecureKey,
        schema: Arc<ParameterSchema>,
        version: u64,
    ) -> Self {
        Self {
            client,
            task_id,
            secure_key,
            schema,
            queue: parking_lot::Mutex::new(CommandQueue::new()),
            gate: tokio::sync::Mutex::new(version),
        }
    }

    /// The task this handle addresses.
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Last version adopted from the domain.
    pub async fn version(&self) -> u64 {
        *self.gate.lock().await
    }

    /// Snapshot of the edits waiting for the next flush.
    pub fn queued_commands(&self) -> Vec<ModifyTaskSpec> {
        self.queue.lock().commands()
    }

    /// Start receiving this task's events.
    pub async fn attach(&self) -> Result<(), ClientError> {
        self.client
            .attach_to_task(&self.task_id, &self.secure_key)
            .await
    }

    /// Stop receiving this task's events.
    pub async fn detach(&self) -> Result<(), ClientError> {
        self.client.detach_from_task(&self.task_id).await
    }

    /// Queue a parameter edit for the next flush.
    ///
    /// Edits to the same target merge, later values winning per parameter.
    pub fn enqueue_parameter_change(
        &self,
        target: ParameterTarget,
        values: ParameterValues,
    ) -> Result<(), ClientError> {
        if let Err(reason) = self.schema.validate(&target, &values) {
            return Err(ClientError::InvalidParameter { target, reason });
        }
        self.queue
            .lock()
            .push(ModifyTaskSpec::set_parameters(target, values));
        Ok(())
    }

    /// Send all queued edits as one request.
    ///
    /// Returns the adopted version, or `None` if nothing was queued.
    pub async fn flush(&self) -> Result<Option<u64>, ClientError> {
        let mut version = self.gate.lock().await;
        self.flush_locked(&mut version).await
    }

    async fn flush_locked(&self, version: &mut u64) -> Result<Option<u64>, ClientError> {
        let commands = self.queue.lock().take();
        if commands.is_empty() {
            return Ok(None);
        }

        debug!(task_id = %self.task_id, count = commands.len(), version = *version, "flushing task commands");
        match self
            .client
            .modify_task_spec(&self.task_id, commands.clone(), *version)
            .await
        {
            Ok(next) => {
                *version = next;
                Ok(Some(next))
            }
            Err(err) => {
                self.queue.lock().restore(commands);
                Err(err)
            }
        }
    }

    /// Flush, then start playback.
    #[instrument(skip(self, segment), fields(task_id = %self.task_id))]
    pub async fn play(
        &self,
        mixer_id: MixerId,
        segment: TimeSegment,
        looping: bool,
        start_at: f64,
        sample_rate: u32,
        bit_depth: u32,
    ) -> Result<u64, ClientError> {
        self.set_play_state(DesiredTaskPlayState::Play(PlayTask {
            mixer_id,
            segment,
            looping,
            start_at,
            sample_rate,
            bit_depth,
        }))
        .await
    }

    /// Flush, then start rendering `segment` into `object_id`.
    #[instrument(skip(self, segment), fields(task_id = %self.task_id))]
    pub async fn render(
        &self,
        mixer_id: MixerId,
        segment: TimeSegment,
        object_id: MediaObjectId,
    ) -> Result<u64, ClientError> {
        self.set_play_state(DesiredTaskPlayState::Render(RenderTask {
            mixer_id,
            segment,
            object_id,
        }))
        .await
    }

    /// Flush, then stop.
    #[instrument(skip(self), fields(task_id = %self.task_id))]
    pub async fn stop(&self) -> Result<u64, ClientError> {
        self.set_play_state(DesiredTaskPlayState::Stopped).await
    }

    async fn set_play_state(&self, desired: DesiredTaskPlayState) -> Result<u64, ClientError> {
        let mut version = self.gate.lock().await;
        let _ = self.flush_locked(&mut version).await?;
        let next = self
            .client
            .set_desired_play_state(&self.task_id, desired, *version)
            .await?;
        *version = next;
        Ok(next)
    }
}
