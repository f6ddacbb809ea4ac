//! Progress Channel
//!
//! Pushes task progress to any number of observers. Each task gets a
//! broadcast channel when it is submitted; the job manager publishes into it
//! and every [`ProgressSubscription`] reads from it.
//!
//! # Message order on one connection
//!
//! ```text
//! connection_established
//! progress (snapshot of the task as of connect)
//! progress | heartbeat ...   percentages never decrease
//! completed | error          at most once, then the stream ends
//! ```
//!
//! Observers that fall behind skip the events they missed instead of
//! stalling the publisher.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

use core_kernel::{ConnectionId, TaskId};

use crate::error::ChannelError;
use crate::task::{BatchTask, TaskState};

/// A message on the progress channel, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressMessage {
    ConnectionEstablished {
        task_id: TaskId,
        connection_id: ConnectionId,
        message: String,
        timestamp: DateTime<Utc>,
    },
    Heartbeat {
        task_id: TaskId,
        timestamp: DateTime<Utc>,
    },
    Progress {
        task_id: TaskId,
        status: String,
        progress: u8,
        message: String,
        completed: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },
    Completed {
        task_id: TaskId,
        progress: u8,
        message: String,
        completed: usize,
        total: usize,
        processing_time_secs: f64,
        timestamp: DateTime<Utc>,
    },
    Error {
        task_id: TaskId,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl ProgressMessage {
    pub fn connection_established(task_id: TaskId, connection_id: ConnectionId) -> Self {
        ProgressMessage::ConnectionEstablished {
            task_id,
            connection_id,
            message: format!("Connected to progress updates for task {}", task_id),
            timestamp: Utc::now(),
        }
    }

    pub fn heartbeat(task_id: TaskId) -> Self {
        ProgressMessage::Heartbeat {
            task_id,
            timestamp: Utc::now(),
        }
    }

    pub fn progress(
        task_id: TaskId,
        status: impl Into<String>,
        progress: u8,
        message: impl Into<String>,
        completed: usize,
        total: usize,
    ) -> Self {
        ProgressMessage::Progress {
            task_id,
            status: status.into(),
            progress,
            message: message.into(),
            completed,
            total,
            timestamp: Utc::now(),
        }
    }

    pub fn completed(task_id: TaskId, total: usize, processing_time: Duration) -> Self {
        ProgressMessage::Completed {
            task_id,
            progress: 100,
            message: format!("Batch processing completed: {} claims analyzed", total),
            completed: total,
            total,
            processing_time_secs: processing_time.as_secs_f64(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(task_id: TaskId, error: impl Into<String>) -> Self {
        ProgressMessage::Error {
            task_id,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    /// Describes `task` as it stands, for observers that connect late
    pub fn snapshot(task: &BatchTask) -> Self {
        match task.state {
            TaskState::Completed => Self::completed(task.id, task.total, task.elapsed()),
            TaskState::Failed => Self::error(
                task.id,
                task.error.clone().unwrap_or_else(|| "Batch processing failed".to_string()),
            ),
            TaskState::Pending | TaskState::Processing => {
                let progress = task.progress_percent();
                Self::progress(
                    task.id,
                    task.state.as_str(),
                    progress,
                    format!("Processing in progress... {}%", progress),
                    task.completed,
                    task.total,
                )
            }
        }
    }

    pub fn task_id(&self) -> TaskId {
        match self {
            ProgressMessage::ConnectionEstablished { task_id, .. }
            | ProgressMessage::Heartbeat { task_id, .. }
            | ProgressMessage::Progress { task_id, .. }
            | ProgressMessage::Completed { task_id, .. }
            | ProgressMessage::Error { task_id, .. } => *task_id,
        }
    }

    /// Percentage carried by the message, if any
    pub fn percent(&self) -> Option<u8> {
        match self {
            ProgressMessage::Progress { progress, .. } | ProgressMessage::Completed { progress, .. } => {
                Some(*progress)
            }
            _ => None,
        }
    }

    /// True for `completed` and `error`
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressMessage::Completed { .. } | ProgressMessage::Error { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProgressMessage::ConnectionEstablished { .. } => "connection_established",
            ProgressMessage::Heartbeat { .. } => "heartbeat",
            ProgressMessage::Progress { .. } => "progress",
            ProgressMessage::Completed { .. } => "completed",
            ProgressMessage::Error { .. } => "error",
        }
    }
}

/// Accessor kept in a trait so it can share its name with the
/// `ProgressMessage::completed` constructor
pub trait CompletedCount {
    /// Claims resolved so far, for `progress` and `completed`
    fn completed(&self) -> Option<usize>;
}

impl CompletedCount for ProgressMessage {
    fn completed(&self) -> Option<usize> {
        match self {
            ProgressMessage::Progress { completed, .. } | ProgressMessage::Completed { completed, .. } => {
                Some(*completed)
            }
            _ => None,
        }
    }
}

struct TaskChannel {
    sender: broadcast::Sender<ProgressMessage>,
    last_percent: u8,
    terminal: bool,
}

/// Per-task broadcast channels
pub struct ProgressHub {
    channels: Mutex<HashMap<TaskId, TaskChannel>>,
    capacity: usize,
    heartbeat_interval: Duration,
}

impl ProgressHub {
    pub fn new(capacity: usize, heartbeat_interval: Duration) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            heartbeat_interval,
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub(crate) fn open(&self, task_id: TaskId) {
        let (sender, _) = broadcast::channel(self.capacity);
        self.lock().insert(
            task_id,
            TaskChannel {
                sender,
                last_percent: 0,
                terminal: false,
            },
        );
    }

    /// Publishes to every current subscriber of the task
    ///
    /// Returns false when the message was suppressed: the task is unknown,
    /// already terminal, or the percentage would go backwards.
    pub(crate) fn publish(&self, message: ProgressMessage) -> bool {
        let task_id = message.task_id();
        let mut channels = self.lock();
        let Some(channel) = channels.get_mut(&task_id) else {
            return false;
        };
        if channel.terminal {
            debug!(task_id = %task_id, kind = message.kind(), "Dropping message after terminal");
            return false;
        }
        if let Some(percent) = message.percent() {
            if percent < channel.last_percent {
                return false;
            }
            channel.last_percent = percent;
        }
        channel.terminal = message.is_terminal();

        // No receivers is fine; late observers get a snapshot instead
        let receivers = channel.sender.send(message).unwrap_or(0);
        trace!(task_id = %task_id, receivers, "Progress published");
        true
    }

    /// Drops the task's channel; remaining observers see the stream end
    pub(crate) fn close(&self, task_id: TaskId) {
        self.lock().remove(&task_id);
    }

    pub(crate) fn receiver(&self, task_id: TaskId) -> Option<broadcast::Receiver<ProgressMessage>> {
        self.lock().get(&task_id).map(|c| c.sender.subscribe())
    }

    /// Number of live observers of the task
    pub fn subscriber_count(&self, task_id: TaskId) -> usize {
        self.lock()
            .get(&task_id)
            .map(|c| c.sender.receiver_count())
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TaskId, TaskChannel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ProgressHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHub")
            .field("tasks", &self.lock().len())
            .field("capacity", &self.capacity)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish()
    }
}

/// A source of progress messages for one task
///
/// `Ok(None)` means the stream ended cleanly; an error means the connection
/// was lost and may be re-established.
#[async_trait]
pub trait ProgressStream: Send {
    async fn next_message(&mut self) -> Result<Option<ProgressMessage>, ChannelError>;
}

/// One observer's connection to a task's progress
pub struct ProgressSubscription {
    task_id: TaskId,
    connection_id: ConnectionId,
    pending: VecDeque<ProgressMessage>,
    receiver: broadcast::Receiver<ProgressMessage>,
    heartbeat: Interval,
    /// Resolved-claim count already delivered, snapshot included
    delivered: Option<usize>,
    finished: bool,
}

impl ProgressSubscription {
    /// `receiver` must be subscribed before `snapshot` was taken, so no
    /// event between the two is lost
    pub(crate) fn new(
        receiver: broadcast::Receiver<ProgressMessage>,
        snapshot: ProgressMessage,
        heartbeat_interval: Duration,
    ) -> Self {
        let task_id = snapshot.task_id();
        let connection_id = ConnectionId::new();
        let delivered = snapshot.completed();

        let mut heartbeat = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let pending = VecDeque::from([
            ProgressMessage::connection_established(task_id, connection_id),
            snapshot,
        ]);

        debug!(task_id = %task_id, connection_id = %connection_id, "Progress observer connected");

        Self {
            task_id,
            connection_id,
            pending,
            receiver,
            heartbeat,
            delivered,
            finished: false,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Next message, or `None` once the stream has ended
    pub async fn next(&mut self) -> Option<ProgressMessage> {
        if self.finished {
            return None;
        }
        if let Some(message) = self.pending.pop_front() {
            self.finished = message.is_terminal();
            return Some(message);
        }

        loop {
            tokio::select! {
                received = self.receiver.recv() => match received {
                    Ok(message) => {
                        // Events the snapshot already covers are not repeated
                        if let (Some(completed), false) = (message.completed(), message.is_terminal()) {
                            if self.delivered.is_some_and(|delivered| completed <= delivered) {
                                continue;
                            }
                            self.delivered = Some(completed);
                        }
                        self.finished = message.is_terminal();
                        return Some(message);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(task_id = %self.task_id, skipped, "Observer lagged, skipping events");
                    }
                    Err(RecvError::Closed) => {
                        self.finished = true;
                        return None;
                    }
                },
                _ = self.heartbeat.tick() => {
                    return Some(ProgressMessage::heartbeat(self.task_id));
                }
            }
        }
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        debug!(task_id = %self.task_id, connection_id = %self.connection_id, "Progress observer disconnected");
    }
}

#[async_trait]
impl ProgressStream for ProgressSubscription {
    async fn next_message(&mut self) -> Result<Option<ProgressMessage>, ChannelError> {
        Ok(self.next().await)
    }
}
