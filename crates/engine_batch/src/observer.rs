//! Progress Observer
//!
//! Client side of the progress channel: follows one task across dropped
//! connections. Reconnection is bounded by a [`ReconnectPolicy`] and never
//! happens once the task has reported a terminal message or the server
//! closed the stream cleanly.
//!
//! # State machine
//!
//! ```text
//!   Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!        ▲                        │                 │
//!        └─────── unclean drop / connect failure ───┘
//!                 (retry after backoff while attempts remain)
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use core_kernel::TaskId;

use crate::error::ChannelError;
use crate::progress::{ProgressMessage, ProgressStream};

/// How the delay between reconnect attempts grows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub strategy: BackoffStrategy,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
            strategy: BackoffStrategy::Linear,
        }
    }
}

impl ReconnectPolicy {
    pub fn exponential(mut self) -> Self {
        self.strategy = BackoffStrategy::Exponential;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based), capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let factor = match self.strategy {
            BackoffStrategy::Linear => attempt,
            BackoffStrategy::Exponential => 2u32.saturating_pow(attempt - 1),
        };
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// How a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// The server ended the stream on purpose
    Clean,
    /// The connection was lost
    Unclean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Terminal,
    ClosedCleanly,
    ClosedByObserver,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry { attempt: u32, delay: Duration },
    Stop(StopReason),
}

/// Connection bookkeeping for one observed task
#[derive(Debug, Clone)]
pub struct ReconnectTracker {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
    terminal_seen: bool,
    closed_by_observer: bool,
    last_percent: Option<u8>,
}

impl ReconnectTracker {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
            terminal_seen: false,
            closed_by_observer: false,
            last_percent: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts made since the last successful connection
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }

    pub fn terminal_seen(&self) -> bool {
        self.terminal_seen
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    pub fn is_closed(&self) -> bool {
        self.closed_by_observer
    }

    pub fn on_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// A successful connection restores the full retry budget
    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempts = 0;
    }

    pub fn on_message(&mut self, message: &ProgressMessage) {
        if let Some(percent) = message.percent() {
            self.last_percent = Some(self.last_percent.map_or(percent, |last| last.max(percent)));
        }
        if message.is_terminal() {
            self.terminal_seen = true;
        }
    }

    pub fn on_disconnect(&mut self, how: Disconnect) -> ReconnectDecision {
        self.state = ConnectionState::Disconnected;
        if self.terminal_seen {
            return ReconnectDecision::Stop(StopReason::Terminal);
        }
        if self.closed_by_observer {
            return ReconnectDecision::Stop(StopReason::ClosedByObserver);
        }
        if how == Disconnect::Clean {
            return ReconnectDecision::Stop(StopReason::ClosedCleanly);
        }
        if self.is_exhausted() {
            return ReconnectDecision::Stop(StopReason::Exhausted);
        }
        self.attempts += 1;
        ReconnectDecision::Retry {
            attempt: self.attempts,
            delay: self.policy.delay_for(self.attempts),
        }
    }

    /// Resets the attempt counter so a new round of retries may start
    pub fn manual_reconnect(&mut self) {
        self.attempts = 0;
        self.closed_by_observer = false;
    }

    pub fn close(&mut self) {
        self.closed_by_observer = true;
        self.state = ConnectionState::Disconnected;
    }
}

/// Opens progress streams for a task
#[async_trait]
pub trait ProgressConnector: Send + Sync {
    async fn connect(&self, task_id: TaskId) -> Result<Box<dyn ProgressStream>, ChannelError>;
}

/// How an observation ended
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSummary {
    /// The terminal message, if one was seen
    pub terminal: Option<ProgressMessage>,
    pub connections: u32,
    pub last_percent: Option<u8>,
}

/// Closes a [`ProgressObserver`] from outside, including while it is
/// inside [`ProgressObserver::watch`]
#[derive(Debug, Clone)]
pub struct ObserverCloser {
    sender: Arc<watch::Sender<bool>>,
}

impl ObserverCloser {
    pub fn close(&self) {
        self.sender.send_replace(true);
    }
}

/// Follows a task's progress across reconnects
pub struct ProgressObserver<C> {
    connector: C,
    tracker: ReconnectTracker,
    close_tx: Arc<watch::Sender<bool>>,
    close_rx: watch::Receiver<bool>,
}

impl<C: ProgressConnector> ProgressObserver<C> {
    pub fn new(connector: C, policy: ReconnectPolicy) -> Self {
        let (close_tx, close_rx) = watch::channel(false);
        Self {
            connector,
            tracker: ReconnectTracker::new(policy),
            close_tx: Arc::new(close_tx),
            close_rx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &ReconnectTracker {
        &self.tracker
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Handle that ends a running or future `watch`
    pub fn closer(&self) -> ObserverCloser {
        ObserverCloser {
            sender: Arc::clone(&self.close_tx),
        }
    }

    /// Allows another round of retries after [`ChannelError::ReconnectExhausted`]
    /// or an explicit close
    pub fn manual_reconnect(&mut self) {
        info!("Manual reconnect requested");
        self.close_tx.send_replace(false);
        self.tracker.manual_reconnect();
    }

    /// Stops any further reconnection
    pub fn close(&mut self) {
        self.close_tx.send_replace(true);
        self.tracker.close();
    }

    /// Streams messages for `task_id` into `on_message` until the task ends,
    /// the server closes cleanly, the observer is closed, or the retry
    /// budget is spent
    pub async fn watch<F>(&mut self, task_id: TaskId, mut on_message: F) -> Result<ObservationSummary, ChannelError>
    where
        F: FnMut(&ProgressMessage) + Send,
    {
        if self.tracker.is_closed() || *self.close_rx.borrow() {
            self.tracker.close();
            return Err(ChannelError::ClosedByObserver);
        }
        if self.tracker.is_exhausted() {
            return Err(ChannelError::ReconnectExhausted {
                attempts: self.tracker.attempts(),
            });
        }

        let mut connections = 0;
        let mut terminal = None;

        loop {
            self.tracker.on_connecting();
            let connected = tokio::select! {
                biased;
                _ = closed(&mut self.close_rx) => return Err(self.closed_while_watching(task_id)),
                connected = self.connector.connect(task_id) => connected,
            };
            let how = match connected {
                Ok(mut stream) => {
                    self.tracker.on_connected();
                    connections += 1;
                    debug!(task_id = %task_id, connections, "Observer connected");
                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = closed(&mut self.close_rx) => return Err(self.closed_while_watching(task_id)),
                            next = stream.next_message() => next,
                        };
                        match next {
                            Ok(Some(message)) => {
                                self.tracker.on_message(&message);
                                on_message(&message);
                                if message.is_terminal() {
                                    terminal = Some(message);
                                    break Disconnect::Clean;
                                }
                            }
                            Ok(None) => break Disconnect::Clean,
                            Err(error) if error.is_transient() => {
                                warn!(task_id = %task_id, error = %error, "Progress connection lost");
                                break Disconnect::Unclean;
                            }
                            Err(error) => return Err(error),
                        }
                    }
                }
                Err(error) if error.is_transient() => {
                    warn!(task_id = %task_id, error = %error, "Progress connect failed");
                    Disconnect::Unclean
                }
                Err(error) => {
                    self.tracker.on_disconnect(Disconnect::Clean);
                    return Err(error);
                }
            };

            match self.tracker.on_disconnect(how) {
                ReconnectDecision::Retry { attempt, delay } => {
                    info!(task_id = %task_id, attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
                    tokio::select! {
                        biased;
                        _ = closed(&mut self.close_rx) => return Err(self.closed_while_watching(task_id)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                ReconnectDecision::Stop(StopReason::Exhausted) => {
                    return Err(ChannelError::ReconnectExhausted {
                        attempts: self.tracker.attempts(),
                    });
                }
                ReconnectDecision::Stop(StopReason::ClosedByObserver) => {
                    return Err(ChannelError::ClosedByObserver);
                }
                ReconnectDecision::Stop(_) => {
                    return Ok(ObservationSummary {
                        terminal,
                        connections,
                        last_percent: self.tracker.last_percent(),
                    });
                }
            }
        }
    }

    fn closed_while_watching(&mut self, task_id: TaskId) -> ChannelError {
        info!(task_id = %task_id, "Observer closed");
        self.tracker.close();
        ChannelError::ClosedByObserver
    }
}

/// Resolves once the close flag is set
async fn closed(receiver: &mut watch::Receiver<bool>) {
    // The sender lives as long as the observer, so this only errors on teardown
    let _ = receiver.wait_for(|closed| *closed).await;
}
