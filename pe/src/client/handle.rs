//! ExecutionHandle - caller-side control of a running plan execution

use std::fmt;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::stream::Terminal;

/// Lifecycle of a single plan execution
///
/// `Idle -> Requesting -> Streaming -> {Finished | Cancelled | Errored}`;
/// `Requesting` may also go straight to `Cancelled` or `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Requesting,
    Streaming,
    Finished,
    Cancelled,
    Errored,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Errored)
    }
}

impl From<&Terminal> for ExecutionState {
    fn from(terminal: &Terminal) -> Self {
        match terminal {
            Terminal::Finished => Self::Finished,
            Terminal::Cancelled => Self::Cancelled,
            Terminal::Error(_) => Self::Errored,
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Streaming => "streaming",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Handle to a detached plan execution
///
/// Dropping the handle does not stop the execution; call [`cancel`](Self::cancel).
pub struct ExecutionHandle {
    id: String,
    cancel: CancellationToken,
    state: watch::Receiver<ExecutionState>,
    task: JoinHandle<ExecutionState>,
}

impl ExecutionHandle {
    pub(crate) fn new(
        id: String,
        cancel: CancellationToken,
        state: watch::Receiver<ExecutionState>,
        task: JoinHandle<ExecutionState>,
    ) -> Self {
        debug!(%id, "ExecutionHandle::new: called");
        Self {
            id,
            cancel,
            state,
            task,
        }
    }

    /// Execution ID used in logs
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ask the execution to stop
    ///
    /// The execution emits a single `cancelled` event unless it already ended.
    pub fn cancel(&self) {
        debug!(id = %self.id, "ExecutionHandle::cancel: called");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ExecutionState {
        *self.state.borrow()
    }

    /// Wait for the execution to reach its terminal state
    pub async fn wait(self) -> ExecutionState {
        debug!(id = %self.id, "ExecutionHandle::wait: called");
        match self.task.await {
            Ok(state) => state,
            Err(e) => {
                warn!(id = %self.id, error = %e, "ExecutionHandle::wait: execution task failed");
                ExecutionState::Errored
            }
        }
    }
}

impl fmt::Debug for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
