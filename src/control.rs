//! Cooperative control signals shared by the scan and download pipelines
//!
//! Two independent axes of control exist:
//! - Pausing: a [`PauseGate`] blocks workers cooperatively until reopened;
//!   paused work resumes where it left off.
//! - Stopping: a [`CancelFlag`] is terminal for its unit of work; workers
//!   poll it between steps and abandon what remains.

use std::sync::Arc;

use tokio::sync::watch;

/// An open/closed gate that workers await before taking new work.
///
/// The gate starts open. While closed, `wait_open` blocks all callers
/// without consuming CPU; reopening wakes every waiter. Cloning shares the
/// same underlying gate.
///
/// # Example
///
/// ```
/// use index_ripper::control::PauseGate;
///
/// let gate = PauseGate::new();
/// gate.pause();
/// assert!(gate.is_paused());
/// gate.resume();
/// assert!(!gate.is_paused());
/// ```
#[derive(Debug, Clone)]
pub struct PauseGate {
    // true = open
    state: Arc<watch::Sender<bool>>,
}

impl PauseGate {
    /// Creates a new gate in the open state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Closes the gate. Workers calling `wait_open` will block.
    pub fn pause(&self) {
        self.state.send_replace(false);
    }

    /// Reopens the gate, waking all blocked workers.
    pub fn resume(&self) {
        self.state.send_replace(true);
    }

    /// Returns true if the gate is currently closed.
    pub fn is_paused(&self) -> bool {
        !*self.state.borrow()
    }

    /// Resolves once the gate is open. Returns immediately if already open.
    pub async fn wait_open(&self) {
        let mut rx = self.state.subscribe();
        // The sender cannot drop while &self is borrowed, so this never errors.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// A one-way cancellation signal.
///
/// Once set it stays set. Workers either poll `is_cancelled` between steps
/// or await `cancelled` to be woken, e.g. while blocked on a closed
/// [`PauseGate`].
#[derive(Debug, Clone)]
pub struct CancelFlag {
    state: Arc<watch::Sender<bool>>,
}

impl CancelFlag {
    /// Creates a new, unset flag.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Sets the flag. Idempotent.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    /// Returns true if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the flag is set. Pends forever if it never is.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}
