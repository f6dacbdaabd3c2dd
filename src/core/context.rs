//! Per-call context.
//!
//! Every store operation takes a [`Context`] carrying a cancellation flag, an
//! optional deadline, and a correlation token that is appended to the change
//! descriptions handed to versioned storage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Cancellation, deadline, and correlation for one operation.
///
/// Clones share the cancellation flag, so a clone kept by the caller (or
/// handed to a signal handler) can cancel work running with the original.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
    correlation: Option<String>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a correlation token.
    pub fn with_correlation(mut self, token: impl Into<String>) -> Self {
        self.correlation = Some(token.into());
        self
    }

    /// Attach a freshly generated correlation token.
    pub fn with_new_correlation(self) -> Self {
        self.with_correlation(uuid::Uuid::new_v4().to_string())
    }

    /// The correlation token, if any.
    pub fn correlation(&self) -> Option<&str> {
        self.correlation.as_deref()
    }

    /// Request cancellation of every operation sharing this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the context was cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Return an error if the context is cancelled or expired.
    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// The error describing why this context is done.
    ///
    /// Collaborators only report that they were interrupted; this recovers
    /// whether it was a cancellation or an expired deadline.
    pub fn interrupted(&self) -> Error {
        match self.check() {
            Err(e) => e,
            Ok(()) => Error::Cancelled,
        }
    }

    /// A context with the same correlation token but no cancellation or deadline.
    ///
    /// Used to record work that already happened on disk after the caller
    /// cancelled the rest of the operation.
    pub fn detached(&self) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
            correlation: self.correlation.clone(),
        }
    }

    /// Build a change description, tagged with the correlation token.
    pub fn describe(&self, message: &str) -> String {
        match &self.correlation {
            Some(token) => format!("{} [{}]", message, token),
            None => message.to_string(),
        }
    }
}
