//! Thread-local "failure in flight" context used by `Logger::exception`
//!
//! Code that is handling an error calls [`capture`] and keeps the returned
//! guard alive while it logs. The context records the error's type, its
//! message and source chain, and a backtrace taken at the capture point.
//! Contexts nest and are only ever visible to the thread that captured them.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::Write;
use std::marker::PhantomData;

/// A captured failure
#[derive(Debug)]
pub struct FailureContext {
    type_name: &'static str,
    message: String,
    causes: Vec<String>,
    backtrace: Backtrace,
}

impl FailureContext {
    /// Capture `err` together with a backtrace of the current thread
    pub fn new<E: Error + 'static>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            type_name: std::any::type_name::<E>(),
            message: err.to_string(),
            causes,
            backtrace: Backtrace::force_capture(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// The stack section appended to an exception log line
    pub fn render(&self) -> String {
        let mut out = String::from("Traceback (most recent call first):\n");
        let _ = write!(out, "{}", self.backtrace);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        let _ = write!(out, "{}: {}", self.type_name, self.message);
        for cause in &self.causes {
            let _ = write!(out, "\nCaused by: {}", cause);
        }
        out
    }
}

thread_local! {
    static ACTIVE: RefCell<Vec<FailureContext>> = RefCell::new(Vec::new());
}

/// Keeps a captured failure active on this thread until dropped
#[must_use = "the failure context is cleared when the guard is dropped"]
pub struct FailureGuard {
    /// Stack depth below this guard's context
    depth: usize,
    // thread-local state: the guard must be dropped on the capturing thread
    _not_send: PhantomData<*const ()>,
}

impl Drop for FailureGuard {
    fn drop(&mut self) {
        // also clears contexts nested inside this one
        let _ = ACTIVE.try_with(|active| active.borrow_mut().truncate(self.depth));
    }
}

/// Make `err` the active failure on this thread until the guard is dropped
///
/// Dropping the guard also clears any context captured after it.
pub fn capture<E: Error + 'static>(err: &E) -> FailureGuard {
    let context = FailureContext::new(err);
    let depth = ACTIVE
        .try_with(|active| {
            let mut active = active.borrow_mut();
            let depth = active.len();
            active.push(context);
            depth
        })
        .unwrap_or(0);
    FailureGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Whether a failure is active on this thread
pub fn is_active() -> bool {
    ACTIVE
        .try_with(|active| !active.borrow().is_empty())
        .unwrap_or(false)
}

/// Render the innermost active failure, if any
pub fn render_current() -> Option<String> {
    ACTIVE
        .try_with(|active| active.borrow().last().map(FailureContext::render))
        .ok()
        .flatten()
}
