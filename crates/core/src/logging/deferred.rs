use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Severity of a deferred log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

/// A log entry recorded before it was written out
#[derive(Debug, Clone)]
pub struct DeferredEntry {
    pub level: LogLevel,
    pub message: String,
    pub scope: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LoggerState {
    entries: Vec<DeferredEntry>,
    scopes: Vec<String>,
    flushed: bool,
}

impl LoggerState {
    fn current_scope(&self) -> Option<String> {
        if self.scopes.is_empty() {
            None
        } else {
            Some(self.scopes.join(" => "))
        }
    }
}

/// Logger that buffers entries until [`DeferredLogger::flush`] is called.
///
/// After the first flush entries go straight to `tracing`. Clones share
/// the same buffer.
#[derive(Debug, Clone, Default)]
pub struct DeferredLogger {
    state: Arc<Mutex<LoggerState>>,
}

impl DeferredLogger {
    /// Create a logger that buffers until flushed
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logger that writes every entry immediately
    pub fn immediate() -> Self {
        let logger = Self::new();
        logger.lock().flushed = true;
        logger
    }

    // The buffer is append-only, so a poisoned lock still holds usable data.
    fn lock(&self) -> MutexGuard<'_, LoggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an entry at `level`
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let mut state = self.lock();
        let entry = DeferredEntry {
            level,
            message: message.into(),
            scope: state.current_scope(),
            timestamp: Utc::now(),
        };
        if state.flushed {
            drop(state);
            emit(&entry);
        } else {
            state.entries.push(entry);
        }
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Tag entries with `name` until the returned guard is dropped.
    /// Scopes nest.
    pub fn begin_scope(&self, name: impl Into<String>) -> LogScope {
        self.lock().scopes.push(name.into());
        LogScope {
            state: Arc::clone(&self.state),
        }
    }

    /// Write buffered entries to `tracing` and switch to immediate mode.
    ///
    /// Returns the number of entries written.
    pub fn flush(&self) -> usize {
        let entries = {
            let mut state = self.lock();
            state.flushed = true;
            std::mem::take(&mut state.entries)
        };
        for entry in &entries {
            emit(entry);
        }
        entries.len()
    }

    /// Entries waiting for a flush
    pub fn pending(&self) -> Vec<DeferredEntry> {
        self.lock().entries.clone()
    }

    /// Check whether the logger has been flushed
    pub fn is_flushed(&self) -> bool {
        self.lock().flushed
    }
}

/// Guard returned by [`DeferredLogger::begin_scope`]
#[must_use = "the scope ends when the guard is dropped"]
#[derive(Debug)]
pub struct LogScope {
    state: Arc<Mutex<LoggerState>>,
}

impl Drop for LogScope {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.scopes.pop();
    }
}

fn emit(entry: &DeferredEntry) {
    let scope = entry.scope.as_deref().unwrap_or_default();
    let logged_at = entry.timestamp.to_rfc3339();
    match entry.level {
        LogLevel::Trace => tracing::trace!(scope, logged_at = %logged_at, "{}", entry.message),
        LogLevel::Debug => tracing::debug!(scope, logged_at = %logged_at, "{}", entry.message),
        LogLevel::Info => tracing::info!(scope, logged_at = %logged_at, "{}", entry.message),
        LogLevel::Warning => tracing::warn!(scope, logged_at = %logged_at, "{}", entry.message),
        LogLevel::Error => tracing::error!(scope, logged_at = %logged_at, "{}", entry.message),
    }
}
