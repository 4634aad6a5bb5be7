//! Non-fatal conditions met while syncing.
//!
//! Nothing in this crate fails the host: when storage misbehaves the sync
//! silently does less, and the reason ends up here and in the log.

use std::cell::RefCell;
use std::fmt;

use crate::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The probe failed, so the attach was skipped.
    StorageUnavailable { store: String, key: String },
    /// Reading the stored value while seeding failed; seeding treated it as absent.
    ReadFailed { key: String, error: String },
    /// Persisting a committed value failed; the watcher stays installed.
    WriteFailed { key: String, error: String },
}

impl Diagnostic {
    pub(crate) fn read_failed(key: &str, error: &StorageError) -> Self {
        Self::ReadFailed {
            key: key.to_owned(),
            error: error.to_string(),
        }
    }

    pub(crate) fn write_failed(key: &str, error: &StorageError) -> Self {
        Self::WriteFailed {
            key: key.to_owned(),
            error: error.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::StorageUnavailable { key, .. }
            | Self::ReadFailed { key, .. }
            | Self::WriteFailed { key, .. } => key,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageUnavailable { store, key } => {
                write!(f, "storage `{store}` is unavailable, not syncing '{key}'")
            }
            Self::ReadFailed { key, error } => write!(f, "failed to read '{key}': {error}"),
            Self::WriteFailed { key, error } => write!(f, "failed to save '{key}': {error}"),
        }
    }
}

/// How many diagnostics a context keeps; older ones are dropped first.
pub const DIAGNOSTICS_CAPACITY: usize = 64;

/// Diagnostics recorded by one engine.
///
/// Only the latest [`DIAGNOSTICS_CAPACITY`] are kept, so a store that fails
/// on every commit can't grow it without bound. Everything is still logged.
#[derive(Debug, Default)]
pub struct DiagnosticsContext {
    recorded: Vec<Diagnostic>,
    dropped: usize,
}

impl DiagnosticsContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs the diagnostic at warning level and keeps it.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(key = diagnostic.key(), "{diagnostic}");
        #[cfg(target_arch = "wasm32")]
        zoon::eprintln!("[local-storage-sync] {diagnostic}");
        if self.recorded.len() == DIAGNOSTICS_CAPACITY {
            self.recorded.remove(0);
            self.dropped += 1;
        }
        self.recorded.push(diagnostic);
    }

    pub fn recorded(&self) -> &[Diagnostic] {
        &self.recorded
    }

    /// Number of diagnostics evicted to stay within capacity.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }

    pub fn clear(&mut self) {
        self.recorded.clear();
        self.dropped = 0;
    }
}

/// Records into a shared context. While the context is borrowed elsewhere the
/// diagnostic is only logged.
pub(crate) fn record_shared(context: &RefCell<DiagnosticsContext>, diagnostic: Diagnostic) {
    match context.try_borrow_mut() {
        Ok(mut context) => context.record(diagnostic),
        Err(_) => tracing::warn!(key = diagnostic.key(), "{diagnostic}"),
    }
}
