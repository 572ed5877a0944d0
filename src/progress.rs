//! Progress-callback trait for per-entry batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchOptionsBuilder::progress_callback`] to receive
//! events as the batch converter walks a store.
//!
//! The callback is the least-invasive integration point: callers can forward
//! events to a channel, a log, or a terminal progress bar without the library
//! knowing how the host application reports progress.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2md::{BatchOptions, BatchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_entry_complete(&self, key: &str, markdown_len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}: {key} ({markdown_len} bytes)");
//!     }
//! }
//!
//! let options = BatchOptions::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch converter as it processes each entry.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The trait is `Send + Sync` so one callback can be
/// shared by batches fanned out over several threads.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first entry is read.
    ///
    /// # Arguments
    /// * `expected_entries` — entry count when the source store knows it up
    ///   front, `None` for stores that are walked lazily
    fn on_batch_start(&self, expected_entries: Option<usize>) {
        let _ = expected_entries;
    }

    /// Called just before an entry is dispatched.
    fn on_entry_start(&self, key: &str) {
        let _ = key;
    }

    /// Called when an entry converted and was written to the target store.
    ///
    /// # Arguments
    /// * `key`          — source key
    /// * `markdown_len` — byte length of the produced Markdown
    fn on_entry_complete(&self, key: &str, markdown_len: usize) {
        let _ = (key, markdown_len);
    }

    /// Called when an entry failed to convert.
    fn on_entry_error(&self, key: &str, error: &str) {
        let _ = (key, error);
    }

    /// Called once after every entry has been attempted (not called when a
    /// fail-fast batch aborts).
    ///
    /// # Arguments
    /// * `converted` — entries written to the target
    /// * `failed`    — entries recorded as failures
    fn on_batch_complete(&self, converted: usize, failed: usize) {
        let _ = (converted, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchOptions`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
