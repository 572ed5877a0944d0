//! Result types returned by single-document and batch conversion.

use crate::error::EntryError;
use serde::{Deserialize, Serialize};

/// How the dispatcher chose the converter for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The caller named the format.
    Explicit,
    /// Derived from the source key's suffix.
    Extension,
    /// Inferred from the byte signature.
    Sniffed,
    /// No format resolved; the registry's fallback ran.
    Fallback,
}

/// The result of converting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The Markdown text (cleaned and capped per the config).
    pub markdown: String,
    /// Format whose converter ran; `None` when the fallback ran without any
    /// candidate format.
    pub format: Option<String>,
    pub resolution: Resolution,
    /// Size of the input document in bytes.
    pub input_bytes: usize,
    /// Wall-clock time spent in the converter and post-processing.
    pub duration_ms: u64,
}

/// One entry written by a batch conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub key: String,
    /// Key the Markdown was stored under in the target store.
    pub target_key: String,
    pub format: Option<String>,
    pub resolution: Resolution,
    pub input_bytes: usize,
    pub markdown_chars: usize,
    pub duration_ms: u64,
}

/// Aggregate counters for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Entries read from the source store.
    pub total_entries: usize,
    pub converted_entries: usize,
    pub failed_entries: usize,
    /// Entries that had no resolvable format and went to the fallback.
    pub fallback_entries: usize,
    pub total_input_bytes: u64,
    pub total_markdown_chars: u64,
    pub total_duration_ms: u64,
}

/// Everything a batch conversion reports back besides the target store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Successfully converted entries, in source order.
    pub converted: Vec<EntrySummary>,
    /// Entries that failed under [`crate::FailurePolicy::CollectAndContinue`].
    pub failures: Vec<EntryError>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// `true` when no entry failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record_success(&mut self, summary: EntrySummary) {
        self.stats.total_entries += 1;
        self.stats.converted_entries += 1;
        if summary.resolution == Resolution::Fallback {
            self.stats.fallback_entries += 1;
        }
        self.stats.total_input_bytes += summary.input_bytes as u64;
        self.stats.total_markdown_chars += summary.markdown_chars as u64;
        self.converted.push(summary);
    }

    pub(crate) fn record_failure(&mut self, error: EntryError) {
        self.stats.total_entries += 1;
        self.stats.failed_entries += 1;
        self.failures.push(error);
    }
}
