//! Batch conversion of a whole store.
//!
//! [`convert_store`] walks a [`ByteStore`] lazily, converts every entry with
//! its key as the format hint, and writes the Markdown into a [`TextStore`]
//! under `key_transform(key)`. [`convert_store_with_egress`] additionally
//! hands the populated target to a caller-supplied function (typically an
//! [`crate::Aggregator`]) and returns its result next to the report.
//!
//! ## Failure handling
//!
//! A converter failure is per-entry and follows
//! [`BatchOptions::failure_policy`]. Reading the source or writing the
//! target is the caller's infrastructure failing, so those errors always
//! abort the batch.

use crate::config::{BatchOptions, FailurePolicy};
use crate::error::Doc2MdError;
use crate::output::{BatchReport, EntrySummary};
use crate::registry::ConverterRegistry;
use crate::store::{ByteStore, TextStore};
use crate::stream::{convert_entry, effective_registry};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every entry of `source` into `target`.
///
/// # Returns
/// `Ok(BatchReport)` once every entry was attempted, even if some failed
/// under [`FailurePolicy::CollectAndContinue`] (check `report.failures`).
///
/// # Errors
/// - [`Doc2MdError::EntryFailed`] on the first failed entry under
///   [`FailurePolicy::FailFast`]; entries written before it stay in `target`
/// - [`Doc2MdError::StoreRead`] / [`Doc2MdError::StoreWrite`] /
///   [`Doc2MdError::KeyNotFound`] / [`Doc2MdError::InvalidKey`] from the
///   stores themselves
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{convert_store, BatchOptions, ConverterRegistry};
/// use std::collections::BTreeMap;
///
/// let mut source = BTreeMap::new();
/// source.insert("a.txt".to_string(), b"hello".to_vec());
/// source.insert("b.unknown".to_string(), b"???".to_vec());
/// source.insert("c.html".to_string(), b"<p>hi</p>".to_vec());
///
/// let mut target: BTreeMap<String, String> = BTreeMap::new();
/// let report = convert_store(
///     &source,
///     &mut target,
///     &BatchOptions::default(),
///     &ConverterRegistry::default(),
/// )
/// .unwrap();
///
/// assert_eq!(report.stats.converted_entries, 3);
/// assert_eq!(target["c.html.md"], "hi\n");
/// ```
pub fn convert_store<S, T>(
    source: &S,
    target: &mut T,
    options: &BatchOptions,
    registry: &ConverterRegistry,
) -> Result<BatchReport, Doc2MdError>
where
    S: ByteStore + ?Sized,
    T: TextStore + ?Sized,
{
    let batch_start = Instant::now();
    let registry = effective_registry(registry, options);
    let callback = options.progress_callback.as_deref();
    let expected = source.len_hint();

    info!(
        expected_entries = ?expected,
        policy = ?options.failure_policy,
        sniff = options.sniff_content,
        "Starting batch conversion"
    );
    if let Some(cb) = callback {
        cb.on_batch_start(expected);
    }

    let mut report = BatchReport::default();
    let mut written: HashSet<String> = HashSet::new();

    for key in source.keys() {
        if let Some(cb) = callback {
            cb.on_entry_start(&key);
        }
        let bytes = source.read(&key)?;
        let outcome = convert_entry(key, &bytes, options, &registry);

        match outcome.result {
            Ok(output) => {
                if !written.insert(outcome.target_key.clone()) {
                    warn!(
                        "'{}' overwrites an earlier entry at '{}'",
                        outcome.key, outcome.target_key
                    );
                }
                let markdown_len = output.markdown.len();
                let summary = EntrySummary {
                    key: outcome.key,
                    target_key: outcome.target_key,
                    format: output.format,
                    resolution: output.resolution,
                    input_bytes: output.input_bytes,
                    markdown_chars: output.markdown.chars().count(),
                    duration_ms: output.duration_ms,
                };
                target.write(&summary.target_key, output.markdown)?;
                if let Some(cb) = callback {
                    cb.on_entry_complete(&summary.key, markdown_len);
                }
                report.record_success(summary);
            }
            Err(err) => {
                if let Some(cb) = callback {
                    cb.on_entry_error(&outcome.key, &err.message);
                }
                match options.failure_policy {
                    FailurePolicy::FailFast => {
                        warn!("Aborting batch on {}", err);
                        return Err(Doc2MdError::EntryFailed {
                            key: outcome.key,
                            source: err,
                        });
                    }
                    FailurePolicy::CollectAndContinue => {
                        warn!("Entry failed, continuing: {}", err);
                        report.record_failure(err);
                    }
                }
            }
        }
    }

    report.stats.total_duration_ms = batch_start.elapsed().as_millis() as u64;
    info!(
        "Batch complete: {}/{} entries converted, {} failed, {}ms",
        report.stats.converted_entries,
        report.stats.total_entries,
        report.stats.failed_entries,
        report.stats.total_duration_ms
    );
    if let Some(cb) = callback {
        cb.on_batch_complete(report.stats.converted_entries, report.stats.failed_entries);
    }
    Ok(report)
}

/// [`convert_store`], then run `egress` over the populated target.
///
/// `egress` only runs when the batch itself succeeded.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{convert_store_with_egress, Aggregator, BatchOptions, ConverterRegistry};
///
/// let source = vec![
///     ("intro.txt".to_string(), b"Hello".to_vec()),
///     ("body.html".to_string(), b"<p>World</p>".to_vec()),
/// ];
/// let mut target: Vec<(String, String)> = Vec::new();
/// let aggregator = Aggregator::builder().build().unwrap();
///
/// let (combined, report) = convert_store_with_egress(
///     &source,
///     &mut target,
///     &BatchOptions::default(),
///     &ConverterRegistry::default(),
///     |t| aggregator.aggregate(t),
/// )
/// .unwrap();
///
/// assert!(report.is_complete());
/// assert_eq!(combined, "Hello\n\nWorld\n");
/// ```
pub fn convert_store_with_egress<S, T, R, F>(
    source: &S,
    target: &mut T,
    options: &BatchOptions,
    registry: &ConverterRegistry,
    egress: F,
) -> Result<(R, BatchReport), Doc2MdError>
where
    S: ByteStore + ?Sized,
    T: TextStore + ?Sized,
    F: FnOnce(&T) -> R,
{
    let report = convert_store(source, target, options, registry)?;
    debug!("Running egress over target store");
    let result = egress(&*target);
    Ok((result, report))
}
