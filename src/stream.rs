//! Lazy per-entry conversion: the iterator underneath batch conversion.
//!
//! [`convert_iter`] wraps any iterator of `(key, bytes)` pairs and yields one
//! [`EntryOutcome`] per pair as it is pulled, so callers can stream entries
//! from wherever they live (an archive, a database cursor, a network
//! listing) without a store abstraction, and stop early whenever they like.
//! [`crate::batch::convert_store`] drives the same per-entry step over a
//! [`crate::ByteStore`] and writes the results.

use crate::config::BatchOptions;
use crate::convert::{convert, ConversionRequest};
use crate::error::EntryError;
use crate::output::ConversionOutput;
use crate::registry::ConverterRegistry;
use std::borrow::Cow;
use tracing::debug;

/// The result of converting one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    /// Source key.
    pub key: String,
    /// Key produced by the batch's key transform.
    pub target_key: String,
    pub result: Result<ConversionOutput, EntryError>,
}

impl EntryOutcome {
    /// The Markdown, when the entry converted.
    pub fn markdown(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|o| o.markdown.as_str())
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Iterator returned by [`convert_iter`].
pub struct ConvertIter<'a, I> {
    entries: I,
    options: &'a BatchOptions,
    registry: Cow<'a, ConverterRegistry>,
}

/// Convert `(key, bytes)` pairs lazily.
///
/// Each entry is dispatched with `source_key = key` and the batch's
/// `sniff_content` setting; [`BatchOptions::overrides`] are layered over a
/// copy of `registry` once, up front. Failures are yielded as
/// `Err(EntryError)` regardless of [`BatchOptions::failure_policy`]; the
/// caller decides whether to keep pulling.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{convert_iter, BatchOptions, ConverterRegistry};
///
/// let registry = ConverterRegistry::default();
/// let options = BatchOptions::default();
/// let entries = vec![("a.txt", b"hello".to_vec()), ("b.html", b"<p>hi</p>".to_vec())];
///
/// let outcomes: Vec<_> = convert_iter(entries, &options, &registry).collect();
/// assert_eq!(outcomes[0].target_key, "a.txt.md");
/// assert_eq!(outcomes[1].markdown(), Some("hi\n"));
/// ```
pub fn convert_iter<'a, I, K, B>(
    entries: I,
    options: &'a BatchOptions,
    registry: &'a ConverterRegistry,
) -> ConvertIter<'a, I::IntoIter>
where
    I: IntoIterator<Item = (K, B)>,
    K: Into<String>,
    B: AsRef<[u8]>,
{
    ConvertIter {
        entries: entries.into_iter(),
        options,
        registry: effective_registry(registry, options),
    }
}

impl<I, K, B> Iterator for ConvertIter<'_, I>
where
    I: Iterator<Item = (K, B)>,
    K: Into<String>,
    B: AsRef<[u8]>,
{
    type Item = EntryOutcome;

    fn next(&mut self) -> Option<EntryOutcome> {
        let (key, bytes) = self.entries.next()?;
        Some(convert_entry(
            key.into(),
            bytes.as_ref(),
            self.options,
            &self.registry,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

/// The caller's registry, or a merged copy when the batch has overrides.
pub(crate) fn effective_registry<'a>(
    registry: &'a ConverterRegistry,
    options: &BatchOptions,
) -> Cow<'a, ConverterRegistry> {
    match &options.overrides {
        Some(overrides) => Cow::Owned(registry.overlaid(overrides)),
        None => Cow::Borrowed(registry),
    }
}

/// Convert a single entry; shared by [`ConvertIter`] and the store batch.
pub(crate) fn convert_entry(
    key: String,
    bytes: &[u8],
    options: &BatchOptions,
    registry: &ConverterRegistry,
) -> EntryOutcome {
    let target_key = (options.key_transform)(&key);
    let request = ConversionRequest::new()
        .source_key(key.as_str())
        .sniff(options.sniff_content);

    let result =
        convert(bytes, &request, registry, &options.conversion).map_err(|e| e.into_entry_error(&key));
    if let Ok(out) = &result {
        debug!(
            key = key.as_str(),
            target = target_key.as_str(),
            duration_ms = out.duration_ms,
            "entry converted"
        );
    }

    EntryOutcome {
        key,
        target_key,
        result,
    }
}
