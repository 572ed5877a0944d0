//! Aggregation: concatenate a Markdown store into one document.
//!
//! The usual egress for a batch: after [`crate::convert_store`] fills a
//! target store, an [`Aggregator`] folds it into a single Markdown string
//! (or a few chunks of it) suitable for handing to a reader or a model.
//!
//! Per entry, in order:
//! 1. skip excluded keys (and non-`.md` keys when `only_markdown_keys`)
//! 2. drop blocks of `min_duplicated_lines`+ lines already seen earlier
//! 3. cap at `max_chars_per_entry` characters
//! 4. prefix `## <key>` when `headers` is on
//!
//! Entries that end up empty are skipped; the [`EntrySeparator`] goes
//! between the remaining ones.

use crate::config::EntrySeparator;
use crate::error::Doc2MdError;
use crate::pipeline::postprocess::truncate_text;
use crate::store::TextStore;
use std::collections::HashSet;

/// Folds Markdown entries into one document.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{Aggregator, EntrySeparator};
///
/// let aggregator = Aggregator::builder()
///     .headers(true)
///     .separator(EntrySeparator::HorizontalRule)
///     .exclude(["draft.md"])
///     .build()
///     .unwrap();
///
/// let md = aggregator.aggregate_entries([
///     ("a.md", "Alpha"),
///     ("draft.md", "ignored"),
///     ("b.md", "Beta"),
/// ]);
/// assert_eq!(md, "## a.md\n\nAlpha\n\n---\n\n## b.md\n\nBeta\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    exclude: HashSet<String>,
    only_markdown_keys: bool,
    max_chars_per_entry: Option<usize>,
    min_duplicated_lines: Option<usize>,
    separator: EntrySeparator,
    headers: bool,
}

/// Builder for [`Aggregator`].
#[derive(Debug, Default)]
pub struct AggregatorBuilder {
    inner: Aggregator,
}

impl AggregatorBuilder {
    /// Keys to leave out (exact match).
    pub fn exclude<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.inner.exclude.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Keep only keys ending in `.md`. Default: false.
    pub fn only_markdown_keys(mut self, v: bool) -> Self {
        self.inner.only_markdown_keys = v;
        self
    }

    pub fn max_chars_per_entry(mut self, n: usize) -> Self {
        self.inner.max_chars_per_entry = Some(n);
        self
    }

    /// Drop any run of at least `n` consecutive lines that already appeared
    /// earlier in the aggregate.
    pub fn min_duplicated_lines(mut self, n: usize) -> Self {
        self.inner.min_duplicated_lines = Some(n);
        self
    }

    pub fn separator(mut self, separator: EntrySeparator) -> Self {
        self.inner.separator = separator;
        self
    }

    /// Prefix each entry with `## <key>`. Default: false.
    pub fn headers(mut self, v: bool) -> Self {
        self.inner.headers = v;
        self
    }

    pub fn build(self) -> Result<Aggregator, Doc2MdError> {
        if self.inner.max_chars_per_entry == Some(0) {
            return Err(Doc2MdError::InvalidConfig(
                "max_chars_per_entry must be ≥ 1".into(),
            ));
        }
        if self.inner.min_duplicated_lines == Some(0) {
            return Err(Doc2MdError::InvalidConfig(
                "min_duplicated_lines must be ≥ 1".into(),
            ));
        }
        Ok(self.inner)
    }
}

impl Aggregator {
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::default()
    }

    /// Aggregate every entry of a text store, in the store's order.
    pub fn aggregate<S: TextStore + ?Sized>(&self, store: &S) -> String {
        self.aggregate_entries(store.entries())
    }

    /// Aggregate a store into chunks of at most `chunk_size` entries each.
    ///
    /// Chunking counts store entries (before filtering), so chunk `i` always
    /// covers the same keys regardless of exclusions. Duplicate detection
    /// restarts with every chunk. A `chunk_size` of 0 is treated as 1.
    pub fn aggregate_chunks<S: TextStore + ?Sized>(
        &self,
        store: &S,
        chunk_size: usize,
    ) -> Vec<String> {
        self.aggregate_entries_chunked(store.entries(), chunk_size)
    }

    /// Aggregate arbitrary `(key, markdown)` pairs.
    pub fn aggregate_entries<I, K, V>(&self, entries: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen = LineWindows::new(self.min_duplicated_lines);
        let mut out = String::new();
        for (key, text) in entries {
            self.push_entry(&mut out, &mut seen, key.as_ref(), text.as_ref());
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    pub fn aggregate_entries_chunked<I, K, V>(&self, entries: I, chunk_size: usize) -> Vec<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let chunk_size = chunk_size.max(1);
        let mut chunks = Vec::new();
        let mut batch: Vec<(K, V)> = Vec::with_capacity(chunk_size);
        for entry in entries {
            batch.push(entry);
            if batch.len() == chunk_size {
                chunks.push(self.aggregate_entries(batch.drain(..)));
            }
        }
        if !batch.is_empty() {
            chunks.push(self.aggregate_entries(batch));
        }
        chunks
    }

    fn includes(&self, key: &str) -> bool {
        !self.exclude.contains(key) && (!self.only_markdown_keys || key.ends_with(".md"))
    }

    fn push_entry(&self, out: &mut String, seen: &mut LineWindows, key: &str, text: &str) {
        if !self.includes(key) {
            return;
        }
        let deduped = seen.dedup(text);
        let capped = match self.max_chars_per_entry {
            Some(max) => truncate_text(deduped.trim(), max),
            None => deduped.trim().to_string(),
        };
        if capped.is_empty() {
            return;
        }
        if !out.is_empty() {
            out.push_str(&self.separator.render(key));
        }
        if self.headers {
            out.push_str("## ");
            out.push_str(key);
            out.push_str("\n\n");
        }
        out.push_str(&capped);
    }
}

/// Windows of `n` consecutive lines seen so far in an aggregate.
struct LineWindows {
    size: Option<usize>,
    seen: HashSet<Vec<String>>,
}

impl LineWindows {
    fn new(size: Option<usize>) -> Self {
        Self {
            size,
            seen: HashSet::new(),
        }
    }

    /// Remove every line covered by a window that appeared earlier, then
    /// remember this entry's windows.
    ///
    /// Windows made only of blank lines never count as duplicates.
    fn dedup(&mut self, text: &str) -> String {
        let Some(n) = self.size else {
            return text.to_string();
        };
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        if lines.len() < n {
            return text.to_string();
        }

        let window = |i: usize| -> Vec<String> {
            lines[i..i + n].iter().map(|l| l.to_string()).collect()
        };
        let blank = |i: usize| lines[i..i + n].iter().all(|l| l.is_empty());

        let mut removed = vec![false; lines.len()];
        for i in 0..=lines.len() - n {
            // Windows of this entry count once they no longer overlap `i`.
            if i >= n && !blank(i - n) {
                self.seen.insert(window(i - n));
            }
            if !blank(i) && self.seen.contains(&window(i)) {
                removed[i..i + n].fill(true);
            }
        }
        let tail_start = (lines.len() + 1).saturating_sub(n).saturating_sub(n);
        for i in tail_start..=lines.len() - n {
            if !blank(i) {
                self.seen.insert(window(i));
            }
        }

        lines
            .iter()
            .zip(removed)
            .filter(|(_, r)| !r)
            .map(|(l, _)| *l)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
