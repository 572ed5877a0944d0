//! # edgequake-doc2md
//!
//! Convert document bytes (PDF, Word, Excel, PowerPoint, HTML, Jupyter
//! notebooks, plain text) to Markdown, one document at a time or a whole
//! key→bytes store at once.
//!
//! ## How a document is converted
//!
//! ```text
//! bytes + hints
//!  │
//!  ├─ 1. Resolve   explicit format → key suffix → byte sniffing → fallback
//!  ├─ 2. Convert   the registry's converter for that format
//!  ├─ 3. Polish    deterministic Markdown cleanup (optional)
//!  └─ 4. Output    Markdown + how the format was resolved
//! ```
//!
//! Converters live in a [`ConverterRegistry`] that the caller owns and passes
//! by reference. [`ConverterRegistry::default()`] registers the built-in
//! formats; register your own closures to add or replace formats.
//!
//! ## Quick Start
//!
//! ```rust
//! use edgequake_doc2md::{bytes_to_markdown, ConversionRequest, ConverterRegistry};
//!
//! let registry = ConverterRegistry::default();
//! let request = ConversionRequest::new().source_key("notes.txt");
//! let md = bytes_to_markdown(b"hello", &request, &registry).unwrap();
//! assert_eq!(md, "hello\n");
//! ```
//!
//! ## Batch conversion
//!
//! ```rust
//! use edgequake_doc2md::{convert_store_with_egress, Aggregator, BatchOptions, ConverterRegistry};
//! use std::collections::BTreeMap;
//!
//! let source: BTreeMap<String, Vec<u8>> = [
//!     ("a.txt", &b"first"[..]),
//!     ("b.html", &b"<h2>Second</h2>"[..]),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_vec()))
//! .collect();
//!
//! let mut target: BTreeMap<String, String> = BTreeMap::new();
//! let aggregator = Aggregator::builder().headers(true).build().unwrap();
//! let (combined, report) = convert_store_with_egress(
//!     &source,
//!     &mut target,
//!     &BatchOptions::default(),
//!     &ConverterRegistry::default(),
//!     |t| aggregator.aggregate(t),
//! )
//! .unwrap();
//!
//! assert_eq!(report.stats.converted_entries, 2);
//! assert!(combined.starts_with("## a.txt.md\n\nfirst"));
//! ```
//!
//! ## Built-in formats
//!
//! | Format | Backend |
//! |--------|---------|
//! | `pdf` | `pdf-extract` (text layer only) |
//! | `docx`, `pptx` | `zip` + OOXML scan |
//! | `xlsx`, `xls` | `calamine` |
//! | `doc`, `ppt` | OOXML delegation or OLE2 text scan |
//! | `html`, `htm` | `html2md` |
//! | `ipynb` | `serde_json` |
//! | `txt`, `text`, `md`, `markdown`, fallback | `encoding_rs` decoding |
//!
//! ## Logging
//!
//! The library emits `tracing` events and never installs a subscriber.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod convert;
pub mod converters;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod store;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use aggregate::{Aggregator, AggregatorBuilder};
pub use batch::{convert_store, convert_store_with_egress};
pub use config::{
    append_md_suffix, replace_extension_with_md, BatchOptions, BatchOptionsBuilder,
    ConversionConfig, ConversionConfigBuilder, EntrySeparator, FailurePolicy, KeyTransform,
};
pub use convert::{bytes_to_markdown, convert, ConversionRequest};
pub use error::{ConverterError, Doc2MdError, EntryError};
pub use output::{BatchReport, BatchStats, ConversionOutput, EntrySummary, Resolution};
pub use pipeline::detect::{format_from_key, sniff_format};
pub use pipeline::postprocess::{clean_markdown, truncate_text};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::{normalize_format, Converter, ConverterRegistry};
pub use store::{ByteStore, DirStore, TextStore};
pub use stream::{convert_iter, ConvertIter, EntryOutcome};
