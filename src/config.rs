//! Configuration types for document-to-Markdown conversion.
//!
//! Single-document behaviour is controlled through [`ConversionConfig`];
//! batch behaviour through [`BatchOptions`], which embeds a
//! `ConversionConfig` for the per-entry dispatch. Both are built via
//! builders so callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::error::Doc2MdError;
use crate::progress::BatchProgressCallback;
use crate::registry::ConverterRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for converting one document.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .clean_output(true)
///     .max_output_chars(10_000)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_output_chars, Some(10_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Run the deterministic Markdown cleanup pass over converter output.
    /// Default: true.
    ///
    /// See [`crate::pipeline::postprocess::clean_markdown`] for the rules.
    /// Disable when a custom converter already produces exactly the bytes
    /// you want stored.
    pub clean_output: bool,

    /// Cap the Markdown at this many characters (after cleanup). Default: None.
    ///
    /// Truncation happens on a char boundary and appends a `…` marker.
    pub max_output_chars: Option<usize>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            clean_output: true,
            max_output_chars: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn clean_output(mut self, v: bool) -> Self {
        self.config.clean_output = v;
        self
    }

    pub fn max_output_chars(mut self, n: usize) -> Self {
        self.config.max_output_chars = Some(n);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Doc2MdError> {
        validate_conversion(&self.config)?;
        Ok(self.config)
    }
}

fn validate_conversion(c: &ConversionConfig) -> Result<(), Doc2MdError> {
    if c.max_output_chars == Some(0) {
        return Err(Doc2MdError::InvalidConfig(
            "max_output_chars must be ≥ 1".into(),
        ));
    }
    Ok(())
}

// ── Batch options ────────────────────────────────────────────────────────

/// Maps a source key to the key its Markdown is stored under.
pub type KeyTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Default key transform: append `.md` (`a.txt` → `a.txt.md`).
///
/// `a.pdf` and `a.docx` map to distinct keys.
pub fn append_md_suffix(key: &str) -> String {
    format!("{key}.md")
}

/// Alternative key transform: replace the last extension with `.md`
/// (`a.txt` → `a.md`, `notes` → `notes.md`).
///
/// Only the final path component is considered (`/` and `\\` separators), so
/// `dir.v2/readme` becomes `dir.v2/readme.md`.
pub fn replace_extension_with_md(key: &str) -> String {
    let name_start = key.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    match key[name_start..].rfind('.') {
        Some(dot) if dot > 0 => format!("{}.md", &key[..name_start + dot]),
        _ => format!("{key}.md"),
    }
}

/// What the batch converter does when a single entry fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Log the failure, record it in [`crate::output::BatchReport::failures`]
    /// and carry on with the next entry. (default)
    #[default]
    CollectAndContinue,
    /// Stop at the first failure and return [`Doc2MdError::EntryFailed`].
    /// Entries converted before the failure stay in the target store.
    FailFast,
}

/// Options for a batch conversion over a store.
///
/// Built via [`BatchOptions::builder()`] or [`BatchOptions::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{BatchOptions, FailurePolicy, replace_extension_with_md};
///
/// let options = BatchOptions::builder()
///     .failure_policy(FailurePolicy::FailFast)
///     .key_transform(replace_extension_with_md)
///     .sniff_content(true)
///     .build()
///     .unwrap();
/// assert_eq!((options.key_transform)("a.pdf"), "a.md");
/// ```
#[derive(Clone)]
pub struct BatchOptions {
    /// Per-entry conversion settings.
    pub conversion: ConversionConfig,

    /// Sniff byte content when a key's extension has no registered converter.
    /// Default: false.
    pub sniff_content: bool,

    /// Failure handling. Default: [`FailurePolicy::CollectAndContinue`].
    pub failure_policy: FailurePolicy,

    /// Target-key derivation. Default: [`append_md_suffix`].
    pub key_transform: KeyTransform,

    /// Converters layered over the caller's registry for this batch only.
    ///
    /// The caller's registry is cloned and these entries (and fallback, if
    /// set) are merged on top; the original is never mutated.
    pub overrides: Option<ConverterRegistry>,

    /// Optional progress callback for per-entry events.
    pub progress_callback: Option<Arc<dyn BatchProgressCallback>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            conversion: ConversionConfig::default(),
            sniff_content: false,
            failure_policy: FailurePolicy::default(),
            key_transform: Arc::new(append_md_suffix),
            overrides: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("conversion", &self.conversion)
            .field("sniff_content", &self.sniff_content)
            .field("failure_policy", &self.failure_policy)
            .field("key_transform", &"<fn(&str) -> String>")
            .field(
                "overrides",
                &self.overrides.as_ref().map(|r| r.formats()),
            )
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchOptions {
    /// Create a new builder for `BatchOptions`.
    pub fn builder() -> BatchOptionsBuilder {
        BatchOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`BatchOptions`].
#[derive(Debug)]
pub struct BatchOptionsBuilder {
    options: BatchOptions,
}

impl BatchOptionsBuilder {
    pub fn conversion(mut self, config: ConversionConfig) -> Self {
        self.options.conversion = config;
        self
    }

    pub fn sniff_content(mut self, v: bool) -> Self {
        self.options.sniff_content = v;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.options.failure_policy = policy;
        self
    }

    pub fn key_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.options.key_transform = Arc::new(f);
        self
    }

    pub fn overrides(mut self, registry: ConverterRegistry) -> Self {
        self.options.overrides = Some(registry);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn BatchProgressCallback>) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<BatchOptions, Doc2MdError> {
        validate_conversion(&self.options.conversion)?;
        Ok(self.options)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How to separate entries in an aggregated Markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrySeparator {
    /// Entries joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment naming the entry key: "<!-- key -->"
    Comment,
    /// Custom string inserted between entries.
    Custom(String),
}

impl EntrySeparator {
    /// Render the separator placed before the entry stored under `key`.
    pub fn render(&self, key: &str) -> String {
        match self {
            EntrySeparator::None => "\n\n".to_string(),
            EntrySeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            EntrySeparator::Comment => format!("\n\n<!-- {} -->\n\n", key),
            EntrySeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}
