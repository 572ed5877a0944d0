//! Single-document conversion: the format dispatcher.
//!
//! [`convert`] picks one converter from a [`ConverterRegistry`] and runs it.
//! The lookup is priority-ordered, first match wins:
//!
//! 1. `explicit_format` — looked up directly. When it is not registered the
//!    fallback runs (or [`Doc2MdError::UnknownFormat`]); an explicit format
//!    never cascades to the key or to sniffing.
//! 2. `source_key` — the suffix of its last path component.
//! 3. `sniff_content` — the byte signature (see [`crate::pipeline::detect`]).
//! 4. The registry's fallback converter.
//!
//! A converter that runs and fails is reported as
//! [`Doc2MdError::ConversionFailure`]; the dispatcher never retries with the
//! fallback after a converter error.

use crate::config::ConversionConfig;
use crate::error::Doc2MdError;
use crate::output::{ConversionOutput, Resolution};
use crate::pipeline::{detect, postprocess};
use crate::registry::{normalize_format, Converter, ConverterRegistry};
use std::time::Instant;
use tracing::debug;

/// Format label used in errors when no candidate format exists.
const NO_FORMAT: &str = "<none>";

/// Hints for resolving a document's format.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::ConversionRequest;
///
/// let request = ConversionRequest::new()
///     .source_key("reports/q3.DOCX")
///     .sniff(true);
/// assert_eq!(request.source_key.as_deref(), Some("reports/q3.DOCX"));
/// assert!(request.explicit_format.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Format identifier chosen by the caller (`"pdf"`, `".Docx"`, …).
    pub explicit_format: Option<String>,
    /// Name/path/key the bytes came from; its suffix hints the format.
    pub source_key: Option<String>,
    /// Inspect the bytes when neither hint resolves a converter.
    pub sniff_content: bool,
}

impl ConversionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.explicit_format = Some(format.into());
        self
    }

    pub fn source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = Some(key.into());
        self
    }

    pub fn sniff(mut self, v: bool) -> Self {
        self.sniff_content = v;
        self
    }
}

/// The converter chosen for a document and how it was chosen.
struct Resolved<'r> {
    format: Option<String>,
    resolution: Resolution,
    converter: &'r Converter,
}

/// Convert one document's bytes to Markdown.
///
/// # Errors
/// - [`Doc2MdError::UnknownFormat`] when nothing resolves and the registry
///   has no fallback
/// - [`Doc2MdError::ConversionFailure`] when the selected converter fails
pub fn convert(
    content: &[u8],
    request: &ConversionRequest,
    registry: &ConverterRegistry,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let start = Instant::now();
    let resolved = resolve(content, request, registry)?;
    debug!(
        key = request.source_key.as_deref().unwrap_or(""),
        format = resolved.format.as_deref().unwrap_or(NO_FORMAT),
        resolution = ?resolved.resolution,
        bytes = content.len(),
        "converter resolved"
    );

    let raw = (resolved.converter)(content).map_err(|e| Doc2MdError::ConversionFailure {
        format: resolved
            .format
            .clone()
            .unwrap_or_else(|| NO_FORMAT.to_string()),
        key: request.source_key.clone(),
        detail: e.to_string(),
    })?;

    let markdown = finish_markdown(raw, config);
    let duration_ms = start.elapsed().as_millis() as u64;
    debug!(
        chars = markdown.chars().count(),
        duration_ms, "conversion complete"
    );

    Ok(ConversionOutput {
        markdown,
        format: resolved.format,
        resolution: resolved.resolution,
        input_bytes: content.len(),
        duration_ms,
    })
}

/// Convert with the default [`ConversionConfig`] and return only the text.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{bytes_to_markdown, ConversionRequest, ConverterRegistry};
///
/// let registry = ConverterRegistry::default();
/// let md = bytes_to_markdown(
///     b"<p>hi</p>",
///     &ConversionRequest::new().source_key("page.html"),
///     &registry,
/// )
/// .unwrap();
/// assert_eq!(md, "hi\n");
/// ```
pub fn bytes_to_markdown(
    content: &[u8],
    request: &ConversionRequest,
    registry: &ConverterRegistry,
) -> Result<String, Doc2MdError> {
    convert(content, request, registry, &ConversionConfig::default()).map(|o| o.markdown)
}

fn resolve<'r>(
    content: &[u8],
    request: &ConversionRequest,
    registry: &'r ConverterRegistry,
) -> Result<Resolved<'r>, Doc2MdError> {
    let explicit = request
        .explicit_format
        .as_deref()
        .map(normalize_format)
        .filter(|f| !f.is_empty());

    if let Some(format) = explicit {
        return match registry.get(&format) {
            Some(converter) => Ok(Resolved {
                format: Some(format),
                resolution: Resolution::Explicit,
                converter,
            }),
            None => fallback(registry, Some(format), request),
        };
    }

    let mut candidate: Option<String> = None;

    if let Some(format) = request.source_key.as_deref().and_then(detect::format_from_key) {
        if let Some(converter) = registry.get(&format) {
            return Ok(Resolved {
                format: Some(format),
                resolution: Resolution::Extension,
                converter,
            });
        }
        candidate = Some(format);
    }

    if request.sniff_content {
        if let Some(format) = detect::sniff_format(content) {
            if let Some(converter) = registry.get(format) {
                return Ok(Resolved {
                    format: Some(format.to_string()),
                    resolution: Resolution::Sniffed,
                    converter,
                });
            }
            candidate.get_or_insert_with(|| format.to_string());
        }
    }

    fallback(registry, candidate, request)
}

fn fallback<'r>(
    registry: &'r ConverterRegistry,
    candidate: Option<String>,
    request: &ConversionRequest,
) -> Result<Resolved<'r>, Doc2MdError> {
    match registry.fallback() {
        Some(converter) => Ok(Resolved {
            format: candidate,
            resolution: Resolution::Fallback,
            converter,
        }),
        None => Err(Doc2MdError::UnknownFormat {
            format: candidate.unwrap_or_else(|| NO_FORMAT.to_string()),
            key: request.source_key.clone(),
        }),
    }
}

fn finish_markdown(raw: String, config: &ConversionConfig) -> String {
    let cleaned = if config.clean_output {
        postprocess::clean_markdown(&raw)
    } else {
        raw
    };
    match config.max_output_chars {
        Some(max) => postprocess::truncate_text(&cleaned, max),
        None => cleaned,
    }
}
