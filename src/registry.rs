//! The converter registry: format identifier → converter function.
//!
//! A registry is a flat map plus an optional fallback. There is no
//! process-wide registry; [`ConverterRegistry::default()`] builds a fresh one
//! with the built-in converters every time, and callers pass the registry by
//! reference into each call. Converters are reference-counted closures, so
//! cloning a registry to layer per-batch overrides on top is cheap.

use crate::converters;
use crate::error::ConverterError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A converter: raw document bytes → Markdown text.
pub type Converter = Arc<dyn Fn(&[u8]) -> Result<String, ConverterError> + Send + Sync>;

/// Normalise a format identifier: trim, strip a leading `.`, lowercase.
pub fn normalize_format(format: &str) -> String {
    format.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Mapping from format identifier to converter, plus an optional fallback.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::ConverterRegistry;
///
/// let mut registry = ConverterRegistry::default();
/// registry.register("txt", |bytes: &[u8]| Ok(format!("> {}", String::from_utf8_lossy(bytes))));
/// assert!(registry.contains("TXT"));
/// assert!(registry.fallback().is_some());
/// ```
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Converter>,
    fallback: Option<Converter>,
}

impl Default for ConverterRegistry {
    /// The built-in registry: pdf, docx, doc, xlsx, xls, pptx, ppt, html/htm,
    /// ipynb, txt/text, md/markdown, with plain-text decoding as fallback.
    fn default() -> Self {
        let mut r = Self::empty();
        r.register("pdf", converters::pdf::pdf_to_markdown);
        r.register("docx", converters::docx::docx_to_markdown);
        r.register("doc", converters::legacy::doc_to_markdown);
        r.register("xlsx", converters::spreadsheet::spreadsheet_to_markdown);
        r.register("xls", converters::spreadsheet::spreadsheet_to_markdown);
        r.register("pptx", converters::pptx::pptx_to_markdown);
        r.register("ppt", converters::legacy::ppt_to_markdown);
        r.register("html", converters::html::html_to_markdown);
        r.register("htm", converters::html::html_to_markdown);
        r.register("ipynb", converters::notebook::notebook_to_markdown);
        for text_format in ["txt", "text", "md", "markdown"] {
            r.register(text_format, converters::text::text_to_markdown);
        }
        r.set_fallback(converters::text::text_to_markdown);
        r
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("formats", &self.formats())
            .field("fallback", &self.fallback.as_ref().map(|_| "<converter>"))
            .finish()
    }
}

impl ConverterRegistry {
    /// A registry with no converters and no fallback.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
            fallback: None,
        }
    }

    /// Register (or replace) the converter for `format`.
    pub fn register<F>(&mut self, format: &str, converter: F) -> &mut Self
    where
        F: Fn(&[u8]) -> Result<String, ConverterError> + Send + Sync + 'static,
    {
        self.converters
            .insert(normalize_format(format), Arc::new(converter));
        self
    }

    /// Register an already shared converter under `format`.
    pub fn register_shared(&mut self, format: &str, converter: Converter) -> &mut Self {
        self.converters.insert(normalize_format(format), converter);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, format: &str, converter: F) -> Self
    where
        F: Fn(&[u8]) -> Result<String, ConverterError> + Send + Sync + 'static,
    {
        self.register(format, converter);
        self
    }

    /// Remove the converter for `format`, returning it if present.
    pub fn remove(&mut self, format: &str) -> Option<Converter> {
        self.converters.remove(&normalize_format(format))
    }

    /// Look up the converter for `format` (case-insensitive).
    pub fn get(&self, format: &str) -> Option<&Converter> {
        self.converters.get(&normalize_format(format))
    }

    /// Whether a converter is registered for `format`.
    pub fn contains(&self, format: &str) -> bool {
        self.get(format).is_some()
    }

    /// Registered format identifiers, sorted.
    pub fn formats(&self) -> Vec<String> {
        let mut v: Vec<String> = self.converters.keys().cloned().collect();
        v.sort_unstable();
        v
    }

    /// Set the converter used when no format resolves.
    ///
    /// The fallback must accept arbitrary bytes; it is never asked to
    /// report an unknown format.
    pub fn set_fallback<F>(&mut self, converter: F) -> &mut Self
    where
        F: Fn(&[u8]) -> Result<String, ConverterError> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(converter));
        self
    }

    /// Drop the fallback so unresolved formats surface as
    /// [`crate::Doc2MdError::UnknownFormat`].
    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// The fallback converter, if any.
    pub fn fallback(&self) -> Option<&Converter> {
        self.fallback.as_ref()
    }

    /// Layer `other` on top of `self`: its converters replace same-named ones
    /// and its fallback (if set) replaces ours.
    pub fn merge(&mut self, other: &ConverterRegistry) -> &mut Self {
        for (format, converter) in &other.converters {
            self.converters.insert(format.clone(), Arc::clone(converter));
        }
        if let Some(fb) = &other.fallback {
            self.fallback = Some(Arc::clone(fb));
        }
        self
    }

    /// A copy of `self` with `overrides` merged on top; `self` is untouched.
    pub fn overlaid(&self, overrides: &ConverterRegistry) -> ConverterRegistry {
        let mut merged = self.clone();
        merged.merge(overrides);
        merged
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(s: &'static str) -> impl Fn(&[u8]) -> Result<String, ConverterError> {
        move |_| Ok(s.to_string())
    }

    #[test]
    fn default_registry_has_builtin_formats() {
        let r = ConverterRegistry::default();
        for f in [
            "pdf", "docx", "doc", "xlsx", "xls", "pptx", "ppt", "html", "ipynb", "txt", "md",
        ] {
            assert!(r.contains(f), "missing built-in format {f}");
        }
        assert!(r.fallback().is_some());
    }

    #[test]
    fn lookup_is_case_insensitive_and_dot_tolerant() {
        let r = ConverterRegistry::default();
        assert!(r.contains("PDF"));
        assert!(r.contains(".Docx"));
        assert!(!r.contains("xyz"));
    }

    #[test]
    fn register_replaces_existing() {
        let mut r = ConverterRegistry::empty();
        r.register("txt", constant("one"));
        r.register("TXT", constant("two"));
        assert_eq!(r.len(), 1);
        assert_eq!(r.get("txt").unwrap()(b"").unwrap(), "two");
    }

    #[test]
    fn overlaid_leaves_original_untouched() {
        let base = ConverterRegistry::default();
        let overrides = ConverterRegistry::empty().with("txt", constant("custom"));
        let merged = base.overlaid(&overrides);

        assert_eq!(merged.get("txt").unwrap()(b"hello").unwrap(), "custom");
        assert_eq!(base.get("txt").unwrap()(b"hello").unwrap(), "hello");
        assert_eq!(merged.len(), base.len());
    }

    #[test]
    fn merge_replaces_fallback_only_when_set() {
        let mut base = ConverterRegistry::empty();
        base.set_fallback(constant("base"));
        base.merge(&ConverterRegistry::empty());
        assert_eq!(base.fallback().unwrap()(b"").unwrap(), "base");

        let mut other = ConverterRegistry::empty();
        other.set_fallback(constant("other"));
        base.merge(&other);
        assert_eq!(base.fallback().unwrap()(b"").unwrap(), "other");
    }

    #[test]
    fn without_fallback_clears_it() {
        let r = ConverterRegistry::default().without_fallback();
        assert!(r.fallback().is_none());
        assert!(!r.is_empty());
    }

    #[test]
    fn remove_and_formats() {
        let mut r = ConverterRegistry::empty()
            .with("b", constant("b"))
            .with("a", constant("a"));
        assert_eq!(r.formats(), vec!["a".to_string(), "b".to_string()]);
        assert!(r.remove("A").is_some());
        assert_eq!(r.formats(), vec!["b".to_string()]);
    }
}
