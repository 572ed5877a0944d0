//! PDF → Markdown via `pdf-extract`.
//!
//! Text-layer extraction only: scanned pages without a text layer produce
//! nothing, and a document where every page is blank is reported as
//! [`ConverterError::Empty`]. Pages are separated by blank lines, as are
//! paragraphs within a page.

use crate::error::ConverterError;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

pub fn pdf_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    let pages = extract_pages(bytes)?;
    debug!(pages = pages.len(), "pdf text extracted");

    let rendered: Vec<String> = pages
        .iter()
        .map(|page| render_page(page))
        .filter(|p| !p.is_empty())
        .collect();
    if rendered.is_empty() {
        return Err(ConverterError::Empty);
    }
    Ok(rendered.join("\n\n"))
}

/// `pdf-extract` panics on a range of malformed inputs (bad xref offsets,
/// unsupported encodings); those become [`ConverterError::Malformed`].
fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ConverterError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ConverterError::Malformed(e.to_string())),
        Err(payload) => Err(ConverterError::Malformed(format!(
            "PDF parser panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Trim lines, turn form feeds into paragraph breaks and collapse blank runs.
fn render_page(page: &str) -> String {
    let normalised = page.replace('\x0C', "\n\n");
    let mut out: Vec<&str> = Vec::new();
    for line in normalised.lines().map(str::trim) {
        if line.is_empty() && out.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_page_collapses_blank_runs() {
        let page = "\n\n  Title  \n\n\n\nBody line one\nBody line two\x0CNext page\n\n";
        assert_eq!(
            render_page(page),
            "Title\n\nBody line one\nBody line two\n\nNext page"
        );
    }

    #[test]
    fn blank_page_renders_empty() {
        assert_eq!(render_page("  \n\x0C\n "), "");
    }

    #[test]
    fn non_pdf_bytes_fail() {
        let err = pdf_to_markdown(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ConverterError::Malformed(_)));
    }

    #[test]
    fn panic_payloads_are_readable() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
