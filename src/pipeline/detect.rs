//! Format detection: from a source key's suffix, or by sniffing content.
//!
//! Sniffing is a pure function over the first bytes of a document: an
//! ordered table of `(predicate, format)` pairs evaluated top to bottom,
//! stopping at the first match. A ZIP could be docx/xlsx/pptx and an OLE2
//! compound file could be doc/xls/ppt, so those predicates also peek at the
//! directory names.
//!
//! ## Signatures
//!
//! | Order | Signature | Format |
//! |-------|-----------|--------|
//! | 1 | leading `%PDF-` (after whitespace/BOM) | `pdf` |
//! | 2 | ZIP + `word/document.xml` | `docx` |
//! | 3 | ZIP + `xl/workbook.xml` | `xlsx` |
//! | 4 | ZIP + `ppt/presentation.xml` | `pptx` |
//! | 5 | OLE2 + `WordDocument` stream | `doc` |
//! | 6 | OLE2 + `Workbook` / `Book` stream | `xls` |
//! | 7 | OLE2 + `PowerPoint Document` stream | `ppt` |
//! | 8 | JSON object with `"cells"` and `"nbformat"` | `ipynb` |
//! | 9 | leading `<!doctype html`, `<html`, `<head`, `<body` | `html` |
//! | 10 | valid UTF-8 without NUL bytes | `txt` |

use std::io::Cursor;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Bytes inspected by the text-based predicates.
const SNIFF_WINDOW: usize = 4096;

type Predicate = fn(&[u8]) -> bool;

/// Priority-ordered signature table. First match wins.
const SIGNATURES: &[(Predicate, &str)] = &[
    (is_pdf, "pdf"),
    (is_docx, "docx"),
    (is_xlsx, "xlsx"),
    (is_pptx, "pptx"),
    (is_doc, "doc"),
    (is_xls, "xls"),
    (is_ppt, "ppt"),
    (is_notebook, "ipynb"),
    (is_html, "html"),
    (is_text, "txt"),
];

/// Infer a format identifier from byte content, or `None` when nothing matches.
pub fn sniff_format(content: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(matches, _)| matches(content))
        .map(|(_, format)| *format)
}

/// Derive a lowercase format identifier from a key's suffix.
///
/// Only the last path component is considered (`/` and `\` separators), and
/// dot-files without a further extension (`.bashrc`) have no format.
pub fn format_from_key(key: &str) -> Option<String> {
    let name = key.rsplit(['/', '\\']).next().unwrap_or(key);
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    Some(name[dot + 1..].to_ascii_lowercase())
}

// ── Predicates ───────────────────────────────────────────────────────────

fn is_pdf(b: &[u8]) -> bool {
    // Anchored: prose that merely mentions the header is text.
    let head = text_window(b);
    let start = head
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .unwrap_or(head.len());
    head[start..].starts_with(PDF_MAGIC)
}

pub(crate) fn is_zip(b: &[u8]) -> bool {
    b.starts_with(ZIP_MAGIC)
}

pub(crate) fn is_ole(b: &[u8]) -> bool {
    b.starts_with(OLE_MAGIC)
}

fn is_docx(b: &[u8]) -> bool {
    zip_has_entry(b, "word/document.xml")
}

fn is_xlsx(b: &[u8]) -> bool {
    zip_has_entry(b, "xl/workbook.xml")
}

fn is_pptx(b: &[u8]) -> bool {
    zip_has_entry(b, "ppt/presentation.xml")
}

fn is_doc(b: &[u8]) -> bool {
    ole_has_stream(b, &["WordDocument"])
}

fn is_xls(b: &[u8]) -> bool {
    ole_has_stream(b, &["Workbook", "Book"])
}

fn is_ppt(b: &[u8]) -> bool {
    ole_has_stream(b, &["PowerPoint Document"])
}

fn zip_has_entry(b: &[u8], name: &str) -> bool {
    if !is_zip(b) {
        return false;
    }
    match zip::ZipArchive::new(Cursor::new(b)) {
        Ok(archive) => archive.file_names().any(|n| n.eq_ignore_ascii_case(name)),
        Err(_) => false,
    }
}

/// OLE2 directory entries store names as UTF-16LE; scan for them directly
/// rather than walking the FAT.
fn ole_has_stream(b: &[u8], names: &[&str]) -> bool {
    if !is_ole(b) {
        return false;
    }
    names.iter().any(|name| {
        let needle: Vec<u8> = name
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .chain([0, 0])
            .collect();
        b.windows(needle.len()).any(|w| w == needle.as_slice())
    })
}

fn text_window(b: &[u8]) -> &[u8] {
    let b = b.strip_prefix(UTF8_BOM).unwrap_or(b);
    &b[..b.len().min(SNIFF_WINDOW)]
}

fn is_notebook(b: &[u8]) -> bool {
    let head = text_window(b);
    let start = match head.iter().position(|c| !c.is_ascii_whitespace()) {
        Some(i) => i,
        None => return false,
    };
    if head[start] != b'{' {
        return false;
    }
    contains(b, b"\"cells\"") && contains(b, b"\"nbformat\"")
}

fn is_html(b: &[u8]) -> bool {
    let head = text_window(b);
    let start = head
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = &head[start..];
    ["<!doctype html", "<html", "<head", "<body"]
        .iter()
        .any(|tag| starts_with_ignore_case(head, tag.as_bytes()))
}

fn is_text(b: &[u8]) -> bool {
    !b.contains(&0) && std::str::from_utf8(b).is_ok()
}

fn contains(hay: &[u8], needle: &[u8]) -> bool {
    hay.windows(needle.len()).any(|w| w == needle)
}

fn starts_with_ignore_case(hay: &[u8], prefix: &[u8]) -> bool {
    hay.len() >= prefix.len() && hay[..prefix.len()].eq_ignore_ascii_case(prefix)
}
