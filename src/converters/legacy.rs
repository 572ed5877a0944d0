//! Legacy binary Office documents (`.doc`, `.ppt`).
//!
//! Files carrying an old extension are often really OOXML; those are handed
//! to the docx/pptx converters. A `.doc` that is really RTF (`{\rtf`) is
//! reduced to its paragraph text. Genuine OLE2 compound files are scanned for
//! runs of readable text, both UTF-16LE (how Word 97+ and PowerPoint store
//! most text) and single-byte ASCII. Both paths are lossy: no structure
//! survives, but the words do.

use super::{docx, pptx};
use crate::error::ConverterError;
use crate::pipeline::detect::{is_ole, is_zip};
use encoding_rs::WINDOWS_1252;

/// Shortest run of characters worth keeping.
const MIN_RUN_CHARS: usize = 4;

/// The OLE2 header sector; never content.
const OLE_HEADER_LEN: usize = 512;

const RTF_MAGIC: &[u8] = b"{\\rtf";

/// RTF destinations that never hold body text.
const RTF_HIDDEN_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "footer",
    "listtable",
    "listoverridetable",
    "themedata",
    "datastore",
    "latentstyles",
];

/// Directory entry names that show up as text in every compound file.
const OLE_STREAM_NAMES: &[&str] = &[
    "Root Entry",
    "WordDocument",
    "0Table",
    "1Table",
    "Data",
    "CompObj",
    "SummaryInformation",
    "DocumentSummaryInformation",
    "PowerPoint Document",
    "Current User",
    "Pictures",
    "Workbook",
];

pub fn doc_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    if is_zip(bytes) {
        return docx::docx_to_markdown(bytes);
    }
    if bytes.starts_with(RTF_MAGIC) {
        return rtf_to_markdown(bytes);
    }
    scan_compound_file(bytes)
}

pub fn ppt_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    if is_zip(bytes) {
        return pptx::pptx_to_markdown(bytes);
    }
    scan_compound_file(bytes)
}

fn scan_compound_file(bytes: &[u8]) -> Result<String, ConverterError> {
    if !is_ole(bytes) {
        return Err(ConverterError::Malformed(
            "not an OLE2 compound document".into(),
        ));
    }
    let body = &bytes[OLE_HEADER_LEN.min(bytes.len())..];

    let mut runs = utf16_runs(body);
    runs.extend(ascii_runs(body));
    runs.sort_by_key(|(offset, _)| *offset);

    let mut seen = std::collections::HashSet::new();
    let lines: Vec<String> = runs
        .into_iter()
        .map(|(_, text)| text)
        .filter(|t| !OLE_STREAM_NAMES.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect();

    if lines.is_empty() {
        return Err(ConverterError::Empty);
    }
    Ok(lines.join("\n\n"))
}

/// Plain paragraphs from an RTF stream.
///
/// Control words are dropped except paragraph/line breaks, tabs, `\uN`
/// characters and `\'hh` escapes (read as Windows-1252).
fn rtf_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    let mut text = String::new();
    // (hidden, \uc) of each enclosing group.
    let mut groups: Vec<(bool, usize)> = Vec::new();
    let mut hidden = false;
    let mut uc = 1usize;
    let mut fallback_left = 0usize;
    let mut group_opened = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        match b {
            b'{' => {
                groups.push((hidden, uc));
                group_opened = true;
                continue;
            }
            b'}' => {
                if let Some((h, u)) = groups.pop() {
                    hidden = h;
                    uc = u;
                }
                fallback_left = 0;
            }
            b'\\' if bytes.get(i).is_some_and(u8::is_ascii_alphabetic) => {
                let start = i;
                while bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
                    i += 1;
                }
                let word = String::from_utf8_lossy(&bytes[start..i]);
                let param_start = i;
                if bytes.get(i) == Some(&b'-') {
                    i += 1;
                }
                while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                    i += 1;
                }
                let param: Option<i32> = std::str::from_utf8(&bytes[param_start..i])
                    .ok()
                    .and_then(|p| p.parse().ok());
                if bytes.get(i) == Some(&b' ') {
                    i += 1;
                }
                if group_opened && RTF_HIDDEN_DESTINATIONS.contains(&&*word) {
                    hidden = true;
                }
                if !hidden {
                    match &*word {
                        "par" | "line" | "row" | "sect" | "page" => text.push('\n'),
                        "tab" | "cell" => text.push('\t'),
                        "uc" => uc = param.map_or(1, |n| n.max(0) as usize),
                        "u" => {
                            if let Some(n) = param {
                                let code = (if n < 0 { n + 0x10000 } else { n }) as u32;
                                text.extend(char::from_u32(code));
                                fallback_left = uc;
                            }
                        }
                        _ => {}
                    }
                }
            }
            b'\\' => {
                let Some(&symbol) = bytes.get(i) else { break };
                i += 1;
                match symbol {
                    b'*' if group_opened => hidden = true,
                    b'\'' => {
                        let hex = bytes.get(i..i + 2).and_then(|h| std::str::from_utf8(h).ok());
                        i += 2;
                        if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                            push_rtf_byte(&mut text, byte, hidden, &mut fallback_left);
                        }
                    }
                    b'\\' | b'{' | b'}' => {
                        push_rtf_byte(&mut text, symbol, hidden, &mut fallback_left)
                    }
                    b'~' => push_rtf_byte(&mut text, b' ', hidden, &mut fallback_left),
                    b'\n' | b'\r' if !hidden => text.push('\n'),
                    _ => {}
                }
            }
            b'\n' | b'\r' => {}
            _ => push_rtf_byte(&mut text, b, hidden, &mut fallback_left),
        }
        group_opened = false;
    }

    let paragraphs: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if paragraphs.is_empty() {
        return Err(ConverterError::Empty);
    }
    Ok(paragraphs.join("\n\n"))
}

fn push_rtf_byte(text: &mut String, byte: u8, hidden: bool, fallback_left: &mut usize) {
    if hidden {
        return;
    }
    if *fallback_left > 0 {
        *fallback_left -= 1;
        return;
    }
    if byte.is_ascii() {
        text.push(char::from(byte));
    } else {
        let buf = [byte];
        let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&buf);
        text.push_str(&decoded);
    }
}

/// Runs of readable UTF-16LE code units at even offsets, as `(offset, text)`.
fn utf16_runs(bytes: &[u8]) -> Vec<(usize, String)> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        match char::from_u32(u32::from(unit)).filter(|c| is_readable_wide(*c)) {
            Some(c) => {
                if current.is_empty() {
                    start = i * 2;
                }
                current.push(if c == '\r' || c == '\u{b}' { '\n' } else { c });
            }
            None => flush_run(&mut runs, &mut current, start),
        }
    }
    flush_run(&mut runs, &mut current, start);
    runs
}

fn ascii_runs(bytes: &[u8]) -> Vec<(usize, String)> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\t' || b == b'\n' || b == b'\r' || (0x20..0x7f).contains(&b) {
            if current.is_empty() {
                start = i;
            }
            current.push(if b == b'\r' { '\n' } else { b as char });
        } else {
            flush_run(&mut runs, &mut current, start);
        }
    }
    flush_run(&mut runs, &mut current, start);
    runs
}

fn flush_run(runs: &mut Vec<(usize, String)>, current: &mut String, start: usize) {
    let text = current.trim();
    if text.chars().count() >= MIN_RUN_CHARS && text.chars().any(char::is_alphabetic) {
        runs.push((start, text.to_string()));
    }
    current.clear();
}

/// Latin-script text plus common typographic punctuation.
///
/// Two adjacent ASCII bytes read as one UTF-16 unit land above U+2000, so
/// everything outside these ranges is rejected to keep single-byte text from
/// decoding as CJK noise.
fn is_readable_wide(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{b}')
        || ('\u{20}'..='\u{7e}').contains(&c)
        || ('\u{a0}'..='\u{24f}').contains(&c)
        || matches!(
            c,
            '\u{2013}' | '\u{2014}' | '\u{2018}' | '\u{2019}' | '\u{201c}' | '\u{201d}' | '\u{2022}' | '\u{2026}'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

    fn ole(parts: &[&[u8]]) -> Vec<u8> {
        let mut b = OLE_MAGIC.to_vec();
        b.resize(OLE_HEADER_LEN, 0);
        for p in parts {
            b.extend_from_slice(p);
            b.extend([0u8, 0, 0, 0]);
        }
        b
    }

    fn wide(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn extracts_wide_and_ascii_runs_in_order() {
        let bytes = ole(&[
            &wide("Root Entry")[..],
            &wide("Quarterly résumé")[..],
            &b"ascii tail"[..],
        ]);
        let md = doc_to_markdown(&bytes).unwrap();
        assert_eq!(md, "Quarterly résumé\n\nascii tail");
    }

    #[test]
    fn short_runs_and_duplicates_dropped() {
        let bytes = ole(&[&b"ab"[..], &wide("Slide text")[..], &wide("Slide text")[..]]);
        assert_eq!(ppt_to_markdown(&bytes).unwrap(), "Slide text");
    }

    #[test]
    fn nothing_readable_is_empty() {
        let bytes = ole(&[&[0x01u8, 0x02, 0x03][..]]);
        assert!(matches!(doc_to_markdown(&bytes), Err(ConverterError::Empty)));
    }

    #[test]
    fn rtf_doc_yields_paragraphs() {
        let rtf = br"{\rtf1\ansi{\fonttbl{\f0 Arial;}}{\*\generator Writer;}\f0 Caf\'e9 menu\par Second line with \{braces\}\par\u8364?5}";
        assert_eq!(
            doc_to_markdown(rtf).unwrap(),
            "Caf\u{e9} menu\n\nSecond line with {braces}\n\n\u{20ac}5"
        );
    }

    #[test]
    fn rtf_without_text_is_empty() {
        let rtf = br"{\rtf1{\fonttbl{\f0 Arial;}}}";
        assert!(matches!(doc_to_markdown(rtf), Err(ConverterError::Empty)));
    }

    #[test]
    fn non_ole_is_malformed() {
        assert!(matches!(
            doc_to_markdown(b"just some text"),
            Err(ConverterError::Malformed(_))
        ));
    }

    #[test]
    fn ascii_pairs_do_not_decode_as_wide() {
        assert!(utf16_runs(b"hello world, plain bytes").is_empty());
    }
}
