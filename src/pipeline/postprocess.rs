//! Post-processing: deterministic cleanup of converter-generated Markdown.
//!
//! Every converter produces "roughly Markdown": PDF text extraction leaves
//! CRLFs and trailing spaces, Word documents carry zero-width characters and
//! soft hyphens, HTML conversion emits long runs of blank lines. The
//! dispatcher runs this single pass over whatever a converter returned.
//!
//! ## Rules
//!
//! 1. CRLF / CR → LF
//! 2. strip invisible characters (zero-width space/joiners, BOM, soft hyphen,
//!    word joiner)
//! 3. trim trailing whitespace per line
//! 4. at most two consecutive blank lines
//! 5. exactly one blank line before an ATX heading
//! 6. insert the missing `| --- |` row under a header-less GFM table
//! 7. exactly one trailing newline
//!
//! Rules 5 and 6 skip fenced code blocks, so `#` comments in notebook code
//! cells stay where they are. A fence closes only on a run of the same
//! character at least as long as the opening one, with nothing after it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker appended by [`truncate_text`] when it cuts text short.
pub const TRUNCATION_MARKER: &str = "…";

const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}',
];

const MAX_BLANK_RUN: usize = 2;

static RE_ATX_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}(\s|$)").unwrap());

/// An open code fence: its character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn parse(trimmed: &str) -> Option<Fence> {
        let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = trimmed.chars().take_while(|&c| c == marker).count();
        (len >= 3).then_some(Fence { marker, len })
    }

    fn is_closed_by(self, trimmed: &str) -> bool {
        let run = trimmed.chars().take_while(|&c| c == self.marker).count();
        run >= self.len && trimmed[run..].trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Fence,
    Code,
    Heading,
    TableSeparator,
    TableRow,
    Text,
}

/// Apply every cleanup rule to converter output.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::clean_markdown;
///
/// let md = clean_markdown("Intro  \r\n## Usage\r\n\r\n\r\n\r\n\r\nRun it.");
/// assert_eq!(md, "Intro\n\n## Usage\n\n\nRun it.\n");
/// ```
pub fn clean_markdown(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = unified.lines().map(scrub_line).collect();

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 8);
    let mut fence: Option<Fence> = None;

    for (i, line) in lines.iter().enumerate() {
        let kind = classify(line, fence);
        match kind {
            LineKind::Fence => {
                fence = match fence {
                    Some(_) => None,
                    None => Fence::parse(line.trim()),
                }
            }
            LineKind::Blank if trailing_blank_lines(&out) >= MAX_BLANK_RUN => continue,
            LineKind::Heading => {
                while out.last().is_some_and(|l| l.is_empty()) {
                    out.pop();
                }
                if !out.is_empty() {
                    out.push(String::new());
                }
            }
            _ => {}
        }
        out.push(line.clone());

        if kind == LineKind::TableRow && opens_headerless_table(&lines, i) {
            let columns = line.trim().trim_matches('|').split('|').count().max(1);
            out.push(format!("|{}", " --- |".repeat(columns)));
        }
    }

    let body = out.join("\n");
    let body = body.trim_end();
    if body.is_empty() {
        "\n".to_string()
    } else {
        format!("{body}\n")
    }
}

/// Cut `text` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was removed.
///
/// Counts `char`s, not bytes, so multi-byte text is never split mid-character.
/// The marker is included in the budget.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    format!("{}{}", text[..cut].trim_end(), TRUNCATION_MARKER)
}

fn scrub_line(line: &str) -> String {
    let visible: String = line.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    visible.trim_end().to_string()
}

fn classify(line: &str, fence: Option<Fence>) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if let Some(open) = fence {
        if open.is_closed_by(trimmed) {
            LineKind::Fence
        } else {
            LineKind::Code
        }
    } else if Fence::parse(trimmed).is_some() {
        LineKind::Fence
    } else if RE_ATX_HEADING.is_match(line) {
        LineKind::Heading
    } else if is_separator_row(trimmed) {
        LineKind::TableSeparator
    } else if is_table_row(trimmed) {
        LineKind::TableRow
    } else {
        LineKind::Text
    }
}

fn trailing_blank_lines(out: &[String]) -> usize {
    out.iter().rev().take_while(|l| l.is_empty()).count()
}

/// Row `i` starts a table (nothing table-like above it) and the row below is
/// data rather than a separator.
fn opens_headerless_table(lines: &[String], i: usize) -> bool {
    let above_is_row = i > 0 && is_table_row(lines[i - 1].trim());
    let below = lines.get(i + 1).map(|l| l.trim()).unwrap_or("");
    !above_is_row && is_table_row(below) && !is_separator_row(below)
}

fn is_table_row(trimmed: &str) -> bool {
    trimmed.len() > 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

fn is_separator_row(trimmed: &str) -> bool {
    trimmed.starts_with('|')
        && trimmed.contains('-')
        && trimmed.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}
