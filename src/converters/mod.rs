//! Built-in converters, one module per document family.
//!
//! Every converter has the same shape, `fn(&[u8]) -> Result<String,
//! ConverterError>`, so it can be registered directly in a
//! [`crate::ConverterRegistry`]. Converters never see keys or formats;
//! the dispatcher attaches those when reporting failures.
//!
//! | Module | Formats | Backend |
//! |--------|---------|---------|
//! | [`pdf`] | `pdf` | `pdf-extract` |
//! | [`docx`] | `docx` | `zip` + OOXML scan |
//! | [`pptx`] | `pptx` | `zip` + OOXML scan |
//! | [`spreadsheet`] | `xlsx`, `xls` | `calamine` |
//! | [`legacy`] | `doc`, `ppt` | OLE2 text-run scan |
//! | [`html`] | `html`, `htm` | `html2md` |
//! | [`notebook`] | `ipynb` | `serde_json` |
//! | [`text`] | `txt`, `md`, fallback | `encoding_rs` |

pub mod docx;
pub mod html;
pub mod legacy;
pub mod notebook;
pub mod pdf;
pub mod pptx;
pub mod spreadsheet;
pub mod text;

mod ooxml;

/// Render rows as a GitHub-flavoured Markdown table, first row as header.
///
/// Short rows are padded to the widest row. Pipes are escaped and line
/// breaks inside a cell collapse to spaces so every row stays on one line.
/// Returns an empty string when there are no rows.
pub(crate) fn render_table(rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let render_row = |row: &[String]| -> String {
        let mut line = String::from("|");
        for i in 0..width {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            line.push(' ');
            line.push_str(&escape_cell(cell));
            line.push_str(" |");
        }
        line
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(&rows[0]));
    lines.push(format!("|{}", " --- |".repeat(width)));
    for row in &rows[1..] {
        lines.push(render_row(row));
    }
    lines.join("\n")
}

fn escape_cell(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
