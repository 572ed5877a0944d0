//! Excel workbooks (`.xlsx`, `.xls`) → Markdown via `calamine`.
//!
//! One `## <sheet name>` section per worksheet in workbook order; non-empty
//! sheets get a GFM table with the first row as header.

use super::render_table;
use crate::error::ConverterError;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

pub fn spreadsheet_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ConverterError::Malformed(e.to_string()))?;

    let mut sections = Vec::new();
    let mut any_cells = false;
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ConverterError::Malformed(format!("sheet '{name}': {e}")))?;
        let table = render_table(&range_rows(&range));
        any_cells |= !table.is_empty();
        if table.is_empty() {
            sections.push(format!("## {name}"));
        } else {
            sections.push(format!("## {name}\n\n{table}"));
        }
    }

    if !any_cells {
        return Err(ConverterError::Empty);
    }
    Ok(sections.join("\n\n"))
}

/// Cell text by row, with trailing all-blank rows dropped.
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    if range.is_empty() {
        return Vec::new();
    }
    let mut rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    while rows
        .last()
        .is_some_and(|r: &Vec<String>| r.iter().all(|c| c.trim().is_empty()))
    {
        rows.pop();
    }
    rows
}
