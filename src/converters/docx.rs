//! Word (`.docx`) → Markdown.
//!
//! The main story lives in `word/document.xml`. We walk its tag stream once,
//! tracking a stack of open paragraphs and a stack of open tables:
//!
//! * `<w:p>` → a paragraph; `<w:pStyle w:val="Heading2">` makes it `## …`,
//!   `Title` makes it `# …`, `<w:numPr>` makes it a `- ` list item
//! * `<w:t>` → text; `<w:tab/>` → tab; `<w:br/>` / `<w:cr/>` → line break
//! * `<w:tbl>` / `<w:tr>` / `<w:tc>` → a GFM table (nested tables are
//!   flattened into the enclosing cell)
//! * text boxes (`w:txbxContent`) → folded inline into the paragraph that
//!   anchors them; `mc:Fallback` copies are skipped

use super::ooxml::{self, Tag};
use super::render_table;
use crate::error::ConverterError;

const DOCUMENT_PART: &str = "word/document.xml";

pub fn docx_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    let mut archive = ooxml::open_archive(bytes)?;
    let xml = ooxml::read_part(&mut archive, DOCUMENT_PART)?;
    let blocks = parse_document(&xml);
    Ok(render_blocks(&blocks))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Heading(usize, String),
    ListItem(String),
    Paragraph(String),
    Table(String),
}

#[derive(Debug, Default)]
struct Paragraph {
    heading: Option<usize>,
    list: bool,
    text: String,
    /// Tables open when the paragraph started.
    tables_open: usize,
}

impl Paragraph {
    fn absorb(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl Table {
    fn append_to_cell(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.cell.is_empty() {
            self.cell.push(' ');
        }
        self.cell.push_str(text);
    }
}

fn parse_document(xml: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut tables: Vec<Table> = Vec::new();
    // Text boxes nest whole paragraphs inside a run of the outer one.
    let mut paras: Vec<Paragraph> = Vec::new();
    let mut text_start: Option<usize> = None;
    let mut fallback_depth = 0usize;

    for tag in ooxml::tags(xml) {
        if let Some(start) = text_start {
            if tag.closes("w:t") {
                if let Some(p) = paras.last_mut() {
                    p.text.push_str(&ooxml::unescape_xml(&xml[start..tag.start]));
                }
                text_start = None;
            }
            continue;
        }

        // `mc:Fallback` repeats the `mc:Choice` content for older readers.
        if tag.name == "mc:Fallback" && !tag.self_closing {
            if tag.closing {
                fallback_depth = fallback_depth.saturating_sub(1);
            } else {
                fallback_depth += 1;
            }
            continue;
        }
        if fallback_depth > 0 {
            continue;
        }

        match tag.name {
            "w:p" if tag.closing => {
                if let Some(p) = paras.pop() {
                    close_paragraph(p, &mut paras, &mut blocks, &mut tables);
                }
            }
            "w:p" => {
                if tag.self_closing {
                    continue;
                }
                paras.push(Paragraph {
                    tables_open: tables.len(),
                    ..Paragraph::default()
                });
            }
            "w:t" if !tag.closing && !tag.self_closing => text_start = Some(tag.end),
            "w:tab" if !tag.closing => push_text(&mut paras, "\t"),
            "w:br" | "w:cr" if !tag.closing => push_text(&mut paras, "\n"),
            "w:pStyle" if !tag.closing => {
                if let Some(p) = paras.last_mut() {
                    p.heading = tag.attr("w:val").as_deref().and_then(heading_level);
                }
            }
            "w:numPr" if !tag.closing => {
                if let Some(p) = paras.last_mut() {
                    p.list = true;
                }
            }
            "w:tbl" => table_event(&tag, &mut tables, &mut blocks),
            "w:tr" if tag.closing => {
                if let Some(t) = tables.last_mut() {
                    let row = std::mem::take(&mut t.row);
                    t.rows.push(row);
                }
            }
            "w:tc" if tag.closing => {
                if let Some(t) = tables.last_mut() {
                    let cell = std::mem::take(&mut t.cell);
                    t.row.push(cell);
                }
            }
            _ => {}
        }
    }

    // Truncated XML: keep whatever was open.
    while let Some(p) = paras.pop() {
        close_paragraph(p, &mut paras, &mut blocks, &mut tables);
    }
    while let Some(t) = tables.pop() {
        close_table(t, &mut blocks, &mut tables);
    }
    blocks
}

/// A paragraph nested in another (text box content) folds into its parent
/// unless a table opened in between owns it.
fn close_paragraph(
    p: Paragraph,
    open: &mut [Paragraph],
    blocks: &mut Vec<Block>,
    tables: &mut [Table],
) {
    match open.last_mut() {
        Some(parent) if tables.len() <= parent.tables_open => parent.absorb(p.text.trim()),
        _ => finish_paragraph(p, blocks, tables),
    }
}

fn push_text(paras: &mut [Paragraph], s: &str) {
    if let Some(p) = paras.last_mut() {
        p.text.push_str(s);
    }
}

fn table_event(tag: &Tag<'_>, tables: &mut Vec<Table>, blocks: &mut Vec<Block>) {
    if tag.closing {
        if let Some(t) = tables.pop() {
            close_table(t, blocks, tables);
        }
    } else if !tag.self_closing {
        tables.push(Table::default());
    }
}

fn close_table(mut table: Table, blocks: &mut Vec<Block>, outer: &mut [Table]) {
    if !table.row.is_empty() || !table.cell.is_empty() {
        let cell = std::mem::take(&mut table.cell);
        if !cell.is_empty() {
            table.row.push(cell);
        }
        let row = std::mem::take(&mut table.row);
        table.rows.push(row);
    }
    match outer.last_mut() {
        Some(parent) => {
            let flat: Vec<String> = table.rows.iter().map(|r| r.join(" ")).collect();
            parent.append_to_cell(flat.join(" ").trim());
        }
        None => {
            let rendered = render_table(&table.rows);
            if !rendered.is_empty() {
                blocks.push(Block::Table(rendered));
            }
        }
    }
}

fn finish_paragraph(p: Paragraph, blocks: &mut Vec<Block>, tables: &mut [Table]) {
    if let Some(t) = tables.last_mut() {
        t.append_to_cell(p.text.trim());
        return;
    }
    let text = p.text.trim();
    if text.is_empty() {
        return;
    }
    let block = match (p.heading, p.list) {
        (Some(level), _) => Block::Heading(level, text.replace('\n', " ")),
        (None, true) => Block::ListItem(text.replace('\n', " ")),
        (None, false) => Block::Paragraph(text.to_string()),
    };
    blocks.push(block);
}

/// Map a paragraph style id to a Markdown heading level.
///
/// Style ids are locale-dependent in the wild; the built-in English ids
/// (`Title`, `Heading1`…`Heading9`, also `heading 1`) are recognised.
fn heading_level(style: &str) -> Option<usize> {
    let s: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if s == "title" {
        return Some(1);
    }
    let n: usize = s.strip_prefix("heading")?.parse().ok()?;
    (n >= 1).then(|| n.min(6))
}

fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut prev_list = false;
    for block in blocks {
        let is_list = matches!(block, Block::ListItem(_));
        if !out.is_empty() {
            out.push_str(if is_list && prev_list { "\n" } else { "\n\n" });
        }
        match block {
            Block::Heading(level, text) => {
                out.push_str(&"#".repeat(*level));
                out.push(' ');
                out.push_str(text);
            }
            Block::ListItem(text) => {
                out.push_str("- ");
                out.push_str(text);
            }
            Block::Paragraph(text) | Block::Table(text) => out.push_str(text),
        }
        prev_list = is_list;
    }
    out
}
