//! Jupyter notebooks (`.ipynb`) → Markdown.
//!
//! Markdown and raw cells pass through verbatim; code cells are fenced with
//! the kernel language. Text outputs (`stream`, `text/plain` results and
//! error summaries) follow their cell as fenced `text` blocks when
//! [`NotebookOptions::include_outputs`] is set.

use super::text::decode_text;
use crate::error::ConverterError;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_LANGUAGE: &str = "python";

/// Rendering options for [`notebook_to_markdown_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotebookOptions {
    /// Append cell outputs after each code cell. Default: true.
    pub include_outputs: bool,
}

impl Default for NotebookOptions {
    fn default() -> Self {
        Self {
            include_outputs: true,
        }
    }
}

// ── nbformat (v4) subset ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Notebook {
    cells: Vec<Cell>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    language_info: Option<LanguageInfo>,
    kernelspec: Option<KernelSpec>,
}

#[derive(Debug, Deserialize)]
struct LanguageInfo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KernelSpec {
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: MultilineText,
    #[serde(default)]
    outputs: Vec<Output>,
}

#[derive(Debug, Deserialize)]
struct Output {
    output_type: String,
    #[serde(default)]
    text: Option<MultilineText>,
    #[serde(default)]
    data: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    ename: Option<String>,
    #[serde(default)]
    evalue: Option<String>,
}

/// nbformat stores text either as one string or as a list of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MultilineText {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::Single(String::new())
    }
}

impl MultilineText {
    fn joined(&self) -> String {
        match self {
            MultilineText::Single(s) => s.clone(),
            MultilineText::Lines(lines) => lines.concat(),
        }
    }
}

pub fn notebook_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    notebook_to_markdown_with(bytes, &NotebookOptions::default())
}

pub fn notebook_to_markdown_with(
    bytes: &[u8],
    options: &NotebookOptions,
) -> Result<String, ConverterError> {
    let json = decode_text(bytes);
    let nb: Notebook = serde_json::from_str(&json)
        .map_err(|e| ConverterError::Malformed(format!("invalid notebook JSON: {e}")))?;

    let language = nb
        .metadata
        .language_info
        .and_then(|l| l.name)
        .or_else(|| nb.metadata.kernelspec.and_then(|k| k.language))
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let mut blocks = Vec::new();
    for cell in &nb.cells {
        let source = cell.source.joined();
        let source = source.trim_end();
        match cell.cell_type.as_str() {
            "code" => {
                if !source.trim().is_empty() {
                    blocks.push(fenced(&language, source));
                }
                if options.include_outputs {
                    blocks.extend(
                        cell.outputs
                            .iter()
                            .filter_map(output_text)
                            .map(|t| fenced("text", t.trim_end())),
                    );
                }
            }
            _ => {
                if !source.trim().is_empty() {
                    blocks.push(source.to_string());
                }
            }
        }
    }

    if blocks.is_empty() {
        return Err(ConverterError::Empty);
    }
    Ok(blocks.join("\n\n"))
}

fn output_text(output: &Output) -> Option<String> {
    let text = match output.output_type.as_str() {
        "stream" => output.text.as_ref()?.joined(),
        "execute_result" | "display_data" => {
            let plain = output.data.as_ref()?.get("text/plain")?;
            serde_json::from_value::<MultilineText>(plain.clone())
                .ok()?
                .joined()
        }
        "error" => format!(
            "{}: {}",
            output.ename.as_deref().unwrap_or("Error"),
            output.evalue.as_deref().unwrap_or("")
        ),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

/// Fence `body`, lengthening the fence if the body itself contains one.
fn fenced(info: &str, body: &str) -> String {
    let mut fence = String::from("```");
    while body.contains(fence.as_str()) {
        fence.push('`');
    }
    format!("{fence}{info}\n{body}\n{fence}")
}
