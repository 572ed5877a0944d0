//! HTML → Markdown via `html2md`.

use super::text::decode_text;
use crate::error::ConverterError;

pub fn html_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    let html = decode_text(bytes);
    Ok(html2md::parse_html(&html).trim().to_string())
}
