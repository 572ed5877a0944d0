//! Plain text and Markdown, and the default fallback converter.

use crate::error::ConverterError;
use encoding_rs::{Encoding, WINDOWS_1252};

/// Decode bytes as text and return them unchanged.
///
/// Never fails: anything that is not valid UTF-8 is read as Windows-1252,
/// which maps every byte to some character.
pub fn text_to_markdown(bytes: &[u8]) -> Result<String, ConverterError> {
    Ok(decode_text(bytes))
}

/// Best-effort text decoding.
///
/// 1. A byte-order mark selects UTF-8, UTF-16LE or UTF-16BE (BOM stripped).
/// 2. Otherwise valid UTF-8 is taken as-is.
/// 3. Otherwise Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}
