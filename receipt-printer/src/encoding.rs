//! Windows-1252 encoding utilities for Latin thermal printers
//!
//! Portuguese receipts need accented letters and the euro sign, which the
//! printer renders from code page 16 (WPC1252). This module provides:
//! - Character widths for fixed-width layout
//! - Converting UTF-8 to Windows-1252 while preserving ESC/POS commands

use tracing::instrument;

/// ESC t 16 - select character code table WPC1252
pub(crate) const SELECT_WPC1252: [u8; 3] = [0x1B, 0x74, 16];

/// Printed width of a string in character cells
///
/// Every Windows-1252 glyph occupies exactly one cell, so this is the
/// number of Unicode scalar values, not the UTF-8 byte length.
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Convert mixed UTF-8 content (with ESC/POS commands) to Windows-1252
///
/// ASCII bytes (0x00-0x7F) are kept exactly as is, which protects ESC/POS
/// commands from being corrupted. Only runs of bytes >= 0x80 are treated as
/// UTF-8 sequences and transcoded.
///
/// The code page is selected at the start and again after every INIT
/// command (ESC @), which resets it.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn convert_to_cp1252(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() + SELECT_WPC1252.len());
    result.extend_from_slice(&SELECT_WPC1252);

    let mut buffer = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == 0x1B && bytes.get(i + 1) == Some(&0x40) {
            flush_buffer(&mut buffer, &mut result);
            result.extend_from_slice(&[0x1B, 0x40]);
            result.extend_from_slice(&SELECT_WPC1252);
            i += 2;
            continue;
        }

        if b < 128 {
            flush_buffer(&mut buffer, &mut result);
            result.push(b);
        } else {
            buffer.push(b);
        }
        i += 1;
    }

    flush_buffer(&mut buffer, &mut result);
    result
}

/// Flush the non-ASCII buffer, converting UTF-8 to Windows-1252
fn flush_buffer(buffer: &mut Vec<u8>, result: &mut Vec<u8>) {
    if buffer.is_empty() {
        return;
    }

    let s = String::from_utf8_lossy(buffer);
    let (encoded, _, unmappable) = encoding_rs::WINDOWS_1252.encode(&s);
    if unmappable {
        tracing::debug!(text = %s, "Characters outside WPC1252 replaced");
    }
    result.extend_from_slice(&encoded);
    buffer.clear();
}
