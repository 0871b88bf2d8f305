//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data.

use crate::encoding::convert_to_cp1252;
use crate::layout::{pad_align, wrap};

/// ESC/POS command builder
///
/// Builds ESC/POS byte sequences for thermal printers.
/// Text is kept as UTF-8 until [`build`](Self::build) converts it to WPC1252.
#[derive(Debug)]
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(2048);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[0x1B, 0x40]);
        Self { buf, width }
    }

    // === Text Output ===

    /// Write raw text
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Write text word-wrapped to the paper width
    pub fn wrapped(&mut self, s: &str) -> &mut Self {
        let wrapped = wrap(s, self.width);
        self.text(&wrapped)
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    /// Print buffer and feed n lines
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        // ESC d n
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    // === Alignment ===

    /// Align text to center
    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    /// Align text to left (default)
    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    // === Text Style ===

    /// Enable bold text
    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x11]);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    // === Separator ===

    /// Print a line of '-' characters
    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line
    ///
    /// Right text is right-aligned; when both don't fit it goes to the
    /// next line, still right-aligned.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let line = pad_align(left, right, self.width);
        self.line(&line)
    }

    // === Paper Control ===

    /// Cut paper (full cut)
    pub fn cut(&mut self) -> &mut Self {
        // GS V 0
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x00]);
        self
    }

    // === Build ===

    /// Build the final byte buffer with WPC1252 encoding
    ///
    /// This converts all UTF-8 text to Windows-1252 while preserving
    /// ESC/POS commands.
    pub fn build(self) -> Vec<u8> {
        convert_to_cp1252(&self.buf)
    }

    /// Build without conversion (for inspection or ASCII-only content)
    pub fn build_raw(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let mut b = EscPosBuilder::new(32);
        b.center()
            .double_size()
            .line("Pedido n.12")
            .reset_size()
            .left()
            .line("Conteúdo");

        let data = b.build_raw();
        assert_eq!(&data[..2], &[0x1B, 0x40]);
        let s = String::from_utf8_lossy(&data);
        assert!(s.contains("Pedido n.12\n"));
        assert!(s.contains("Conteúdo\n"));
    }

    #[test]
    fn test_line_lr() {
        let mut b = EscPosBuilder::new(20);
        b.line_lr("1x Sopa", "2.00 EUR");

        let data = b.build_raw();
        let s = String::from_utf8_lossy(&data);
        assert!(s.contains("1x Sopa     2.00 EUR\n"));
    }

    #[test]
    fn test_wrapped() {
        let mut b = EscPosBuilder::new(10);
        b.wrapped("Morada: Rua das Flores 12");

        let data = b.build_raw();
        let s = String::from_utf8_lossy(&data[2..]);
        assert_eq!(s, "Morada:\nRua das\nFlores 12\n");
    }

    #[test]
    fn test_separator_spans_width() {
        let mut b = EscPosBuilder::new(10);
        b.sep_single();

        let data = b.build_raw();
        let s = String::from_utf8_lossy(&data[2..]);
        assert_eq!(s, "----------\n");
    }

    #[test]
    fn test_build_encodes_text() {
        let mut b = EscPosBuilder::new(10);
        b.line("Tel.: ção").cut();

        let data = b.build();
        assert!(data.windows(2).any(|w| w == [0xE7, 0xE3]));
        assert!(data.ends_with(&[0x1D, 0x56, 0x00]));
    }
}
