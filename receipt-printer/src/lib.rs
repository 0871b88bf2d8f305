//! # receipt-printer
//!
//! ESC/POS receipt printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - Windows-1252 encoding for Latin thermal printers
//! - Fixed-width text layout (word wrap, left/right alignment)
//! - Network printing over a persistent raw TCP session (port 9100)
//!
//! Business logic (WHAT to print) stays in application code:
//! - Order receipt rendering → order-agent
//!
//! ## Example
//!
//! ```ignore
//! use receipt_printer::{DeviceConnector, EscPosBuilder, NetworkPrinter};
//!
//! let mut builder = EscPosBuilder::new(48);
//! builder.center();
//! builder.double_size();
//! builder.line("ED - 12:30:00");
//! builder.reset_size();
//! builder.left();
//! builder.line_lr("2x Picanha", "24.00 EUR");
//! builder.cut();
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! let mut session = printer.open().await?;
//! session.send(&builder.build()).await?;
//! session.close().await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod layout;
mod printer;

// Re-exports
pub use encoding::{convert_to_cp1252, text_width};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use layout::{WordWrap, pad_align, wrap};
pub use printer::{DeviceConnector, DeviceSession, NetworkPrinter, NetworkSession};
