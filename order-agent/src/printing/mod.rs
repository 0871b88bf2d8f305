//! Receipt printing
//!
//! - `device`: the single printer session and its reconnection
//! - `renderer`: order → receipt layout, and sending it

pub mod device;
pub mod renderer;

pub use device::DeviceConnectionManager;
pub use renderer::ReceiptRenderer;
