//! Configuration and error taxonomy

pub mod config;
pub mod error;

pub use config::{Config, ConfigError, Credentials};
pub use error::{AgentError, ErrorKind, ProbeTarget};
