//! Order Agent - unattended receipt printing for online orders
//!
//! Polls the backend for unprinted orders, prints each on an ESC/POS
//! network printer and acknowledges it. Any failure that could drop an
//! order stops the cycle and sounds an alarm until an operator acts.
//!
//! # Module structure
//!
//! ```text
//! order-agent/src/
//! ├── core/          # config, error taxonomy
//! ├── models/        # order transfer objects and domain values
//! ├── services/      # reachability, authentication, order gateway
//! ├── printing/      # printer session, receipt renderer
//! ├── agent/         # orchestrator, cycle worker, alarm, status
//! ├── utils/         # logging
//! └── shell.rs       # console commands
//! ```

pub mod agent;
pub mod core;
pub mod models;
pub mod printing;
pub mod services;
pub mod shell;
pub mod utils;

pub use agent::{Orchestrator, Services, StatusSnapshot, TerminalBell};
pub use crate::core::{AgentError, Config, ConfigError};
pub use utils::logger::{cleanup_old_logs, init_logger};

use receipt_printer::NetworkPrinter;
use std::sync::Arc;

/// Production collaborators built from the configuration
pub fn production_services(config: &Config) -> anyhow::Result<Services> {
    let auth = services::AuthClient::new(
        config.auth_url.clone(),
        config.max_attempts,
        config.retry_delay,
        config.request_timeout,
    )?;
    let gateway = services::HttpOrderGateway::new(
        config.orders_url.clone(),
        config.update_order_url.clone(),
        config.request_timeout,
    )?;

    let printer = NetworkPrinter::new(&config.printer_host, config.printer_port)?;

    Ok(Services {
        reachability: Arc::new(services::HttpHealthChecker::new()?),
        authenticator: Arc::new(auth),
        gateway: Arc::new(gateway),
        printer: Arc::new(printer),
        alert: Arc::new(TerminalBell),
    })
}
