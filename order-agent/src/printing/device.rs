//! Printer session lifecycle
//!
//! [`DeviceConnectionManager`] is the only owner of the printer session.
//! Any detected failure clears it so the next use reconnects.

use receipt_printer::{DeviceConnector, DeviceSession};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct DeviceConnectionManager {
    connector: Arc<dyn DeviceConnector>,
    session: Option<Box<dyn DeviceSession>>,
}

impl DeviceConnectionManager {
    pub fn new(connector: Arc<dyn DeviceConnector>) -> Self {
        Self {
            connector,
            session: None,
        }
    }

    /// Validate the live session or open a new one
    pub async fn ensure_connected(&mut self) -> bool {
        if let Some(session) = self.session.as_mut() {
            if session.is_online().await {
                return true;
            }
            warn!("Printer liveness check failed, reconnecting");
            self.session = None;
        }

        match self.connector.open().await {
            Ok(mut session) => {
                if session.is_online().await {
                    info!("Printer session established");
                    self.session = Some(session);
                    true
                } else {
                    warn!("Printer connected but not online");
                    if let Err(e) = session.close().await {
                        debug!(error = %e, "Closing offline session failed");
                    }
                    false
                }
            }
            Err(e) => {
                warn!(error = %e, "Printer connection failed");
                false
            }
        }
    }

    /// Live session, if any
    pub fn session_mut(&mut self) -> Option<&mut dyn DeviceSession> {
        match self.session.as_mut() {
            Some(session) => Some(session.as_mut()),
            None => None,
        }
    }

    /// Forget the session without closing it (it already failed)
    pub fn drop_session(&mut self) {
        if self.session.take().is_some() {
            debug!("Printer session dropped");
        }
    }

    /// Close the session, best effort
    pub async fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            match session.close().await {
                Ok(()) => info!("Printer session released"),
                Err(e) => warn!(error = %e, "Error while releasing printer session"),
            }
        }
    }
}
