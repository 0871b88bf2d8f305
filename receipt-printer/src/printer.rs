//! Printer adapters for sending ESC/POS data
//!
//! A [`DeviceConnector`] opens a [`DeviceSession`]: one long-lived
//! connection that is validated, written to, and closed explicitly.
//! [`NetworkPrinter`] implements this for raw TCP printers (port 9100).

use crate::encoding::SELECT_WPC1252;
use crate::error::{PrintError, PrintResult};
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};
use tracing::{debug, info, instrument, warn};

/// DLE EOT 1 - real-time printer status request
const STATUS_REQUEST: [u8; 3] = [0x10, 0x04, 0x01];

/// Status byte bit set while the printer is offline
const STATUS_OFFLINE: u8 = 0x08;

/// An open session to a receipt printer
#[async_trait]
pub trait DeviceSession: Send {
    /// Check that the printer still answers and reports itself online
    async fn is_online(&mut self) -> bool;

    /// Send raw ESC/POS data
    async fn send(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Close the session
    async fn close(&mut self) -> PrintResult<()>;
}

/// Opens printer sessions
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Connect and select the text code page
    async fn open(&self) -> PrintResult<Box<dyn DeviceSession>>;
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100. The host
/// may be an IP address or a name; names are resolved on every connect.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(PrintError::InvalidConfig(format!(
                "Invalid printer host: {:?}",
                host
            )));
        }
        if port == 0 {
            return Err(PrintError::InvalidConfig("Printer port must not be 0".into()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connect / status timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the host and connect to the first address that answers
    async fn connect(&self) -> PrintResult<TcpStream> {
        let addrs = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| PrintError::Connection(format!("{}: cannot resolve: {}", self, e)))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(%addr, error = %e, "Connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(PrintError::Connection(match last_error {
            Some(e) => format!("{}: {}", self, e),
            None => format!("{}: no address found", self),
        }))
    }
}

impl fmt::Display for NetworkPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl DeviceConnector for NetworkPrinter {
    #[instrument(skip(self), fields(printer = %self))]
    async fn open(&self) -> PrintResult<Box<dyn DeviceSession>> {
        info!("Connecting to printer");

        let mut stream = tokio::time::timeout(self.timeout, self.connect())
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self)))??;

        let addr = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        stream.write_all(&SELECT_WPC1252).await?;
        stream.flush().await?;

        debug!(%addr, "Connected, code page selected");
        Ok(Box::new(NetworkSession {
            stream: Some(stream),
            addr,
            timeout: self.timeout,
        }))
    }
}

/// Open TCP session to a network printer
#[derive(Debug)]
pub struct NetworkSession {
    stream: Option<TcpStream>,
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkSession {
    /// Ask the printer for its status byte
    async fn query_status(&mut self) -> PrintResult<u8> {
        let stream = self.stream.as_mut().ok_or(PrintError::Closed)?;
        stream.write_all(&STATUS_REQUEST).await?;
        stream.flush().await?;

        let mut status = [0u8; 1];
        tokio::time::timeout(self.timeout, stream.read_exact(&mut status))
            .await
            .map_err(|_| PrintError::Timeout(format!("Status timeout: {}", self.addr)))??;

        if status[0] & STATUS_OFFLINE != 0 {
            return Err(PrintError::Offline(format!(
                "{} (status {:#04x})",
                self.addr, status[0]
            )));
        }
        Ok(status[0])
    }
}

#[async_trait]
impl DeviceSession for NetworkSession {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn is_online(&mut self) -> bool {
        match self.query_status().await {
            Ok(status) => {
                debug!(status, "Printer online");
                true
            }
            Err(e) => {
                warn!(error = %e, "Printer offline");
                false
            }
        }
    }

    #[instrument(skip(self, data), fields(addr = %self.addr, data_len = data.len()))]
    async fn send(&mut self, data: &[u8]) -> PrintResult<()> {
        let stream = self.stream.as_mut().ok_or(PrintError::Closed)?;

        stream.write_all(data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;
        stream.flush().await?;

        info!("Print job sent successfully");
        Ok(())
    }

    async fn close(&mut self) -> PrintResult<()> {
        match self.stream.take() {
            Some(mut stream) => {
                debug!(addr = %self.addr, "Closing printer session");
                stream.shutdown().await?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}
