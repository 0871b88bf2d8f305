//! Audible alarm
//!
//! [`AlertSignaler`] runs a cancellable pulse loop as a tokio task. Only one
//! loop exists at a time: `start` stops and joins the previous one first.

use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Where alarm pulses go
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn pulse(&self) -> io::Result<()>;
}

/// Rings the terminal bell on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

#[async_trait]
impl AlertSink for TerminalBell {
    async fn pulse(&self) -> io::Result<()> {
        warn!("Alarm active, operator action required");
        let mut stderr = io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()
    }
}

struct ActiveAlert {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct AlertSignaler {
    sink: Arc<dyn AlertSink>,
    interval: Duration,
    active: Mutex<Option<ActiveAlert>>,
}

impl AlertSignaler {
    pub fn new(sink: Arc<dyn AlertSink>, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            active: Mutex::new(None),
        }
    }

    /// Start pulsing, replacing any running loop
    pub async fn start(&self) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            Self::shutdown(previous).await;
        }

        let stop = CancellationToken::new();
        let handle = tokio::spawn(pulse_loop(
            self.sink.clone(),
            self.interval,
            stop.clone(),
        ));
        *active = Some(ActiveAlert { stop, handle });
        debug!("Alarm started");
    }

    /// Stop pulsing and wait for the loop to end. No-op when idle.
    pub async fn stop(&self) {
        let previous = self.active.lock().await.take();
        if let Some(previous) = previous {
            Self::shutdown(previous).await;
            debug!("Alarm stopped");
        }
    }

    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|a| !a.handle.is_finished())
    }

    async fn shutdown(alert: ActiveAlert) {
        alert.stop.cancel();
        if let Err(e) = alert.handle.await {
            error!(error = %e, "Alarm task failed");
        }
    }
}

async fn pulse_loop(sink: Arc<dyn AlertSink>, interval: Duration, stop: CancellationToken) {
    while !stop.is_cancelled() {
        if let Err(e) = sink.pulse().await {
            error!(error = %e, "Alarm output failed, giving up");
            break;
        }
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
