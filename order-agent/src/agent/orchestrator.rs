//! Run-state machine
//!
//! States are STOPPED, RUNNING and RUNNING with the alarm overlay. Control
//! transitions are serialized by one async lock; the readable status lives
//! in [`SharedStatus`].

use parking_lot::Mutex;
use receipt_printer::DeviceConnector;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::alert::{AlertSignaler, AlertSink};
use super::cycle::Worker;
use super::status::{SharedStatus, StatusSnapshot};
use crate::core::{AgentError, Config};
use crate::printing::ReceiptRenderer;
use crate::services::{Authenticate, OrderGateway, Reachability};

/// Collaborators used by the cycle
#[derive(Clone)]
pub struct Services {
    pub reachability: Arc<dyn Reachability>,
    pub authenticator: Arc<dyn Authenticate>,
    pub gateway: Arc<dyn OrderGateway>,
    pub printer: Arc<dyn DeviceConnector>,
    pub alert: Arc<dyn AlertSink>,
}

pub(super) struct Inner {
    pub(super) config: Config,
    pub(super) services: Services,
    pub(super) renderer: ReceiptRenderer,
    pub(super) status: SharedStatus,
    alarm: AlertSignaler,
    /// Stop signal of the current worker; replaced on every start
    stop_signal: Mutex<CancellationToken>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the agent; clones share the same state
#[derive(Clone)]
pub struct Orchestrator {
    pub(super) inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(config: Config, services: Services) -> Self {
        let renderer = ReceiptRenderer::new(config.line_width, config.receipt_title.clone());
        let alarm = AlertSignaler::new(services.alert.clone(), config.alert_interval);
        Self {
            inner: Arc::new(Inner {
                config,
                services,
                renderer,
                status: SharedStatus::new(),
                alarm,
                stop_signal: Mutex::new(CancellationToken::new()),
                worker: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Spawn the cycle worker unless one is already live
    pub async fn start(&self) {
        let mut worker = self.inner.worker.lock().await;

        if let Some(handle) = worker.take() {
            if !handle.is_finished() {
                if !self.inner.stop_signal.lock().is_cancelled() {
                    debug!("Worker already running");
                    *worker = Some(handle);
                    return;
                }
                // Escalated worker still winding down
                self.join_worker(handle).await;
            }
        }

        let stop = CancellationToken::new();
        *self.inner.stop_signal.lock() = stop.clone();

        self.silence_alarm().await;
        let generation = self.inner.status.mark_started();

        *worker = Some(tokio::spawn(Worker::new(self.clone(), stop, generation).run()));
        info!(generation, "Agent started");
    }

    /// Signal the worker, wait for it (bounded) and park in STOPPED
    pub async fn stop(&self) {
        let mut worker = self.inner.worker.lock().await;

        self.inner.stop_signal.lock().cancel();
        if let Some(handle) = worker.take() {
            self.join_worker(handle).await;
        }

        self.silence_alarm().await;
        self.inner.status.mark_stopped();
        info!("Agent stopped");
    }

    pub async fn restart(&self) {
        info!("Restarting agent");
        self.stop().await;
        self.start().await;
    }

    pub fn status(&self) -> StatusSnapshot {
        self.inner.status.snapshot()
    }

    pub async fn silence_alarm(&self) {
        self.inner.alarm.stop().await;
        self.inner.status.set_alarm(false);
    }

    pub async fn alarm_active(&self) -> bool {
        self.inner.alarm.is_active().await
    }

    /// Escalate a cycle failure to the operator
    ///
    /// Stops the failing worker through its own `stop` token. When that
    /// worker still owns the current generation, the operator message is
    /// recorded and the alarm raised; a worker detached by an earlier stop
    /// only logs.
    pub(super) async fn error(&self, err: AgentError, generation: u64, stop: &CancellationToken) {
        error!(kind = ?err.kind(), error = %err, generation, "Cycle failed");
        stop.cancel();

        if !self.inner.status.record_error(generation, err.status_line()) {
            warn!(generation, "Failure from a replaced worker, not escalated");
            return;
        }
        self.inner.alarm.start().await;
    }

    async fn join_worker(&self, handle: JoinHandle<()>) {
        let timeout = self.inner.config.stop_timeout;
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(())) => debug!("Worker joined"),
            Ok(Err(e)) => error!(error = %e, "Worker task failed"),
            Err(_) => warn!(?timeout, "Worker did not stop in time, detaching"),
        }
    }
}
