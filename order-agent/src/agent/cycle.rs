//! Order cycle worker
//!
//! One iteration: probes, authentication, fetch, then print and acknowledge
//! each order in fetch order. Fatal failures go through
//! [`Orchestrator::error`], which cancels this worker's stop token and ends
//! the loop. Status writes carry the worker's generation so a worker left
//! behind by a timed-out stop cannot touch its replacement.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::orchestrator::Orchestrator;
use crate::core::{AgentError, ProbeTarget};
use crate::models::{Customer, Order, transfer_to_domain};
use crate::printing::DeviceConnectionManager;
use crate::services::AccessToken;

pub(super) struct Worker {
    orchestrator: Orchestrator,
    stop: CancellationToken,
    generation: u64,
    device: DeviceConnectionManager,
}

impl Worker {
    pub(super) fn new(
        orchestrator: Orchestrator,
        stop: CancellationToken,
        generation: u64,
    ) -> Self {
        let device = DeviceConnectionManager::new(orchestrator.inner.services.printer.clone());
        Self {
            orchestrator,
            stop,
            generation,
            device,
        }
    }

    pub(super) async fn run(mut self) {
        info!("Order cycle started");
        let poll_interval = self.orchestrator.config().poll_interval;

        while !self.stop.is_cancelled() {
            let outcome = AssertUnwindSafe(self.run_once()).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => self.escalate(err).await,
                Err(panic) => {
                    self.escalate(AgentError::Unexpected(panic_message(panic))).await;
                    break;
                }
            }

            tokio::select! {
                _ = self.stop.cancelled() => break,
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }

        self.cleanup().await;
    }

    async fn escalate(&mut self, err: AgentError) {
        self.orchestrator.error(err, self.generation, &self.stop).await;
    }

    async fn run_once(&mut self) -> Result<(), AgentError> {
        self.check_connectivity().await?;

        let services = &self.orchestrator.inner.services;
        let access = services
            .authenticator
            .authenticate(&self.orchestrator.config().credentials)
            .await?;

        let orders = services
            .gateway
            .fetch_pending(&access)
            .await
            .map_err(AgentError::OrderFetch)?;

        if orders.is_empty() {
            debug!("No pending orders");
            return Ok(());
        }
        info!(count = orders.len(), "Pending orders fetched");

        for dto in &orders {
            if self.stop.is_cancelled() {
                info!("Stop requested, abandoning batch");
                break;
            }

            let (customer, order) = transfer_to_domain(dto);
            self.print_with_retry(&order, &customer).await?;

            if let Err(err) = self.acknowledge_with_retry(order.id, &access).await {
                // Already on paper; the backend will offer it again
                error!(order_id = order.id, error = %err, "Order printed but not acknowledged");
            }
        }

        Ok(())
    }

    async fn check_connectivity(&mut self) -> Result<(), AgentError> {
        let config = self.orchestrator.config();
        let reachability = &self.orchestrator.inner.services.reachability;

        if !reachability.probe(&config.internet_check_url).await {
            return Err(AgentError::Connectivity(ProbeTarget::Internet));
        }
        if !self.device.ensure_connected().await {
            return Err(AgentError::Connectivity(ProbeTarget::Device));
        }
        if !reachability.probe(&config.server_health_url).await {
            return Err(AgentError::Connectivity(ProbeTarget::Backend));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(order_id = order.id))]
    async fn print_with_retry(&mut self, order: &Order, customer: &Customer) -> Result<(), AgentError> {
        let config = self.orchestrator.config();
        let max_attempts = config.max_attempts;

        for attempt in 1..=max_attempts {
            if self.device.ensure_connected().await {
                let session = self.device.session_mut();
                if self
                    .orchestrator
                    .inner
                    .renderer
                    .print(order, customer, session)
                    .await
                {
                    info!(attempt, "Order printed");
                    return Ok(());
                }
            }

            warn!(attempt, max_attempts, "Print attempt failed");
            self.device.drop_session();
            if attempt < max_attempts {
                tokio::time::sleep(config.retry_delay).await;
            }
        }

        Err(AgentError::OrderPrint {
            order_id: order.id,
            attempts: max_attempts,
        })
    }

    #[instrument(skip(self, access))]
    async fn acknowledge_with_retry(
        &mut self,
        order_id: i64,
        access: &AccessToken,
    ) -> Result<(), AgentError> {
        let config = self.orchestrator.config();
        let gateway = &self.orchestrator.inner.services.gateway;
        let mut attempt = 1;

        loop {
            match gateway.acknowledge(order_id, access).await {
                Ok(()) => {
                    info!(attempt, "Order marked as printed");
                    return Ok(());
                }
                Err(source) if attempt >= config.max_attempts => {
                    return Err(AgentError::OrderUpdate { order_id, source });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Acknowledge attempt failed");
                    attempt += 1;
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    async fn cleanup(mut self) {
        self.device.release().await;
        self.stop.cancel();
        if self.orchestrator.inner.status.finish(self.generation) {
            info!("Order cycle stopped");
        } else {
            info!(generation = self.generation, "Replaced order cycle stopped");
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
