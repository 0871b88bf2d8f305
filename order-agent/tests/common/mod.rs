//! Shared fixtures: HTTP stubs and in-memory collaborators
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use order_agent::agent::{AlertSink, Services};
use order_agent::models::OrderDto;
use order_agent::services::{
    AccessToken, AuthError, Authenticate, GatewayError, OrderGateway, Reachability,
};
use order_agent::{Config, core::Credentials};
use parking_lot::Mutex;
use receipt_printer::{DeviceConnector, DeviceSession, PrintError, PrintResult};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================================
// HTTP stubs
// ============================================================================

/// Serve `router` on an ephemeral local port, returning its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A local URL with nothing listening
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ============================================================================
// Order fixtures
// ============================================================================

pub fn order_json(id: i64) -> Value {
    json!({
        "id": id,
        "customer": "Ana Silva",
        "email": "ana@example.pt",
        "nif": 123456789,
        "full_address": "Rua Direita 10",
        "locality_name": "Coimbra",
        "indication": null,
        "phone_number": "912345678",
        "delivery_time": "2024-05-17T19:30:00+01:00",
        "created": "2024-05-17T18:02:11",
        "order_products": [{
            "product": {
                "category": "Carnes",
                "product_name": "Picanha",
                "product_accompaniment": "Arroz e feijão"
            },
            "purchased_with_points": false,
            "quantity": 2,
            "points": 0,
            "price": 12.0,
            "note": ""
        }],
        "total_price": 24.0,
        "printed": false
    })
}

pub fn order_dto(id: i64) -> OrderDto {
    serde_json::from_value(order_json(id)).unwrap()
}

// ============================================================================
// In-memory collaborators
// ============================================================================

pub const INTERNET_URL: &str = "http://internet.test/";
pub const HEALTH_URL: &str = "http://backend.test/api/health/";

/// Fast timings, fake URLs
pub fn test_config() -> Config {
    let mut config = Config::new("http://backend.test", "127.0.0.1");
    config.internet_check_url = INTERNET_URL.into();
    config.server_health_url = HEALTH_URL.into();
    config.credentials = Credentials::new("loja", "segredo");
    config.max_attempts = 3;
    config.retry_delay = Duration::from_millis(10);
    config.poll_interval = Duration::from_millis(50);
    config.stop_timeout = Duration::from_secs(2);
    config.alert_interval = Duration::from_millis(10);
    config
}

#[derive(Default)]
pub struct FakeReachability {
    down: Mutex<HashSet<String>>,
}

impl FakeReachability {
    pub fn set_down(&self, url: &str, down: bool) {
        let mut set = self.down.lock();
        if down {
            set.insert(url.to_string());
        } else {
            set.remove(url);
        }
    }
}

#[async_trait]
impl Reachability for FakeReachability {
    async fn probe(&self, url: &str) -> bool {
        !self.down.lock().contains(url)
    }
}

#[derive(Default)]
pub struct FakeAuth {
    pub reject: AtomicBool,
}

#[async_trait]
impl Authenticate for FakeAuth {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<AccessToken, AuthError> {
        if self.reject.load(Ordering::SeqCst) {
            Err(AuthError::InvalidCredentials)
        } else {
            Ok(AccessToken::new("tok"))
        }
    }
}

/// Pending orders stay pending until acknowledged
#[derive(Default)]
pub struct FakeGateway {
    pending: Mutex<Vec<OrderDto>>,
    pub acknowledged: Mutex<Vec<i64>>,
    pub ack_attempts: AtomicUsize,
    pub fetches: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_ack: AtomicBool,
    pub panic_on_fetch: AtomicBool,
    /// Next fetch hangs this long, then fails
    pub stall_next_fetch: Mutex<Option<Duration>>,
}

impl FakeGateway {
    pub fn with_orders(ids: &[i64]) -> Self {
        let gateway = Self::default();
        *gateway.pending.lock() = ids.iter().map(|id| order_dto(*id)).collect();
        gateway
    }

    pub fn acknowledged(&self) -> Vec<i64> {
        self.acknowledged.lock().clone()
    }
}

#[async_trait]
impl OrderGateway for FakeGateway {
    async fn fetch_pending(&self, _token: &AccessToken) -> Result<Vec<OrderDto>, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_fetch.load(Ordering::SeqCst) {
            panic!("corrupted order cache");
        }
        let stall = self.stall_next_fetch.lock().take();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
            return Err(GatewayError::Status {
                status: 504,
                body: "gateway timeout".into(),
            });
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(self.pending.lock().clone())
    }

    async fn acknowledge(&self, order_id: i64, _token: &AccessToken) -> Result<(), GatewayError> {
        self.ack_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_ack.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.pending.lock().retain(|o| o.id != order_id);
        self.acknowledged.lock().push(order_id);
        Ok(())
    }
}

/// Printer shared by every session it opens
#[derive(Default)]
pub struct PrinterState {
    pub offline: AtomicBool,
    pub fail_send: AtomicBool,
    /// Sends that fail before `fail_send` is consulted
    pub failing_sends: AtomicUsize,
    /// Sessions numbered up to this one report offline
    pub offline_through: AtomicUsize,
    pub send_attempts: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub live: AtomicUsize,
    pub printed: Mutex<Vec<Vec<u8>>>,
}

impl PrinterState {
    pub fn printed_count(&self) -> usize {
        self.printed.lock().len()
    }

    /// Printed jobs that contain `needle`
    pub fn printed_containing(&self, needle: &str) -> usize {
        self.printed
            .lock()
            .iter()
            .filter(|job| job.windows(needle.len()).any(|w| w == needle.as_bytes()))
            .count()
    }
}

#[derive(Default, Clone)]
pub struct FakePrinter {
    pub state: Arc<PrinterState>,
}

#[async_trait]
impl DeviceConnector for FakePrinter {
    async fn open(&self) -> PrintResult<Box<dyn DeviceSession>> {
        let number = self.state.opened.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
            number,
            closed: false,
        }))
    }
}

struct FakeSession {
    state: Arc<PrinterState>,
    number: usize,
    closed: bool,
}

#[async_trait]
impl DeviceSession for FakeSession {
    async fn is_online(&mut self) -> bool {
        !self.closed
            && !self.state.offline.load(Ordering::SeqCst)
            && self.number > self.state.offline_through.load(Ordering::SeqCst)
    }

    async fn send(&mut self, data: &[u8]) -> PrintResult<()> {
        self.state.send_attempts.fetch_add(1, Ordering::SeqCst);
        if self.closed {
            return Err(PrintError::Closed);
        }
        let scripted_failure = self
            .state
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure || self.state.fail_send.load(Ordering::SeqCst) {
            return Err(PrintError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "paper jam",
            )));
        }
        self.state.printed.lock().push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> PrintResult<()> {
        if !self.closed {
            self.closed = true;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct CountingAlert {
    pub pulses: AtomicUsize,
}

#[async_trait]
impl AlertSink for CountingAlert {
    async fn pulse(&self) -> io::Result<()> {
        self.pulses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Every fake, plus the [`Services`] bundle wired to them
pub struct Harness {
    pub reachability: Arc<FakeReachability>,
    pub auth: Arc<FakeAuth>,
    pub gateway: Arc<FakeGateway>,
    pub printer: FakePrinter,
    pub alert: Arc<CountingAlert>,
}

impl Harness {
    pub fn new(gateway: FakeGateway) -> Self {
        Self {
            reachability: Arc::new(FakeReachability::default()),
            auth: Arc::new(FakeAuth::default()),
            gateway: Arc::new(gateway),
            printer: FakePrinter::default(),
            alert: Arc::new(CountingAlert::default()),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            reachability: self.reachability.clone(),
            authenticator: self.auth.clone(),
            gateway: self.gateway.clone(),
            printer: Arc::new(self.printer.clone()),
            alert: self.alert.clone(),
        }
    }

    pub fn printer(&self) -> &PrinterState {
        &self.printer.state
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
