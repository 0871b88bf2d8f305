//! Pending order retrieval and print acknowledgment

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::auth::AccessToken;
use crate::models::{OrderDto, transfer_to_domain};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid order payload: {0}")]
    Decode(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

/// Order service operations used by the cycle
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Orders the server still reports as unprinted, in server order
    async fn fetch_pending(&self, token: &AccessToken) -> Result<Vec<OrderDto>, GatewayError>;

    /// Mark one order as printed
    async fn acknowledge(&self, order_id: i64, token: &AccessToken) -> Result<(), GatewayError>;
}

/// HTTP gateway to the order service
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    client: Client,
    orders_url: String,
    update_order_url: String,
}

impl HttpOrderGateway {
    /// `update_order_url` is a prefix; `{order_id}/` is appended
    pub fn new(
        orders_url: impl Into<String>,
        update_order_url: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            orders_url: orders_url.into(),
            update_order_url: update_order_url.into(),
        })
    }

    fn acknowledge_url(&self, order_id: i64) -> String {
        format!("{}{}/", self.update_order_url, order_id)
    }
}

/// Turn any non-200 response into an error carrying its body
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    #[instrument(skip(self, token), fields(url = %self.orders_url))]
    async fn fetch_pending(&self, token: &AccessToken) -> Result<Vec<OrderDto>, GatewayError> {
        let response = self
            .client
            .get(&self.orders_url)
            .bearer_auth(token.as_str())
            .send()
            .await?;
        let response = check_status(response).await?;

        let bytes = response.bytes().await?;
        let orders: Vec<OrderDto> =
            serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))?;

        for dto in &orders {
            transfer_to_domain(dto)
                .1
                .validate()
                .map_err(GatewayError::InvalidOrder)?;
        }

        if orders.is_empty() {
            debug!("No pending orders");
        } else {
            info!(count = orders.len(), "Fetched pending orders");
        }
        Ok(orders)
    }

    #[instrument(skip(self, token))]
    async fn acknowledge(&self, order_id: i64, token: &AccessToken) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(self.acknowledge_url(order_id))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        check_status(response).await?;

        debug!(order_id, "Acknowledge accepted");
        Ok(())
    }
}
