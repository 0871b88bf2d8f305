//! Backend collaborators: reachability, authentication, order gateway

pub mod auth;
pub mod gateway;
pub mod health;

pub use auth::{AccessToken, AuthClient, AuthError, Authenticate};
pub use gateway::{GatewayError, HttpOrderGateway, OrderGateway};
pub use health::{HttpHealthChecker, Reachability};
