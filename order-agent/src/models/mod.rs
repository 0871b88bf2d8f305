//! Order data model

pub mod order;
pub mod serde_helpers;

pub use order::{
    Customer, Order, OrderDto, OrderKind, OrderLine, OrderProductDto, Product, ProductDto,
    transfer_to_domain,
};
