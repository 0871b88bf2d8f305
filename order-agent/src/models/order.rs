//! Order transfer objects and domain values
//!
//! The backend sends customer data flattened into each order
//! ([`OrderDto`]). [`transfer_to_domain`] splits it into the [`Customer`]
//! and [`Order`] used for rendering.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::serde_helpers::flexible_datetime;

// ============================================================================
// Transfer objects
// ============================================================================

/// Product reference inside an order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub category: String,
    pub product_name: String,
    #[serde(default)]
    pub product_accompaniment: String,
}

/// Order line as sent by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderProductDto {
    pub product: ProductDto,
    #[serde(default)]
    pub purchased_with_points: bool,
    pub quantity: u32,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub note: String,
}

/// Order as sent by the backend, customer fields inlined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: i64,
    pub customer: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nif: Option<i64>,
    #[serde(default)]
    pub full_address: String,
    #[serde(default)]
    pub locality_name: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
    #[serde(default)]
    pub phone_number: String,
    #[serde(with = "flexible_datetime")]
    pub delivery_time: DateTime<FixedOffset>,
    #[serde(with = "flexible_datetime")]
    pub created: DateTime<FixedOffset>,
    pub order_products: Vec<OrderProductDto>,
    pub total_price: f64,
    #[serde(default)]
    pub printed: bool,
}

// ============================================================================
// Domain values
// ============================================================================

/// Pickup or delivery, derived from the customer address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Pickup,
    Delivery,
}

impl OrderKind {
    pub fn from_address(address: &str) -> Self {
        if address.trim().is_empty() {
            OrderKind::Pickup
        } else {
            OrderKind::Delivery
        }
    }

    /// Label printed on the receipt
    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Pickup => "Recolha no Restaurante",
            OrderKind::Delivery => "Entrega ao Domicilio",
        }
    }

    /// Two-letter code for the fast-glance line
    pub fn code(&self) -> &'static str {
        match self {
            OrderKind::Pickup => "VB",
            OrderKind::Delivery => "ED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub nif: Option<i64>,
    /// Empty for pickup orders
    pub full_address: String,
    pub phone_number: String,
    pub locality_name: Option<String>,
    pub indication: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub category: String,
    pub name: String,
    pub accompaniment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product: Product,
    pub purchased_with_points: bool,
    pub quantity: u32,
    pub points: u32,
    pub price: f64,
    pub note: String,
}

impl OrderLine {
    /// Price as shown on the receipt, in points for points purchases
    pub fn price_label(&self) -> String {
        if self.purchased_with_points {
            format!("{} pts", self.points)
        } else {
            format!("{:.2} EUR", self.price)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub kind: OrderKind,
    pub delivery_time: DateTime<FixedOffset>,
    pub created: DateTime<FixedOffset>,
    pub lines: Vec<OrderLine>,
    pub total_price: f64,
    pub printed: bool,
}

impl Order {
    /// `DD-MM-YYYY` of the delivery time
    pub fn formatted_date(&self) -> String {
        self.delivery_time.format("%d-%m-%Y").to_string()
    }

    /// `HH:MM:SS` of the delivery time
    pub fn formatted_time(&self) -> String {
        self.delivery_time.format("%H:%M:%S").to_string()
    }

    /// Large header line, e.g. `ED - 19:30:00`
    pub fn fast_info(&self) -> String {
        format!("{} - {}", self.kind.code(), self.formatted_time())
    }

    /// Check the invariants the receipt relies on
    pub fn validate(&self) -> Result<(), String> {
        if self.lines.is_empty() {
            return Err(format!("order {} has no products", self.id));
        }
        if let Some(line) = self.lines.iter().find(|l| l.quantity == 0) {
            return Err(format!(
                "order {} has zero quantity for {}",
                self.id, line.product.name
            ));
        }
        if !self.total_price.is_finite() || self.total_price < 0.0 {
            return Err(format!(
                "order {} has invalid total {}",
                self.id, self.total_price
            ));
        }
        Ok(())
    }
}

/// Split a transfer object into its customer and order
pub fn transfer_to_domain(dto: &OrderDto) -> (Customer, Order) {
    let customer = Customer {
        name: dto.customer.clone(),
        email: dto.email.clone(),
        nif: dto.nif,
        full_address: dto.full_address.clone(),
        phone_number: dto.phone_number.clone(),
        locality_name: dto.locality_name.clone().filter(|s| !s.trim().is_empty()),
        indication: dto.indication.clone().filter(|s| !s.trim().is_empty()),
    };

    let lines = dto
        .order_products
        .iter()
        .map(|op| OrderLine {
            product: Product {
                category: op.product.category.clone(),
                name: op.product.product_name.clone(),
                accompaniment: op.product.product_accompaniment.clone(),
            },
            purchased_with_points: op.purchased_with_points,
            quantity: op.quantity,
            points: op.points,
            price: op.price,
            note: op.note.clone(),
        })
        .collect();

    let order = Order {
        id: dto.id,
        kind: OrderKind::from_address(&dto.full_address),
        delivery_time: dto.delivery_time,
        created: dto.created,
        lines,
        total_price: dto.total_price,
        printed: dto.printed,
    };

    (customer, order)
}
