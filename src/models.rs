//! Domain entities shared by the services and the store backends.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{ServiceError, ServiceResult};

pub const MAX_PRODUCT_NAME_LEN: usize = 100;
pub const MAX_CATEGORY_DESCRIPTION_LEN: usize = 200;
/// Quantity of a freshly added cart item.
pub const DEFAULT_QUANTITY: i32 = 1;
/// Prices are stored as NUMERIC(18,2).
pub const PRICE_SCALE: u32 = 2;
/// NUMERIC(18,2) leaves 16 integer digits.
const PRICE_INTEGER_DIGITS: u32 = 16;

/// Smallest price that no longer fits the price column.
pub fn price_limit() -> Decimal {
    Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub description: String,
}

impl Category {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
        }
    }

    /// Strips surrounding whitespace from the description.
    pub fn normalize(&mut self) {
        self.description = self.description.trim().to_string();
    }

    pub fn validate(&self) -> ServiceResult<()> {
        let description = self.description.as_str();
        if description.trim().is_empty() {
            return Err(ServiceError::validation("category description is required"));
        }
        if description.chars().count() > MAX_CATEGORY_DESCRIPTION_LEN {
            return Err(ServiceError::validation(format!(
                "category description must be at most {MAX_CATEGORY_DESCRIPTION_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
}

impl Product {
    /// Strips surrounding whitespace from name and description.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
    }

    pub fn validate(&self) -> ServiceResult<()> {
        let name = self.name.as_str();
        if name.trim().is_empty() {
            return Err(ServiceError::validation("product name is required"));
        }
        if name.chars().count() > MAX_PRODUCT_NAME_LEN {
            return Err(ServiceError::validation(format!(
                "product name must be at most {MAX_PRODUCT_NAME_LEN} characters"
            )));
        }
        if self.price < Decimal::ZERO {
            return Err(ServiceError::validation("product price must not be negative"));
        }
        if self.price >= price_limit() {
            return Err(ServiceError::validation(format!(
                "product price must be below 10^{PRICE_INTEGER_DIGITS}"
            )));
        }
        if self.price.scale() > PRICE_SCALE && self.price != self.price.round_dp(PRICE_SCALE) {
            return Err(ServiceError::validation(format!(
                "product price must have at most {PRICE_SCALE} decimal places"
            )));
        }
        Ok(())
    }
}

/// Input for creating a product; the id is assigned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl NewProduct {
    /// The product to store, with a fresh id and trimmed text fields.
    pub fn into_product(self) -> Product {
        let mut product = Product {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            price: self.price,
            category_id: self.category_id,
        };
        product.normalize();
        product
    }
}

/// At most one cart exists per user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShoppingCart {
    pub id: Uuid,
    pub user_identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl CartItem {
    /// A new line for `product` with the default quantity and the product's
    /// current price as the unit price snapshot.
    pub fn for_product(cart_id: Uuid, product: &Product) -> Self {
        Self {
            id: Uuid::new_v4(),
            cart_id,
            product_id: product.id,
            quantity: DEFAULT_QUANTITY,
            unit_price: product.price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// One entry of a cart as seen by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of the line totals of a cart.
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}
