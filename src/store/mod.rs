//! Per-user cart and order storage.
//!
//! Carts and orders are held behind [`SessionStore`] so the process-memory
//! implementation can be swapped for a durable one without touching the
//! services.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CartLine, Order, OrderItem, ProductId};

mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Outcome of setting a cart line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated(CartLine),
    /// The requested quantity was below one, so the line was dropped.
    Removed,
    /// No line for that product.
    Missing,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn cart(&self, user_id: Uuid) -> Result<Vec<CartLine>, StoreError>;

    /// Add `quantity` to the product's line, creating it when absent.
    async fn merge_cart_line(
        &self,
        user_id: Uuid,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, StoreError>;

    async fn set_quantity(
        &self,
        user_id: Uuid,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<QuantityUpdate, StoreError>;

    /// Returns whether a line was removed.
    async fn remove_cart_line(
        &self,
        user_id: Uuid,
        product_id: ProductId,
    ) -> Result<bool, StoreError>;

    /// Orders for the user, newest first.
    async fn orders(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Record a new order and empty the user's cart.
    async fn place_order(
        &self,
        user_id: Uuid,
        items: Vec<OrderItem>,
        total_amount: i64,
    ) -> Result<Order, StoreError>;
}
