use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{QuantityUpdate, SessionStore, StoreError};
use crate::models::{CartLine, ORDER_STATUS_PLACED, Order, OrderItem, ProductId};

/// Process-memory store. Everything is lost when the server restarts.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    carts: HashMap<Uuid, Vec<CartLine>>,
    orders: HashMap<Uuid, Vec<Order>>,
    next_order_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                carts: HashMap::new(),
                orders: HashMap::new(),
                next_order_id: 1,
            }),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn cart(&self, user_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn merge_cart_line(
        &self,
        user_id: Uuid,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, StoreError> {
        let mut inner = self.inner.write().await;
        let cart = inner.carts.entry(user_id).or_default();
        let line = match cart.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                *line
            }
            None => {
                let line = CartLine {
                    product_id,
                    quantity,
                };
                cart.push(line);
                line
            }
        };
        Ok(line)
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<QuantityUpdate, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(&user_id) else {
            return Ok(QuantityUpdate::Missing);
        };
        let Some(idx) = cart.iter().position(|l| l.product_id == product_id) else {
            return Ok(QuantityUpdate::Missing);
        };
        if quantity < 1 {
            cart.remove(idx);
            return Ok(QuantityUpdate::Removed);
        }
        cart[idx].quantity = quantity;
        Ok(QuantityUpdate::Updated(cart[idx]))
    }

    async fn remove_cart_line(
        &self,
        user_id: Uuid,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = cart.len();
        cart.retain(|l| l.product_id != product_id);
        Ok(cart.len() != before)
    }

    async fn orders(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders = self
            .inner
            .read()
            .await
            .orders
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        // ids break ties between orders created within the same instant
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn place_order(
        &self,
        user_id: Uuid,
        items: Vec<OrderItem>,
        total_amount: i64,
    ) -> Result<Order, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_order_id;
        inner.next_order_id += 1;

        let order = Order {
            id,
            items,
            total_amount,
            status: ORDER_STATUS_PLACED.to_string(),
            created_at: Utc::now(),
        };
        inner.orders.entry(user_id).or_default().push(order.clone());
        inner.carts.insert(user_id, Vec::new());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merge_adds_to_existing_line() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.merge_cart_line(user, 3, 1).await.unwrap();
        let line = store.merge_cart_line(user, 3, 2).await.unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(store.cart(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_quantity_below_one_removes_line() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.merge_cart_line(user, 3, 2).await.unwrap();

        assert_eq!(
            store.set_quantity(user, 3, 5).await.unwrap(),
            QuantityUpdate::Updated(CartLine {
                product_id: 3,
                quantity: 5
            })
        );
        assert_eq!(
            store.set_quantity(user, 3, 0).await.unwrap(),
            QuantityUpdate::Removed
        );
        assert_eq!(
            store.set_quantity(user, 3, 1).await.unwrap(),
            QuantityUpdate::Missing
        );
        assert!(store.cart(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn carts_are_scoped_per_user() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.merge_cart_line(alice, 1, 1).await.unwrap();
        assert!(store.cart(bob).await.unwrap().is_empty());
        assert!(!store.remove_cart_line(bob, 1).await.unwrap());
        assert!(store.remove_cart_line(alice, 1).await.unwrap());
    }

    #[tokio::test]
    async fn place_order_assigns_ids_and_clears_cart() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.merge_cart_line(user, 9, 2).await.unwrap();

        let items = vec![OrderItem {
            product_id: 9,
            quantity: 2,
            price: 1000,
        }];
        let first = store.place_order(user, items.clone(), 2000).await.unwrap();
        let second = store.place_order(user, items, 2000).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, ORDER_STATUS_PLACED);
        assert!(store.cart(user).await.unwrap().is_empty());

        let orders = store.orders(user).await.unwrap();
        assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![2, 1]);
    }
}
