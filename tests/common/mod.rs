//! In-process stand-ins for the backend and the product catalog.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use storefront_api::{
    client::{Catalog, ClientError, LocalStore, Product, RemoteService, Storefront},
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        contact::ContactRequest,
        orders::PlaceOrderRequest,
    },
    models::{CartLine, Order, OrderItem, ProductId, PublicUser},
    validation::LoginForm,
};
use uuid::Uuid;

pub const PASSWORD: &str = "secret1";

pub fn product(id: ProductId, title: &str, price: i64) -> Product {
    Product {
        id,
        title: title.to_string(),
        price,
        description: format!("{title} for everyday use"),
        category: "misc".to_string(),
        image: format!("https://img.example/{id}.png"),
    }
}

pub fn login_form(email: &str) -> LoginForm {
    LoginForm {
        email: email.to_string(),
        password: PASSWORD.to_string(),
    }
}

#[derive(Default)]
struct RemoteState {
    users: HashMap<String, PublicUser>,
    carts: HashMap<String, Vec<CartLine>>,
    wishlists: HashMap<String, Vec<ProductId>>,
    orders: HashMap<String, Vec<Order>>,
    contacts: Vec<ContactRequest>,
    next_order_id: i64,
    fail_collections: bool,
    collection_calls: usize,
}

/// Backend double keeping per-user collections keyed by email. Tokens are
/// `token:<email>`.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<RemoteState>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap()
    }

    pub fn add_user(&self, name: &str, email: &str) {
        self.state().users.insert(
            email.to_string(),
            PublicUser {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
            },
        );
    }

    /// Every cart, wishlist and order call fails while set. Auth keeps working.
    pub fn fail_collections(&self, fail: bool) {
        self.state().fail_collections = fail;
    }

    pub fn collection_calls(&self) -> usize {
        self.state().collection_calls
    }

    pub fn cart_of(&self, email: &str) -> Vec<CartLine> {
        self.state().carts.get(email).cloned().unwrap_or_default()
    }

    pub fn set_cart(&self, email: &str, lines: Vec<CartLine>) {
        self.state().carts.insert(email.to_string(), lines);
    }

    pub fn wishlist_of(&self, email: &str) -> Vec<ProductId> {
        self.state().wishlists.get(email).cloned().unwrap_or_default()
    }

    pub fn set_wishlist(&self, email: &str, ids: Vec<ProductId>) {
        self.state().wishlists.insert(email.to_string(), ids);
    }

    pub fn orders_of(&self, email: &str) -> Vec<Order> {
        self.state().orders.get(email).cloned().unwrap_or_default()
    }

    pub fn contacts(&self) -> Vec<ContactRequest> {
        self.state().contacts.clone()
    }

    /// Resolves the token and counts the call.
    fn authorize(&self, token: &str) -> Result<(MutexGuard<'_, RemoteState>, String), ClientError> {
        let mut state = self.state();
        state.collection_calls += 1;
        if state.fail_collections {
            return Err(ClientError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        let email = token
            .strip_prefix("token:")
            .filter(|email| state.users.contains_key(*email))
            .ok_or_else(|| ClientError::Unauthorized("Invalid token".to_string()))?
            .to_string();
        Ok((state, email))
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn register(&self, request: &RegisterRequest) -> Result<PublicUser, ClientError> {
        let mut state = self.state();
        if state.users.contains_key(&request.email) {
            return Err(ClientError::Api {
                status: 400,
                message: "Email already registered".to_string(),
            });
        }
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
        };
        state.users.insert(request.email.clone(), user.clone());
        Ok(user)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let state = self.state();
        match state.users.get(&request.email) {
            Some(user) if request.password == PASSWORD => Ok(LoginResponse {
                token: format!("token:{}", user.email),
                user: user.clone(),
            }),
            _ => Err(ClientError::Api {
                status: 400,
                message: "Invalid email or password".to_string(),
            }),
        }
    }

    async fn health(&self) -> Result<String, ClientError> {
        Ok("ok".to_string())
    }

    async fn wishlist(&self, token: &str) -> Result<Vec<ProductId>, ClientError> {
        let (state, email) = self.authorize(token)?;
        Ok(state.wishlists.get(&email).cloned().unwrap_or_default())
    }

    async fn add_wishlist_item(&self, token: &str, product_id: ProductId) -> Result<(), ClientError> {
        let (mut state, email) = self.authorize(token)?;
        let ids = state.wishlists.entry(email).or_default();
        if !ids.contains(&product_id) {
            ids.push(product_id);
        }
        Ok(())
    }

    async fn remove_wishlist_item(
        &self,
        token: &str,
        product_id: ProductId,
    ) -> Result<(), ClientError> {
        let (mut state, email) = self.authorize(token)?;
        state
            .wishlists
            .entry(email)
            .or_default()
            .retain(|id| *id != product_id);
        Ok(())
    }

    async fn cart(&self, token: &str) -> Result<Vec<CartLine>, ClientError> {
        let (state, email) = self.authorize(token)?;
        Ok(state.carts.get(&email).cloned().unwrap_or_default())
    }

    async fn add_cart_item(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        let (mut state, email) = self.authorize(token)?;
        let cart = state.carts.entry(email).or_default();
        match cart.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => line.quantity += quantity,
            None => cart.push(CartLine {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    async fn update_cart_quantity(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        let (mut state, email) = self.authorize(token)?;
        let cart = state.carts.entry(email).or_default();
        let Some(idx) = cart.iter().position(|line| line.product_id == product_id) else {
            return Err(ClientError::Api {
                status: 404,
                message: "Not Found".to_string(),
            });
        };
        if quantity < 1 {
            cart.remove(idx);
        } else {
            cart[idx].quantity = quantity;
        }
        Ok(())
    }

    async fn remove_cart_item(&self, token: &str, product_id: ProductId) -> Result<(), ClientError> {
        let (mut state, email) = self.authorize(token)?;
        state
            .carts
            .entry(email)
            .or_default()
            .retain(|line| line.product_id != product_id);
        Ok(())
    }

    async fn orders(&self, token: &str) -> Result<Vec<Order>, ClientError> {
        let (state, email) = self.authorize(token)?;
        let mut orders = state.orders.get(&email).cloned().unwrap_or_default();
        orders.reverse();
        Ok(orders)
    }

    async fn place_order(
        &self,
        token: &str,
        request: &PlaceOrderRequest,
    ) -> Result<i64, ClientError> {
        let (mut state, email) = self.authorize(token)?;
        state.next_order_id += 1;
        let items: Vec<OrderItem> = request.items.iter().cloned().map(OrderItem::from).collect();
        let total_amount = request
            .total_amount
            .unwrap_or_else(|| storefront_api::models::order_total(&items));
        let order = Order {
            id: state.next_order_id,
            items,
            total_amount,
            status: "placed".to_string(),
            created_at: Utc::now(),
        };
        let id = order.id;
        state.orders.entry(email.clone()).or_default().push(order);
        state.carts.insert(email, Vec::new());
        Ok(id)
    }

    async fn send_contact(&self, request: &ContactRequest) -> Result<(), ClientError> {
        self.state().contacts.push(request.clone());
        Ok(())
    }
}

pub struct FakeCatalog {
    products: HashMap<ProductId, Product>,
}

impl FakeCatalog {
    pub fn new(products: Vec<Product>) -> Arc<Self> {
        Arc::new(Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        })
    }

    pub fn standard() -> Arc<Self> {
        Self::new(vec![
            product(1, "Rain Jacket", 5999),
            product(2, "Canvas Backpack", 1099),
            product(3, "Steel Mug", 550),
            product(4, "Wool Socks", 899),
        ])
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn products(&self) -> Result<Vec<Product>, ClientError> {
        let mut products: Vec<Product> = self.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        self.products.get(&id).cloned().ok_or(ClientError::Api {
            status: 404,
            message: format!("product {id} not found"),
        })
    }
}

pub fn storefront(
    local: Arc<dyn LocalStore>,
    remote: &Arc<FakeRemote>,
    catalog: &Arc<FakeCatalog>,
) -> Storefront {
    Storefront::new(local, remote.clone(), catalog.clone())
}
