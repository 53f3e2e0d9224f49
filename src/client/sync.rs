//! Cart, wishlist and order state for one device.
//!
//! Every mutation lands in memory and in the local cache first. When a user is
//! signed in the matching backend call follows; its failure is logged and
//! otherwise ignored, so the two sides may drift until the next reconcile.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use super::{
    ClientError,
    catalog::{Catalog, HttpCatalog, Product, ProductSort, filter_products, sort_products},
    local::{Collection, FileLocalStore, LocalStore, MemoryLocalStore, load, merge, save},
    remote::{HttpRemote, RemoteService},
    tracking::TrackingView,
};
use crate::{
    config::ClientConfig,
    dto::{
        auth::{LoginRequest, RegisterRequest},
        contact::ContactRequest,
        orders::{OrderItemInput, PlaceOrderRequest},
    },
    models::{Order, OrderItem, ProductId, PublicUser, order_total},
    validation::{CheckoutForm, LoginForm, RegisterForm, Validate},
};

/// Status shown for orders the backend accepted.
pub const STATUS_PLACED: &str = "Placed";
/// Status shown for orders that only exist on this device.
pub const STATUS_PROCESSING: &str = "Processing";
/// Owner recorded on orders placed while signed out.
pub const GUEST_EMAIL: &str = "guest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: i32,
}

impl CartItem {
    pub fn line_total(&self) -> i64 {
        self.product.price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub user_email: String,
}

impl OrderRecord {
    fn from_remote(order: Order, user_email: &str) -> Self {
        Self {
            id: order.id.to_string(),
            items: order.items,
            total_amount: order.total_amount,
            created_at: order.created_at,
            status: STATUS_PLACED.to_string(),
            user_email: user_email.to_string(),
        }
    }
}

pub struct Storefront {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteService>,
    catalog: Arc<dyn Catalog>,
    session: Option<Session>,
    cart: Vec<CartItem>,
    wishlist: Vec<Product>,
    orders: Vec<OrderRecord>,
}

impl Storefront {
    /// Starts signed out with whatever the local cache holds.
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteService>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        let cart = cached(local.as_ref(), Collection::Cart);
        let wishlist = cached(local.as_ref(), Collection::Wishlist);
        let orders = cached(local.as_ref(), Collection::Orders);
        Self {
            local,
            remote,
            catalog,
            session: None,
            cart,
            wishlist,
            orders,
        }
    }

    /// Like [`Storefront::new`] but resumes a session saved by an earlier run
    /// and reconciles against it.
    pub async fn restore(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteService>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        let session = match load::<Session>(local.as_ref(), Collection::Session) {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable saved session");
                None
            }
        };
        let mut storefront = Self::new(local, remote, catalog);
        if session.is_some() {
            storefront.session = session;
            storefront.reconcile().await;
        }
        storefront
    }

    /// HTTP backend and catalog, with a file cache when `cache_dir` is set.
    pub async fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let local: Arc<dyn LocalStore> = match &config.cache_dir {
            Some(dir) => Arc::new(FileLocalStore::new(dir)?),
            None => Arc::new(MemoryLocalStore::new()),
        };
        let http = reqwest::Client::new();
        let remote = Arc::new(HttpRemote::with_client(http.clone(), &config.api_base_url));
        let catalog = Arc::new(HttpCatalog::with_client(http, &config.catalog_base_url));
        Ok(Self::restore(local, remote, catalog).await)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    pub fn wishlist(&self) -> &[Product] {
        &self.wishlist
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn cart_subtotal(&self) -> i64 {
        self.cart.iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all lines.
    pub fn cart_count(&self) -> i32 {
        self.cart.iter().map(|item| item.quantity).sum()
    }

    pub fn is_favorite(&self, product_id: ProductId) -> bool {
        self.wishlist.iter().any(|p| p.id == product_id)
    }

    /// Creates the account. The caller still has to log in.
    pub async fn register(&self, form: &RegisterForm) -> Result<PublicUser, ClientError> {
        form.validate()?;
        self.remote.register(&RegisterRequest::from(form)).await
    }

    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn login(&mut self, form: &LoginForm) -> Result<PublicUser, ClientError> {
        form.validate()?;
        let request = LoginRequest {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let response = self.remote.login(&request).await?;
        let session = Session {
            token: response.token,
            user: response.user,
        };
        self.persist(Collection::Session, &session);
        let user = session.user.clone();
        self.session = Some(session);
        self.reconcile().await;
        debug!(cart = self.cart.len(), wishlist = self.wishlist.len(), "signed in");
        Ok(user)
    }

    /// Drops the session and falls back to the local cache. Nothing on the
    /// backend is cleared.
    pub fn logout(&mut self) {
        self.session = None;
        if let Err(err) = self.local.remove(Collection::Session) {
            warn!(error = %err, "failed to drop saved session");
        }
        self.cart = cached(self.local.as_ref(), Collection::Cart);
        self.wishlist = cached(self.local.as_ref(), Collection::Wishlist);
        self.orders = cached(self.local.as_ref(), Collection::Orders);
    }

    /// Pulls cart, wishlist and orders for the current identity.
    pub async fn reconcile(&mut self) {
        self.hydrate_cart().await;
        self.hydrate_wishlist().await;
        self.hydrate_orders().await;
    }

    async fn hydrate_cart(&mut self) {
        let guest: Vec<CartItem> = cached(self.local.as_ref(), Collection::Cart);
        let Some(token) = self.token() else {
            self.cart = guest;
            return;
        };

        self.cart = match self.fetch_cart(&token).await {
            Ok(remote) if remote.is_empty() && !guest.is_empty() => {
                for item in &guest {
                    let quantity = item.quantity.max(1);
                    if let Err(err) = self
                        .remote
                        .add_cart_item(&token, item.product.id, quantity)
                        .await
                    {
                        swallow("push guest cart line", &err);
                    }
                }
                match self.fetch_cart(&token).await {
                    Ok(items) => items,
                    Err(err) => {
                        swallow("refetch cart", &err);
                        guest
                    }
                }
            }
            Ok(remote) => remote,
            Err(err) => {
                swallow("fetch cart", &err);
                guest
            }
        };
        self.persist(Collection::Cart, &self.cart);
    }

    async fn fetch_cart(&self, token: &str) -> Result<Vec<CartItem>, ClientError> {
        let lines = self.remote.cart(token).await?;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self.catalog.product(line.product_id).await?;
            items.push(CartItem {
                product,
                quantity: line.quantity,
            });
        }
        Ok(items)
    }

    async fn hydrate_wishlist(&mut self) {
        let guest: Vec<Product> = cached(self.local.as_ref(), Collection::Wishlist);
        let Some(token) = self.token() else {
            self.wishlist = guest;
            return;
        };

        self.wishlist = match self.fetch_wishlist(&token).await {
            Ok(remote) if remote.is_empty() && !guest.is_empty() => {
                for product in &guest {
                    if let Err(err) = self.remote.add_wishlist_item(&token, product.id).await {
                        swallow("push guest wishlist entry", &err);
                    }
                }
                match self.fetch_wishlist(&token).await {
                    Ok(products) => products,
                    Err(err) => {
                        swallow("refetch wishlist", &err);
                        guest
                    }
                }
            }
            Ok(remote) => remote,
            Err(err) => {
                swallow("fetch wishlist", &err);
                guest
            }
        };
        self.persist(Collection::Wishlist, &self.wishlist);
    }

    async fn fetch_wishlist(&self, token: &str) -> Result<Vec<Product>, ClientError> {
        let ids = self.remote.wishlist(token).await?;
        let mut products = Vec::with_capacity(ids.len());
        for id in ids {
            products.push(self.catalog.product(id).await?);
        }
        Ok(products)
    }

    async fn hydrate_orders(&mut self) {
        let Some(session) = self.session.clone() else {
            self.orders = cached(self.local.as_ref(), Collection::Orders);
            return;
        };
        match self.remote.orders(&session.token).await {
            Ok(orders) => {
                self.orders = orders
                    .into_iter()
                    .map(|order| OrderRecord::from_remote(order, &session.user.email))
                    .collect();
                self.persist(Collection::Orders, &self.orders);
            }
            Err(err) => swallow("fetch orders", &err),
        }
    }

    /// One more unit of `product`, starting a line at 1.
    pub async fn add_to_cart(&mut self, product: &Product) {
        match self.cart.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => item.quantity += 1,
            None => self.cart.push(CartItem {
                product: product.clone(),
                quantity: 1,
            }),
        }
        self.persist(Collection::Cart, &self.cart);

        if let Some(token) = self.token() {
            if let Err(err) = self.remote.add_cart_item(&token, product.id, 1).await {
                swallow("add cart item", &err);
            }
        }
    }

    pub async fn remove_from_cart(&mut self, product_id: ProductId) {
        self.cart.retain(|item| item.product.id != product_id);
        self.persist(Collection::Cart, &self.cart);

        if let Some(token) = self.token() {
            if let Err(err) = self.remote.remove_cart_item(&token, product_id).await {
                swallow("remove cart item", &err);
            }
        }
    }

    /// Quantities below 1 remove the line. An unknown line is left alone
    /// locally but the backend is still asked to update it.
    pub async fn update_quantity(&mut self, product_id: ProductId, quantity: i32) {
        if quantity <= 0 {
            self.remove_from_cart(product_id).await;
            return;
        }
        if let Some(item) = self
            .cart
            .iter_mut()
            .find(|item| item.product.id == product_id)
        {
            item.quantity = quantity;
            self.persist(Collection::Cart, &self.cart);
        }

        if let Some(token) = self.token() {
            if let Err(err) = self
                .remote
                .update_cart_quantity(&token, product_id, quantity)
                .await
            {
                swallow("update cart quantity", &err);
            }
        }
    }

    pub async fn clear_cart(&mut self) {
        let removed = std::mem::take(&mut self.cart);
        self.persist(Collection::Cart, &self.cart);

        if let Some(token) = self.token() {
            for item in &removed {
                if let Err(err) = self.remote.remove_cart_item(&token, item.product.id).await {
                    swallow("clear cart item", &err);
                }
            }
        }
    }

    /// Flips membership and returns the new state.
    pub async fn toggle_favorite(&mut self, product: &Product) -> bool {
        let was_favorite = self.is_favorite(product.id);
        if was_favorite {
            self.wishlist.retain(|p| p.id != product.id);
        } else {
            self.wishlist.push(product.clone());
        }
        self.persist(Collection::Wishlist, &self.wishlist);

        if let Some(token) = self.token() {
            let result = if was_favorite {
                self.remote.remove_wishlist_item(&token, product.id).await
            } else {
                self.remote.add_wishlist_item(&token, product.id).await
            };
            if let Err(err) = result {
                swallow("toggle wishlist entry", &err);
            }
        }
        !was_favorite
    }

    /// Records an order, on the backend when signed in. A failed or anonymous
    /// placement is kept on the device as `Processing`.
    pub async fn place_order(&mut self, items: Vec<OrderItem>, total: Option<i64>) -> OrderRecord {
        let total_amount = total.unwrap_or_else(|| order_total(&items));
        let (remote_id, user_email) = match self.session.clone() {
            Some(session) => {
                let request = PlaceOrderRequest {
                    items: items.iter().map(OrderItemInput::from).collect(),
                    total_amount: Some(total_amount),
                };
                match self.remote.place_order(&session.token, &request).await {
                    Ok(id) => (Some(id), session.user.email),
                    Err(err) => {
                        swallow("place order", &err);
                        (None, session.user.email)
                    }
                }
            }
            None => (None, GUEST_EMAIL.to_string()),
        };

        let (id, status) = match remote_id {
            Some(id) => (id.to_string(), STATUS_PLACED),
            None => (self.local_order_id(), STATUS_PROCESSING),
        };
        let record = OrderRecord {
            id,
            items,
            total_amount,
            created_at: Utc::now(),
            status: status.to_string(),
            user_email,
        };

        match merge(
            self.local.as_ref(),
            Collection::Orders,
            |orders: &mut Vec<OrderRecord>| orders.insert(0, record.clone()),
        ) {
            Ok(orders) => self.orders = orders,
            Err(err) => {
                warn!(error = %err, "failed to write local cache");
                self.orders.insert(0, record.clone());
            }
        }
        debug!(order_id = %record.id, status = %record.status, "order recorded");
        record
    }

    /// Turns the cart into an order and empties it.
    pub async fn checkout(&mut self, form: &CheckoutForm) -> Result<OrderRecord, ClientError> {
        form.validate()?;
        if self.cart.is_empty() {
            return Err(ClientError::EmptyCart);
        }
        let items = self
            .cart
            .iter()
            .map(|item| OrderItem {
                product_id: item.product.id,
                quantity: item.quantity,
                price: item.product.price,
            })
            .collect();
        let total = self.cart_subtotal();
        let record = self.place_order(items, Some(total)).await;
        self.clear_cart().await;
        Ok(record)
    }

    pub fn track(&self, order_id: &str) -> Result<TrackingView, ClientError> {
        let order_id = order_id.trim();
        self.orders
            .iter()
            .find(|order| !order_id.is_empty() && order.id == order_id)
            .map(TrackingView::from)
            .ok_or_else(|| ClientError::OrderNotFound(order_id.to_string()))
    }

    pub async fn browse(
        &self,
        query: &str,
        sort: Option<ProductSort>,
    ) -> Result<Vec<Product>, ClientError> {
        let products = self.catalog.products().await?;
        let mut products = filter_products(&products, query);
        if let Some(sort) = sort {
            sort_products(&mut products, sort);
        }
        Ok(products)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        self.catalog.product(id).await
    }

    pub async fn send_contact(&self, request: &ContactRequest) -> Result<(), ClientError> {
        request.validate()?;
        self.remote.send_contact(request).await
    }

    pub async fn health(&self) -> Result<String, ClientError> {
        self.remote.health().await
    }

    fn token(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.token.clone())
    }

    fn local_order_id(&self) -> String {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("ord_{millis}");
            if !self.orders.iter().any(|order| order.id == id) {
                return id;
            }
            millis += 1;
        }
    }

    fn persist<T: Serialize>(&self, collection: Collection, value: &T) {
        if let Err(err) = save(self.local.as_ref(), collection, value) {
            warn!(collection = collection.key(), error = %err, "failed to write local cache");
        }
    }
}

/// Cached collection, or empty when missing or unreadable.
fn cached<T: DeserializeOwned + Default>(store: &dyn LocalStore, collection: Collection) -> T {
    match load(store, collection) {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            warn!(collection = collection.key(), error = %err, "discarding unreadable cache");
            T::default()
        }
    }
}

fn swallow(action: &str, err: &ClientError) {
    warn!(action, error = %err, "backend call failed, keeping local state");
}
