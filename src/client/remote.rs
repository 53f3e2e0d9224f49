use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::ClientError;
use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, UpdateQuantityRequest},
        contact::ContactRequest,
        orders::{PlaceOrderRequest, PlaceOrderResponse},
        wishlist::AddWishlistRequest,
    },
    models::{CartLine, Order, ProductId, PublicUser},
    response::ApiResponse,
    routes::health::HealthData,
};

/// The backend's collection endpoints, scoped by bearer token.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<PublicUser, ClientError>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;
    async fn health(&self) -> Result<String, ClientError>;

    async fn wishlist(&self, token: &str) -> Result<Vec<ProductId>, ClientError>;
    async fn add_wishlist_item(&self, token: &str, product_id: ProductId)
    -> Result<(), ClientError>;
    async fn remove_wishlist_item(
        &self,
        token: &str,
        product_id: ProductId,
    ) -> Result<(), ClientError>;

    async fn cart(&self, token: &str) -> Result<Vec<CartLine>, ClientError>;
    async fn add_cart_item(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError>;
    async fn update_cart_quantity(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError>;
    async fn remove_cart_item(&self, token: &str, product_id: ProductId)
    -> Result<(), ClientError>;

    async fn orders(&self, token: &str) -> Result<Vec<Order>, ClientError>;
    /// Returns the id the backend assigned.
    async fn place_order(
        &self,
        token: &str,
        request: &PlaceOrderRequest,
    ) -> Result<i64, ClientError>;

    async fn send_contact(&self, request: &ContactRequest) -> Result<(), ClientError>;
}

/// [`RemoteService`] over the JSON API.
pub struct HttpRemote {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// `base_url` includes the `/api` prefix, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and unwrap the `{message, data, meta}` envelope.
    async fn send_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            let body: ApiResponse<T> = response.json().await?;
            return Ok(body.data);
        }

        let message = response
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());

        if status == StatusCode::UNAUTHORIZED {
            Err(ClientError::Unauthorized(message))
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send_optional(request)
            .await?
            .ok_or_else(|| ClientError::Api {
                status: StatusCode::OK.as_u16(),
                message: "response carried no data".into(),
            })
    }

    async fn send_ignoring_body(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.send_optional::<serde_json::Value>(request)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    #[instrument(skip_all, fields(email = %request.email))]
    async fn register(&self, request: &RegisterRequest) -> Result<PublicUser, ClientError> {
        self.send(self.http.post(self.url("/register")).json(request))
            .await
    }

    #[instrument(skip_all, fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.send(self.http.post(self.url("/login")).json(request))
            .await
    }

    async fn health(&self) -> Result<String, ClientError> {
        let data: HealthData = self.send(self.http.get(self.url("/health"))).await?;
        Ok(data.status)
    }

    async fn wishlist(&self, token: &str) -> Result<Vec<ProductId>, ClientError> {
        self.send(self.http.get(self.url("/wishlist")).bearer_auth(token))
            .await
    }

    async fn add_wishlist_item(
        &self,
        token: &str,
        product_id: ProductId,
    ) -> Result<(), ClientError> {
        self.send_ignoring_body(
            self.http
                .post(self.url("/wishlist"))
                .bearer_auth(token)
                .json(&AddWishlistRequest {
                    product_id: Some(product_id),
                }),
        )
        .await
    }

    async fn remove_wishlist_item(
        &self,
        token: &str,
        product_id: ProductId,
    ) -> Result<(), ClientError> {
        self.send_ignoring_body(
            self.http
                .delete(self.url(&format!("/wishlist/{product_id}")))
                .bearer_auth(token),
        )
        .await
    }

    async fn cart(&self, token: &str) -> Result<Vec<CartLine>, ClientError> {
        self.send(self.http.get(self.url("/cart")).bearer_auth(token))
            .await
    }

    async fn add_cart_item(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        self.send_ignoring_body(
            self.http
                .post(self.url("/cart"))
                .bearer_auth(token)
                .json(&AddToCartRequest {
                    product_id: Some(product_id),
                    quantity,
                }),
        )
        .await
    }

    async fn update_cart_quantity(
        &self,
        token: &str,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ClientError> {
        self.send_ignoring_body(
            self.http
                .patch(self.url(&format!("/cart/{product_id}")))
                .bearer_auth(token)
                .json(&UpdateQuantityRequest {
                    quantity: Some(quantity),
                }),
        )
        .await
    }

    async fn remove_cart_item(
        &self,
        token: &str,
        product_id: ProductId,
    ) -> Result<(), ClientError> {
        self.send_ignoring_body(
            self.http
                .delete(self.url(&format!("/cart/{product_id}")))
                .bearer_auth(token),
        )
        .await
    }

    async fn orders(&self, token: &str) -> Result<Vec<Order>, ClientError> {
        self.send(self.http.get(self.url("/orders")).bearer_auth(token))
            .await
    }

    async fn place_order(
        &self,
        token: &str,
        request: &PlaceOrderRequest,
    ) -> Result<i64, ClientError> {
        let placed: PlaceOrderResponse = self
            .send(
                self.http
                    .post(self.url("/orders"))
                    .bearer_auth(token)
                    .json(request),
            )
            .await?;
        Ok(placed.order_id)
    }

    async fn send_contact(&self, request: &ContactRequest) -> Result<(), ClientError> {
        self.send_ignoring_body(self.http.post(self.url("/contact")).json(request))
            .await
    }
}
