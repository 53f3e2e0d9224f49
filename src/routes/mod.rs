use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod contact;
pub mod doc;
pub mod health;
pub mod orders;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .route("/health", get(health::health_check))
        .nest("/wishlist", wishlist::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::route())
        .nest("/contact", contact::router())
}
