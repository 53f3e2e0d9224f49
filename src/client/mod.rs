//! Storefront client: keeps cart, wishlist and orders in a device-local cache
//! and reconciles them with the backend whenever the signed-in user changes.

use thiserror::Error;

use crate::validation::FieldErrors;

pub mod catalog;
pub mod local;
pub mod remote;
pub mod sync;
pub mod tracking;

pub use catalog::{Catalog, HttpCatalog, Product, ProductSort};
pub use local::{Collection, FileLocalStore, LocalStore, MemoryLocalStore};
pub use remote::{HttpRemote, RemoteService};
pub use sync::{CartItem, OrderRecord, Session, Storefront};
pub use tracking::{TrackingStep, TrackingView};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("local storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("local storage json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Order ID. Please enter an Order ID from your My Orders.")]
    OrderNotFound(String),

    #[error("Your cart is empty")]
    EmptyCart,
}

impl From<FieldErrors> for ClientError {
    fn from(errors: FieldErrors) -> Self {
        ClientError::Validation(errors)
    }
}
