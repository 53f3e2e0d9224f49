pub mod auth;
pub mod cart;
pub mod contact;
pub mod orders;
pub mod wishlist;
