pub mod users;
pub mod wishlist_items;
pub mod wishlists;

pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
pub use wishlists::Entity as Wishlists;
