use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartList, UpdateQuantityRequest},
        contact::ContactRequest,
        orders::{OrderItemInput, OrderList, PlaceOrderRequest, PlaceOrderResponse},
        wishlist::{AddWishlistRequest, WishlistIds},
    },
    models::{CartLine, ContactMessage, Order, OrderItem, PublicUser},
    response::{ApiResponse, Meta},
    routes::{auth, cart, contact, health, orders, wishlist},
    validation::FieldErrors,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        orders::list_orders,
        orders::place_order,
        contact::submit_contact
    ),
    components(
        schemas(
            PublicUser,
            CartLine,
            Order,
            OrderItem,
            ContactMessage,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateQuantityRequest,
            CartList,
            AddWishlistRequest,
            WishlistIds,
            OrderItemInput,
            PlaceOrderRequest,
            PlaceOrderResponse,
            OrderList,
            ContactRequest,
            FieldErrors,
            health::HealthData,
            Meta,
            ApiResponse<PublicUser>,
            ApiResponse<LoginResponse>,
            ApiResponse<CartList>,
            ApiResponse<CartLine>,
            ApiResponse<WishlistIds>,
            ApiResponse<OrderList>,
            ApiResponse<PlaceOrderResponse>,
            ApiResponse<ContactMessage>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Cart", description = "In-memory cart endpoints"),
        (name = "Orders", description = "In-memory order endpoints"),
        (name = "Contact", description = "Contact form endpoint"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
