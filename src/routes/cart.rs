use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};

use crate::{
    dto::cart::{AddToCartRequest, CartList, UpdateQuantityRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::{CartLine, ProductId},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart))
        .route(
            "/{product_id}",
            patch(update_quantity).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines for current user", body = ApiResponse<CartList>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    Ok(Json(cart_service::list_cart(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add to an existing line or create it", body = ApiResponse<CartLine>),
        (status = 400, description = "Bad request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartLine>>> {
    Ok(Json(cart_service::add_to_cart(&state, &user, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = i64, Path, description = "Product ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity set, or line removed when below one", body = ApiResponse<CartLine>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<ProductId>,
    ApiJson(payload): ApiJson<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<Option<CartLine>>>> {
    Ok(Json(
        cart_service::update_quantity(&state, &user, product_id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<ProductId>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(
        cart_service::remove_from_cart(&state, &user, product_id).await?,
    ))
}
