use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};

use crate::{
    dto::wishlist::{AddWishlistRequest, WishlistIds},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::ProductId,
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist).post(add_to_wishlist))
        .route("/{product_id}", delete(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "Wishlisted product ids", body = ApiResponse<WishlistIds>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistIds>>> {
    Ok(Json(wishlist_service::list_wishlist(&state.orm, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/wishlist",
    request_body = AddWishlistRequest,
    responses(
        (status = 200, description = "Added to wishlist", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Bad Request")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<AddWishlistRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(
        wishlist_service::add_to_wishlist(&state.orm, &user, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{product_id}",
    params(
        ("product_id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<ProductId>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(
        wishlist_service::remove_from_wishlist(&state.orm, &user, product_id).await?,
    ))
}
