use crate::{
    dto::cart::{AddToCartRequest, CartList, UpdateQuantityRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartLine, ProductId},
    response::{ApiResponse, Meta},
    state::AppState,
    store::QuantityUpdate,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items = state.sessions.cart(user.user_id).await?;
    let meta = Meta::new(items.len() as i64);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartLine>> {
    let Some(product_id) = payload.product_id.filter(|id| *id > 0) else {
        return Err(AppError::BadRequest("productId required".to_string()));
    };
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let line = state
        .sessions
        .merge_cart_line(user.user_id, product_id, payload.quantity)
        .await?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id = line.product_id,
        quantity = line.quantity,
        "cart line merged"
    );
    Ok(ApiResponse::success("Added to cart", line, Some(Meta::empty())))
}

/// A quantity below one drops the line instead of storing it.
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: ProductId,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<Option<CartLine>>> {
    let Some(quantity) = payload.quantity else {
        return Err(AppError::BadRequest("quantity required".to_string()));
    };
    match state
        .sessions
        .set_quantity(user.user_id, product_id, quantity)
        .await?
    {
        QuantityUpdate::Updated(line) => Ok(ApiResponse::success(
            "Quantity updated",
            Some(line),
            Some(Meta::empty()),
        )),
        QuantityUpdate::Removed => Ok(ApiResponse::success("Removed", None, Some(Meta::empty()))),
        QuantityUpdate::Missing => Err(AppError::NotFound),
    }
}

/// Removing a product that is not in the cart still succeeds.
pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: ProductId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = state
        .sessions
        .remove_cart_line(user.user_id, product_id)
        .await?;
    tracing::debug!(user_id = %user.user_id, product_id, removed, "cart line removed");

    Ok(ApiResponse::success(
        "Removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
