use crate::{
    dto::orders::{OrderList, PlaceOrderRequest, PlaceOrderResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderItem, order_total},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = state.sessions.orders(user.user_id).await?;
    let meta = Meta::new(orders.len() as i64);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Records the order exactly as the client priced it and empties the cart.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlaceOrderResponse>> {
    let items: Vec<OrderItem> = payload.items.into_iter().map(OrderItem::from).collect();
    if items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let total_amount = payload
        .total_amount
        .unwrap_or_else(|| order_total(&items));

    let order = state
        .sessions
        .place_order(user.user_id, items, total_amount)
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        order_id = order.id,
        total_amount = order.total_amount,
        "order placed"
    );

    Ok(ApiResponse::success(
        "Order placed",
        PlaceOrderResponse { order_id: order.id },
        Some(Meta::empty()),
    ))
}
