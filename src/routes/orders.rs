use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::{OrderList, PlaceOrderRequest, PlaceOrderResponse},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn route() -> Router<AppState> {
    Router::new().route("/", get(list_orders).post(place_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders for current user, newest first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(order_service::list_orders(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = ApiResponse<PlaceOrderResponse>),
        (status = 400, description = "Bad request")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<PlaceOrderResponse>>> {
    Ok(Json(
        order_service::place_order(&state, &user, payload).await?,
    ))
}
