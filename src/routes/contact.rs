use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::contact::ContactRequest,
    error::AppResult,
    middleware::json::ApiJson,
    models::ContactMessage,
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_contact))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message received", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Missing name, email or message")
    ),
    tag = "Contact"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ContactRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    Ok(Json(
        contact_service::submit_message(&state.pool, payload).await?,
    ))
}
