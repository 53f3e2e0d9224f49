use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::contact::ContactRequest,
    error::{AppError, AppResult},
    models::ContactMessage,
    response::{ApiResponse, Meta},
    validation::Validate,
};

pub async fn submit_message(
    pool: &DbPool,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    payload.validate().map_err(AppError::Validation)?;

    let subject = payload
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let message: ContactMessage = sqlx::query_as(
        r#"
        INSERT INTO contact_messages (id, name, email, subject, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(subject)
    .bind(payload.message.trim())
    .fetch_one(pool)
    .await?;

    tracing::info!(message_id = %message.id, "contact message stored");
    Ok(ApiResponse::success(
        "Message received",
        message,
        Some(Meta::empty()),
    ))
}
