use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest};
use crate::{
    config::JwtConfig,
    db::DbPool,
    error::{AppError, AppResult},
    models::{PublicUser, User},
    response::{ApiResponse, Meta},
    validation::Validate,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn issue_token(jwt: &JwtConfig, user_id: Uuid, email: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(jwt.ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// A concurrent registration can pass the lookup and still lose the insert.
fn email_taken(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BadRequest("Email already registered".to_string())
        }
        other => AppError::DbError(other),
    }
}

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<PublicUser>> {
    payload.validate().map_err(AppError::Validation)?;
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;
    let email = email.trim().to_string();

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name.trim())
    .bind(email.as_str())
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(email_taken)?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::success(
        "User registered successfully",
        PublicUser::from(&user),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    pool: &DbPool,
    jwt: &JwtConfig,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

    let Some(user) = user else {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let token = issue_token(jwt, user.id, &user.email)?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::success(
        "Login successful",
        LoginResponse {
            token,
            user: PublicUser::from(&user),
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            ttl_hours: 2,
        }
    }

    #[test]
    fn issued_token_decodes_to_same_identity() {
        let user_id = Uuid::new_v4();
        let token = issue_token(&jwt(), user_id, "jane@example.com").unwrap();
        let user = decode_token(&jwt(), &token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "jane@example.com");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&jwt(), Uuid::new_v4(), "jane@example.com").unwrap();
        let other = JwtConfig {
            secret: "another".into(),
            ttl_hours: 2,
        };
        assert!(matches!(
            decode_token(&other, &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("secret1").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"secret1", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong", &parsed)
                .is_err()
        );
    }

    #[derive(Debug)]
    struct DuplicateEmail;

    impl std::fmt::Display for DuplicateEmail {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateEmail {}

    impl sqlx::error::DatabaseError for DuplicateEmail {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn lost_insert_race_reads_as_taken_email() {
        let err = email_taken(sqlx::Error::Database(Box::new(DuplicateEmail)));
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Email already registered"));

        let err = email_taken(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::DbError(sqlx::Error::RowNotFound)));
    }
}
