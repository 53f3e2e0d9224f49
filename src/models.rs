use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog product identifier. Products live in the external catalog, the
/// backend only ever stores their ids.
pub type ProductId = i64;

/// Status every order is created with. Orders are never transitioned.
pub const ORDER_STATUS_PLACED: &str = "placed";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price in minor units.
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Sum of `price * quantity` over the given lines.
pub fn order_total<'a, I>(items: I) -> i64
where
    I: IntoIterator<Item = &'a OrderItem>,
{
    items
        .into_iter()
        .map(|item| item.price * i64::from(item.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_total_sums_price_times_quantity() {
        let items = vec![
            OrderItem {
                product_id: 1,
                quantity: 2,
                price: 1099,
            },
            OrderItem {
                product_id: 7,
                quantity: 1,
                price: 550,
            },
        ];
        assert_eq!(order_total(&items), 2 * 1099 + 550);
        assert_eq!(order_total(&Vec::<OrderItem>::new()), 0);
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password_hash: "secret-hash".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "jane@example.com");
    }
}
