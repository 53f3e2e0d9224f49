use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem, ProductId};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    #[serde(alias = "product_id")]
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price in minor units, trusted as sent.
    #[serde(default)]
    pub price: i64,
}

impl From<OrderItemInput> for OrderItem {
    fn from(input: OrderItemInput) -> Self {
        OrderItem {
            product_id: input.product_id,
            quantity: input.quantity,
            price: input.price,
        }
    }
}

impl From<&OrderItem> for OrderItemInput {
    fn from(item: &OrderItem) -> Self {
        OrderItemInput {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    /// Missing totals are derived from the items.
    #[serde(default, alias = "total_amount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    #[serde(alias = "order_id")]
    pub order_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}
