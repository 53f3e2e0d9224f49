use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CartLine, ProductId};

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(default, alias = "product_id")]
    pub product_id: Option<ProductId>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateQuantityRequest {
    #[serde(default)]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<CartLine>)]
    pub items: Vec<CartLine>,
}
