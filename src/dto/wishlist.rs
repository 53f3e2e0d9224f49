use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ProductId;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddWishlistRequest {
    #[serde(default, alias = "product_id")]
    pub product_id: Option<ProductId>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct WishlistIds {
    #[schema(value_type = Vec<i64>)]
    pub items: Vec<ProductId>,
}
