use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::wishlist::{AddWishlistRequest, WishlistIds},
    entity::{
        wishlist_items::{
            ActiveModel as WishlistItemActive, Column as ItemCol, Entity as WishlistItems,
        },
        wishlists::{ActiveModel as WishlistActive, Column as WishlistCol, Entity as Wishlists},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::ProductId,
    response::{ApiResponse, Meta},
};

async fn find_wishlist(orm: &OrmConn, user_id: Uuid) -> AppResult<Option<Uuid>> {
    let id = Wishlists::find()
        .select_only()
        .column(WishlistCol::Id)
        .filter(WishlistCol::UserId.eq(user_id))
        .into_tuple::<Uuid>()
        .one(orm)
        .await?;
    Ok(id)
}

/// Returns the user's wishlist id, creating the row on first use.
async fn ensure_wishlist(orm: &OrmConn, user_id: Uuid) -> AppResult<Uuid> {
    if let Some(id) = find_wishlist(orm, user_id).await? {
        return Ok(id);
    }

    Wishlists::insert(WishlistActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(WishlistCol::UserId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    find_wishlist(orm, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("wishlist row missing after insert")))
}

pub async fn list_wishlist(orm: &OrmConn, user: &AuthUser) -> AppResult<ApiResponse<WishlistIds>> {
    let wishlist_id = ensure_wishlist(orm, user.user_id).await?;

    let items: Vec<ProductId> = WishlistItems::find()
        .select_only()
        .column(ItemCol::ProductId)
        .filter(ItemCol::WishlistId.eq(wishlist_id))
        .order_by_asc(ItemCol::CreatedAt)
        .into_tuple::<i64>()
        .all(orm)
        .await?;

    let meta = Meta::new(items.len() as i64);
    Ok(ApiResponse::success("OK", WishlistIds { items }, Some(meta)))
}

/// Adding a product twice leaves a single entry.
pub async fn add_to_wishlist(
    orm: &OrmConn,
    user: &AuthUser,
    payload: AddWishlistRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let Some(product_id) = payload.product_id.filter(|id| *id > 0) else {
        return Err(AppError::BadRequest("productId required".into()));
    };

    let wishlist_id = ensure_wishlist(orm, user.user_id).await?;

    let inserted = WishlistItems::insert(WishlistItemActive {
        id: Set(Uuid::new_v4()),
        wishlist_id: Set(wishlist_id),
        product_id: Set(product_id),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([ItemCol::WishlistId, ItemCol::ProductId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id,
        inserted,
        "wishlist add"
    );
    Ok(ApiResponse::success(
        "Added to wishlist",
        serde_json::json!({ "product_id": product_id }),
        Some(Meta::empty()),
    ))
}

/// Succeeds whether or not the product was on the list.
pub async fn remove_from_wishlist(
    orm: &OrmConn,
    user: &AuthUser,
    product_id: ProductId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if let Some(wishlist_id) = find_wishlist(orm, user.user_id).await? {
        let result = WishlistItems::delete_many()
            .filter(ItemCol::WishlistId.eq(wishlist_id))
            .filter(ItemCol::ProductId.eq(product_id))
            .exec(orm)
            .await?;
        tracing::debug!(
            user_id = %user.user_id,
            product_id,
            removed = result.rows_affected,
            "wishlist remove"
        );
    }

    Ok(ApiResponse::success(
        "Removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
