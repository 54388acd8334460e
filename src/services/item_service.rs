use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::items::{AddCommentRequest, ApproveItemRequest, CreateItemRequest, ItemList, ItemRatings},
    entity::comments::{
        ActiveModel as CommentActive, Column as CommentCol, Entity as Comments,
        Model as CommentModel,
    },
    entity::items::{ActiveModel as ItemActive, Column as ItemCol, Entity as Items, Model as ItemModel},
    entity::users::{Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    events::RealtimeEvent,
    middleware::auth::AuthUser,
    models::{Comment, Item},
    response::{ApiResponse, Meta},
    routes::params::{CatalogQuery, CatalogSort},
    services::notification_service,
    state::AppState,
};

const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

pub async fn create_item(
    state: &AppState,
    admin: &AuthUser,
    payload: CreateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    if payload.title.trim().is_empty() || payload.brand.trim().is_empty() {
        return Err(AppError::BadRequest("Title and brand are required".into()));
    }
    if payload.images.is_empty() {
        return Err(AppError::BadRequest("At least one image is required".into()));
    }
    if payload.quantity < 0 {
        return Err(AppError::BadRequest("Quantity cannot be negative".into()));
    }
    if payload.price <= 0 {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }

    let owner = Users::find_by_id(admin.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let threshold = payload
        .low_stock_threshold
        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);

    let item = ItemActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        title: Set(payload.title),
        description: Set(payload.description),
        images: Set(serde_json::json!(payload.images)),
        brand: Set(payload.brand),
        category: Set(payload.category),
        quantity: Set(payload.quantity),
        price: Set(payload.price),
        low_stock_threshold: Set(threshold),
        is_low_stock: Set(payload.quantity <= threshold),
        rating: Set(0.0),
        total_ratings: Set(0),
        // New items wait for warehouse approval.
        status: Set("pending".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let details = serde_json::json!({
        "itemTitle": item.title,
        "itemId": item.id,
        "brand": item.brand,
        "category": item.category,
        "quantity": item.quantity,
    });
    if let Err(err) = notification_service::record(
        &state.orm,
        "new_item",
        "New item awaiting approval",
        details,
        owner.id,
        Some(item.id),
    )
    .await
    {
        tracing::warn!(error = %err, "notification insert failed");
    }

    state.events.publish(RealtimeEvent::NewProduct {
        title: item.title.clone(),
        quantity: item.quantity,
        category: item.category.clone(),
        added_by: owner.username.clone(),
        status: item.status.clone(),
    });

    Ok(ApiResponse::success(
        "Item added successfully",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn approve_item(
    state: &AppState,
    admin: &AuthUser,
    item_id: Uuid,
    payload: ApproveItemRequest,
) -> AppResult<ApiResponse<Item>> {
    if payload.status != "approved" && payload.status != "rejected" {
        return Err(AppError::BadRequest("Invalid status value".into()));
    }

    let item = Items::find_by_id(item_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if item.status == payload.status {
        return Err(AppError::BadRequest(format!(
            "Item is already {}",
            payload.status
        )));
    }

    let owner_id = item.owner_id;
    let title = item.title.clone();

    let mut active: ItemActive = item.into();
    active.status = Set(payload.status.clone());
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    let details = serde_json::json!({
        "itemTitle": title,
        "status": payload.status,
        "processedBy": admin.user_id,
    });
    if let Err(err) = notification_service::record(
        &state.orm,
        "approval",
        &format!("Your item {title} has been {}", payload.status),
        details,
        owner_id,
        Some(item.id),
    )
    .await
    {
        tracing::warn!(error = %err, "notification insert failed");
    }

    Ok(ApiResponse::success(
        format!("Item {} successfully", payload.status),
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// Public catalog: approved items only, with the storefront filters.
pub async fn list_catalog(
    state: &AppState,
    query: CatalogQuery,
) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(ItemCol::Status.eq("approved"));

    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(ItemCol::Category.eq(category.clone()));
    }
    if let Some(brand) = query.brand.as_ref().filter(|b| !b.is_empty()) {
        condition = condition.add(ItemCol::Brand.eq(brand.clone()));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(ItemCol::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(ItemCol::Price.lte(max_price));
    }

    let mut finder = Items::find().filter(condition);
    finder = match query.sort.unwrap_or(CatalogSort::Newest) {
        CatalogSort::Newest => finder.order_by_desc(ItemCol::CreatedAt),
        CatalogSort::PriceLow => finder.order_by_asc(ItemCol::Price),
        CatalogSort::PriceHigh => finder.order_by_desc(ItemCol::Price),
        CatalogSort::Rating => finder.order_by_desc(ItemCol::Rating),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products retrieved successfully",
        ItemList { items },
        Some(meta),
    ))
}

pub async fn add_comment_and_rating(
    state: &AppState,
    user: &AuthUser,
    payload: AddCommentRequest,
) -> AppResult<ApiResponse<ItemRatings>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
    }
    if payload.comment.trim().is_empty() {
        return Err(AppError::BadRequest("Comment is required".into()));
    }

    let txn = state.orm.begin().await?;

    let item = Items::find_by_id(payload.item_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let already_rated = Comments::find()
        .filter(CommentCol::ItemId.eq(item.id))
        .filter(CommentCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .is_some();
    if already_rated {
        return Err(AppError::BadRequest("You have already rated this item".into()));
    }

    CommentActive {
        id: Set(Uuid::new_v4()),
        item_id: Set(item.id),
        user_id: Set(user.user_id),
        rating: Set(payload.rating),
        body: Set(payload.comment),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let new_rating = next_average(item.rating, item.total_ratings, payload.rating);
    let new_total = item.total_ratings + 1;
    let item_id = item.id;

    let mut active: ItemActive = item.into();
    active.rating = Set(new_rating);
    active.total_ratings = Set(new_total);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    txn.commit().await?;

    let comments = item_comments(state, item_id).await?;
    Ok(ApiResponse::success(
        "Rating and comment added successfully",
        ItemRatings {
            rating: new_rating,
            total_ratings: new_total,
            comments,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_item_comments(
    state: &AppState,
    item_id: Uuid,
) -> AppResult<ApiResponse<ItemRatings>> {
    let item = Items::find_by_id(item_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let comments = item_comments(state, item.id).await?;
    Ok(ApiResponse::success(
        "Item ratings",
        ItemRatings {
            rating: item.rating,
            total_ratings: item.total_ratings,
            comments,
        },
        Some(Meta::empty()),
    ))
}

async fn item_comments(state: &AppState, item_id: Uuid) -> AppResult<Vec<Comment>> {
    let rows = Comments::find()
        .filter(CommentCol::ItemId.eq(item_id))
        .order_by_desc(CommentCol::CreatedAt)
        .find_also_related(Users)
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(comment, user)| user.map(|u| comment_from_entity(comment, u)))
        .collect())
}

/// Online mean update; avoids recomputing from the full comment history.
pub fn next_average(old_rating: f64, total_ratings: i32, rating: i32) -> f64 {
    (old_rating * total_ratings as f64 + rating as f64) / (total_ratings + 1) as f64
}

fn comment_from_entity(comment: CommentModel, user: UserModel) -> Comment {
    Comment {
        id: comment.id,
        item_id: comment.item_id,
        user_id: comment.user_id,
        username: user.username,
        email: user.email,
        rating: comment.rating,
        body: comment.body,
        created_at: comment.created_at.with_timezone(&Utc),
    }
}

pub fn item_from_entity(model: ItemModel) -> Item {
    Item {
        id: model.id,
        owner_id: model.owner_id,
        title: model.title,
        description: model.description,
        images: model.images,
        brand: model.brand,
        category: model.category,
        quantity: model.quantity,
        price: model.price,
        low_stock_threshold: model.low_stock_threshold,
        is_low_stock: model.is_low_stock,
        rating: model.rating,
        total_ratings: model.total_ratings,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::next_average;

    #[test]
    fn average_of_first_rating_is_the_rating() {
        assert_eq!(next_average(0.0, 0, 4), 4.0);
    }

    #[test]
    fn average_after_four_then_five_is_four_point_five() {
        let after_first = next_average(0.0, 0, 4);
        let after_second = next_average(after_first, 1, 5);
        assert_eq!(after_second, 4.5);
    }

    #[test]
    fn average_stays_within_rating_bounds() {
        let mut rating = 0.0;
        for (n, r) in [5, 1, 3, 2, 4].into_iter().enumerate() {
            rating = next_average(rating, n as i32, r);
            assert!((1.0..=5.0).contains(&rating));
        }
        assert!((rating - 3.0).abs() < 1e-9);
    }
}
