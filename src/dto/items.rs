use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Comment, Item};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub title: String,
    pub description: String,
    /// Image URLs; upload/storage happens out of band.
    pub images: Vec<String>,
    pub brand: String,
    pub category: String,
    pub quantity: i32,
    pub price: i64,
    pub low_stock_threshold: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveItemRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub item_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

/// Aggregate rating plus the full comment list for one item.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemRatings {
    pub rating: f64,
    pub total_ratings: i32,
    pub comments: Vec<Comment>,
}
