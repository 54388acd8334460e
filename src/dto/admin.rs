use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Storewide dashboard counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub monthly_sales: i64,
    pub monthly_order_count: i64,
    pub total_users: i64,
    pub active_vendors: i64,
    pub pending_orders: i64,
    pub low_stock_items: i64,
    pub new_reviews: i64,
}

/// Dashboard counters scoped to one admin's items.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardStats {
    pub monthly_sales: i64,
    pub monthly_order_count: i64,
    pub pending_orders: i64,
    pub low_stock_items: i64,
    pub new_reviews: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesPoint {
    pub month: &'static str,
    pub year: i64,
    pub sales: i64,
    pub orders: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesGraph {
    pub points: Vec<SalesPoint>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct Review {
    pub product_id: Uuid,
    pub product_title: String,
    pub username: String,
    pub email: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub reviews: Vec<Review>,
}
