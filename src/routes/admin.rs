use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::admin::{AdminDashboardStats, DashboardStats, ReviewList, SalesGraph},
    dto::items::ItemList,
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::AdminUser,
    models::Order,
    response::ApiResponse,
    routes::params::{OrderListQuery, Pagination, ReviewQuery},
    services::{admin_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{order_id}/status", put(update_order_status))
        .route("/products", get(list_admin_products))
        .route("/low-stock", get(list_low_stock))
        .route("/dashboard-stats", get(admin_dashboard_stats))
        .route("/sales-graph", get(admin_sales_graph))
        .route("/stats", get(dashboard_stats))
        .route("/stats/sales-graph", get(sales_graph))
        .route("/reviews", get(list_reviews))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "All orders with line snapshots", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_all_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/item/admin/orders/{order_id}/status",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "The calling admin's items", body = ApiResponse<ItemList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_admin_products(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = admin_service::list_admin_products(&state, &admin, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Items at or below their threshold", body = ApiResponse<ItemList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = admin_service::list_low_stock(&state, &admin, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/dashboard-stats",
    responses(
        (status = 200, description = "Counters scoped to the calling admin", body = ApiResponse<AdminDashboardStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_dashboard_stats(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<ApiResponse<AdminDashboardStats>>> {
    let resp = admin_service::admin_dashboard_stats(&state, &admin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/sales-graph",
    responses(
        (status = 200, description = "Six-month sales for the calling admin", body = ApiResponse<SalesGraph>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_sales_graph(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<ApiResponse<SalesGraph>>> {
    let resp = admin_service::admin_sales_graph(&state, &admin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/stats",
    responses(
        (status = 200, description = "Storewide dashboard counters", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = admin_service::dashboard_stats(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/stats/sales-graph",
    responses(
        (status = 200, description = "Storewide six-month sales", body = ApiResponse<SalesGraph>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn sales_graph(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<ApiResponse<SalesGraph>>> {
    let resp = admin_service::sales_graph(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/admin/reviews",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("rating" = Option<i32>, Query, description = "Filter by exact rating"),
        ("product_id" = Option<Uuid>, Query, description = "Filter by item"),
        ("start_date" = Option<String>, Query, description = "RFC 3339 lower bound"),
        ("end_date" = Option<String>, Query, description = "RFC 3339 upper bound"),
        ("sort" = Option<String>, Query, description = "newest, oldest, highest, lowest")
    ),
    responses(
        (status = 200, description = "Reviews on the calling admin's items", body = ApiResponse<ReviewList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = admin_service::list_reviews(&state, &admin, query).await?;
    Ok(Json(resp))
}
