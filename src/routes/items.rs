use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::items::{AddCommentRequest, ApproveItemRequest, CreateItemRequest, ItemList, ItemRatings},
    dto::orders::{OrderWithItems, PlaceOrderRequest},
    error::AppResult,
    middleware::auth::{AdminUser, AuthUser},
    models::Item,
    response::ApiResponse,
    routes::params::CatalogQuery,
    services::{item_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-new-item", post(create_item))
        .route("/products", get(list_catalog))
        .route("/items/{item_id}/approve", put(approve_item))
        .route("/place-order", post(place_order))
        .route("/comment", post(add_comment))
        .route("/comments/{item_id}", get(get_comments))
}

#[utoipa::path(
    post,
    path = "/api/v1/item/create-new-item",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created pending approval", body = ApiResponse<Item>),
        (status = 400, description = "Missing required fields"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateItemRequest>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::create_item(&state, &admin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/products",
    params(
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("brand" = Option<String>, Query, description = "Filter by brand"),
        ("min_price" = Option<i64>, Query, description = "Minimum price"),
        ("max_price" = Option<i64>, Query, description = "Maximum price"),
        ("sort" = Option<String>, Query, description = "newest, price-low, price-high, rating"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Approved catalog items", body = ApiResponse<ItemList>)
    ),
    tag = "Items"
)]
pub async fn list_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = item_service::list_catalog(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/item/items/{item_id}/approve",
    params(("item_id" = Uuid, Path, description = "Item ID")),
    request_body = ApproveItemRequest,
    responses(
        (status = 200, description = "Item approved or rejected", body = ApiResponse<Item>),
        (status = 400, description = "Invalid status or no-op transition"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn approve_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<ApproveItemRequest>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::approve_item(&state, &admin, item_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/item/place-order",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart or insufficient stock"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/item/comment",
    request_body = AddCommentRequest,
    responses(
        (status = 200, description = "Rating and comment added", body = ApiResponse<ItemRatings>),
        (status = 400, description = "Invalid rating or already rated"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<Json<ApiResponse<ItemRatings>>> {
    let resp = item_service::add_comment_and_rating(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/comments/{item_id}",
    params(("item_id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item rating and comments", body = ApiResponse<ItemRatings>),
        (status = 404, description = "Item not found")
    ),
    tag = "Items"
)]
pub async fn get_comments(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ItemRatings>>> {
    let resp = item_service::get_item_comments(&state, item_id).await?;
    Ok(Json(resp))
}
