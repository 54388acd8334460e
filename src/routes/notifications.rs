use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, put},
};

use crate::{
    dto::notifications::{MarkReadRequest, MarkReadResponse, NotificationList},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::NotificationQuery,
    services::notification_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/mark-read", put(mark_read))
}

#[utoipa::path(
    get,
    path = "/api/v1/item/notifications",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("read" = Option<bool>, Query, description = "Filter by read state"),
        ("type" = Option<String>, Query, description = "Filter by notification type")
    ),
    responses(
        (status = 200, description = "Notifications, newest first", body = ApiResponse<NotificationList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<ApiResponse<NotificationList>>> {
    let resp = notification_service::list_notifications(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/item/notifications/mark-read",
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Notifications marked as read", body = ApiResponse<MarkReadResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MarkReadRequest>,
) -> AppResult<Json<ApiResponse<MarkReadResponse>>> {
    let resp = notification_service::mark_notifications_read(&state, &user, payload).await?;
    Ok(Json(resp))
}
