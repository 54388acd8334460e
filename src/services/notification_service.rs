use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::notifications::{MarkReadRequest, MarkReadResponse, NotificationList},
    entity::notifications::{
        ActiveModel as NotificationActive, Column as NotificationCol, Entity as Notifications,
        Model as NotificationModel,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Notification,
    response::{ApiResponse, Meta},
    routes::params::NotificationQuery,
    state::AppState,
};

/// Persist one notification record. Callers treat failures as non-fatal:
/// the triggering request already succeeded.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    kind: &str,
    message: &str,
    details: serde_json::Value,
    user_id: Uuid,
    item_id: Option<Uuid>,
) -> AppResult<()> {
    NotificationActive {
        id: Set(Uuid::new_v4()),
        kind: Set(kind.to_string()),
        message: Set(message.to_string()),
        details: Set(Some(details)),
        is_read: Set(false),
        user_id: Set(user_id),
        item_id: Set(item_id),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    query: NotificationQuery,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut finder = Notifications::find();
    // Non-admins only see their own rows; admins see everything.
    if user.role != "admin" {
        finder = finder.filter(NotificationCol::UserId.eq(user.user_id));
    }
    if let Some(read) = query.read {
        finder = finder.filter(NotificationCol::IsRead.eq(read));
    }
    if let Some(kind) = query.kind.as_ref().filter(|k| !k.is_empty()) {
        finder = finder.filter(NotificationCol::Kind.eq(kind.clone()));
    }
    finder = finder.order_by_desc(NotificationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let notifications = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(notification_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { notifications },
        Some(meta),
    ))
}

pub async fn mark_notifications_read(
    state: &AppState,
    user: &AuthUser,
    payload: MarkReadRequest,
) -> AppResult<ApiResponse<MarkReadResponse>> {
    let mut update = Notifications::update_many()
        .col_expr(NotificationCol::IsRead, Expr::value(true))
        .filter(NotificationCol::Id.is_in(payload.notification_ids));
    if user.role != "admin" {
        update = update.filter(NotificationCol::UserId.eq(user.user_id));
    }
    let result = update.exec(&state.orm).await?;

    Ok(ApiResponse::success(
        "Notifications marked as read",
        MarkReadResponse {
            modified_count: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

pub fn notification_from_entity(model: NotificationModel) -> Notification {
    Notification {
        id: model.id,
        kind: model.kind,
        message: model.message,
        details: model.details,
        is_read: model.is_read,
        user_id: model.user_id,
        item_id: model.item_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
