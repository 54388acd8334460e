use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems, PlaceOrderRequest, UpdateOrderStatusRequest},
    entity::items::{Column as ItemCol, Entity as Items, Model as ItemModel},
    entity::order_items::{
        ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        Model as OrderItemModel,
    },
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    entity::users::Entity as Users,
    error::{AppError, AppResult},
    events::RealtimeEvent,
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::notification_service,
    state::AppState,
};

const VALID_ORDER_STATUSES: [&str; 4] = ["pending", "confirmed", "shipped", "delivered"];

/// Convert a cart into a persisted order while enforcing stock.
///
/// Each line decrements stock with a single conditional update, so two
/// concurrent orders cannot both pass the availability check and oversell.
/// The whole request runs in one transaction: a failed line rolls back the
/// decrements of every earlier line.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest(
            "Items and shipping address are required".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let mut total_amount: i64 = 0;
    let mut snapshots: Vec<(ItemModel, i32)> = Vec::new();

    // Lines are processed in list order; duplicate item ids count as
    // independent lines, each decremented atomically.
    for line in &payload.items {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Quantity must be positive".into()));
        }

        let item = Items::find_by_id(line.item_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let result = Items::update_many()
            .col_expr(
                ItemCol::Quantity,
                Expr::col(ItemCol::Quantity).sub(line.quantity),
            )
            .col_expr(
                ItemCol::IsLowStock,
                Expr::col(ItemCol::Quantity)
                    .sub(line.quantity)
                    .lte(Expr::col(ItemCol::LowStockThreshold)),
            )
            .filter(ItemCol::Id.eq(line.item_id))
            .filter(ItemCol::Quantity.gte(line.quantity))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::BadRequest(format!(
                "Insufficient quantity for item {}",
                item.title
            )));
        }

        total_amount += item.price * line.quantity as i64;
        snapshots.push((item, line.quantity));
    }

    let shipping_address = serde_json::to_value(&payload.shipping_address)
        .map_err(|e| AppError::Internal(e.into()))?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set("pending".into()),
        shipping_address: Set(shipping_address),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for (item, quantity) in &snapshots {
        let line = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            item_id: Set(item.id),
            quantity: Set(*quantity),
            // Price snapshot at order time; the order never re-reads the item.
            price: Set(item.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(line));
    }

    txn.commit().await?;

    let customer_name = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .map(|u| u.username)
        .unwrap_or_else(|| "unknown".into());

    state.events.publish(RealtimeEvent::NewOrder {
        order_id: order.id,
        customer_name: customer_name.clone(),
        total_amount: order.total_amount,
        item_count: order_items.len(),
        order_status: order.status.clone(),
    });

    let details = serde_json::json!({
        "orderId": order.id,
        "customerName": customer_name,
        "totalAmount": order.total_amount,
        "itemCount": order_items.len(),
    });
    if let Err(err) = notification_service::record(
        &state.orm,
        "order",
        "New order received",
        details,
        user.user_id,
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "notification insert failed");
    }

    for (item, quantity) in &snapshots {
        let crossed = item.quantity > item.low_stock_threshold
            && item.quantity - quantity <= item.low_stock_threshold;
        if !crossed {
            continue;
        }
        let details = serde_json::json!({
            "itemTitle": item.title,
            "remaining": item.quantity - quantity,
            "threshold": item.low_stock_threshold,
        });
        if let Err(err) = notification_service::record(
            &state.orm,
            "low_stock",
            &format!("{} is low on stock", item.title),
            details,
            item.owner_id,
            Some(item.id),
        )
        .await
        {
            tracing::warn!(error = %err, "notification insert failed");
        }
    }

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut lines_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for line in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .all(&state.orm)
        .await?
    {
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(order_item_from_entity(line));
    }

    let items = orders
        .into_iter()
        .map(|order| {
            let items = lines_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems {
                order: order_from_entity(order),
                items,
            }
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn update_order_status(
    state: &AppState,
    order_id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    if !VALID_ORDER_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::BadRequest("Invalid order status".into()));
    }

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status.clone());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    let message = format!("Order status updated to {}", order.status);

    state.events.publish(RealtimeEvent::OrderStatusUpdate {
        order_id: order.id,
        status: order.status.clone(),
        message: message.clone(),
    });

    let details = serde_json::json!({ "orderId": order.id, "status": order.status });
    if let Err(err) = notification_service::record(
        &state.orm,
        "order",
        &message,
        details,
        order.user_id,
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "notification insert failed");
    }

    Ok(ApiResponse::success(
        "Order status updated successfully",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        status: model.status,
        shipping_address: model.shipping_address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        item_id: model.item_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
