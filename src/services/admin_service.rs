use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::admin::{AdminDashboardStats, DashboardStats, Review, ReviewList, SalesGraph, SalesPoint},
    dto::items::ItemList,
    entity::items::{Column as ItemCol, Entity as Items},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ReviewQuery, ReviewSort},
    services::item_service::item_from_entity,
    state::AppState,
};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Storewide counters for the warehouse dashboard.
pub async fn dashboard_stats(state: &AppState) -> AppResult<ApiResponse<DashboardStats>> {
    let (monthly_sales, monthly_order_count): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_amount), 0)::BIGINT, COUNT(*) FROM orders \
         WHERE created_at >= date_trunc('month', now())",
    )
    .fetch_one(&state.pool)
    .await?;

    let (total_users,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'user'")
            .fetch_one(&state.pool)
            .await?;
    let (active_vendors,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&state.pool)
            .await?;
    let (pending_orders,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = 'pending'")
            .fetch_one(&state.pool)
            .await?;
    let (low_stock_items,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM items WHERE is_low_stock")
            .fetch_one(&state.pool)
            .await?;
    let (new_reviews,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM comments WHERE created_at >= now() - INTERVAL '7 days'",
    )
    .fetch_one(&state.pool)
    .await?;

    let stats = DashboardStats {
        monthly_sales,
        monthly_order_count,
        total_users,
        active_vendors,
        pending_orders,
        low_stock_items,
        new_reviews,
    };
    Ok(ApiResponse::success("Dashboard stats", stats, None))
}

/// Same counters scoped to orders containing the calling admin's items;
/// sales count only that admin's lines.
pub async fn admin_dashboard_stats(
    state: &AppState,
    admin: &AuthUser,
) -> AppResult<ApiResponse<AdminDashboardStats>> {
    let (monthly_sales, monthly_order_count): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(oi.price * oi.quantity), 0)::BIGINT, COUNT(DISTINCT o.id) \
         FROM orders o \
         JOIN order_items oi ON oi.order_id = o.id \
         JOIN items i ON i.id = oi.item_id \
         WHERE i.owner_id = $1 AND o.created_at >= date_trunc('month', now())",
    )
    .bind(admin.user_id)
    .fetch_one(&state.pool)
    .await?;

    let (pending_orders,): (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT o.id) FROM orders o \
         JOIN order_items oi ON oi.order_id = o.id \
         JOIN items i ON i.id = oi.item_id \
         WHERE i.owner_id = $1 AND o.status = 'pending'",
    )
    .bind(admin.user_id)
    .fetch_one(&state.pool)
    .await?;

    let (low_stock_items,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM items WHERE owner_id = $1 AND is_low_stock")
            .bind(admin.user_id)
            .fetch_one(&state.pool)
            .await?;

    let (new_reviews,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM comments c JOIN items i ON i.id = c.item_id \
         WHERE i.owner_id = $1 AND c.created_at >= now() - INTERVAL '7 days'",
    )
    .bind(admin.user_id)
    .fetch_one(&state.pool)
    .await?;

    let stats = AdminDashboardStats {
        monthly_sales,
        monthly_order_count,
        pending_orders,
        low_stock_items,
        new_reviews,
    };
    Ok(ApiResponse::success("Dashboard stats", stats, None))
}

/// Six months of sales totals for confirmed/shipped/delivered orders.
pub async fn sales_graph(state: &AppState) -> AppResult<ApiResponse<SalesGraph>> {
    let rows: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
        "SELECT EXTRACT(YEAR FROM created_at)::BIGINT, \
                EXTRACT(MONTH FROM created_at)::BIGINT, \
                COALESCE(SUM(total_amount), 0)::BIGINT, \
                COUNT(*)::BIGINT \
         FROM orders \
         WHERE created_at >= date_trunc('month', now()) - INTERVAL '5 months' \
           AND status IN ('confirmed', 'shipped', 'delivered') \
         GROUP BY 1, 2 ORDER BY 1, 2",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Sales graph",
        SalesGraph {
            points: rows.into_iter().map(sales_point).collect(),
        },
        None,
    ))
}

/// Per-admin sales graph summing only that admin's order lines.
pub async fn admin_sales_graph(
    state: &AppState,
    admin: &AuthUser,
) -> AppResult<ApiResponse<SalesGraph>> {
    let rows: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
        "SELECT EXTRACT(YEAR FROM o.created_at)::BIGINT, \
                EXTRACT(MONTH FROM o.created_at)::BIGINT, \
                COALESCE(SUM(oi.price * oi.quantity), 0)::BIGINT, \
                COUNT(DISTINCT o.id)::BIGINT \
         FROM orders o \
         JOIN order_items oi ON oi.order_id = o.id \
         JOIN items i ON i.id = oi.item_id \
         WHERE i.owner_id = $1 \
           AND o.created_at >= date_trunc('month', now()) - INTERVAL '5 months' \
           AND o.status IN ('confirmed', 'shipped', 'delivered') \
         GROUP BY 1, 2 ORDER BY 1, 2",
    )
    .bind(admin.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Sales graph",
        SalesGraph {
            points: rows.into_iter().map(sales_point).collect(),
        },
        None,
    ))
}

pub async fn list_admin_products(
    state: &AppState,
    admin: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Items::find()
        .filter(ItemCol::OwnerId.eq(admin.user_id))
        .order_by_desc(ItemCol::CreatedAt);

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
    Ok(ApiResponse::success("Products", ItemList { items }, Some(meta)))
}

pub async fn list_low_stock(
    state: &AppState,
    admin: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Items::find()
        .filter(ItemCol::OwnerId.eq(admin.user_id))
        .filter(ItemCol::IsLowStock.eq(true))
        .order_by_asc(ItemCol::Quantity);

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
    Ok(ApiResponse::success("Low stock", ItemList { items }, Some(meta)))
}

/// Reviews on the calling admin's items, filterable by rating, product and
/// date range.
pub async fn list_reviews(
    state: &AppState,
    admin: &AuthUser,
    query: ReviewQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let order_by = query.sort.unwrap_or(ReviewSort::Newest).as_sql();

    let filter = "FROM comments c \
         JOIN items i ON i.id = c.item_id \
         JOIN users u ON u.id = c.user_id \
         WHERE i.owner_id = $1 \
           AND ($2::INT IS NULL OR c.rating = $2) \
           AND ($3::UUID IS NULL OR c.item_id = $3) \
           AND ($4::TIMESTAMPTZ IS NULL OR c.created_at >= $4) \
           AND ($5::TIMESTAMPTZ IS NULL OR c.created_at <= $5)";

    let select = format!(
        "SELECT i.id AS product_id, i.title AS product_title, u.username, u.email, \
                c.rating, c.body AS comment, c.created_at \
         {filter} ORDER BY {order_by} LIMIT $6 OFFSET $7"
    );

    let reviews: Vec<Review> = sqlx::query_as(&select)
        .bind(admin.user_id)
        .bind(query.rating)
        .bind(query.product_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let count = format!("SELECT COUNT(*) {filter}");
    let (total,): (i64,) = sqlx::query_as(&count)
        .bind(admin.user_id)
        .bind(query.rating)
        .bind(query.product_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { reviews },
        Some(meta),
    ))
}

fn sales_point((year, month, sales, orders): (i64, i64, i64, i64)) -> SalesPoint {
    SalesPoint {
        month: MONTH_NAMES[(month as usize).clamp(1, 12) - 1],
        year,
        sales,
        orders,
    }
}
