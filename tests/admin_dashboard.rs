use axum_marketplace_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    entity::comments::ActiveModel as CommentActive,
    entity::items::ActiveModel as ItemActive,
    entity::order_items::ActiveModel as OrderItemActive,
    entity::orders::ActiveModel as OrderActive,
    entity::users::ActiveModel as UserActive,
    events::EventBus,
    middleware::auth::AuthUser,
    routes::params::{Pagination, ReviewQuery, ReviewSort},
    services::admin_service,
    state::AppState,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Dashboard aggregates: storewide and per-admin counters, status-filtered
// sales graphs, low-stock scoping, and review filters over seeded history.
#[tokio::test]
async fn dashboard_counters_graphs_and_reviews() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let now = Utc::now();
    let two_months_ago = now - Duration::days(62);
    let out_of_window = now - Duration::days(200);

    let vendor_id = create_user(&state, "admin", "vendor", "vendor@example.com").await?;
    let rival_id = create_user(&state, "admin", "rival", "rival@example.com").await?;
    let alice_id = create_user(&state, "user", "alice", "alice@example.com").await?;
    let bob_id = create_user(&state, "user", "bob", "bob@example.com").await?;

    let vendor = AuthUser {
        user_id: vendor_id,
        role: "admin".into(),
    };
    let rival = AuthUser {
        user_id: rival_id,
        role: "admin".into(),
    };

    // Two vendor items (one low on stock) and one item owned by the rival.
    let widget_id = create_item(&state, vendor_id, "Widget", 100, 1, true).await?;
    let gadget_id = create_item(&state, vendor_id, "Gadget", 250, 50, false).await?;
    let rival_item_id = create_item(&state, rival_id, "Rival Gizmo", 999, 1, true).await?;

    // Orders across months and statuses. Line prices are snapshots.
    create_order(&state, alice_id, "delivered", now, &[(widget_id, 2, 100)]).await?;
    create_order(&state, alice_id, "pending", now, &[(gadget_id, 1, 250)]).await?;
    create_order(
        &state,
        bob_id,
        "shipped",
        two_months_ago,
        &[(gadget_id, 2, 250), (rival_item_id, 1, 999)],
    )
    .await?;
    create_order(
        &state,
        bob_id,
        "confirmed",
        out_of_window,
        &[(widget_id, 1, 100)],
    )
    .await?;

    // Reviews: two fresh on vendor items, one month-old, one on the rival's.
    create_comment(&state, widget_id, alice_id, 5, "Great", now).await?;
    create_comment(&state, gadget_id, alice_id, 4, "Good", now - Duration::hours(1)).await?;
    create_comment(&state, widget_id, bob_id, 2, "Meh", now - Duration::days(30)).await?;
    create_comment(&state, rival_item_id, bob_id, 1, "Bad", now).await?;

    // Storewide counters: this month's orders regardless of status.
    let stats = admin_service::dashboard_stats(&state).await?;
    let stats = stats.data.unwrap();
    assert_eq!(stats.monthly_sales, 450);
    assert_eq!(stats.monthly_order_count, 2);
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.active_vendors, 2);
    assert_eq!(stats.pending_orders, 1);
    assert_eq!(stats.low_stock_items, 2);
    assert_eq!(stats.new_reviews, 3);

    // Storewide graph counts only confirmed/shipped/delivered orders inside
    // the six-month window: the pending and the too-old order drop out.
    let graph = admin_service::sales_graph(&state).await?;
    let points = graph.data.unwrap().points;
    assert_eq!(points.len(), 2);
    assert_eq!(points.iter().map(|p| p.sales).sum::<i64>(), 200 + 1499);
    assert_eq!(points.iter().map(|p| p.orders).sum::<i64>(), 2);

    // Per-admin counters only see orders containing that admin's lines.
    let vendor_stats = admin_service::admin_dashboard_stats(&state, &vendor).await?;
    let vendor_stats = vendor_stats.data.unwrap();
    assert_eq!(vendor_stats.monthly_sales, 450);
    assert_eq!(vendor_stats.monthly_order_count, 2);
    assert_eq!(vendor_stats.pending_orders, 1);
    assert_eq!(vendor_stats.low_stock_items, 1);
    assert_eq!(vendor_stats.new_reviews, 2);

    // Per-admin graph sums only that admin's lines of the shared order.
    let vendor_graph = admin_service::admin_sales_graph(&state, &vendor).await?;
    let vendor_points = vendor_graph.data.unwrap().points;
    assert_eq!(vendor_points.iter().map(|p| p.sales).sum::<i64>(), 200 + 500);
    assert_eq!(vendor_points.iter().map(|p| p.orders).sum::<i64>(), 2);

    let rival_graph = admin_service::admin_sales_graph(&state, &rival).await?;
    let rival_points = rival_graph.data.unwrap().points;
    assert_eq!(rival_points.iter().map(|p| p.sales).sum::<i64>(), 999);
    assert_eq!(rival_points.iter().map(|p| p.orders).sum::<i64>(), 1);

    // Low stock is scoped to the caller's items.
    let low = admin_service::list_low_stock(&state, &vendor, pagination(None, None)).await?;
    let low = low.data.unwrap().items;
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, widget_id);

    // Reviews: newest first by default, scoped to the vendor's items.
    let reviews = admin_service::list_reviews(&state, &vendor, review_query()).await?;
    let newest: Vec<i32> = reviews.data.unwrap().reviews.iter().map(|r| r.rating).collect();
    assert_eq!(newest, vec![5, 4, 2]);

    let reviews = admin_service::list_reviews(
        &state,
        &vendor,
        ReviewQuery {
            sort: Some(ReviewSort::Oldest),
            ..review_query()
        },
    )
    .await?;
    let oldest: Vec<i32> = reviews.data.unwrap().reviews.iter().map(|r| r.rating).collect();
    assert_eq!(oldest, vec![2, 4, 5]);

    let reviews = admin_service::list_reviews(
        &state,
        &vendor,
        ReviewQuery {
            rating: Some(2),
            ..review_query()
        },
    )
    .await?;
    let filtered = reviews.data.unwrap().reviews;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].username, "bob");

    let reviews = admin_service::list_reviews(
        &state,
        &vendor,
        ReviewQuery {
            product_id: Some(widget_id),
            ..review_query()
        },
    )
    .await?;
    assert_eq!(reviews.data.unwrap().reviews.len(), 2);

    let reviews = admin_service::list_reviews(
        &state,
        &vendor,
        ReviewQuery {
            start_date: Some(now - Duration::days(7)),
            ..review_query()
        },
    )
    .await?;
    assert_eq!(reviews.data.unwrap().reviews.len(), 2);

    let reviews = admin_service::list_reviews(
        &state,
        &vendor,
        ReviewQuery {
            pagination: Pagination {
                page: Some(2),
                per_page: Some(2),
            },
            ..review_query()
        },
    )
    .await?;
    assert_eq!(reviews.meta.as_ref().unwrap().total, Some(3));
    assert_eq!(reviews.data.unwrap().reviews.len(), 1);

    let reviews = admin_service::list_reviews(&state, &rival, review_query()).await?;
    let rival_reviews = reviews.data.unwrap().reviews;
    assert_eq!(rival_reviews.len(), 1);
    assert_eq!(rival_reviews[0].product_id, rival_item_id);

    Ok(())
}

fn pagination(page: Option<i64>, per_page: Option<i64>) -> Pagination {
    Pagination { page, per_page }
}

fn review_query() -> ReviewQuery {
    ReviewQuery {
        pagination: pagination(None, None),
        rating: None,
        product_id: None,
        start_date: None,
        end_date: None,
        sort: None,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE notifications, comments, order_items, orders, items, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        events: EventBus::new(),
    })
}

async fn create_user(
    state: &AppState,
    role: &str,
    username: &str,
    email: &str,
) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        otp: NotSet,
        otp_expiry: NotSet,
        reset_token: NotSet,
        reset_token_expiry: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_item(
    state: &AppState,
    owner_id: Uuid,
    title: &str,
    price: i64,
    quantity: i32,
    is_low_stock: bool,
) -> anyhow::Result<Uuid> {
    let item = ItemActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        title: Set(title.to_string()),
        description: Set(format!("{title} for dashboard tests")),
        images: Set(serde_json::json!(["https://example.com/item.jpg"])),
        brand: Set("Acme".into()),
        category: Set("tools".into()),
        quantity: Set(quantity),
        price: Set(price),
        low_stock_threshold: Set(5),
        is_low_stock: Set(is_low_stock),
        rating: Set(0.0),
        total_ratings: Set(0),
        status: Set("approved".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(item.id)
}

async fn create_order(
    state: &AppState,
    user_id: Uuid,
    status: &str,
    created_at: DateTime<Utc>,
    lines: &[(Uuid, i32, i64)],
) -> anyhow::Result<Uuid> {
    let total: i64 = lines.iter().map(|(_, qty, price)| price * *qty as i64).sum();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_amount: Set(total),
        status: Set(status.to_string()),
        shipping_address: Set(serde_json::json!({ "street": "1 Test Lane" })),
        created_at: Set(created_at.into()),
        updated_at: Set(created_at.into()),
    }
    .insert(&state.orm)
    .await?;

    for (item_id, quantity, price) in lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            item_id: Set(*item_id),
            quantity: Set(*quantity),
            price: Set(*price),
            created_at: Set(created_at.into()),
        }
        .insert(&state.orm)
        .await?;
    }

    Ok(order.id)
}

async fn create_comment(
    state: &AppState,
    item_id: Uuid,
    user_id: Uuid,
    rating: i32,
    body: &str,
    created_at: DateTime<Utc>,
) -> anyhow::Result<Uuid> {
    let comment = CommentActive {
        id: Set(Uuid::new_v4()),
        item_id: Set(item_id),
        user_id: Set(user_id),
        rating: Set(rating),
        body: Set(body.to_string()),
        created_at: Set(created_at.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(comment.id)
}
