use axum_marketplace_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{OrderLineRequest, PlaceOrderRequest, ShippingAddress},
    entity::items::{ActiveModel as ItemActive, Entity as Items},
    entity::users::ActiveModel as UserActive,
    events::EventBus,
    middleware::auth::AuthUser,
    services::order_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

// Concurrent orders against one item must never oversell: each line is a
// single conditional decrement, so exactly floor(stock / ask) requests win.
#[tokio::test]
async fn concurrent_orders_cannot_oversell() -> anyhow::Result<()> {
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

    let owner_id = create_user(&state, "admin", "stock-owner", "stock-owner@example.com").await?;
    let buyer_id = create_user(&state, "user", "stock-buyer", "stock-buyer@example.com").await?;

    let item = ItemActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        title: Set("Contended Widget".into()),
        description: Set("Ten in stock, many buyers".into()),
        images: Set(serde_json::json!(["https://example.com/widget.jpg"])),
        brand: Set("Acme".into()),
        category: Set("tools".into()),
        quantity: Set(10),
        price: Set(100),
        low_stock_threshold: Set(2),
        is_low_stock: Set(false),
        rating: Set(0.0),
        total_ratings: Set(0),
        status: Set("approved".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let state = state.clone();
        let item_id = item.id;
        let buyer = AuthUser {
            user_id: buyer_id,
            role: "user".into(),
        };
        handles.push(tokio::spawn(async move {
            order_service::place_order(
                &state,
                &buyer,
                PlaceOrderRequest {
                    items: vec![OrderLineRequest {
                        item_id,
                        quantity: 3,
                    }],
                    shipping_address: ShippingAddress {
                        street: "1 Test Lane".into(),
                        city: "Testville".into(),
                        state: "TS".into(),
                        zip_code: "00001".into(),
                        country: "Testland".into(),
                    },
                },
            )
            .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await?.is_ok() {
            successes += 1;
        }
    }

    // 10 units at 3 per order: only three requests can be satisfied.
    assert_eq!(successes, 3);

    let remaining = Items::find_by_id(item.id).one(&state.orm).await?.unwrap();
    assert_eq!(remaining.quantity, 10 - 3 * successes);
    assert!(remaining.quantity >= 0);
    assert!(remaining.is_low_stock);

    Ok(())
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
