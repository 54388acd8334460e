use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user", "user@example.com", "user123", "user").await?;
    seed_items(&pool, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_items(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    let items = vec![
        ("Trail Backpack 40L", "Weatherproof hiking pack", "Summit", "outdoors", 550000, 50),
        ("Ceramic Pour-Over Set", "Dripper, carafe and filters", "Morningbrew", "kitchen", 120000, 100),
        ("Mechanical Keyboard", "Hot-swappable 75% board", "Keysmith", "electronics", 450000, 30),
        ("Linen Throw Blanket", "Stonewashed, queen size", "Hearth", "home", 250000, 75),
    ];

    for (title, description, brand, category, price, quantity) in items {
        sqlx::query(
            r#"
            INSERT INTO items (id, owner_id, title, description, brand, category, price, quantity, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'approved')
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(brand)
        .bind(category)
        .bind(price)
        .bind(quantity)
        .execute(pool)
        .await?;
    }

    println!("Seeded items");
    Ok(())
}
