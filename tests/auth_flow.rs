use axum_marketplace_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::{
        ChangePasswordRequest, ForgotPasswordRequest, RefreshTokenRequest, ResetPasswordRequest,
        SigninRequest, SignupRequest, VerifyOtpRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::auth_service,
};
use sea_orm::{ConnectionTrait, Statement};
use sqlx::PgPool;

// Full password lifecycle: signup -> signin -> OTP reset -> change -> refresh.
#[tokio::test]
async fn signup_signin_and_password_reset_flow() -> anyhow::Result<()> {
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
    if std::env::var("JWT_SECRET").is_err() {
        unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
    }

    let pool = setup_pool(&database_url).await?;

    let signed_up = auth_service::signup(&pool, signup_request()).await?;
    let user = signed_up.data.unwrap();
    assert_eq!(user.role, "user");

    // Email and username are both unique.
    let duplicate = auth_service::signup(&pool, signup_request()).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let wrong_password = auth_service::signin(
        &pool,
        SigninRequest {
            email: "carol@example.com".into(),
            password: "not-the-password".into(),
        },
    )
    .await;
    assert!(matches!(wrong_password, Err(AppError::BadRequest(_))));

    let signed_in = auth_service::signin(
        &pool,
        SigninRequest {
            email: "carol@example.com".into(),
            password: "original-pass".into(),
        },
    )
    .await?;
    let session = signed_in.data.unwrap();
    assert!(!session.token.is_empty());
    assert!(!session.refresh_token.is_empty());

    // Refresh tokens mint new access tokens; access tokens must not.
    let refreshed = auth_service::refresh_token(
        &pool,
        RefreshTokenRequest {
            refresh_token: session.refresh_token.clone(),
        },
    )
    .await?;
    assert!(!refreshed.data.unwrap().token.is_empty());

    let wrong_kind = auth_service::refresh_token(
        &pool,
        RefreshTokenRequest {
            refresh_token: session.token.clone(),
        },
    )
    .await;
    assert!(matches!(wrong_kind, Err(AppError::BadRequest(_))));

    // OTP reset. Delivery is external, so read the code straight from the row.
    auth_service::forgot_password(
        &pool,
        ForgotPasswordRequest {
            email: "carol@example.com".into(),
        },
    )
    .await?;

    let (otp,): (Option<String>,) = sqlx::query_as("SELECT otp FROM users WHERE email = $1")
        .bind("carol@example.com")
        .fetch_one(&pool)
        .await?;
    let otp = otp.expect("OTP stored after forgot-password");

    let wrong_otp = auth_service::verify_otp(
        &pool,
        VerifyOtpRequest {
            email: "carol@example.com".into(),
            otp: "0000".into(),
        },
    )
    .await;
    assert!(matches!(wrong_otp, Err(AppError::BadRequest(_))));

    let verified = auth_service::verify_otp(
        &pool,
        VerifyOtpRequest {
            email: "carol@example.com".into(),
            otp,
        },
    )
    .await?;
    let reset_token = verified.data.unwrap().reset_token;

    auth_service::reset_password(
        &pool,
        &reset_token,
        ResetPasswordRequest {
            password: "after-reset-pass".into(),
            confirm_password: "after-reset-pass".into(),
        },
    )
    .await?;

    // The token is single use.
    let reused = auth_service::reset_password(
        &pool,
        &reset_token,
        ResetPasswordRequest {
            password: "another-pass-123".into(),
            confirm_password: "another-pass-123".into(),
        },
    )
    .await;
    assert!(matches!(reused, Err(AppError::BadRequest(_))));

    let old_password = auth_service::signin(
        &pool,
        SigninRequest {
            email: "carol@example.com".into(),
            password: "original-pass".into(),
        },
    )
    .await;
    assert!(matches!(old_password, Err(AppError::BadRequest(_))));

    auth_service::signin(
        &pool,
        SigninRequest {
            email: "carol@example.com".into(),
            password: "after-reset-pass".into(),
        },
    )
    .await?;

    // Authenticated password change.
    let auth = AuthUser {
        user_id: user.id,
        role: user.role.clone(),
    };
    auth_service::change_password(
        &pool,
        &auth,
        ChangePasswordRequest {
            password: "after-reset-pass".into(),
            new_password: "final-pass-1234".into(),
        },
    )
    .await?;

    auth_service::signin(
        &pool,
        SigninRequest {
            email: "carol@example.com".into(),
            password: "final-pass-1234".into(),
        },
    )
    .await?;

    Ok(())
}

fn signup_request() -> SignupRequest {
    SignupRequest {
        username: "carol".into(),
        email: "carol@example.com".into(),
        password: "original-pass".into(),
        confirm_password: "original-pass".into(),
        role: None,
    }
}

async fn setup_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE notifications, comments, order_items, orders, items, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    create_pool(database_url).await
}
