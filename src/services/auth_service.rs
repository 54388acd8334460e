use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use rand::Rng;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::auth::{
        ChangePasswordRequest, Claims, ForgotPasswordRequest, RefreshTokenRequest,
        RefreshTokenResponse, ResetPasswordRequest, SigninRequest, SigninResponse, SignupRequest,
        VerifyOtpRequest, VerifyOtpResponse, validate_password,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
};

const OTP_TTL_MINUTES: i64 = 5;
const RESET_TOKEN_TTL_MINUTES: i64 = 15;
const ACCESS_TOKEN_TTL_HOURS: i64 = 24;
const REFRESH_TOKEN_TTL_HOURS: i64 = 24 * 7;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    otp: Option<String>,
    otp_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub async fn signup(pool: &DbPool, payload: SignupRequest) -> AppResult<ApiResponse<User>> {
    payload.validate()?;

    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 OR username = $2")
            .bind(payload.email.as_str())
            .bind(payload.username.as_str())
            .fetch_optional(pool)
            .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest(
            "Email or username is already taken".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or_else(|| "user".to_string());
    let id = Uuid::new_v4();

    let user: UserRow = sqlx::query_as(
        "INSERT INTO users (id, username, email, password_hash, role) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(id)
    .bind(payload.username.as_str())
    .bind(payload.email.as_str())
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::success(
        "User registered",
        user_from_row(user),
        None,
    ))
}

pub async fn signin(pool: &DbPool, payload: SigninRequest) -> AppResult<ApiResponse<SigninResponse>> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    verify_password(&payload.password, &user.password_hash)?;

    let token = issue_token(user.id, &user.role, "access", ACCESS_TOKEN_TTL_HOURS)?;
    let refresh_token = issue_token(user.id, &user.role, "refresh", REFRESH_TOKEN_TTL_HOURS)?;

    let resp = SigninResponse {
        token,
        refresh_token,
        user: user_from_row(user),
    };

    Ok(ApiResponse::success("Signed in", resp, Some(Meta::empty())))
}

pub async fn forgot_password(
    pool: &DbPool,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("User does not exist".into())),
    };

    let otp = format!("{}", rand::thread_rng().gen_range(1000..10000));
    let otp_expiry = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

    sqlx::query("UPDATE users SET otp = $1, otp_expiry = $2, updated_at = now() WHERE id = $3")
        .bind(otp.as_str())
        .bind(otp_expiry)
        .bind(user.id)
        .execute(pool)
        .await?;

    // Mail delivery is handled by an external service; we only record the intent.
    tracing::info!(email = %user.email, "password reset OTP issued");

    Ok(ApiResponse::success(
        "Password reset code sent",
        serde_json::json!({ "email": user.email }),
        None,
    ))
}

pub async fn verify_otp(
    pool: &DbPool,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<VerifyOtpResponse>> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid OTP".into())),
    };

    if user.otp.as_deref() != Some(payload.otp.as_str()) {
        return Err(AppError::BadRequest("Invalid OTP".into()));
    }
    match user.otp_expiry {
        Some(expiry) if expiry > Utc::now() => {}
        _ => return Err(AppError::BadRequest("OTP has expired".into())),
    }

    let reset_token = Uuid::new_v4().to_string();
    let reset_expiry = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    sqlx::query(
        "UPDATE users SET otp = NULL, otp_expiry = NULL, reset_token = $1, \
         reset_token_expiry = $2, updated_at = now() WHERE id = $3",
    )
    .bind(reset_token.as_str())
    .bind(reset_expiry)
    .bind(user.id)
    .execute(pool)
    .await?;

    Ok(ApiResponse::success(
        "OTP verified",
        VerifyOtpResponse {
            email: user.email,
            reset_token,
        },
        None,
    ))
}

pub async fn reset_password(
    pool: &DbPool,
    token: &str,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;

    let user: Option<UserRow> = sqlx::query_as(
        "SELECT * FROM users WHERE reset_token = $1 AND reset_token_expiry > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid or expired reset token".into())),
    };

    let password_hash = hash_password(&payload.password)?;
    sqlx::query(
        "UPDATE users SET password_hash = $1, reset_token = NULL, \
         reset_token_expiry = NULL, updated_at = now() WHERE id = $2",
    )
    .bind(password_hash)
    .bind(user.id)
    .execute(pool)
    .await?;

    Ok(ApiResponse::success(
        "Password reset successfully",
        serde_json::json!({}),
        None,
    ))
}

pub async fn change_password(
    pool: &DbPool,
    auth: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    validate_password(&payload.new_password)?;

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("User does not exist".into())),
    };

    verify_password(&payload.password, &user.password_hash)?;

    let password_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(password_hash)
        .bind(user.id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success(
        "Password changed successfully",
        serde_json::json!({}),
        None,
    ))
}

pub async fn refresh_token(
    pool: &DbPool,
    payload: RefreshTokenRequest,
) -> AppResult<ApiResponse<RefreshTokenResponse>> {
    let secret = jwt_secret()?;
    let decoded = decode::<Claims>(
        &payload.refresh_token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::BadRequest("Invalid or expired refresh token".into()))?;

    if decoded.claims.kind != "refresh" {
        return Err(AppError::BadRequest("Invalid or expired refresh token".into()));
    }

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("User does not exist".into())),
    };

    let token = issue_token(user.id, &user.role, "access", ACCESS_TOKEN_TTL_HOURS)?;
    Ok(ApiResponse::success(
        "Token refreshed",
        RefreshTokenResponse { token },
        None,
    ))
}

pub fn issue_token(user_id: Uuid, role: &str, kind: &str, ttl_hours: i64) -> AppResult<String> {
    let secret = jwt_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        kind: kind.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn jwt_secret() -> AppResult<String> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::BadRequest("Invalid email or password".into()))
}

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id,
        username: row.username,
        email: row.email,
        role: row.role,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
