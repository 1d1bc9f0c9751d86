use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use skyfare_core::User;
use skyfare_store::{is_unique_violation, UserRepo};

use crate::error::AppError;
use crate::middleware::auth::{auth_middleware, Claims, ROLE_ADMIN, ROLE_CUSTOMER};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    mobile_no: Option<String>,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: Uuid,
    name: String,
    email: String,
    mobile_no: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    user: UserResponse,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            mobile_no: user.mobile_no,
            created_at: user.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
}

pub fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(me))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    if req.name.trim().len() < 2 {
        return Err(AppError::ValidationError("name is too short".to_string()));
    }
    if !req.email.contains('@') {
        return Err(AppError::ValidationError("invalid email address".to_string()));
    }
    if req.password.len() < 6 {
        return Err(AppError::ValidationError(
            "password must be at least 6 characters".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: req.email.to_lowercase(),
        mobile_no: req.mobile_no,
        password_hash: hash_password(&req.password),
        is_admin: false,
        created_at: state.clock.now(),
    };

    let mut conn = state.db.pool.acquire().await.map_err(AppError::from)?;
    if let Err(e) = UserRepo::insert(&mut conn, &user).await {
        return if is_unique_violation(&e) {
            Err(AppError::ValidationError(
                "email already registered".to_string(),
            ))
        } else {
            Err(e.into())
        };
    }

    tracing::info!(user_id = %user.id, "account registered");
    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            user: user.into(),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = UserRepo::find_by_email(&state.db.pool, &req.email.to_lowercase()).await?;

    // One error for both unknown email and bad password.
    let user = user
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| AppError::AuthenticationError("incorrect email or password".to_string()))?;

    let token = issue_token(&state, &user)?;
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: user.into(),
    }))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AppError> {
    let user = UserRepo::find_by_id(&state.db.pool, claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFoundError("user not found".to_string()))?;
    Ok(Json(user.into()))
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: if user.is_admin { ROLE_ADMIN } else { ROLE_CUSTOMER }.to_string(),
        exp: (state.clock.now() + Duration::seconds(state.auth.expiration as i64)).timestamp()
            as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("token encoding failed: {e}")))
}

/// Salted SHA-256 digest, stored as `salt$digest` hex.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let salt_hex = hex::encode(salt);
    let digest = Sha256::digest(format!("{salt_hex}{password}").as_bytes());
    format!("{salt_hex}${}", hex::encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => {
            hex::encode(Sha256::digest(format!("{salt}{password}").as_bytes())) == digest
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let stored = hash_password("s3cret-pass");
        assert!(verify_password("s3cret-pass", &stored));
        assert!(!verify_password("wrong", &stored));
        assert!(!verify_password("s3cret-pass", "garbage"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }
}
