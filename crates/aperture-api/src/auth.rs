use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use aperture_db::Database;
use aperture_storage::BlobStore;
use aperture_types::api::{Claims, LoginRequest, MessageResponse, RegisterRequest, TokenResponse};

use crate::convert::format_timestamp;
use crate::error::{ApiError, conflict_on_unique};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub blobs: BlobStore,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::BadRequest(
            "Username must be between 3 and 32 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    // Single OR query over both unique columns
    if state
        .db
        .find_user_by_username_or_email(&req.username, &req.email)?
        .is_some()
    {
        return Err(ApiError::Conflict("Username or email already exists".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    let user_id = Uuid::new_v4();
    let now = format_timestamp(&chrono::Utc::now());

    state
        .db
        .create_user(
            &user_id.to_string(),
            &req.username,
            &req.email,
            &password_hash,
            &now,
        )
        .map_err(|e| conflict_on_unique(e, "Username or email already exists"))?;

    let token = create_token(&state.jwt_secret, user_id, &req.email, &req.username)?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored password hash unreadable: {e}"))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".into()))?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {e}", user.id))?;

    let token = create_token(&state.jwt_secret, user_id, &user.email, &user.username)?;

    Ok(Json(TokenResponse {
        access_token: token,
    }))
}

/// Stateless logout — token invalidation is client-side.
pub async fn logout() -> impl IntoResponse {
    Json(MessageResponse {
        message: "Successfully logged out".into(),
    })
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    username: &str,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use axum::response::IntoResponse;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    fn register_req(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_persists_user_and_issues_decodable_token() {
        let state = test_state().await;
        let resp = register(
            State(state.clone()),
            Json(register_req("alice", "alice@example.com", "hunter2222")),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let user = state.db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");
        // The stored value is a salted hash, never the password itself.
        assert_ne!(user.password, "hunter2222");

        let token = create_token(&state.jwt_secret, user.id.parse().unwrap(), &user.email, &user.username).unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.username, "alice");
        assert_eq!(decoded.claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn register_rejects_duplicates_with_conflict() {
        let state = test_state().await;
        register(
            State(state.clone()),
            Json(register_req("alice", "alice@example.com", "hunter2222")),
        )
        .await
        .unwrap();

        let dup_name = register(
            State(state.clone()),
            Json(register_req("alice", "other@example.com", "hunter2222")),
        )
        .await;
        assert!(matches!(dup_name, Err(ApiError::Conflict(_))));

        let dup_email = register(
            State(state),
            Json(register_req("bob", "alice@example.com", "hunter2222")),
        )
        .await;
        assert!(matches!(dup_email, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn register_validates_input_shape() {
        let state = test_state().await;

        let short_name = register(
            State(state.clone()),
            Json(register_req("ab", "a@example.com", "hunter2222")),
        )
        .await;
        assert!(matches!(short_name, Err(ApiError::BadRequest(_))));

        let bad_email = register(
            State(state.clone()),
            Json(register_req("alice", "not-an-email", "hunter2222")),
        )
        .await;
        assert!(matches!(bad_email, Err(ApiError::BadRequest(_))));

        let short_password = register(
            State(state),
            Json(register_req("alice", "a@example.com", "short")),
        )
        .await;
        assert!(matches!(short_password, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_email() {
        let state = test_state().await;
        register(
            State(state.clone()),
            Json(register_req("alice", "alice@example.com", "hunter2222")),
        )
        .await
        .unwrap();

        let ok = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@example.com".into(),
                password: "hunter2222".into(),
            }),
        )
        .await;
        assert!(ok.is_ok());

        let wrong = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@example.com".into(),
                password: "wrong-password".into(),
            }),
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized(_))));

        let unknown = login(
            State(state),
            Json(LoginRequest {
                email: "nobody@example.com".into(),
                password: "hunter2222".into(),
            }),
        )
        .await;
        assert!(matches!(unknown, Err(ApiError::Unauthorized(_))));
    }
}
