//! Shared fixtures for the handler tests: an in-memory database behind a
//! throwaway blob directory, plus seed helpers.

use std::sync::Arc;

use uuid::Uuid;

use aperture_db::Database;
use aperture_storage::BlobStore;
use aperture_types::api::Claims;

use crate::auth::{AppState, AppStateInner};

pub async fn test_state() -> AppState {
    let dir = std::env::temp_dir().join(format!("aperture-api-test-{}", Uuid::new_v4()));
    let blobs = BlobStore::new(dir, "http://localhost:3000/media".into())
        .await
        .unwrap();
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        blobs,
        jwt_secret: "test-secret".into(),
    })
}

/// Insert a user row and return the claims a request from them would carry.
pub fn seed_user(state: &AppState, username: &str) -> Claims {
    let id = Uuid::new_v4();
    let email = format!("{username}@example.com");
    state
        .db
        .create_user(&id.to_string(), username, &email, "hash", "2024-01-01T00:00:00Z")
        .unwrap();
    Claims {
        sub: id,
        email,
        username: username.to_string(),
        exp: usize::MAX,
    }
}

/// Insert a photo row owned by `owner` at the given timestamp, returning its id.
pub fn seed_photo(state: &AppState, owner: &Claims, created_at: &str) -> Uuid {
    let id = Uuid::new_v4();
    state
        .db
        .insert_photo(
            &id.to_string(),
            &owner.sub.to_string(),
            "photo.jpg",
            &format!("http://localhost:3000/media/1-{id}.jpg"),
            Some("caption"),
            "[]",
            created_at,
        )
        .unwrap();
    id
}
