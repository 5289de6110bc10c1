use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use aperture_types::api::{SearchResponse, UserSummary};

use crate::auth::AppState;
use crate::convert::{parse_row_uuid, parse_timestamp, photo_response};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub username: Option<String>,
    pub hashtag: Option<String>,
}

/// GET /search — usernames and photo captions/hashtags are matched
/// independently; an absent parameter yields an empty result list.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let users = match query.username.as_deref() {
        Some(username) => state
            .db
            .search_users(username)?
            .into_iter()
            .map(|row| UserSummary {
                id: parse_row_uuid(&row.id, "user"),
                username: row.username,
                bio: row.bio,
                created_at: parse_timestamp(&row.created_at, "user created_at"),
            })
            .collect(),
        None => vec![],
    };

    let photos = match query.hashtag.as_deref() {
        Some(hashtag) => state
            .db
            .search_photos(hashtag)?
            .into_iter()
            .map(photo_response)
            .collect(),
        None => vec![],
    };

    Ok(Json(SearchResponse { users, photos }))
}
