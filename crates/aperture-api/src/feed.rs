use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::error;

use aperture_db::Database;
use aperture_types::api::{Claims, FeedMetadata, FeedResponse};

use crate::auth::AppState;
use crate::convert::photo_response;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /feed — photos by the user and everyone they follow, newest first.
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    let feed = tokio::task::spawn_blocking(move || {
        assemble_feed(&db.db, &user_id, query.page, query.limit)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("feed task failed: {e}"))
    })??;

    Ok(Json(feed))
}

/// The two queries run in sequence without a transaction; a follow racing a
/// feed read may observe either graph state.
fn assemble_feed(
    db: &Database,
    user_id: &str,
    page: Option<i64>,
    limit: Option<i64>,
) -> anyhow::Result<FeedResponse> {
    let (page, limit) = normalize(page, limit);
    let offset = (page as i64 - 1) * limit as i64;

    let mut owner_ids = db.get_following_ids(user_id)?;
    // Authors always see their own posts.
    owner_ids.push(user_id.to_string());

    let total = db.count_photos_by_owners(&owner_ids)?;
    let rows = db.feed_page(&owner_ids, limit, offset)?;

    Ok(FeedResponse {
        data: rows.into_iter().map(photo_response).collect(),
        metadata: metadata(page, limit, total),
    })
}

/// Pages below 1 are coerced to 1; the limit has a floor of 10 and a ceiling
/// of 100.
fn normalize(page: Option<i64>, limit: Option<i64>) -> (u32, u32) {
    let page = page.unwrap_or(1).clamp(1, u32::MAX as i64);
    let limit = limit.unwrap_or(10).clamp(10, 100);
    (page as u32, limit as u32)
}

fn metadata(page: u32, limit: u32, total: i64) -> FeedMetadata {
    let total_pages = (total as u64).div_ceil(limit as u64) as u32;
    FeedMetadata {
        current_page: page,
        total_pages,
        total_items: total,
        items_per_page: limit,
        has_next_page: page < total_pages,
        has_previous_page: page > 1,
    }
}
