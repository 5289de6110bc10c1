use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use aperture_types::api::{
    Claims, CountResponse, CreateLikeRequest, LikeResponse, NotificationKind,
};

use crate::auth::AppState;
use crate::convert::{format_timestamp, parse_row_uuid, parse_timestamp};
use crate::error::{ApiError, conflict_on_unique};

/// POST /likes — like a photo; at most one like per user per photo.
pub async fn create_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateLikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let photo_id = req.photo_id.to_string();
    let photo = state
        .db
        .get_photo(&photo_id)?
        .ok_or_else(|| ApiError::NotFound("Photo not found".into()))?;

    let user_id = claims.sub.to_string();
    if state.db.get_like(&user_id, &photo_id)?.is_some() {
        return Err(ApiError::Conflict("User has already liked this photo".into()));
    }

    let like_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    let now_s = format_timestamp(&now);

    state
        .db
        .insert_like(&like_id.to_string(), &user_id, &photo_id, &now_s)
        .map_err(|e| conflict_on_unique(e, "User has already liked this photo"))?;

    // Caller-driven fan-out; your own photo draws no notification.
    if photo.owner_id != user_id {
        state.db.insert_notification(
            &Uuid::new_v4().to_string(),
            &photo.owner_id,
            NotificationKind::Like.as_str(),
            &like_id.to_string(),
            &now_s,
        )?;
    }

    Ok((
        StatusCode::CREATED,
        Json(LikeResponse {
            id: like_id,
            user_id: claims.sub,
            photo_id: req.photo_id,
            created_at: now,
        }),
    ))
}

/// DELETE /likes/{photoId}
pub async fn delete_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(photo_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .delete_like(&claims.sub.to_string(), &photo_id.to_string())?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Like not found".into()));
    }
    Ok(StatusCode::OK)
}

/// GET /likes/photo/{photoId}
pub async fn list_likes(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<Vec<LikeResponse>>, ApiError> {
    let rows = state.db.get_likes_for_photo(&photo_id.to_string())?;
    let likes = rows
        .into_iter()
        .map(|row| LikeResponse {
            id: parse_row_uuid(&row.id, "like"),
            user_id: parse_row_uuid(&row.user_id, "user"),
            photo_id: parse_row_uuid(&row.photo_id, "photo"),
            created_at: parse_timestamp(&row.created_at, "like created_at"),
        })
        .collect();
    Ok(Json(likes))
}

/// GET /likes/photo/{photoId}/count
pub async fn count_likes(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.db.count_likes(&photo_id.to_string())?;
    Ok(Json(CountResponse { count }))
}
