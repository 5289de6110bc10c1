use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use aperture_types::api::{Claims, MessageResponse, NotificationResponse};

use crate::auth::AppState;
use crate::convert::{format_timestamp, parse_row_uuid, parse_timestamp};
use crate::error::ApiError;

/// GET /notifications — newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let rows = state.db.get_notifications(&claims.sub.to_string())?;
    let notifications = rows
        .into_iter()
        .map(|row| {
            let kind = row
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("corrupt notification '{}': {e}", row.id))?;
            Ok(NotificationResponse {
                id: parse_row_uuid(&row.id, "notification"),
                user_id: parse_row_uuid(&row.user_id, "user"),
                kind,
                reference_id: parse_row_uuid(&row.reference_id, "reference"),
                read: row.read,
                created_at: parse_timestamp(&row.created_at, "notification created_at"),
            })
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;
    Ok(Json(notifications))
}

/// POST /notifications/{id}/read — no-op when nothing matches.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let now = format_timestamp(&chrono::Utc::now());
    state
        .db
        .mark_notification_read(&claims.sub.to_string(), &id.to_string(), &now)?;
    Ok(Json(MessageResponse {
        message: "Notification marked as read".into(),
    }))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let now = format_timestamp(&chrono::Utc::now());
    state
        .db
        .mark_all_notifications_read(&claims.sub.to_string(), &now)?;
    Ok(Json(MessageResponse {
        message: "All notifications marked as read".into(),
    }))
}
