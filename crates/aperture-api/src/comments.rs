use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use aperture_types::api::{
    Claims, CommentResponse, CountResponse, CreateCommentRequest, NotificationKind,
};

use crate::auth::AppState;
use crate::convert::{format_timestamp, parse_row_uuid, parse_timestamp};
use crate::error::ApiError;

/// POST /comments/photo/{photoId}
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(photo_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment content is required".into()));
    }

    let photo = state
        .db
        .get_photo(&photo_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Photo not found".into()))?;

    let comment_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    let now_s = format_timestamp(&now);
    let user_id = claims.sub.to_string();

    state.db.insert_comment(
        &comment_id.to_string(),
        &user_id,
        &photo_id.to_string(),
        &req.content,
        &now_s,
    )?;

    // Caller-driven fan-out; your own photo draws no notification.
    if photo.owner_id != user_id {
        state.db.insert_notification(
            &Uuid::new_v4().to_string(),
            &photo.owner_id,
            NotificationKind::Comment.as_str(),
            &comment_id.to_string(),
            &now_s,
        )?;
    }

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: comment_id,
            user_id: claims.sub,
            photo_id,
            username: claims.username,
            content: req.content,
            created_at: now,
            updated_at: now,
        }),
    ))
}

/// GET /comments/photo/{photoId} — joined with commenter usernames.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let rows = state.db.get_comments_for_photo(&photo_id.to_string())?;
    let comments = rows
        .into_iter()
        .map(|row| CommentResponse {
            id: parse_row_uuid(&row.id, "comment"),
            user_id: parse_row_uuid(&row.user_id, "user"),
            photo_id: parse_row_uuid(&row.photo_id, "photo"),
            username: row.username,
            content: row.content,
            created_at: parse_timestamp(&row.created_at, "comment created_at"),
            updated_at: parse_timestamp(&row.updated_at, "comment updated_at"),
        })
        .collect();
    Ok(Json(comments))
}

/// GET /comments/photo/{photoId}/count
pub async fn count_comments(
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.db.count_comments(&photo_id.to_string())?;
    Ok(Json(CountResponse { count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_photo, seed_user, test_state};

    #[tokio::test]
    async fn commenting_notifies_the_owner_once() {
        let state = test_state().await;
        let alice = seed_user(&state, "alice");
        let bob = seed_user(&state, "bob");
        let photo = seed_photo(&state, &alice, "2024-01-01T00:00:00Z");

        create_comment(
            State(state.clone()),
            Extension(bob.clone()),
            Path(photo),
            Json(CreateCommentRequest {
                content: "great shot".into(),
            }),
        )
        .await
        .unwrap();

        let notifications = state.db.get_notifications(&alice.sub.to_string()).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, "COMMENT");

        // Owner commenting on their own photo stays silent.
        create_comment(
            State(state.clone()),
            Extension(alice.clone()),
            Path(photo),
            Json(CreateCommentRequest {
                content: "thanks!".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            state.db.get_notifications(&alice.sub.to_string()).unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn commenting_missing_photo_is_not_found() {
        let state = test_state().await;
        let alice = seed_user(&state, "alice");

        let missing = create_comment(
            State(state),
            Extension(alice),
            Path(Uuid::new_v4()),
            Json(CreateCommentRequest {
                content: "hello".into(),
            }),
        )
        .await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let state = test_state().await;
        let alice = seed_user(&state, "alice");
        let photo = seed_photo(&state, &alice, "2024-01-01T00:00:00Z");

        let blank = create_comment(
            State(state),
            Extension(alice),
            Path(photo),
            Json(CreateCommentRequest {
                content: "   ".into(),
            }),
        )
        .await;
        assert!(matches!(blank, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn listing_carries_usernames_and_counts_match() {
        let state = test_state().await;
        let alice = seed_user(&state, "alice");
        let bob = seed_user(&state, "bob");
        let photo = seed_photo(&state, &alice, "2024-01-01T00:00:00Z");

        create_comment(
            State(state.clone()),
            Extension(bob),
            Path(photo),
            Json(CreateCommentRequest {
                content: "first".into(),
            }),
        )
        .await
        .unwrap();

        let comments = list_comments(State(state.clone()), Path(photo)).await.unwrap();
        assert_eq!(comments.0.len(), 1);
        assert_eq!(comments.0[0].username, "bob");
        assert_eq!(comments.0[0].content, "first");

        let count = count_comments(State(state), Path(photo)).await.unwrap();
        assert_eq!(count.0.count, 1);
    }
}
