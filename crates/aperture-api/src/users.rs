use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use aperture_db::models::UserRow;
use aperture_types::api::{Claims, NotificationKind, ProfileResponse, UpdateProfileRequest};

use crate::auth::AppState;
use crate::convert::{format_timestamp, parse_row_uuid, parse_timestamp};
use crate::error::{ApiError, conflict_on_unique};

pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_username(&username)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    build_profile(&state, user)
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = claims.sub.to_string();
    let user = state
        .db
        .get_user_by_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let username = match &req.username {
        Some(new_username) => {
            if let Some(existing) = state.db.get_user_by_username(new_username)? {
                if existing.id != user.id {
                    return Err(ApiError::Conflict("Username already taken".into()));
                }
            }
            new_username.clone()
        }
        None => user.username.clone(),
    };
    // Absent bio leaves the stored value untouched.
    let bio = req.bio.clone().or(user.bio.clone());

    let now = format_timestamp(&chrono::Utc::now());
    state
        .db
        .update_user_profile(&user_id, &username, bio.as_deref(), &now)
        .map_err(|e| conflict_on_unique(e, "Username already taken"))?;

    let updated = state
        .db
        .get_user_by_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    build_profile(&state, updated)
}

pub async fn follow_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let target = state
        .db
        .get_user_by_username(&username)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let follower_id = claims.sub.to_string();
    if target.id == follower_id {
        return Err(ApiError::Conflict("Users cannot follow themselves".into()));
    }

    if state.db.get_follow(&follower_id, &target.id)?.is_some() {
        return Err(ApiError::Conflict("Already following this user".into()));
    }

    let now = format_timestamp(&chrono::Utc::now());
    state
        .db
        .insert_follow(&follower_id, &target.id, &now)
        .map_err(|e| conflict_on_unique(e, "Already following this user"))?;

    // Fan-out is caller-driven: tell the target about the new follower.
    state.db.insert_notification(
        &Uuid::new_v4().to_string(),
        &target.id,
        NotificationKind::Follow.as_str(),
        &follower_id,
        &now,
    )?;

    Ok(StatusCode::CREATED)
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let target = state
        .db
        .get_user_by_username(&username)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let deleted = state.db.delete_follow(&claims.sub.to_string(), &target.id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Not following this user".into()));
    }

    Ok(StatusCode::OK)
}

fn build_profile(state: &AppState, user: UserRow) -> Result<Json<ProfileResponse>, ApiError> {
    let followers_count = state.db.count_followers(&user.id)?;
    let following_count = state.db.count_following(&user.id)?;
    let photos_count = state.db.count_photos_by_owner(&user.id)?;

    Ok(Json(ProfileResponse {
        id: parse_row_uuid(&user.id, "user"),
        username: user.username,
        bio: user.bio,
        followers_count,
        following_count,
        photos_count,
        created_at: parse_timestamp(&user.created_at, "user created_at"),
    }))
}
