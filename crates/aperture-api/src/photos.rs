use std::io::Cursor;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use image::ImageFormat;
use tracing::error;
use uuid::Uuid;

use aperture_storage::BlobStore;
use aperture_types::api::{Claims, PhotoResponse};

use crate::auth::AppState;
use crate::convert::{format_timestamp, photo_response};
use crate::error::ApiError;

/// 5 MiB upload limit for photos
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
/// Images are resized to fit within this bound, never upscaled.
const MAX_DIMENSION: u32 = 1200;

/// POST /photos — multipart upload: `file` plus optional `caption` and
/// `hashtags` fields. Validation happens before any blob or database work.
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut caption: Option<String> = None;
    let mut hashtag_fields: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart request".into()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest("Malformed multipart request".into()))?;
                file = Some((filename, mime, data.to_vec()));
            }
            "caption" => {
                caption = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| ApiError::BadRequest("Malformed multipart request".into()))?,
                );
            }
            "hashtags" => {
                hashtag_fields.push(
                    field
                        .text()
                        .await
                        .map_err(|_| ApiError::BadRequest("Malformed multipart request".into()))?,
                );
            }
            _ => {}
        }
    }

    let (filename, mime, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;
    let format = validate_file(data.len(), &mime)?;
    let hashtags = parse_hashtags(&hashtag_fields);

    // Resize off the async runtime; decoding is CPU-bound.
    let processed = tokio::task::spawn_blocking(move || process_image(data, format))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("image task failed: {e}"))
        })?
        .map_err(|_| ApiError::BadRequest("Invalid image data".into()))?;

    let now = chrono::Utc::now();
    let key = BlobStore::make_key(now.timestamp_millis(), &filename);
    let stored = state.blobs.put(&key, &processed).await?;

    let photo_id = Uuid::new_v4();
    let db = state.clone();
    let row = (
        photo_id.to_string(),
        claims.sub.to_string(),
        filename.clone(),
        stored.url.clone(),
        caption.clone(),
        serde_json::to_string(&hashtags).map_err(|e| anyhow::anyhow!(e))?,
        format_timestamp(&now),
    );
    tokio::task::spawn_blocking(move || {
        db.db
            .insert_photo(&row.0, &row.1, &row.2, &row.3, row.4.as_deref(), &row.5, &row.6)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("insert task failed: {e}"))
    })??;

    Ok((
        StatusCode::CREATED,
        Json(PhotoResponse {
            id: photo_id,
            owner_id: claims.sub,
            owner_username: claims.username,
            filename,
            url: stored.url,
            caption,
            hashtags,
            created_at: now,
            updated_at: now,
        }),
    ))
}

/// GET /photos — the authenticated user's photos, newest first.
pub async fn list_photos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PhotoResponse>>, ApiError> {
    let db = state.clone();
    let owner_id = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.get_photos_by_owner(&owner_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("query task failed: {e}"))
        })??;

    Ok(Json(rows.into_iter().map(photo_response).collect()))
}

/// DELETE /photos/{id} — owner-only; removes the blob, then the row.
pub async fn delete_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let photo = state
        .db
        .get_photo(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Photo not found".into()))?;

    if photo.owner_id != claims.sub.to_string() {
        return Err(ApiError::BadRequest(
            "You can only delete your own photos".into(),
        ));
    }

    // The blob key is the last path segment of the stored URL.
    if let Some(key) = photo.url.rsplit('/').next() {
        state.blobs.delete(key).await?;
    }

    state.db.delete_photo(&photo.id)?;
    Ok(StatusCode::OK)
}

fn validate_file(size: usize, mime: &str) -> Result<ImageFormat, ApiError> {
    if size > MAX_FILE_SIZE {
        return Err(ApiError::BadRequest("File size exceeds 5MB limit".into()));
    }
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(ApiError::BadRequest(format!(
            "Invalid file type. Allowed types: {}",
            ALLOWED_MIME_TYPES.join(", ")
        )));
    }
    ImageFormat::from_mime_type(mime)
        .ok_or_else(|| ApiError::BadRequest("Invalid file type".into()))
}

/// The `hashtags` field arrives either as a JSON array string or as repeated
/// plain-text fields; both forms collapse into one tag list.
fn parse_hashtags(fields: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in fields {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(parsed) => tags.extend(parsed),
            Err(_) => {
                let tag = raw.trim();
                if !tag.is_empty() {
                    tags.push(tag.to_string());
                }
            }
        }
    }
    tags
}

/// Fit the image within MAX_DIMENSION×MAX_DIMENSION, preserving aspect ratio.
/// Images already inside the bound pass through unchanged — no upscaling.
fn process_image(data: Vec<u8>, format: ImageFormat) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(&data, format)?;

    if img.width() <= MAX_DIMENSION && img.height() <= MAX_DIMENSION {
        return Ok(data);
    }

    let resized = img.thumbnail(MAX_DIMENSION, MAX_DIMENSION);
    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, format)?;
    Ok(out.into_inner())
}
