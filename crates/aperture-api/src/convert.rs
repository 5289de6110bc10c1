//! Row-to-DTO conversions shared by the photo, feed, and search handlers.

use aperture_db::models::PhotoRow;
use aperture_types::api::PhotoResponse;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Timestamps are written by the application as RFC 3339, but rows created
/// outside it (schema defaults) carry SQLite's "YYYY-MM-DD HH:MM:SS" form.
pub fn parse_timestamp(value: &str, what: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} timestamp '{}': {}", what, value, e);
            DateTime::default()
        })
}

pub fn parse_row_uuid(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, value, e);
        Uuid::default()
    })
}

pub fn photo_response(row: PhotoRow) -> PhotoResponse {
    let hashtags: Vec<String> = serde_json::from_str(&row.hashtags).unwrap_or_else(|e| {
        warn!("Corrupt hashtags on photo '{}': {}", row.id, e);
        vec![]
    });

    PhotoResponse {
        id: parse_row_uuid(&row.id, "photo"),
        owner_id: parse_row_uuid(&row.owner_id, "owner"),
        owner_username: row.owner_username,
        filename: row.filename,
        url: row.url,
        caption: row.caption,
        hashtags,
        created_at: parse_timestamp(&row.created_at, "photo created_at"),
        updated_at: parse_timestamp(&row.updated_at, "photo updated_at"),
    }
}
