/// Database row types — these map directly to SQLite rows.
/// Distinct from aperture-types API DTOs to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct PhotoRow {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub filename: String,
    pub url: String,
    pub caption: Option<String>,
    /// JSON-encoded array of tag strings.
    pub hashtags: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct FollowRow {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: String,
}

pub struct LikeRow {
    pub id: String,
    pub user_id: String,
    pub photo_id: String,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub user_id: String,
    pub photo_id: String,
    pub username: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub reference_id: String,
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}
