use crate::Database;
use crate::models::LikeRow;
use anyhow::Result;
use rusqlite::OptionalExtension;

impl Database {
    pub fn insert_like(&self, id: &str, user_id: &str, photo_id: &str, now: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO likes (id, user_id, photo_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, user_id, photo_id, now],
            )?;
            Ok(())
        })
    }

    pub fn get_like(&self, user_id: &str, photo_id: &str) -> Result<Option<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, photo_id, created_at FROM likes
                 WHERE user_id = ?1 AND photo_id = ?2",
            )?;
            let row = stmt
                .query_row([user_id, photo_id], map_like_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Returns the number of deleted rows (0 when no such like exists).
    pub fn delete_like(&self, user_id: &str, photo_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND photo_id = ?2",
                [user_id, photo_id],
            )?;
            Ok(n)
        })
    }

    pub fn get_likes_for_photo(&self, photo_id: &str) -> Result<Vec<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, photo_id, created_at FROM likes
                 WHERE photo_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([photo_id], map_like_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_likes(&self, photo_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE photo_id = ?1",
                [photo_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

fn map_like_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LikeRow> {
    Ok(LikeRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        photo_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}
