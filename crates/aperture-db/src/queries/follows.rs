use crate::Database;
use crate::models::FollowRow;
use anyhow::Result;
use rusqlite::OptionalExtension;

impl Database {
    pub fn insert_follow(&self, follower_id: &str, following_id: &str, now: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![follower_id, following_id, now],
            )?;
            Ok(())
        })
    }

    pub fn get_follow(&self, follower_id: &str, following_id: &str) -> Result<Option<FollowRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT follower_id, following_id, created_at FROM follows
                 WHERE follower_id = ?1 AND following_id = ?2",
            )?;
            let row = stmt
                .query_row([follower_id, following_id], |row| {
                    Ok(FollowRow {
                        follower_id: row.get(0)?,
                        following_id: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Returns the number of deleted edges (0 when the edge did not exist).
    pub fn delete_follow(&self, follower_id: &str, following_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                [follower_id, following_id],
            )?;
            Ok(n)
        })
    }

    pub fn count_followers(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE following_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn count_following(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn get_following_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT following_id FROM follows WHERE follower_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}
