use crate::Database;
use crate::models::NotificationRow;
use anyhow::Result;

impl Database {
    pub fn insert_notification(
        &self,
        id: &str,
        user_id: &str,
        kind: &str,
        reference_id: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, type, reference_id, read, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                rusqlite::params![id, user_id, kind, reference_id, now],
            )?;
            Ok(())
        })
    }

    pub fn get_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, type, reference_id, read, created_at, updated_at
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        reference_id: row.get(3)?,
                        read: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Update-by-filter; returns the number of rows touched. Zero matches is
    /// not an error.
    pub fn mark_notification_read(&self, user_id: &str, id: &str, now: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE notifications SET read = 1, updated_at = ?3
                 WHERE id = ?2 AND user_id = ?1",
                rusqlite::params![user_id, id, now],
            )?;
            Ok(n)
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str, now: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE notifications SET read = 1, updated_at = ?2 WHERE user_id = ?1",
                rusqlite::params![user_id, now],
            )?;
            Ok(n)
        })
    }
}
