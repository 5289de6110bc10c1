use crate::Database;
use crate::models::CommentRow;
use anyhow::Result;

impl Database {
    pub fn insert_comment(
        &self,
        id: &str,
        user_id: &str,
        photo_id: &str,
        content: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, user_id, photo_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, user_id, photo_id, content, now],
            )?;
            Ok(())
        })
    }

    pub fn get_comments_for_photo(&self, photo_id: &str) -> Result<Vec<CommentRow>> {
        // JOIN users to fetch the commenter's username in a single query
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.user_id, c.photo_id, u.username, c.content, c.created_at, c.updated_at
                 FROM comments c
                 JOIN users u ON c.user_id = u.id
                 WHERE c.photo_id = ?1
                 ORDER BY c.created_at DESC",
            )?;
            let rows = stmt
                .query_map([photo_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        photo_id: row.get(2)?,
                        username: row.get(3)?,
                        content: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_comments(&self, photo_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE photo_id = ?1",
                [photo_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    const NOW: &str = "2024-01-01T00:00:00Z";

    #[test]
    fn comments_list_newest_first_with_usernames() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "alice", "alice@example.com", "hash", NOW)
            .unwrap();
        db.create_user("u2", "bob", "bob@example.com", "hash", NOW)
            .unwrap();
        db.insert_photo("p1", "u1", "a.jpg", "/media/a.jpg", None, "[]", NOW)
            .unwrap();

        db.insert_comment("c1", "u2", "p1", "first", "2024-01-01T10:00:00Z")
            .unwrap();
        db.insert_comment("c2", "u1", "p1", "second", "2024-01-01T11:00:00Z")
            .unwrap();

        let comments = db.get_comments_for_photo("p1").unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, "c2");
        assert_eq!(comments[0].username, "alice");
        assert_eq!(comments[1].id, "c1");
        assert_eq!(comments[1].username, "bob");

        assert_eq!(db.count_comments("p1").unwrap(), 2);
        assert_eq!(db.count_comments("missing").unwrap(), 0);
    }
}
