use crate::Database;
use crate::models::PhotoRow;
use crate::queries::escape_like;
use anyhow::Result;
use rusqlite::OptionalExtension;

const PHOTO_COLUMNS: &str = "p.id, p.owner_id, u.username, p.filename, p.url, p.caption, \
                             p.hashtags, p.created_at, p.updated_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn insert_photo(
        &self,
        id: &str,
        owner_id: &str,
        filename: &str,
        url: &str,
        caption: Option<&str>,
        hashtags_json: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO photos (id, owner_id, filename, url, caption, hashtags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                rusqlite::params![id, owner_id, filename, url, caption, hashtags_json, now],
            )?;
            Ok(())
        })
    }

    pub fn get_photo(&self, id: &str) -> Result<Option<PhotoRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PHOTO_COLUMNS} FROM photos p
                 JOIN users u ON p.owner_id = u.id
                 WHERE p.id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_photo_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_photos_by_owner(&self, owner_id: &str) -> Result<Vec<PhotoRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PHOTO_COLUMNS} FROM photos p
                 JOIN users u ON p.owner_id = u.id
                 WHERE p.owner_id = ?1
                 ORDER BY p.created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], map_photo_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_photo(&self, id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM photos WHERE id = ?1", [id])?;
            Ok(n)
        })
    }

    pub fn count_photos_by_owner(&self, owner_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM photos WHERE owner_id = ?1",
                [owner_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// One page of the feed: photos by any of `owner_ids`, newest first,
    /// joined with the owner for display.
    pub fn feed_page(&self, owner_ids: &[String], limit: u32, offset: i64) -> Result<Vec<PhotoRow>> {
        if owner_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders = placeholder_list(owner_ids.len());
            let sql = format!(
                "SELECT {PHOTO_COLUMNS} FROM photos p
                 JOIN users u ON p.owner_id = u.id
                 WHERE p.owner_id IN ({placeholders})
                 ORDER BY p.created_at DESC
                 LIMIT ?{} OFFSET ?{}",
                owner_ids.len() + 1,
                owner_ids.len() + 2,
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut params: Vec<&dyn rusqlite::types::ToSql> = owner_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            params.push(&limit);
            params.push(&offset);

            let rows = stmt
                .query_map(params.as_slice(), map_photo_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Total number of feed rows, for pagination metadata.
    pub fn count_photos_by_owners(&self, owner_ids: &[String]) -> Result<i64> {
        if owner_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let placeholders = placeholder_list(owner_ids.len());
            let sql =
                format!("SELECT COUNT(*) FROM photos WHERE owner_id IN ({placeholders})");

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = owner_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let n = stmt.query_row(params.as_slice(), |row| row.get(0))?;
            Ok(n)
        })
    }

    /// Pattern match over captions and hashtags, newest first.
    pub fn search_photos(&self, query: &str) -> Result<Vec<PhotoRow>> {
        let pattern = format!("%{}%", escape_like(query));
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PHOTO_COLUMNS} FROM photos p
                 JOIN users u ON p.owner_id = u.id
                 WHERE p.caption LIKE ?1 ESCAPE '\\' OR p.hashtags LIKE ?1 ESCAPE '\\'
                 ORDER BY p.created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([&pattern], map_photo_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn placeholder_list(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_photo_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PhotoRow> {
    Ok(PhotoRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_username: row.get(2)?,
        filename: row.get(3)?,
        url: row.get(4)?,
        caption: row.get(5)?,
        hashtags: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::Database;

    const NOW: &str = "2024-01-01T00:00:00Z";

    fn seed(db: &Database) {
        db.create_user("u1", "alice", "alice@example.com", "hash", NOW)
            .unwrap();
        db.create_user("u2", "bob", "bob@example.com", "hash", NOW)
            .unwrap();
    }

    fn insert_photo(db: &Database, id: &str, owner: &str, caption: &str, at: &str) {
        db.insert_photo(id, owner, "img.jpg", &format!("/media/{id}.jpg"), Some(caption), "[]", at)
            .unwrap();
    }

    #[test]
    fn feed_page_orders_newest_first_across_owners() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        insert_photo(&db, "p1", "u2", "bobs", "2024-01-01T10:00:00Z");
        insert_photo(&db, "p2", "u1", "alices", "2024-01-02T10:00:00Z");

        let owners = vec!["u2".to_string(), "u1".to_string()];
        let rows = db.feed_page(&owners, 10, 0).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "p2");
        assert_eq!(rows[0].owner_username, "alice");
        assert_eq!(rows[1].id, "p1");

        assert_eq!(db.count_photos_by_owners(&owners).unwrap(), 2);
    }

    #[test]
    fn feed_page_applies_limit_and_offset() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        for i in 0..5 {
            insert_photo(
                &db,
                &format!("p{i}"),
                "u1",
                "caption",
                &format!("2024-01-0{}T00:00:00Z", i + 1),
            );
        }

        let owners = vec!["u1".to_string()];
        let page = db.feed_page(&owners, 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "p2");
        assert_eq!(page[1].id, "p1");
    }

    #[test]
    fn feed_page_with_no_owners_is_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.feed_page(&[], 10, 0).unwrap().is_empty());
        assert_eq!(db.count_photos_by_owners(&[]).unwrap(), 0);
    }

    #[test]
    fn photo_delete_cascades_to_engagement() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        insert_photo(&db, "p1", "u1", "caption", NOW);
        db.insert_like("l1", "u2", "p1", NOW).unwrap();
        db.insert_comment("c1", "u2", "p1", "nice", NOW).unwrap();

        assert_eq!(db.delete_photo("p1").unwrap(), 1);
        assert_eq!(db.count_likes("p1").unwrap(), 0);
        assert_eq!(db.count_comments("p1").unwrap(), 0);
    }

    #[test]
    fn search_matches_caption_and_hashtags() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        db.insert_photo(
            "p1",
            "u1",
            "a.jpg",
            "/media/a.jpg",
            Some("sunset at the beach"),
            "[\"nature\"]",
            NOW,
        )
        .unwrap();
        db.insert_photo(
            "p2",
            "u1",
            "b.jpg",
            "/media/b.jpg",
            None,
            "[\"sunset\",\"city\"]",
            "2024-01-02T00:00:00Z",
        )
        .unwrap();

        let hits = db.search_photos("sunset").unwrap();
        assert_eq!(hits.len(), 2);
        // Newest first.
        assert_eq!(hits[0].id, "p2");

        let hits = db.search_photos("city").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p2");

        assert!(db.search_photos("nomatch").unwrap().is_empty());
    }
}
