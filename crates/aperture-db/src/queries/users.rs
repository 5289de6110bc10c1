use crate::Database;
use crate::models::UserRow;
use crate::queries::escape_like;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

const USER_COLUMNS: &str = "id, username, email, password, bio, created_at, updated_at";

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, username, email, password_hash, now],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    /// Single OR query backing the registration conflict check.
    pub fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt
                .query_row(rusqlite::params![username, email], map_user_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_user_profile(
        &self,
        id: &str,
        username: &str,
        bio: Option<&str>,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET username = ?2, bio = ?3, updated_at = ?4 WHERE id = ?1",
                rusqlite::params![id, username, bio, now],
            )?;
            Ok(())
        })
    }

    pub fn search_users(&self, query: &str) -> Result<Vec<UserRow>> {
        let pattern = format!("%{}%", escape_like(query));
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE username LIKE ?1 ESCAPE '\\'
                 ORDER BY username"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([&pattern], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], map_user_row).optional()?;
    Ok(row)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        bio: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn seed_user(db: &Database, id: &str, username: &str, email: &str) {
        db.create_user(id, username, email, "hash", "2024-01-01T00:00:00Z")
            .unwrap();
    }

    #[test]
    fn username_and_email_are_unique() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice", "alice@example.com");

        assert!(db
            .create_user("u2", "alice", "other@example.com", "hash", "2024-01-01T00:00:00Z")
            .is_err());
        assert!(db
            .create_user("u3", "other", "alice@example.com", "hash", "2024-01-01T00:00:00Z")
            .is_err());
    }

    #[test]
    fn or_lookup_matches_either_field() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice", "alice@example.com");

        let by_name = db
            .find_user_by_username_or_email("alice", "nobody@example.com")
            .unwrap();
        assert!(by_name.is_some());

        let by_email = db
            .find_user_by_username_or_email("nobody", "alice@example.com")
            .unwrap();
        assert!(by_email.is_some());

        let neither = db
            .find_user_by_username_or_email("nobody", "nobody@example.com")
            .unwrap();
        assert!(neither.is_none());
    }

    #[test]
    fn profile_update_persists() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice", "alice@example.com");

        db.update_user_profile("u1", "alice2", Some("hello"), "2024-01-02T00:00:00Z")
            .unwrap();

        let user = db.get_user_by_id("u1").unwrap().unwrap();
        assert_eq!(user.username, "alice2");
        assert_eq!(user.bio.as_deref(), Some("hello"));
        assert!(db.get_user_by_username("alice").unwrap().is_none());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "u1", "alice", "alice@example.com");
        seed_user(&db, "u2", "100%cotton", "cotton@example.com");

        let hits = db.search_users("li").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "alice");

        // A literal `%` must not behave as a wildcard.
        let hits = db.search_users("0%c").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "100%cotton");

        let hits = db.search_users("%").unwrap();
        assert_eq!(hits.len(), 1);
    }
}
