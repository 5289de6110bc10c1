mod comments;
mod follows;
mod likes;
mod notifications;
mod photos;
mod users;

/// Escape LIKE wildcards in user-supplied search text. The escaped string is
/// matched with `LIKE ... ESCAPE '\'` so `%` and `_` in a query are literal.
pub fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("alice"), "alice");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
