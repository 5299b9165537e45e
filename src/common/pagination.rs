const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Normalises `limit`/`offset` query values into a bounded page.
pub fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Trims a free-text search and drops it when empty.
pub fn search_term(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_limits() {
        assert_eq!(page(None, None), (50, 0));
        assert_eq!(page(Some(1000), Some(-3)), (200, 0));
        assert_eq!(page(Some(0), Some(20)), (1, 20));
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(&Some("   ".into())), None);
        assert_eq!(search_term(&Some(" sop ".into())), Some("sop".into()));
    }
}
