use crate::error::{Result, SpelunkerError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 500;

/// How a caller asks for a page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaginationOptions {
    /// Numbered pages. Requires a total count.
    Countable { page: i64, per_page: i64 },
    /// Continuation from an opaque token. An empty pointer starts from the beginning.
    Cursor { pointer: String, per_page: i64 },
}

impl Default for PaginationOptions {
    fn default() -> Self {
        PaginationOptions::Countable {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PaginationOptions {
    pub fn countable(page: i64, per_page: i64) -> Self {
        PaginationOptions::Countable {
            page: page.max(1),
            per_page: clamp_per_page(per_page),
        }
    }

    pub fn cursor(pointer: impl Into<String>, per_page: i64) -> Self {
        PaginationOptions::Cursor {
            pointer: pointer.into(),
            per_page: clamp_per_page(per_page),
        }
    }

    pub fn per_page(&self) -> i64 {
        match self {
            PaginationOptions::Countable { per_page, .. } => clamp_per_page(*per_page),
            PaginationOptions::Cursor { per_page, .. } => clamp_per_page(*per_page),
        }
    }

    /// Page number, floored at 1. Cursor requests are always on "page 1".
    pub fn page(&self) -> i64 {
        match self {
            PaginationOptions::Countable { page, .. } => (*page).max(1),
            PaginationOptions::Cursor { .. } => 1,
        }
    }

    pub fn pointer(&self) -> Option<&str> {
        match self {
            PaginationOptions::Cursor { pointer, .. } if !pointer.is_empty() => Some(pointer),
            _ => None,
        }
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self, PaginationOptions::Cursor { .. })
    }

    /// `(limit, offset)` for a countable page, offset is `(page - 1) * per_page`
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page();
        (per_page, (self.page() - 1) * per_page)
    }
}

fn clamp_per_page(per_page: i64) -> i64 {
    per_page.clamp(1, MAX_PER_PAGE)
}

/// `ceil(total / per_page)`, zero when there is nothing to page through
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        return 0;
    }

    let per_page = per_page.max(1);
    (total + per_page - 1) / per_page
}

/// Pagination metadata returned alongside a page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaginationResults {
    Countable {
        total: i64,
        per_page: i64,
        page: i64,
        pages: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_page: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_page: Option<i64>,
    },
    Cursor {
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<i64>,
        per_page: i64,
        /// Empty once the result set is exhausted
        next: String,
    },
}

impl PaginationResults {
    pub fn countable(total: i64, opts: &PaginationOptions) -> Self {
        let per_page = opts.per_page();
        let page = opts.page();
        let pages = page_count(total, per_page);

        PaginationResults::Countable {
            total,
            per_page,
            page,
            pages,
            next_page: (page < pages).then_some(page + 1),
            previous_page: (page > 1 && page <= pages + 1).then_some(page - 1),
        }
    }

    pub fn cursor(total: Option<i64>, per_page: i64, next: impl Into<String>) -> Self {
        PaginationResults::Cursor {
            total,
            per_page,
            next: next.into(),
        }
    }

    /// Results for a query that matched nothing, in the mode the caller asked for
    pub fn empty(opts: &PaginationOptions) -> Self {
        match opts {
            PaginationOptions::Countable { .. } => PaginationResults::countable(0, opts),
            PaginationOptions::Cursor { .. } => {
                PaginationResults::cursor(Some(0), opts.per_page(), "")
            }
        }
    }

    pub fn total(&self) -> Option<i64> {
        match self {
            PaginationResults::Countable { total, .. } => Some(*total),
            PaginationResults::Cursor { total, .. } => *total,
        }
    }

    pub fn pages(&self) -> Option<i64> {
        match self {
            PaginationResults::Countable { pages, .. } => Some(*pages),
            PaginationResults::Cursor { total, per_page, .. } => {
                total.map(|t| page_count(t, *per_page))
            }
        }
    }

    /// The continuation token, if there is anything left to fetch
    pub fn next_cursor(&self) -> Option<&str> {
        match self {
            PaginationResults::Cursor { next, .. } if !next.is_empty() => Some(next),
            _ => None,
        }
    }
}

/// Parse the numeric part of a prefixed cursor token, e.g. `after-1234`
pub fn parse_cursor_offset(pointer: &str, prefix: &str) -> Result<i64> {
    pointer
        .strip_prefix(prefix)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .ok_or_else(|| SpelunkerError::invalid_input(format!("Invalid cursor '{}'", pointer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_is_ceiling() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(95, 10), 10);
    }

    #[test]
    fn test_limit_offset_floors_at_one() {
        assert_eq!(PaginationOptions::countable(0, 0).limit_offset(), (1, 0));
        assert_eq!(PaginationOptions::countable(3, 10).limit_offset(), (10, 20));

        let raw = PaginationOptions::Countable { page: -4, per_page: -1 };
        assert_eq!(raw.limit_offset(), (1, 0));
    }

    #[test]
    fn test_countable_results() {
        let opts = PaginationOptions::countable(2, 10);
        let results = PaginationResults::countable(25, &opts);

        assert_eq!(
            results,
            PaginationResults::Countable {
                total: 25,
                per_page: 10,
                page: 2,
                pages: 3,
                next_page: Some(3),
                previous_page: Some(1),
            }
        );
    }

    #[test]
    fn test_empty_results_follow_request_mode() {
        let countable = PaginationResults::empty(&PaginationOptions::default());
        assert_eq!(countable.pages(), Some(0));

        let cursor = PaginationResults::empty(&PaginationOptions::cursor("", 10));
        assert_eq!(cursor.next_cursor(), None);
        assert_eq!(cursor.total(), Some(0));
    }

    #[test]
    fn test_results_json_tagged_by_method() {
        let results = PaginationResults::cursor(None, 10, "abc");
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"method": "cursor", "per_page": 10, "next": "abc"})
        );
    }

    #[test]
    fn test_parse_cursor_offset() {
        assert_eq!(parse_cursor_offset("after-42", "after-").unwrap(), 42);
        assert!(parse_cursor_offset("after-", "after-").is_err());
        assert!(parse_cursor_offset("before-42", "after-").is_err());
        assert!(parse_cursor_offset("after--1", "after-").is_err());
    }
}
