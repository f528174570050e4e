pub mod cursor;

pub use cursor::{CursorCodec, CursorError, CursorPosition};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PaginationInfo {
    pub has_next: bool,
    /// Empty when there is no next page.
    pub next_cursor: String,
}

/// One page of a keyset-paginated feed, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub size: usize,
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Page {
            size: 0,
            data: Vec::new(),
            pagination: PaginationInfo {
                has_next: false,
                next_cursor: String::new(),
            },
        }
    }

    /// Assemble a page from a probe of `limit + 1` rows.
    ///
    /// When the probe came back full, the extra row is dropped and `mint` is
    /// called with the last kept row to produce the next cursor.
    pub fn from_probe(mut rows: Vec<T>, limit: usize, mint: impl FnOnce(&T) -> String) -> Self {
        let has_next = rows.len() > limit;
        if has_next {
            rows.truncate(limit);
        }

        let next_cursor = match (has_next, rows.last()) {
            (true, Some(last)) => mint(last),
            _ => String::new(),
        };

        Page {
            size: rows.len(),
            data: rows,
            pagination: PaginationInfo {
                has_next,
                next_cursor,
            },
        }
    }
}
