//! Cursor-based pagination for insertion-ordered reads.
//!
//! Cursors are opaque base64-encoded UUIDs. Because every primary key is a
//! time-ordered v7 UUID, paginating on `id > cursor` gives stable insertion
//! order without a separate sequence column.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use uuid::Uuid;

/// Default page size when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Hard cap on page size.
pub const MAX_PAGE_SIZE: i64 = 200;

// ============================================================================
// Cursor
// ============================================================================

/// Opaque pagination cursor (base64-encoded UUID).
#[derive(Debug, Clone)]
pub struct Cursor(Uuid);

impl Cursor {
    /// Create a cursor from a UUID.
    pub fn new(id: Uuid) -> Self {
        Cursor(id)
    }

    /// Encode the cursor as a base64 string.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }

    /// Decode a cursor string back to a Cursor.
    pub fn decode(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .context("Invalid cursor: not valid base64")?;
        let uuid = Uuid::from_slice(&bytes).context("Invalid cursor: not a valid UUID")?;
        Ok(Cursor(uuid))
    }

    /// Get the underlying UUID.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

// ============================================================================
// Page arguments and result
// ============================================================================

/// Input arguments for a paginated read.
#[derive(Debug, Clone, Default)]
pub struct PageArgs {
    /// Number of items to return (clamped to [1, MAX_PAGE_SIZE]).
    pub first: Option<i64>,
    /// Resume after this cursor (exclusive).
    pub after: Option<String>,
}

impl PageArgs {
    /// Effective page size after clamping.
    pub fn limit(&self) -> i64 {
        self.first
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Decode the `after` cursor, if present.
    pub fn after_id(&self) -> Result<Option<Uuid>> {
        match &self.after {
            Some(s) => Ok(Some(Cursor::decode(s)?.into_uuid())),
            None => Ok(None),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor of the last item, for fetching the next page.
    pub end_cursor: Option<String>,
    /// Whether more items exist past `end_cursor`.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Build a page from `limit + 1` fetched rows.
    ///
    /// `id_of` extracts the UUID used as the cursor for each item.
    pub fn from_rows(mut rows: Vec<T>, limit: i64, id_of: impl Fn(&T) -> Uuid) -> Self {
        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        let end_cursor = rows.last().map(|item| Cursor::new(id_of(item)).encode());
        Page {
            items: rows,
            end_cursor,
            has_more,
        }
    }

    /// An empty page.
    pub fn empty() -> Self {
        Page {
            items: Vec::new(),
            end_cursor: None,
            has_more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_roundtrip() {
        let id = Uuid::now_v7();
        let encoded = Cursor::new(id).encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(decoded.into_uuid(), id);
    }

    #[test]
    fn cursor_rejects_garbage() {
        assert!(Cursor::decode("not a cursor!!").is_err());
    }

    #[test]
    fn limit_is_clamped() {
        let args = PageArgs {
            first: Some(100_000),
            after: None,
        };
        assert_eq!(args.limit(), MAX_PAGE_SIZE);

        let args = PageArgs {
            first: Some(0),
            after: None,
        };
        assert_eq!(args.limit(), 1);

        assert_eq!(PageArgs::default().limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn page_truncates_overfetch() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::now_v7()).collect();
        let page = Page::from_rows(ids.clone(), 3, |id| *id);
        assert_eq!(page.items.len(), 3);
        assert!(page.has_more);
        assert_eq!(
            page.end_cursor.as_deref(),
            Some(Cursor::new(ids[2]).encode().as_str())
        );
    }

    #[test]
    fn page_without_overfetch_has_no_more() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::now_v7()).collect();
        let page = Page::from_rows(ids, 3, |id| *id);
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);
    }
}
