use crate::state::Cursor;

/// Resume point for a crawl
///
/// `page_number` names the next page to fetch for `seed` and `cursor` is the
/// cursor to fetch it with. A checkpoint with an exhausted cursor means the
/// seed is finished and the crawl should move on to the next eligible account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub seed: String,
    pub page_number: u32,
    pub cursor: Cursor,
}

impl Checkpoint {
    /// Checkpoint for a seed whose first page has not been evaluated yet
    pub fn start_of(seed: &str) -> Self {
        Self {
            seed: seed.to_string(),
            page_number: 1,
            cursor: Cursor::First,
        }
    }

    /// Checkpoint recorded after page `page_number` has been committed
    pub fn after_page(seed: &str, page_number: u32, next_cursor: Cursor) -> Self {
        Self {
            seed: seed.to_string(),
            page_number: page_number + 1,
            cursor: next_cursor,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }
}
