//! Splitting listings into numbered pages.

/// Number of entries on one page
pub const PAGE_SIZE: i64 = 10;

/// The position of one page within a listing of `total` entries.
///
/// Pages are numbered from 1. There is always at least one page, even for an empty listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl Window {
    /// Picks the page for a raw `page` query parameter.
    ///
    /// A missing or malformed number gives the first page, an out of range number the last.
    pub fn new(requested: Option<&str>, total: i64) -> Window {
        let total = total.max(0);
        let num_pages = if total == 0 {
            1
        } else {
            (total + PAGE_SIZE - 1) / PAGE_SIZE
        };
        let number = match requested.map(|page| page.trim().parse::<i64>()) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n < 1 || n > num_pages => num_pages,
            Some(Ok(n)) => n,
        };
        Window {
            number,
            num_pages,
            total,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous(&self) -> i64 {
        self.number - 1
    }

    pub fn next(&self) -> i64 {
        self.number + 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }
}

/// One page of a listing
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: Window,
}
