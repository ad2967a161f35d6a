use serde::Serialize;

/// Slice of a listing plus the numbers needed to render pager links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: i64,
}

/// Resolved position in a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    /// A missing or non-numeric page yields the first page; a number outside
    /// `1..=num_pages` yields the last one.
    pub fn resolve(requested: Option<&str>, total: i64, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let pages = (total.max(0) + i64::from(per_page) - 1) / i64::from(per_page);
        let num_pages = u32::try_from(pages.max(1)).unwrap_or(u32::MAX);

        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n >= 1 && n <= i64::from(num_pages) => n as u32,
            Some(Ok(_)) => num_pages,
            _ => 1,
        };

        Self {
            number,
            num_pages,
            limit: i64::from(per_page),
            offset: i64::from(number - 1) * i64::from(per_page),
        }
    }

    pub fn page<T>(&self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total,
        }
    }
}
