//! Page arithmetic for the reports listing

/// Page sizes offered by the reports view
pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Number of pages for `total` items, never less than one
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(limit)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Current page (1-based) and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    limit: u32,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pager {
    /// `None` unless `limit` is one of [`PAGE_SIZES`]
    pub fn new(page: u32, limit: u32) -> Option<Self> {
        PAGE_SIZES.contains(&limit).then_some(Self {
            page: page.max(1),
            limit,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn can_prev(&self, loading: bool) -> bool {
        !loading && self.page > 1
    }

    pub fn can_next(&self, total: u64, loading: bool) -> bool {
        !loading && self.page < total_pages(total, self.limit)
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, total: u64) {
        self.page = (self.page + 1).min(total_pages(total, self.limit));
    }

    /// Returns `false` when `limit` is not an offered page size
    pub fn set_limit(&mut self, limit: u32) -> bool {
        if !PAGE_SIZES.contains(&limit) {
            return false;
        }
        self.limit = limit;
        self.page = 1;
        true
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}
