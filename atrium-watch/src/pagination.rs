//! Page and offset math for subscription listings
//!
//! The feed asks for a page number; out-of-range requests are clamped
//! rather than rejected, so a stale bookmark to page 9 of a shrunken list
//! lands on the last page instead of erroring.

/// Where a requested page falls in the full result set
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Effective page number (1-indexed, after clamping)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for the backing LIMIT/OFFSET query
    pub offset: i64,
}

/// Clamp a requested page into bounds and derive its query offset.
///
/// An empty result set still yields page 1 with offset 0. `page_size`
/// must be positive; the feed validates before calling.
pub fn calculate_pagination(total_results: i64, requested_page: i64, page_size: i64) -> Pagination {
    let total_pages = (total_results + page_size - 1) / page_size;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
