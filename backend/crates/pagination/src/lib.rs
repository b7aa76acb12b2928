//! Offset pagination primitives shared by backend listing endpoints.
//!
//! A [`PageRequest`] normalises caller-supplied page numbers and sizes so
//! adapters never see a zero or negative value, and a [`Page`] carries one
//! slice of results together with the totals needed to render navigation.
//!
//! Normalisation policy:
//! - a page below `1`, or one that cannot be parsed, becomes [`DEFAULT_PAGE`];
//! - a page size below `1`, or one that cannot be parsed, becomes
//!   [`DEFAULT_PAGE_SIZE`].

use std::num::NonZeroU32;

use serde::Serialize;

/// Page number used when the caller omits or mangles the value.
pub const DEFAULT_PAGE: NonZeroU32 = NonZeroU32::MIN;

/// Page size used when the caller omits or mangles the value.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => NonZeroU32::MIN,
};

/// Normalised page coordinates for an offset-paginated query.
///
/// # Examples
///
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(0, -1);
/// assert_eq!(request.page(), 1);
/// assert_eq!(request.page_size(), 10);
/// assert_eq!(request.offset(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: NonZeroU32,
    page_size: NonZeroU32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request, replacing out-of-range values with the defaults.
    #[must_use]
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: positive(page).unwrap_or(DEFAULT_PAGE),
            page_size: positive(page_size).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Build a request from raw query-string values.
    ///
    /// Missing or unparsable values fall back to the defaults rather than
    /// failing the request.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::PageRequest;
    ///
    /// let request = PageRequest::parse(Some("3"), Some("abc"));
    /// assert_eq!(request.page(), 3);
    /// assert_eq!(request.page_size(), 10);
    /// ```
    #[must_use]
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Self {
        Self {
            page: page
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .and_then(positive)
                .unwrap_or(DEFAULT_PAGE),
            page_size: page_size
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .and_then(positive)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page.get()
    }

    /// Number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    /// Maximum number of rows an adapter should return.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.page_size.get()
    }

    /// Number of rows an adapter should skip: `(page - 1) * page_size`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.get() - 1).saturating_mul(u64::from(self.page_size.get()))
    }
}

fn positive(value: i64) -> Option<NonZeroU32> {
    u32::try_from(value).ok().and_then(NonZeroU32::new)
}

/// Number of pages needed to show `total_count` items.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroU32;
/// use pagination::total_pages;
///
/// let size = NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN);
/// assert_eq!(total_pages(25, size), 3);
/// assert_eq!(total_pages(0, size), 0);
/// ```
#[must_use]
pub const fn total_pages(total_count: u64, page_size: NonZeroU32) -> u64 {
    total_count.div_ceil(page_size.get() as u64)
}

/// One page of results plus the totals needed for navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    total_count: u64,
    page: u32,
    page_size: u32,
    total_pages: u64,
}

impl<T> Page<T> {
    /// Wrap `items` fetched for `request`, given the unpaginated total.
    #[must_use]
    pub const fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            page: request.page.get(),
            page_size: request.page_size.get(),
            total_pages: total_pages(total_count, request.page_size),
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Total number of items across all pages.
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Requested page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages available.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total_pages
    }
}
