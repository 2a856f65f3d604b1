//! Pagination math for list views (transactions, disputes, payment links).
//!
//! [`Paginator`] normalises a requested page and page size against the total
//! number of results and produces the navigation links and page-size choices
//! that list pages render.

use serde::Serialize;

/// Page sizes offered to users, smallest first.
pub const PAGE_SIZES: [u64; 3] = [100, 200, 500];

/// Page size used when none (or an invalid one) is requested.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Largest page size upstream list endpoints accept.
pub const MAX_PAGE_SIZE: u64 = 500;

/// Number of numbered links shown on each side of the current page.
const PAGE_WINDOW: u64 = 2;

/// Kind of navigation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageLinkKind {
    Previous,
    Page,
    Next,
}

/// One navigation link in a paginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub kind: PageLinkKind,
    /// Page the link points at (1-based).
    pub number: u64,
    pub label: String,
    pub is_current: bool,
}

/// One entry of the page-size selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplaySizeOption {
    pub size: u64,
    pub is_selected: bool,
}

/// Normalised pagination state for one list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    page_size: u64,
    page: u64,
}

impl Paginator {
    /// Creates a paginator.
    ///
    /// A page size of zero or above [`MAX_PAGE_SIZE`] falls back to
    /// [`DEFAULT_PAGE_SIZE`]. The page is clamped to `1..=last_page()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use selfservice_core::Paginator;
    ///
    /// let p = Paginator::new(250, 100, 9);
    /// assert_eq!(p.page(), 3);
    /// assert_eq!(p.last_page(), 3);
    /// assert_eq!(p.offset(), 200);
    /// ```
    #[must_use]
    pub fn new(total: u64, page_size: u64, page: u64) -> Self {
        let page_size = page_size_or_default(page_size);
        let last = last_page_for(total, page_size);
        Self {
            total,
            page_size,
            page: page.clamp(1, last),
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Current page (1-based).
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Last page number; 1 when there are no results.
    #[must_use]
    pub fn last_page(&self) -> u64 {
        last_page_for(self.total, self.page_size)
    }

    #[must_use]
    pub fn previous_page(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }

    #[must_use]
    pub fn next_page(&self) -> Option<u64> {
        (self.page < self.last_page()).then(|| self.page + 1)
    }

    /// Index of the first result on the current page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// Navigation links: previous, a window of numbered pages, next.
    ///
    /// Empty when everything fits on one page.
    #[must_use]
    pub fn page_links(&self) -> Vec<PageLink> {
        let last = self.last_page();
        if last <= 1 {
            return Vec::new();
        }

        let mut links = Vec::new();
        if let Some(prev) = self.previous_page() {
            links.push(PageLink {
                kind: PageLinkKind::Previous,
                number: prev,
                label: "Previous".to_string(),
                is_current: false,
            });
        }

        let start = self.page.saturating_sub(PAGE_WINDOW).max(1);
        let end = self.page.saturating_add(PAGE_WINDOW).min(last);
        for number in start..=end {
            links.push(PageLink {
                kind: PageLinkKind::Page,
                number,
                label: number.to_string(),
                is_current: number == self.page,
            });
        }

        if let Some(next) = self.next_page() {
            links.push(PageLink {
                kind: PageLinkKind::Next,
                number: next,
                label: "Next".to_string(),
                is_current: false,
            });
        }
        links
    }

    /// Whether the page-size selector is worth showing.
    #[must_use]
    pub fn show_display_size_links(&self) -> bool {
        self.total > PAGE_SIZES[0]
    }

    /// Page sizes to offer: each size whose smaller neighbour does not
    /// already fit every result, plus the size currently in use.
    #[must_use]
    pub fn display_size_options(&self) -> Vec<DisplaySizeOption> {
        let mut options: Vec<DisplaySizeOption> = PAGE_SIZES
            .iter()
            .enumerate()
            .filter(|&(i, &size)| i == 0 || size == self.page_size || PAGE_SIZES[i - 1] < self.total)
            .map(|(_, &size)| DisplaySizeOption {
                size,
                is_selected: size == self.page_size,
            })
            .collect();

        if !PAGE_SIZES.contains(&self.page_size) {
            options.push(DisplaySizeOption {
                size: self.page_size,
                is_selected: true,
            });
            options.sort_by_key(|o| o.size);
        }
        options
    }
}

/// Returns `page_size` if it is usable, otherwise [`DEFAULT_PAGE_SIZE`].
///
/// Zero and anything above [`MAX_PAGE_SIZE`] are not usable.
#[must_use]
pub fn page_size_or_default(page_size: u64) -> u64 {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

fn last_page_for(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size).max(1)
}
