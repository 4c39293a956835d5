//! Incremental loader state for the add-product category picker.
//!
//! The picker pulls categories one page at a time as the visitor scrolls.
//! [`CategoryPicker`] is the bookkeeping for that: which page comes next,
//! whether a fetch is already running, and the options collected so far.

use serde::{Deserialize, Serialize};

use super::catalog::ProductCategory;
use super::envelope::{Paginated, total_pages};

/// Loader state for the category options.
///
/// ```
/// use market_stall_core::CategoryPicker;
///
/// let mut picker = CategoryPicker::default();
/// assert_eq!(picker.begin(), Some(1));
/// // A second fetch is refused while the first is running.
/// assert_eq!(picker.begin(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPicker {
    /// Last page successfully loaded; zero before the first load.
    loaded_page: u32,
    page_size: u32,
    /// Known once the first page has arrived.
    total_pages: Option<u32>,
    in_flight: bool,
    options: Vec<ProductCategory>,
}

impl Default for CategoryPicker {
    fn default() -> Self {
        Self::new(Self::PAGE_SIZE)
    }
}

impl CategoryPicker {
    /// Options fetched per request.
    pub const PAGE_SIZE: u32 = 10;

    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self {
            loaded_page: 0,
            page_size,
            total_pages: None,
            in_flight: false,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    #[must_use]
    pub fn options(&self) -> &[ProductCategory] {
        &self.options
    }

    /// Whether every page has been loaded.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.total_pages
            .is_some_and(|total| self.loaded_page >= total)
    }

    /// The page the next fetch would ask for, if one is allowed right now.
    #[must_use]
    pub fn next_request(&self) -> Option<u32> {
        if self.in_flight || self.is_exhausted() {
            return None;
        }
        Some(self.loaded_page.saturating_add(1))
    }

    /// Claim the next fetch. Returns the page to request, or `None` when a
    /// fetch is already running or nothing is left.
    pub fn begin(&mut self) -> Option<u32> {
        let page = self.next_request()?;
        self.in_flight = true;
        Some(page)
    }

    /// Record a successful fetch of `page` and return the options it added.
    ///
    /// Options whose id is already known are skipped.
    pub fn complete(
        &mut self,
        page: u32,
        response: Paginated<Vec<ProductCategory>>,
    ) -> Vec<ProductCategory> {
        self.in_flight = false;
        self.loaded_page = self.loaded_page.max(page);
        self.total_pages = Some(total_pages(response.total, self.page_size));

        let mut added = Vec::new();
        for option in response.data {
            if self.options.iter().any(|known| known.id == option.id) {
                continue;
            }
            self.options.push(option.clone());
            added.push(option);
        }
        added
    }

    /// Release the in-flight claim after a failed fetch.
    pub const fn fail(&mut self) {
        self.in_flight = false;
    }
}
