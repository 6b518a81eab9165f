//! Paging types shared by list endpoints.

use serde::{Deserialize, Serialize};

/// Parameters of a single page load.
///
/// `criteria` is supplied by the caller and opaque to the pager; `offset`
/// and `limit` are owned by the pager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest<C> {
    /// Caller-defined filter (search query, genre set, ...).
    pub criteria: C,
    /// Index of the first requested item.
    pub offset: usize,
    /// Maximum number of items requested.
    pub limit: usize,
}

impl<C> PageRequest<C> {
    /// Creates a page request.
    #[must_use]
    pub const fn new(criteria: C, offset: usize, limit: usize) -> Self {
        Self {
            criteria,
            offset,
            limit,
        }
    }
}

/// A page returned by a list endpoint.
///
/// Endpoints do not report whether more items exist; see [`PageResponse::is_last`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Items of this page, in server order.
    pub items: Vec<T>,
}

impl<T> PageResponse<T> {
    /// Creates a page from its items.
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Returns the number of items in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if this page ends the sequence, i.e. it came back short.
    #[must_use]
    pub fn is_last(&self, limit: usize) -> bool {
        self.items.len() < limit
    }
}

/// Loading indicator state for a paged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PagingState {
    /// A page load is in flight.
    pub is_loading: bool,
    /// The most recent page load failed.
    pub is_error: bool,
}

impl PagingState {
    /// Nothing in flight, no error.
    pub const IDLE: Self = Self {
        is_loading: false,
        is_error: false,
    };

    /// A load is in flight.
    pub const LOADING: Self = Self {
        is_loading: true,
        is_error: false,
    };

    /// The last load failed.
    pub const ERROR: Self = Self {
        is_loading: false,
        is_error: true,
    };
}
