//! Pagination for list pages.
//!
//! [`Paginator`] splits a list into fixed-size pages. List views resolve
//! `?page=N` with [`Paginator::page_from_query`], where anything other than
//! a page number inside the range (or `last`) is an error the view turns
//! into `404 Not Found`.
//!
//! # Examples
//!
//! ```
//! use taxi_views::pagination::Paginator;
//!
//! let paginator = Paginator::new((1..=12).collect::<Vec<i32>>(), 5);
//! assert_eq!(paginator.num_pages(), 3);
//!
//! let page = paginator.page_from_query(Some("3")).unwrap();
//! assert_eq!(page.object_list, vec![11, 12]);
//! assert!(page.has_previous());
//! assert!(!page.has_next());
//! ```

use std::fmt;

use serde::Serialize;
use taxi_core::TaxiError;
use taxi_http::{query_transform, QueryDict};

/// Why a page could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    /// The page number is past the last page.
    EmptyPage,
    /// The page parameter is not a number.
    PageNotAnInteger,
    /// The page number is below 1.
    InvalidPage,
}

impl fmt::Display for PaginationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPage => write!(f, "That page contains no results"),
            Self::PageNotAnInteger => write!(f, "That page number is not an integer"),
            Self::InvalidPage => write!(f, "That page number is less than 1"),
        }
    }
}

impl std::error::Error for PaginationError {}

impl From<PaginationError> for TaxiError {
    fn from(err: PaginationError) -> Self {
        Self::NotFound(format!("Invalid page: {err}"))
    }
}

/// Splits a list of objects into pages of `per_page` items.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    object_list: Vec<T>,
    per_page: usize,
}

impl<T: Clone> Paginator<T> {
    /// Creates a paginator. A zero page size is treated as one.
    pub fn new(object_list: Vec<T>, per_page: usize) -> Self {
        Self {
            object_list,
            per_page: per_page.max(1),
        }
    }

    /// Total number of objects.
    pub fn count(&self) -> usize {
        self.object_list.len()
    }

    /// Items per page.
    pub const fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages. An empty list still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        self.count().div_ceil(self.per_page).max(1)
    }

    /// Returns page `number`, counting from 1.
    pub fn page(&self, number: usize) -> Result<Page<T>, PaginationError> {
        if number == 0 {
            return Err(PaginationError::InvalidPage);
        }
        let num_pages = self.num_pages();
        if number > num_pages {
            return Err(PaginationError::EmptyPage);
        }
        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.count());
        Ok(Page {
            object_list: self.object_list[start..end].to_vec(),
            number,
            num_pages,
            count: self.count(),
            per_page: self.per_page,
        })
    }

    /// Resolves the raw `page` query parameter. Missing means page 1 and
    /// `last` means the final page.
    pub fn page_from_query(&self, raw: Option<&str>) -> Result<Page<T>, PaginationError> {
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => self.num_pages(),
            Some(s) => s
                .parse::<usize>()
                .map_err(|_| PaginationError::PageNotAnInteger)?,
        };
        self.page(number)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The objects on this page.
    pub object_list: Vec<T>,
    /// This page's number, counting from 1.
    pub number: usize,
    /// Total number of pages.
    pub num_pages: usize,
    /// Total number of objects across all pages.
    pub count: usize,
    /// Items per page.
    pub per_page: usize,
}

impl<T> Page<T> {
    /// Whether a later page exists.
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Whether an earlier page exists.
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Whether there is more than one page.
    pub const fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    /// The 1-based index of the first object on this page, or 0 when empty.
    pub const fn start_index(&self) -> usize {
        if self.count == 0 {
            0
        } else {
            (self.number - 1) * self.per_page + 1
        }
    }

    /// The 1-based index of the last object on this page.
    pub fn end_index(&self) -> usize {
        if self.has_next() {
            self.number * self.per_page
        } else {
            self.count
        }
    }

    /// Pagination links for templates. Each link keeps the current query
    /// parameters and replaces only `page`.
    pub fn links(&self, params: &QueryDict) -> PageLinks {
        let link = |n: usize| {
            let n = n.to_string();
            format!("?{}", query_transform(params, &[("page", n.as_str())]))
        };
        PageLinks {
            number: self.number,
            num_pages: self.num_pages,
            is_paginated: self.has_other_pages(),
            previous_url: self.has_previous().then(|| link(self.number - 1)),
            next_url: self.has_next().then(|| link(self.number + 1)),
        }
    }
}

/// The template view of a page's navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    /// The current page number.
    pub number: usize,
    /// Total number of pages.
    pub num_pages: usize,
    /// Whether to show navigation at all.
    pub is_paginated: bool,
    /// Link to the previous page.
    pub previous_url: Option<String>,
    /// Link to the next page.
    pub next_url: Option<String>,
}
