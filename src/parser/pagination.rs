//! Pagination boundary detection

use crate::dom::{Document, Node};

use super::normalize::parse_int;

/// Pagination controls, in order of preference
const PAGE_NUMBER_SELECTORS: &[&str] = &[
    "div.pagenavix > .page-numbers",
    "div.pagination .page-numbers",
];

/// Total page count read from the pagination control
///
/// Only controls whose text is a pure integer count; "next", "prev" and
/// ellipsis entries are skipped. Returns `None` when no numeric control
/// exists, which is the case for single-page listings.
pub fn extract_total_page<D: Document>(document: &D) -> Option<u32> {
    PAGE_NUMBER_SELECTORS.iter().find_map(|css| {
        document
            .select_all(css)
            .iter()
            .filter_map(|node| parse_int(&node.text()))
            .filter(|n| *n > 0)
            .max()
    })
}
