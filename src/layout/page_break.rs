//! # Page Break Decisions
//!
//! The paged tables break on row counts, not measured heights: a fixed
//! number of blocks or rows per page, then a new page with the header
//! repeated. These functions hold those rules so they can be tested apart
//! from any drawing.

/// What to do before drawing the next row or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// Keep drawing on the current page.
    Continue,
    /// Start a new page first.
    NewPage,
}

impl BreakDecision {
    pub fn is_new_page(self) -> bool {
        self == BreakDecision::NewPage
    }
}

/// Merge tables: `block` is the 1-based block (day) counter. With
/// `page_rows` blocks per page, a break lands on every block that is a
/// multiple of `page_rows + 1`.
pub fn merge_block_break(block: usize, page_rows: usize) -> BreakDecision {
    match page_rows.checked_add(1) {
        Some(period) if block % period == 0 => BreakDecision::NewPage,
        _ => BreakDecision::Continue,
    }
}

/// State tables: `row` is the 0-based data row index. Every
/// `max_row_count` rows the table continues on a new page.
pub fn state_row_break(row: usize, max_row_count: usize) -> BreakDecision {
    if row != 0 && max_row_count != 0 && row % max_row_count == 0 {
        BreakDecision::NewPage
    } else {
        BreakDecision::Continue
    }
}
