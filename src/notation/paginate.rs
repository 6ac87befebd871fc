//! Paginator
//!
//! Splits notation text into pages of at most N lines. Each page keeps its
//! line terminators, so concatenating the pages yields the original text.

use serde::{Deserialize, Serialize};

/// Split `text` into chunks of at most `max_lines_per_page` lines.
///
/// Empty text has no pages. A page size of 0 is treated as 1.
pub fn paginate(text: &str, max_lines_per_page: usize) -> Vec<String> {
    let per_page = max_lines_per_page.max(1);
    let mut pages = Vec::new();
    let mut current = String::new();
    let mut lines_in_page = 0;

    for line in text.split_inclusive('\n') {
        current.push_str(line);
        lines_in_page += 1;
        if lines_in_page == per_page {
            pages.push(std::mem::take(&mut current));
            lines_in_page = 0;
        }
    }
    if lines_in_page > 0 {
        pages.push(current);
    }

    pages
}

/// Pages of the loaded document and the page on display
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PaginationState {
    pages: Vec<String>,
    /// 1-based
    page: usize,
    max_lines_per_page: usize,
}

impl PaginationState {
    pub fn new(max_lines_per_page: usize) -> Self {
        Self {
            pages: Vec::new(),
            page: 1,
            max_lines_per_page: max_lines_per_page.max(1),
        }
    }

    /// Recompute pages for new text. The page index is kept (clamped) unless
    /// `reset_page` is set, which happens when the document itself changes.
    pub fn recompute(&mut self, text: &str, reset_page: bool) {
        self.pages = paginate(text, self.max_lines_per_page);
        if reset_page {
            self.page = 1;
        }
        self.page = self.clamp(self.page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    /// Move to `page`, clamped into `[1, page_count]`. Returns the new index.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.page = self.clamp(page);
        self.page
    }

    pub fn current_text(&self) -> Option<&str> {
        self.pages.get(self.page - 1).map(String::as_str)
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.pages.len().max(1))
    }
}
