// src/corpus/mod.rs
pub mod ingest;

use std::ops::Range;

/// One physical page of the source document. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    index: usize,
    text: String,
}

impl Page {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based page number, as printed in the document and in log output.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Ordered page texts of a single document. Indices are contiguous from 0
/// and equal to the position in the corpus; empty pages are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCorpus {
    pages: Vec<Page>,
}

impl PageCorpus {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Page { index, text: text.into() })
            .collect();
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Pages covered by a search window.
    pub fn window_pages(&self, window: &SearchWindow) -> &[Page] {
        &self.pages[window.range()]
    }

    /// Concatenated text of pages `start..=end`, clamped to the corpus.
    pub fn text_between(&self, start: usize, end: usize) -> String {
        if self.pages.is_empty() || start > end {
            return String::new();
        }
        let end = end.min(self.pages.len() - 1);
        self.pages
            .get(start..=end)
            .unwrap_or_default()
            .iter()
            .map(Page::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn full_text(&self) -> String {
        self.pages().iter().map(Page::text).collect::<Vec<_>>().join("\n")
    }

    /// Restricts locator strategies to the tail of the document, where the
    /// disclosure index conventionally sits.
    pub fn search_window(&self, policy: &WindowPolicy) -> SearchWindow {
        let total = self.pages.len();
        if total < policy.min_pages {
            tracing::debug!("Document has {} pages (< {}), searching all of it", total, policy.min_pages);
            return SearchWindow { start: 0, end: total };
        }

        let start = (total as f64 * policy.start_ratio).floor() as usize;
        if start >= total {
            return SearchWindow { start: 0, end: total };
        }
        SearchWindow { start, end: total }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPolicy {
    /// Fraction of the document skipped before the window starts.
    pub start_ratio: f64,
    /// Documents shorter than this are searched whole.
    pub min_pages: usize,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self { start_ratio: 0.6, min_pages: 10 }
    }
}

/// Half-open page range `[start, end)` that locators may examine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    start: usize,
    end: usize,
}

impl SearchWindow {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn first(&self) -> Option<usize> {
        (self.start < self.end).then_some(self.start)
    }

    pub fn last(&self) -> Option<usize> {
        (self.start < self.end).then(|| self.end - 1)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
