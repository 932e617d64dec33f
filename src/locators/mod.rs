// src/locators/mod.rs
//
// Strategies for finding the GRI content index, tried cheapest and most
// precise first. Each one either anchors a section inside the search window
// or reports nothing; the resolver owns the fallback order.
pub mod heuristic;
pub mod pattern;
pub mod resolver;
pub mod similarity;

use serde::Serialize;

use crate::corpus::SearchWindow;

pub use heuristic::{HeuristicLocator, PageClassification, PageClassifier};
pub use pattern::PatternLocator;
pub use resolver::SectionResolver;
pub use similarity::SimilarityLocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Pattern,
    Similarity,
    Heuristic,
    /// Every strategy missed; the whole document is scanned instead.
    #[serde(rename = "NONE")]
    Unlocated,
}

/// Where the index section was found. Pages are 0-based and inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedSection {
    pub strategy: Strategy,
    pub start_page: usize,
    pub end_page: usize,
    /// `None` when the strategy has no meaningful score (heuristic, unlocated).
    pub confidence: Option<f64>,
}

impl LocatedSection {
    /// A section runs from its first page to the end of the window; no end marker is sought.
    pub fn anchored(
        strategy: Strategy,
        start_page: usize,
        window: &SearchWindow,
        confidence: Option<f64>,
    ) -> Self {
        let end_page = window.last().unwrap_or(start_page).max(start_page);
        Self { strategy, start_page, end_page, confidence }
    }

    pub fn whole_document(total_pages: usize) -> Self {
        Self {
            strategy: Strategy::Unlocated,
            start_page: 0,
            end_page: total_pages.saturating_sub(1),
            confidence: None,
        }
    }
}
