// src/locators/pattern.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::corpus::{PageCorpus, SearchWindow};
use crate::locators::{LocatedSection, Strategy};

// --- Regex Patterns for Section Headers (Lazy Static) ---
// English and Indonesian header variants of a GRI index. Order matters only for logging.
static GRI_HEADER_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)GRI\s+(?:Content\s+)?Index",
        r"(?i)GRI\s+\d+:\s+[A-Za-z\s]+\d{4}", // "GRI 305: Emissions 2016"
        r"(?i)Global\s+Reporting\s+Initiative",
        r"(?i)GRI\s+Standards?\s+Index",
        r"(?i)Sustainability\s+Reporting\s+Standards?",
        r"(?i)GRI\s+Disclosure",
        r"(?i)GRI\s+Reference",
        // Indonesian
        r"(?i)Indeks\s+(?:Isi\s+)?GRI",
        r"(?i)Standar\s+Pelaporan\s+Berkelanjutan",
    ]
    .iter()
    .filter_map(|pat| Regex::new(pat).ok())
    .collect()
});

/// Finds the index by its header text. Exact regex semantics, case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct PatternLocator {
    // lowercased, matched verbatim
    standard_names: Vec<String>,
}

impl PatternLocator {
    /// Also treat a verbatim catalog standard title ("GRI 2: General Disclosures 2021") as a header.
    pub fn with_standard_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            standard_names: names.into_iter().map(|n| n.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn header_patterns() -> &'static [Regex] {
        &GRI_HEADER_RE
    }

    /// The first header-like text on the page, if any.
    pub fn page_match(&self, text: &str) -> Option<String> {
        if let Some(found) = GRI_HEADER_RE.iter().find_map(|re| re.find(text)) {
            return Some(found.as_str().to_string());
        }
        let lowered = text.to_lowercase();
        self.standard_names
            .iter()
            .find(|name| lowered.contains(name.as_str()))
            .cloned()
    }

    pub fn locate(&self, corpus: &PageCorpus, window: &SearchWindow) -> Option<LocatedSection> {
        tracing::info!(
            "Searching for GRI patterns in {} pages {:?} of {}",
            window.len(),
            window.first().zip(window.last()).map(|(a, b)| (a + 1, b + 1)),
            corpus.len()
        );

        for page in corpus.window_pages(window) {
            if let Some(matched) = self.page_match(page.text()) {
                tracing::info!("Found GRI pattern '{}' on page {}", matched, page.number());
                return Some(LocatedSection::anchored(Strategy::Pattern, page.index(), window, Some(1.0)));
            }
        }

        tracing::warn!("No GRI patterns found using pattern matching");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::WindowPolicy;

    fn corpus_with(pages: usize, hits: &[(usize, &str)]) -> PageCorpus {
        let mut texts = vec!["Operational highlights and financial review.".to_string(); pages];
        for (index, text) in hits {
            texts[*index] = text.to_string();
        }
        PageCorpus::from_texts(texts)
    }

    #[test]
    fn first_match_in_window_anchors_the_section() {
        let corpus = corpus_with(100, &[(72, "GRI Content Index"), (80, "GRI Standards Index")]);
        let window = corpus.search_window(&WindowPolicy::default());

        let section = PatternLocator::default().locate(&corpus, &window).expect("section");
        assert_eq!(section.strategy, Strategy::Pattern);
        assert_eq!(section.start_page, 72);
        assert_eq!(section.end_page, 99);
        assert_eq!(section.confidence, Some(1.0));
    }

    #[test]
    fn matches_before_the_window_are_ignored() {
        let corpus = corpus_with(100, &[(10, "GRI Content Index")]);
        let window = corpus.search_window(&WindowPolicy::default());
        assert!(PatternLocator::default().locate(&corpus, &window).is_none());
    }

    #[test]
    fn headers_match_case_insensitively_in_both_languages() {
        let locator = PatternLocator::default();
        assert!(locator.page_match("gri   content\nindex").is_some());
        assert!(locator.page_match("INDEKS GRI").is_some());
        assert!(locator.page_match("Standar Pelaporan Berkelanjutan").is_some());
        assert!(locator.page_match("GRI 305: Emissions 2016").is_some());
        assert!(locator.page_match("Annual sales grew by 4%").is_none());
    }

    #[test]
    fn standard_titles_count_as_headers() {
        let locator = PatternLocator::with_standard_names(["Sector Standard: Oil and Gas"]);
        assert_eq!(
            locator.page_match("Disclosures under the SECTOR STANDARD: OIL AND GAS").as_deref(),
            Some("sector standard: oil and gas")
        );
        assert!(PatternLocator::default()
            .page_match("Disclosures under the SECTOR STANDARD: OIL AND GAS")
            .is_none());
    }

    #[test]
    fn empty_corpus_is_not_found() {
        let corpus = PageCorpus::default();
        let window = corpus.search_window(&WindowPolicy::default());
        assert!(PatternLocator::default().locate(&corpus, &window).is_none());
    }
}
