// src/locators/heuristic.rs

use std::time::Duration;

use crate::corpus::{Page, PageCorpus, SearchWindow};
use crate::locators::{LocatedSection, Strategy};
use crate::utils::error::ModelError;

pub const DEFAULT_SAMPLE_CAP: usize = 5;

/// Answer of an external model about one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageClassification {
    /// `None` when the model gave no usable answer.
    pub contains_index: Option<bool>,
    /// 1-based page where the model thinks the index starts.
    pub start_hint: Option<usize>,
}

impl PageClassification {
    pub fn positive(start_hint: Option<usize>) -> Self {
        Self { contains_index: Some(true), start_hint }
    }

    pub fn negative() -> Self {
        Self { contains_index: Some(false), start_hint: None }
    }
}

/// Anything able to tell whether a page holds a GRI disclosure index.
pub trait PageClassifier {
    async fn classify_page(&self, page: &Page) -> Result<PageClassification, ModelError>;
}

/// Last-resort locator backed by an external model. Every failure is a "no".
pub struct HeuristicLocator<C> {
    classifier: C,
    sample_cap: usize,
    timeout: Duration,
}

impl<C: PageClassifier> HeuristicLocator<C> {
    pub fn new(classifier: C, sample_cap: usize, timeout: Duration) -> Self {
        Self { classifier, sample_cap, timeout }
    }

    #[cfg(test)]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Evenly spaced non-blank pages across the window, at most `sample_cap` of them.
    pub fn sample<'a>(&self, pages: &'a [Page]) -> Vec<&'a Page> {
        if self.sample_cap == 0 {
            return Vec::new();
        }
        let pages: Vec<&Page> = pages.iter().filter(|p| !p.text().trim().is_empty()).collect();
        let step = (pages.len() / self.sample_cap).max(1);
        pages.into_iter().step_by(step).take(self.sample_cap).collect()
    }

    pub async fn locate(&self, corpus: &PageCorpus, window: &SearchWindow) -> Option<LocatedSection> {
        if window.is_empty() {
            tracing::warn!("No pages to sample for LLM analysis");
            return None;
        }
        let sample = self.sample(corpus.window_pages(window));
        tracing::info!("Using LLM analysis on {} sample pages", sample.len());

        for page in sample {
            let classification = match tokio::time::timeout(self.timeout, self.classifier.classify_page(page)).await {
                Ok(Ok(classification)) => classification,
                Ok(Err(e)) => {
                    tracing::warn!("LLM analysis failed for page {}: {}", page.number(), e);
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        "LLM analysis failed for page {}: {}",
                        page.number(),
                        ModelError::Timeout(self.timeout)
                    );
                    continue;
                }
            };

            if classification.contains_index != Some(true) {
                continue;
            }

            let start = classification
                .start_hint
                .and_then(|number| number.checked_sub(1))
                .filter(|index| window.contains(*index))
                .unwrap_or(page.index());
            tracing::info!("LLM detected GRI section on page {} (starting page {})", page.number(), start + 1);
            return Some(LocatedSection::anchored(Strategy::Heuristic, start, window, None));
        }

        tracing::warn!("LLM did not detect GRI section");
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::corpus::WindowPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted classifier: answers by 0-based page index and counts calls.
    pub(crate) struct ScriptedClassifier {
        pub positive_page: Option<usize>,
        pub hint: Option<usize>,
        pub fail: bool,
        pub delay: Option<Duration>,
        pub calls: AtomicUsize,
    }

    impl ScriptedClassifier {
        pub(crate) fn answering(positive_page: Option<usize>) -> Self {
            Self { positive_page, hint: None, fail: false, delay: None, calls: AtomicUsize::new(0) }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PageClassifier for ScriptedClassifier {
        async fn classify_page(&self, page: &Page) -> Result<PageClassification, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ModelError::Malformed("garbled".to_string()));
            }
            if self.positive_page == Some(page.index()) {
                Ok(PageClassification::positive(self.hint))
            } else {
                Ok(PageClassification::negative())
            }
        }
    }

    fn corpus(pages: usize) -> PageCorpus {
        PageCorpus::from_texts((0..pages).map(|i| format!("page body {}", i)))
    }

    #[test]
    fn sample_is_capped_and_spread() {
        let corpus = corpus(100);
        let window = corpus.search_window(&WindowPolicy::default());
        let locator = HeuristicLocator::new(ScriptedClassifier::answering(None), 5, Duration::from_secs(1));

        let indices: Vec<usize> = locator
            .sample(corpus.window_pages(&window))
            .iter()
            .map(|p| p.index())
            .collect();
        assert_eq!(indices, vec![60, 68, 76, 84, 92]);

        let short = PageCorpus::from_texts(["a", "b", "c"]);
        assert_eq!(locator.sample(short.pages()).len(), 3);
    }

    #[test]
    fn blank_pages_are_not_sampled() {
        let corpus = PageCorpus::from_texts(
            (0..20).map(|i| if i % 2 == 0 { String::new() } else { format!("page body {}", i) }),
        );
        let window = corpus.search_window(&WindowPolicy::default());
        let locator = HeuristicLocator::new(ScriptedClassifier::answering(None), 5, Duration::from_secs(1));

        let indices: Vec<usize> = locator
            .sample(corpus.window_pages(&window))
            .iter()
            .map(|p| p.index())
            .collect();
        assert_eq!(indices, vec![13, 15, 17, 19]);
    }

    #[tokio::test]
    async fn positive_page_anchors_the_section() {
        let corpus = corpus(100);
        let window = corpus.search_window(&WindowPolicy::default());
        let locator = HeuristicLocator::new(ScriptedClassifier::answering(Some(76)), 5, Duration::from_secs(1));

        let section = locator.locate(&corpus, &window).await.expect("section");
        assert_eq!(section.strategy, Strategy::Heuristic);
        assert_eq!(section.start_page, 76);
        assert_eq!(section.end_page, 99);
        assert_eq!(section.confidence, None);
        assert_eq!(locator.classifier().calls(), 3);
    }

    #[tokio::test]
    async fn start_hint_inside_window_is_honoured() {
        let corpus = corpus(100);
        let window = corpus.search_window(&WindowPolicy::default());
        let mut classifier = ScriptedClassifier::answering(Some(68));
        classifier.hint = Some(66); // 1-based
        let locator = HeuristicLocator::new(classifier, 5, Duration::from_secs(1));
        assert_eq!(locator.locate(&corpus, &window).await.map(|s| s.start_page), Some(65));

        let mut classifier = ScriptedClassifier::answering(Some(68));
        classifier.hint = Some(3); // outside the window
        let locator = HeuristicLocator::new(classifier, 5, Duration::from_secs(1));
        assert_eq!(locator.locate(&corpus, &window).await.map(|s| s.start_page), Some(68));
    }

    #[tokio::test]
    async fn model_errors_are_negative() {
        let corpus = corpus(20);
        let window = corpus.search_window(&WindowPolicy::default());
        let mut classifier = ScriptedClassifier::answering(Some(12));
        classifier.fail = true;
        let locator = HeuristicLocator::new(classifier, 5, Duration::from_secs(1));

        assert!(locator.locate(&corpus, &window).await.is_none());
        assert_eq!(locator.classifier().calls(), 5);
    }

    #[tokio::test]
    async fn slow_model_times_out_as_negative() {
        let corpus = corpus(20);
        let window = corpus.search_window(&WindowPolicy::default());
        let mut classifier = ScriptedClassifier::answering(Some(12));
        classifier.delay = Some(Duration::from_secs(5));
        let locator = HeuristicLocator::new(classifier, 2, Duration::from_millis(20));

        assert!(locator.locate(&corpus, &window).await.is_none());
    }
}
