// src/locators/resolver.rs

use crate::corpus::{PageCorpus, WindowPolicy};
use crate::locators::{
    HeuristicLocator, LocatedSection, PageClassifier, PatternLocator, SimilarityLocator, Strategy,
};

#[derive(Debug, Clone, PartialEq)]
enum ResolverState {
    Unresolved,
    TryPattern,
    TrySimilarity,
    TryHeuristic,
    Resolved(LocatedSection),
    Exhausted,
}

/// Outcome of a resolver run, with the strategies actually invoked in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub section: LocatedSection,
    pub attempted: Vec<Strategy>,
}

impl Resolution {
    /// No strategy located the section; `section` spans the whole document.
    pub fn is_exhausted(&self) -> bool {
        self.section.strategy == Strategy::Unlocated
    }
}

/// Runs pattern, similarity, then heuristic, stopping at the first hit.
pub struct SectionResolver<C> {
    window_policy: WindowPolicy,
    pattern: PatternLocator,
    similarity: SimilarityLocator,
    heuristic: Option<HeuristicLocator<C>>,
}

impl<C: PageClassifier> SectionResolver<C> {
    pub fn new(
        window_policy: WindowPolicy,
        pattern: PatternLocator,
        similarity: SimilarityLocator,
        heuristic: Option<HeuristicLocator<C>>,
    ) -> Self {
        Self { window_policy, pattern, similarity, heuristic }
    }

    pub async fn resolve(&self, corpus: &PageCorpus) -> Resolution {
        let window = corpus.search_window(&self.window_policy);
        let mut attempted = Vec::new();
        let mut state = ResolverState::Unresolved;

        loop {
            state = match state {
                ResolverState::Unresolved => ResolverState::TryPattern,
                ResolverState::TryPattern => {
                    attempted.push(Strategy::Pattern);
                    match self.pattern.locate(corpus, &window) {
                        Some(section) => ResolverState::Resolved(section),
                        None => {
                            tracing::info!("Pattern matching failed, trying TF-IDF");
                            ResolverState::TrySimilarity
                        }
                    }
                }
                ResolverState::TrySimilarity => {
                    attempted.push(Strategy::Similarity);
                    match self.similarity.locate(corpus, &window) {
                        Some(section) => ResolverState::Resolved(section),
                        None => ResolverState::TryHeuristic,
                    }
                }
                ResolverState::TryHeuristic => match &self.heuristic {
                    Some(heuristic) => {
                        tracing::info!("TF-IDF failed, trying LLM");
                        attempted.push(Strategy::Heuristic);
                        match heuristic.locate(corpus, &window).await {
                            Some(section) => ResolverState::Resolved(section),
                            None => ResolverState::Exhausted,
                        }
                    }
                    None => {
                        tracing::info!("TF-IDF failed and no model is configured, skipping LLM");
                        ResolverState::Exhausted
                    }
                },
                ResolverState::Resolved(section) => {
                    tracing::info!(
                        "GRI section located by {:?}: pages {}-{}",
                        section.strategy,
                        section.start_page + 1,
                        section.end_page + 1
                    );
                    return Resolution { section, attempted };
                }
                ResolverState::Exhausted => {
                    tracing::warn!("Could not detect GRI section using any method, scanning the whole document");
                    return Resolution {
                        section: LocatedSection::whole_document(corpus.len()),
                        attempted,
                    };
                }
            };
        }
    }
}
