// src/pipeline.rs
//
// One document in, one verdict per catalog entry out.

use crate::catalog::{Catalog, CatalogMatcher, DisclosureVerdict};
use crate::config::ExtractorConfig;
use crate::corpus::PageCorpus;
use crate::locators::{
    HeuristicLocator, LocatedSection, PageClassifier, PatternLocator, SectionResolver,
    SimilarityLocator, Strategy,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub section: LocatedSection,
    pub attempted: Vec<Strategy>,
    pub verdicts: Vec<DisclosureVerdict>,
}

impl ExtractionReport {
    pub fn found_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_found()).count()
    }

    pub fn coverage_percent(&self) -> f64 {
        if self.verdicts.is_empty() {
            return 0.0;
        }
        self.found_count() as f64 / self.verdicts.len() as f64 * 100.0
    }
}

pub struct GriPipeline<'a, C> {
    catalog: &'a Catalog,
    resolver: SectionResolver<C>,
    matcher: CatalogMatcher,
}

impl<'a, C: PageClassifier> GriPipeline<'a, C> {
    /// `classifier` is only consulted when both local strategies miss.
    pub fn new(catalog: &'a Catalog, config: &ExtractorConfig, classifier: Option<C>) -> Self {
        let resolver = SectionResolver::new(
            config.window,
            PatternLocator::with_standard_names(catalog.standard_names()),
            SimilarityLocator::new(config.similarity_threshold, config.max_features),
            classifier.map(|c| HeuristicLocator::new(c, config.heuristic_sample_cap, config.model_timeout)),
        );
        Self {
            catalog,
            resolver,
            matcher: CatalogMatcher::new(config.fuzzy_threshold),
        }
    }

    pub async fn run(&self, corpus: &PageCorpus) -> ExtractionReport {
        tracing::info!("Starting GRI extraction on {} pages", corpus.len());

        // 1. Locate the index section; an exhausted resolver spans the whole document
        let resolution = self.resolver.resolve(corpus).await;

        // 2. Match every catalog entry against the section text
        let text = if resolution.is_exhausted() {
            corpus.full_text()
        } else {
            corpus.text_between(resolution.section.start_page, resolution.section.end_page)
        };
        let section = resolution.section;
        tracing::info!(
            "Analyzing GRI section from page {} to {} ({} chars)",
            section.start_page + 1,
            section.end_page + 1,
            text.len()
        );
        let verdicts = self.matcher.match_catalog(&text, self.catalog);

        ExtractionReport { section, attempted: resolution.attempted, verdicts }
    }
}
