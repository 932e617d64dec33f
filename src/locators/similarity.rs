// src/locators/similarity.rs
//
// TF-IDF fallback for documents whose index header does not match any pattern.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::corpus::{Page, PageCorpus, SearchWindow};
use crate::locators::{LocatedSection, Strategy};

// --- Constants ---
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.1;
pub const DEFAULT_MAX_FEATURES: usize = 1000;
const MAX_NGRAM: usize = 3;

/// Hand-written descriptions of what a GRI index page reads like.
const GRI_QUERY_PHRASES: &[&str] = &[
    "GRI content index global reporting initiative sustainability standards disclosure",
    "GRI standards disclosure table",
    "GRI 2: General Disclosures 2021",
    "GRI 2 general disclosures organizational details governance",
    "GRI 3 material topics process management",
    "environmental social economic performance emissions water energy",
    "biodiversity waste health safety human rights labor practices",
];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w\w+\b").expect("Failed to compile TOKEN_RE")
});

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
        "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became", "because",
        "become", "becomes", "becoming", "been", "before", "beforehand", "behind", "being",
        "below", "beside", "besides", "between", "beyond", "both", "but", "by", "can",
        "cannot", "could", "did", "do", "does", "done", "down", "due", "during", "each", "eg",
        "either", "else", "elsewhere", "enough", "etc", "even", "ever", "every", "everyone",
        "everything", "everywhere", "except", "few", "for", "former", "formerly", "from",
        "further", "had", "has", "have", "he", "hence", "her", "here", "hereafter", "hereby",
        "herein", "hers", "herself", "him", "himself", "his", "how", "however", "ie", "if",
        "in", "inc", "indeed", "into", "is", "it", "its", "itself", "just", "last", "latter",
        "least", "less", "ltd", "made", "many", "may", "me", "meanwhile", "might", "mine",
        "more", "moreover", "most", "mostly", "much", "must", "my", "myself", "namely",
        "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor", "not",
        "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only",
        "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
        "over", "own", "per", "perhaps", "please", "rather", "same", "seem", "seemed",
        "seeming", "seems", "several", "she", "should", "since", "so", "some", "somehow",
        "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "than",
        "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
        "thereby", "therefore", "therein", "thereupon", "these", "they", "this", "those",
        "though", "through", "throughout", "thru", "thus", "to", "together", "too", "toward",
        "towards", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well",
        "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter",
        "whereas", "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while",
        "whither", "who", "whoever", "whole", "whom", "whose", "why", "will", "with",
        "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Scores window pages against the query phrases; the best page wins if it clears the threshold.
#[derive(Debug, Clone)]
pub struct SimilarityLocator {
    threshold: f64,
    max_features: usize,
    queries: Vec<String>,
}

impl Default for SimilarityLocator {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_MAX_FEATURES)
    }
}

impl SimilarityLocator {
    pub fn new(threshold: f64, max_features: usize) -> Self {
        Self {
            threshold,
            max_features,
            queries: GRI_QUERY_PHRASES.iter().map(|q| q.to_string()).collect(),
        }
    }

    /// Strictly above: a page scoring exactly the threshold is rejected.
    pub fn accepts(&self, score: f64) -> bool {
        score > self.threshold
    }

    pub fn locate(&self, corpus: &PageCorpus, window: &SearchWindow) -> Option<LocatedSection> {
        let scores = self.score_pages(corpus.window_pages(window));
        if scores.is_empty() {
            tracing::warn!("No non-empty pages in the search window for TF-IDF");
            return None;
        }

        // first page wins ties
        let mut best = scores[0];
        for &candidate in &scores[1..] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        let (page_index, score) = best;

        if self.accepts(score) {
            tracing::info!(
                "TF-IDF found potential GRI section on page {} (similarity: {:.3})",
                page_index + 1,
                score
            );
            Some(LocatedSection::anchored(Strategy::Similarity, page_index, window, Some(score)))
        } else {
            tracing::warn!("TF-IDF similarity too low (max: {:.3})", score);
            None
        }
    }

    /// Mean cosine similarity of each non-empty page to the query phrases, as `(page index, score)`.
    pub fn score_pages(&self, pages: &[Page]) -> Vec<(usize, f64)> {
        let scored: Vec<&Page> = pages.iter().filter(|p| !p.text().trim().is_empty()).collect();
        if scored.is_empty() || self.queries.is_empty() {
            return Vec::new();
        }

        let mut documents: Vec<Vec<String>> = scored.iter().map(|p| analyze(p.text())).collect();
        documents.extend(self.queries.iter().map(|q| analyze(q)));

        let matrix = TfidfMatrix::fit(&documents, self.max_features);
        tracing::debug!("TF-IDF matrix shape: ({}, {})", documents.len(), matrix.vocabulary_len);

        let (page_rows, query_rows) = matrix.rows.split_at(scored.len());
        scored
            .iter()
            .zip(page_rows)
            .map(|(page, row)| {
                let total: f64 = query_rows.iter().map(|query| dot(row, query)).sum();
                (page.index(), total / query_rows.len() as f64)
            })
            .collect()
    }
}

/// Lowercased tokens of two or more word characters, stop words removed, as 1- to 3-grams.
fn analyze(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .collect();

    let mut terms = Vec::new();
    for n in 1..=MAX_NGRAM {
        for gram in tokens.windows(n) {
            terms.push(gram.join(" "));
        }
    }
    terms
}

struct TfidfMatrix {
    vocabulary_len: usize,
    // L2-normalized dense rows, one per document
    rows: Vec<Vec<f64>>,
}

impl TfidfMatrix {
    fn fit(documents: &[Vec<String>], max_features: usize) -> Self {
        // 1. Corpus-wide term counts pick the vocabulary
        let mut corpus_counts: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            for term in doc {
                *corpus_counts.entry(term.as_str()).or_default() += 1;
            }
        }
        let mut ranked: Vec<(&str, usize)> = corpus_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);
        let vocabulary: HashMap<&str, usize> =
            ranked.iter().enumerate().map(|(i, (term, _))| (*term, i)).collect();

        // 2. Raw term frequencies and document frequencies
        let mut counts = vec![vec![0.0_f64; vocabulary.len()]; documents.len()];
        let mut document_frequency = vec![0usize; vocabulary.len()];
        for (row, doc) in counts.iter_mut().zip(documents) {
            for term in doc {
                if let Some(&column) = vocabulary.get(term.as_str()) {
                    if row[column] == 0.0 {
                        document_frequency[column] += 1;
                    }
                    row[column] += 1.0;
                }
            }
        }

        // 3. Smoothed idf, then L2 normalization
        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        for row in counts.iter_mut() {
            for (value, weight) in row.iter_mut().zip(&idf) {
                *value *= weight;
            }
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|v| *v /= norm);
            }
        }

        Self { vocabulary_len: vocabulary.len(), rows: counts }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::WindowPolicy;

    const INDEX_PAGE: &str = "GRI content index global reporting initiative sustainability standards \
        disclosure table. GRI 2 general disclosures organizational details governance. \
        GRI 3 material topics process management. Emissions water energy waste biodiversity.";

    #[test]
    fn index_like_page_is_selected() {
        let corpus = PageCorpus::from_texts([
            "Our company planted trees near the river and hosted a picnic for families.",
            INDEX_PAGE,
            "",
            "Chairman letter: a record year of dividends for shareholders.",
        ]);
        let window = corpus.search_window(&WindowPolicy::default());

        let section = SimilarityLocator::default().locate(&corpus, &window).expect("section");
        assert_eq!(section.strategy, Strategy::Similarity);
        assert_eq!(section.start_page, 1);
        assert_eq!(section.end_page, 3);
        let confidence = section.confidence.expect("score");
        assert!(confidence > 0.1 && confidence <= 1.0);
    }

    #[test]
    fn unrelated_pages_are_not_found() {
        let corpus = PageCorpus::from_texts([
            "Preheat the oven and whisk eggs with sugar.",
            "Fold flour gently into the batter, then bake for forty minutes.",
        ]);
        let window = corpus.search_window(&WindowPolicy::default());
        assert!(SimilarityLocator::default().locate(&corpus, &window).is_none());
    }

    #[test]
    fn empty_pages_are_not_scored() {
        let corpus = PageCorpus::from_texts(["", "  ", INDEX_PAGE]);
        let scores = SimilarityLocator::default().score_pages(corpus.pages());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0, 2);
    }

    #[test]
    fn threshold_is_strict() {
        let locator = SimilarityLocator::default();
        assert!(!locator.accepts(0.1));
        assert!(locator.accepts(0.1000001));
        assert!(!locator.accepts(0.05));
    }

    #[test]
    fn scoring_is_deterministic() {
        let corpus = PageCorpus::from_texts(["energy and water report", INDEX_PAGE, "governance review"]);
        let locator = SimilarityLocator::default();
        assert_eq!(locator.score_pages(corpus.pages()), locator.score_pages(corpus.pages()));
    }

    #[test]
    fn analyzer_drops_stop_words_and_single_characters() {
        let terms = analyze("GRI 2: the General Disclosures");
        assert_eq!(
            terms,
            vec!["gri", "general", "disclosures", "gri general", "general disclosures", "gri general disclosures"]
        );
    }
}
