// src/catalog/matcher.rs

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use once_cell::sync::Lazy;
use rapidfuzz::distance::levenshtein;
use regex::Regex;
use serde::Serialize;

use crate::catalog::{Catalog, CatalogEntry};

// --- Constants ---
/// Default Levenshtein ratio a description window must reach to count as present.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
/// Short descriptions ("Employees", "Energy intensity") match ordinary prose too easily.
const MIN_FUZZY_WORDS: usize = 3;
/// Description words longer than this anchor candidate windows in the text.
const ANCHOR_MIN_CHARS: usize = 5;

// Any dash PDF extraction tends to produce, with the whitespace around it.
static CODE_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*[-\u{00ad}\u{2010}-\u{2015}\u{2212}\u{fe63}\u{ff0d}]\s*")
        .expect("Failed to compile CODE_SEPARATOR_RE")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisclosureStatus {
    Found,
    NotFound,
}

/// Presence verdict for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisclosureVerdict {
    pub material_topic: String,
    pub gri_code: String,
    pub status: DisclosureStatus,
}

impl DisclosureVerdict {
    pub fn is_found(&self) -> bool {
        self.status == DisclosureStatus::Found
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    ExactCode,
    FuzzyDescription,
}

/// Section text prepared once and shared by every catalog entry.
pub struct PreparedText {
    code_text: String,
    words: Vec<String>,
    positions: HashMap<String, Vec<usize>>,
    /// Word spans owned by a catalog code printed in the text: the words
    /// right after the code, as many as its description has.
    claims: Vec<(String, Range<usize>)>,
    /// Every fuzzy-eligible description of the catalog, lowercased and joined.
    rivals: Vec<(String, String)>,
}

impl PreparedText {
    pub fn new(text: &str, catalog: &Catalog) -> Self {
        let code_text = normalize_code_separators(text);
        let (words, marks) = tokenize_marked(&code_text);

        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, word) in words.iter().enumerate() {
            if word.chars().count() >= ANCHOR_MIN_CHARS {
                positions.entry(word.clone()).or_default().push(position);
            }
        }

        let claims = marks
            .into_iter()
            .filter_map(|(position, code)| {
                let span = catalog
                    .entries_for_code(&code)
                    .map(|entry| tokenize_words(&entry.description).len())
                    .max()?;
                Some((code, position..position + span))
            })
            .collect();

        let rivals = catalog
            .entries()
            .iter()
            .filter_map(|entry| {
                let words = tokenize_words(&entry.description);
                (words.len() >= MIN_FUZZY_WORDS).then(|| (entry.code.clone(), words.join(" ")))
            })
            .collect();

        Self { code_text, words, positions, claims, rivals }
    }

    fn claimed_by_other(&self, code: &str, span: &Range<usize>) -> bool {
        self.claims
            .iter()
            .any(|(owner, claim)| owner != code && overlaps(claim, span))
    }

    fn outscored_by_rival(&self, code: &str, window: &str, score: f64) -> bool {
        self.rivals.iter().any(|(owner, rival)| {
            owner != code && length_ceiling(rival, window) > score && ratio(rival, window) > score
        })
    }
}

/// A description window that reached the threshold for one entry.
#[derive(Debug, Clone)]
struct FuzzyHit<'a> {
    entry: usize,
    code: &'a str,
    words: Range<usize>,
    score: f64,
}

/// Decides presence of each catalog entry in a block of text.
#[derive(Debug, Clone)]
pub struct CatalogMatcher {
    fuzzy_threshold: f64,
}

impl Default for CatalogMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl CatalogMatcher {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self { fuzzy_threshold }
    }

    /// One verdict per catalog entry, in catalog order.
    pub fn match_catalog(&self, text: &str, catalog: &Catalog) -> Vec<DisclosureVerdict> {
        let prepared = PreparedText::new(text, catalog);
        let kinds = self.match_entries(catalog, &prepared);

        let verdicts: Vec<DisclosureVerdict> = catalog
            .entries()
            .iter()
            .zip(kinds)
            .map(|(entry, kind)| {
                let status = match kind {
                    Some(kind) => {
                        tracing::debug!("Found GRI code {} ({:?})", entry.code, kind);
                        DisclosureStatus::Found
                    }
                    None => DisclosureStatus::NotFound,
                };
                DisclosureVerdict {
                    material_topic: entry.standard_name.clone(),
                    gri_code: entry.code.clone(),
                    status,
                }
            })
            .collect();

        let found = verdicts.iter().filter(|v| v.is_found()).count();
        tracing::info!("Found {} out of {} GRI codes", found, verdicts.len());
        verdicts
    }

    /// Match kind per catalog entry, in catalog order. Exact codes first; a
    /// description is only consulted when its code is absent, and a fuzzy
    /// window overlapping a better-scoring window of another code is dropped.
    pub fn match_entries(&self, catalog: &Catalog, prepared: &PreparedText) -> Vec<Option<MatchKind>> {
        let mut kinds: Vec<Option<MatchKind>> = catalog
            .entries()
            .iter()
            .map(|entry| {
                let code = normalize_code_separators(&entry.code);
                contains_code(&prepared.code_text, &code).then_some(MatchKind::ExactCode)
            })
            .collect();

        let hits: Vec<FuzzyHit> = catalog
            .entries()
            .iter()
            .enumerate()
            .filter(|(index, _)| kinds[*index].is_none())
            .flat_map(|(index, entry)| self.fuzzy_hits(index, entry, prepared))
            .collect();

        for hit in &hits {
            let outscored = hits.iter().any(|other| {
                other.code != hit.code && overlaps(&other.words, &hit.words) && other.score > hit.score
            });
            if outscored {
                tracing::debug!("Dropped fuzzy match for {}: window belongs to another code", hit.code);
                continue;
            }
            kinds[hit.entry] = Some(MatchKind::FuzzyDescription);
        }
        kinds
    }

    fn fuzzy_hits<'a>(&self, index: usize, entry: &'a CatalogEntry, prepared: &PreparedText) -> Vec<FuzzyHit<'a>> {
        let target_words = tokenize_words(&entry.description);
        if target_words.len() < MIN_FUZZY_WORDS {
            return Vec::new();
        }
        let target = target_words.join(" ");
        let span = target_words.len();

        // Candidate windows are aligned on occurrences of the description's longer words.
        let mut candidates: BTreeSet<(usize, usize)> = BTreeSet::new();
        for (offset, word) in target_words.iter().enumerate() {
            let Some(hits) = prepared.positions.get(word) else {
                continue;
            };
            for &hit in hits {
                let Some(start) = hit.checked_sub(offset) else {
                    continue;
                };
                for len in span.saturating_sub(1).max(1)..=span + 1 {
                    candidates.insert((start, len));
                }
            }
        }

        candidates
            .into_iter()
            .filter_map(|(start, len)| {
                let words = start..(start + len).min(prepared.words.len());
                if words.is_empty() || prepared.claimed_by_other(&entry.code, &words) {
                    return None;
                }
                let window = prepared.words[words.clone()].join(" ");
                let score = self.score(&target, &window)?;
                if prepared.outscored_by_rival(&entry.code, &window, score) {
                    return None;
                }
                Some(FuzzyHit { entry: index, code: &entry.code, words, score })
            })
            .collect()
    }

    fn score(&self, target: &str, window: &str) -> Option<f64> {
        // The length gap alone bounds the ratio from above.
        if length_ceiling(target, window) < self.fuzzy_threshold {
            return None;
        }
        let score = ratio(target, window);
        (score >= self.fuzzy_threshold).then_some(score)
    }
}

fn ratio(a: &str, b: &str) -> f64 {
    levenshtein::normalized_similarity(a.chars(), b.chars())
}

fn length_ceiling(a: &str, b: &str) -> f64 {
    let (a, b) = (a.chars().count(), b.chars().count());
    let longest = a.max(b);
    if longest == 0 {
        return 0.0;
    }
    1.0 - a.abs_diff(b) as f64 / longest as f64
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Maps every dash variant to `-` and drops whitespace around it, so
/// "417 – 2" and "417-2" compare equal.
pub fn normalize_code_separators(text: &str) -> String {
    CODE_SEPARATOR_RE.replace_all(text, "-").into_owned()
}

/// True when `code` occurs without a digit directly before or after it,
/// so "2-1" is not found inside "102-1" or "2-10".
fn contains_code(haystack: &str, code: &str) -> bool {
    if code.is_empty() {
        return false;
    }
    haystack.match_indices(code).any(|(position, _)| {
        let before = haystack[..position].chars().next_back();
        let after = haystack[position + code.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// Lowercase words of already normalized text, with every code-shaped token
/// ("305-2") pulled out and paired with the word position it precedes.
fn tokenize_marked(code_text: &str) -> (Vec<String>, Vec<(usize, String)>) {
    let mut words = Vec::new();
    let mut marks = Vec::new();
    for piece in code_text.split(|c: char| !c.is_alphanumeric() && c != '-') {
        let parts: Vec<&str> = piece.split('-').filter(|part| !part.is_empty()).collect();
        let mut i = 0;
        while i < parts.len() {
            if i + 1 < parts.len() && is_code_part(parts[i], 3) && is_code_part(parts[i + 1], 2) {
                marks.push((words.len(), format!("{}-{}", parts[i], parts[i + 1])));
                i += 2;
                continue;
            }
            words.push(parts[i].to_lowercase());
            i += 1;
        }
    }
    (words, marks)
}

fn is_code_part(part: &str, max_digits: usize) -> bool {
    part.len() <= max_digits && part.chars().all(|c| c.is_ascii_digit())
}

fn tokenize_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}
