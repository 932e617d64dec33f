// src/catalog/mod.rs
pub mod matcher;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::CatalogError;

pub use matcher::{CatalogMatcher, DisclosureStatus, DisclosureVerdict};

/// GRI Standards as published; adding a standard or disclosure is a data change here.
static BUILTIN_CATALOG_JSON: &str = include_str!("../../data/gri_catalog.json");

/// One standardized reporting item, e.g. `417-2` of "GRI 417: Marketing and Labeling 2016".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub standard_name: String,
    pub code: String,
    pub description: String,
}

// On-disk shape: an ordered list so definition order survives parsing.
#[derive(Debug, Deserialize)]
struct StandardRecord {
    standard: String,
    disclosures: Vec<DisclosureRecord>,
}

#[derive(Debug, Deserialize)]
struct DisclosureRecord {
    code: String,
    description: String,
}

/// Read-only reference table. Entries keep definition order: standard, then code.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!("Loaded catalog from {} ({} disclosures)", path.display(), catalog.len());
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<StandardRecord> = serde_json::from_str(raw)?;

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for record in records {
            for disclosure in record.disclosures {
                if !seen.insert((record.standard.clone(), disclosure.code.clone())) {
                    return Err(CatalogError::DuplicateCode {
                        standard: record.standard,
                        code: disclosure.code,
                    });
                }
                entries.push(CatalogEntry {
                    standard_name: record.standard.clone(),
                    code: disclosure.code,
                    description: disclosure.description,
                });
            }
        }

        let catalog = Self { entries };
        if catalog.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct standard names in definition order.
    pub fn standard_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.standard_name.as_str()) {
                names.push(&entry.standard_name);
            }
        }
        names
    }

    /// All entries carrying `code`; the same code can exist under two standards.
    pub fn entries_for_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.code == code)
    }
}
