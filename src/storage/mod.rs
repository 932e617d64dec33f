// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::catalog::{Catalog, DisclosureStatus};
use crate::pipeline::ExtractionReport;
use crate::utils::error::StorageError;

#[derive(Debug, Serialize)]
struct DisclosureRecord<'a> {
    material_topic: &'a str,
    gri_code: &'a str,
    status: DisclosureStatus,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct ResultsDocument<'a> {
    gri_disclosures: Vec<DisclosureRecord<'a>>,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Saves the verdict list as `{"gri_disclosures": [...]}`, descriptions taken from the catalog.
    pub fn save_results(
        &self,
        report: &ExtractionReport,
        catalog: &Catalog,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let records = report
            .verdicts
            .iter()
            .zip(catalog.entries())
            .map(|(verdict, entry)| DisclosureRecord {
                material_topic: &verdict.material_topic,
                gri_code: &verdict.gri_code,
                status: verdict.status,
                description: &entry.description,
            })
            .collect();

        let json = serde_json::to_string_pretty(&ResultsDocument { gri_disclosures: records })
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let file_path = self.base_dir.join(filename);
        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved results to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the run in JSON format, next to the results
    pub fn save_run_metadata(
        &self,
        report: &ExtractionReport,
        input: &Path,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("gri_results");
        let file_path = self.base_dir.join(format!("{}_meta.json", stem));

        let metadata = serde_json::json!({
            "input": input.display().to_string(),
            "strategy": report.section.strategy,
            "attempted": report.attempted,
            "start_page": report.section.start_page + 1,
            "end_page": report.section.end_page + 1,
            "confidence": report.section.confidence,
            "found": report.found_count(),
            "total": report.verdicts.len(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DisclosureVerdict;
    use crate::locators::{LocatedSection, Strategy};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gri_extractor_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn report_for(catalog: &Catalog) -> ExtractionReport {
        let verdicts = catalog
            .entries()
            .iter()
            .map(|e| DisclosureVerdict {
                material_topic: e.standard_name.clone(),
                gri_code: e.code.clone(),
                status: if e.code == "2-1" { DisclosureStatus::Found } else { DisclosureStatus::NotFound },
            })
            .collect();
        ExtractionReport {
            section: LocatedSection {
                strategy: Strategy::Pattern,
                start_page: 8,
                end_page: 9,
                confidence: Some(1.0),
            },
            attempted: vec![Strategy::Pattern],
            verdicts,
        }
    }

    #[test]
    fn results_file_lists_every_entry_with_description() {
        let catalog = Catalog::builtin().expect("catalog");
        let storage = StorageManager::new(scratch_dir("results")).expect("storage");
        let path = storage
            .save_results(&report_for(&catalog), &catalog, "out.json")
            .expect("saved");

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).expect("readable")).expect("json");
        let items = saved["gri_disclosures"].as_array().expect("array");
        assert_eq!(items.len(), catalog.len());
        assert_eq!(items[0]["gri_code"], "2-1");
        assert_eq!(items[0]["status"], "FOUND");
        assert_eq!(items[0]["description"], "Organizational details");
        assert_eq!(items[1]["status"], "NOT_FOUND");
    }

    #[test]
    fn metadata_records_strategy_and_counts() {
        let catalog = Catalog::builtin().expect("catalog");
        let storage = StorageManager::new(scratch_dir("meta")).expect("storage");
        let path = storage
            .save_run_metadata(&report_for(&catalog), Path::new("report.txt"), "out.json")
            .expect("saved");

        assert!(path.ends_with("out_meta.json"));
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).expect("readable")).expect("json");
        assert_eq!(saved["strategy"], "PATTERN");
        assert_eq!(saved["start_page"], 9);
        assert_eq!(saved["found"], 1);
        assert_eq!(saved["total"], 130);
    }
}
