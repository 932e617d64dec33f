// src/main.rs
mod catalog;
mod config;
mod corpus;
mod groq;
mod locators;
mod pipeline;
mod storage;
mod utils;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

use catalog::Catalog;
use config::ExtractorConfig;
use groq::GroqClient;
use locators::PatternLocator;
use pipeline::{ExtractionReport, GriPipeline};
use storage::StorageManager;
use utils::AppError;

// Any code-shaped token, for the debug rendering
static CODE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}\s*[-\u{2010}-\u{2015}\u{2212}]\s*\d{1,2}\b").expect("Failed to compile CODE_TOKEN_RE")
});

/// Extract GRI disclosures from a sustainability report
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page-indexed text of the report (.txt from pdftotext, .json, .xml from pdftohtml -xml, .html)
    input: PathBuf,

    /// Output JSON file name
    #[arg(short, long, default_value = "gri_results.json")]
    output: String,

    /// Directory for results and debug files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Replacement catalog file (same shape as data/gri_catalog.json)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Groq API key for the LLM fallback (overrides GROQ_API_KEY)
    #[arg(long)]
    groq_key: Option<String>,

    /// Print only summary statistics, don't save full results
    #[arg(short, long)]
    summary_only: bool,

    /// List all found GRI codes
    #[arg(long)]
    list_found: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Save an annotated HTML rendering of the search window
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments and setup logging (reads RUST_LOG env var)
    let args = Args::parse();
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting processing for args: {:?}", args.input);

    // 2. Configuration: defaults, then environment, then flags
    let mut config = ExtractorConfig::from_env()?;
    if let Some(key) = args.groq_key.clone().filter(|k| !k.trim().is_empty()) {
        config.groq_api_key = Some(key);
    }

    // 3. Catalog
    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };

    // 4. Ingest the document; failure here ends the run
    let corpus = corpus::ingest::load_corpus(&args.input).map_err(|e| {
        tracing::error!("Failed to read {}: {}", args.input.display(), e);
        AppError::from(e)
    })?;
    if corpus.is_empty() {
        tracing::warn!("{} has no pages, every disclosure will be reported as not found", args.input.display());
    }

    // 5. Optional model for the last-resort locator
    let classifier = match &config.groq_api_key {
        Some(key) => match GroqClient::new(
            key.clone(),
            config.groq_model.clone(),
            config.groq_endpoint.clone(),
            config.model_timeout,
            config.model_text_cap,
        ) {
            Ok(client) => {
                tracing::info!("Groq client initialized successfully");
                Some(client)
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Groq client: {}", e);
                None
            }
        },
        None => {
            tracing::warn!("No Groq API key provided, LLM detection will be disabled");
            None
        }
    };

    // 6. Run the pipeline
    let started = std::time::Instant::now();
    let pipeline = GriPipeline::new(&catalog, &config, classifier);
    let report = pipeline.run(&corpus).await;
    let elapsed = started.elapsed();

    let storage = StorageManager::new(&args.output_dir)?;

    if args.debug {
        let debug_dir = storage.base_dir().join("debug");
        std::fs::create_dir_all(&debug_dir)?;
        let window = corpus.search_window(&config.window);
        let mut patterns: Vec<(&Regex, &str)> =
            PatternLocator::header_patterns().iter().map(|re| (re, "header")).collect();
        patterns.push((&*CODE_TOKEN_RE, "code"));
        let debug_path = debug_dir.join("window_annotated.html");
        if let Err(e) = utils::html_debug::create_debug_html(corpus.window_pages(&window), &debug_path, &patterns) {
            tracing::warn!("Failed to create debug HTML: {}", e);
        } else {
            tracing::info!("Created annotated debug HTML: {}", debug_path.display());
        }
    }

    // 7. Report
    print_summary(&report, elapsed);
    if args.list_found {
        print_found_codes(&report);
    }

    if !args.summary_only {
        let path = storage.save_results(&report, &catalog, &args.output)?;
        storage.save_run_metadata(&report, &args.input, &args.output)?;
        println!("\nResults saved to: {}", path.display());
    }

    tracing::info!("Processing finished. Found {} of {} codes", report.found_count(), report.verdicts.len());
    Ok(())
}

fn quality_band(coverage: f64) -> &'static str {
    match coverage {
        c if c >= 90.0 => "EXCELLENT",
        c if c >= 70.0 => "GOOD",
        c if c >= 50.0 => "FAIR",
        _ => "POOR",
    }
}

fn print_summary(report: &ExtractionReport, elapsed: std::time::Duration) {
    let coverage = report.coverage_percent();
    println!("\nGRI Extraction Summary");
    println!("{}", "=".repeat(40));
    println!("Processing time: {:.1} seconds", elapsed.as_secs_f64());
    println!(
        "Section: {:?}, pages {}-{}",
        report.section.strategy,
        report.section.start_page + 1,
        report.section.end_page + 1
    );
    println!("Total GRI codes: {}", report.verdicts.len());
    println!("Found GRI codes: {}", report.found_count());
    println!("Coverage rate: {:.1}%", coverage);
    println!("Extraction quality: {}", quality_band(coverage));
}

fn print_found_codes(report: &ExtractionReport) {
    // standard -> codes, catalog order within each standard
    let mut by_standard: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for verdict in report.verdicts.iter().filter(|v| v.is_found()) {
        by_standard
            .entry(verdict.material_topic.as_str())
            .or_default()
            .push(verdict.gri_code.as_str());
    }

    if by_standard.is_empty() {
        println!("\nNo GRI codes found");
        return;
    }

    println!("\nFound GRI Codes ({} total)", report.found_count());
    println!("{}", "-".repeat(50));
    for (standard, codes) in by_standard {
        println!("\n{}", standard);
        println!("   {}", codes.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_bands() {
        assert_eq!(quality_band(95.0), "EXCELLENT");
        assert_eq!(quality_band(90.0), "EXCELLENT");
        assert_eq!(quality_band(70.0), "GOOD");
        assert_eq!(quality_band(55.0), "FAIR");
        assert_eq!(quality_band(10.0), "POOR");
    }

    #[test]
    fn cli_parses_flags() {
        let args = Args::parse_from(["gri_extractor", "report.txt", "--list-found", "-s", "--groq-key", "k"]);
        assert_eq!(args.input, PathBuf::from("report.txt"));
        assert!(args.list_found);
        assert!(args.summary_only);
        assert_eq!(args.groq_key.as_deref(), Some("k"));
        assert_eq!(args.output, "gri_results.json");
    }
}
