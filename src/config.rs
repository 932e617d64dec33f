// src/config.rs
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::matcher::DEFAULT_FUZZY_THRESHOLD;
use crate::corpus::WindowPolicy;
use crate::groq::client::{DEFAULT_MODEL, GROQ_CHAT_URL};
use crate::locators::heuristic::DEFAULT_SAMPLE_CAP;
use crate::locators::similarity::{DEFAULT_MAX_FEATURES, DEFAULT_SIMILARITY_THRESHOLD};
use crate::utils::AppError;

const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MODEL_TEXT_CAP: usize = 2000;

/// Tunables for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub window: WindowPolicy,
    pub similarity_threshold: f64,
    pub max_features: usize,
    pub fuzzy_threshold: f64,
    pub heuristic_sample_cap: usize,
    pub model_text_cap: usize,
    pub model_timeout: Duration,
    /// Without a key the heuristic locator is skipped.
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_endpoint: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            window: WindowPolicy::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_features: DEFAULT_MAX_FEATURES,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            heuristic_sample_cap: DEFAULT_SAMPLE_CAP,
            model_text_cap: DEFAULT_MODEL_TEXT_CAP,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            groq_api_key: None,
            groq_model: DEFAULT_MODEL.to_string(),
            groq_endpoint: GROQ_CHAT_URL.to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Defaults overridden by `GRI_*` and `GROQ_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ratio) = parse_var(&lookup, "GRI_WINDOW_RATIO")? {
            config.window.start_ratio = ratio;
        }
        if let Some(pages) = parse_var(&lookup, "GRI_MIN_WINDOW_PAGES")? {
            config.window.min_pages = pages;
        }
        if let Some(threshold) = parse_var(&lookup, "GRI_SIMILARITY_THRESHOLD")? {
            config.similarity_threshold = threshold;
        }
        if let Some(threshold) = parse_var(&lookup, "GRI_FUZZY_THRESHOLD")? {
            config.fuzzy_threshold = threshold;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "GRI_MODEL_TIMEOUT_SECS")? {
            config.model_timeout = Duration::from_secs(secs);
        }
        config.groq_api_key = lookup("GROQ_API_KEY").filter(|key| !key.trim().is_empty());
        if let Some(model) = lookup("GROQ_MODEL").filter(|m| !m.trim().is_empty()) {
            config.groq_model = model;
        }
        if let Some(endpoint) = lookup("GROQ_API_URL").filter(|u| !u.trim().is_empty()) {
            config.groq_endpoint = endpoint;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..1.0).contains(&self.window.start_ratio) {
            return Err(AppError::Config(format!(
                "window ratio must be in [0, 1), got {}",
                self.window.start_ratio
            )));
        }
        for (name, value) in [
            ("similarity threshold", self.similarity_threshold),
            ("fuzzy threshold", self.fuzzy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        if self.model_timeout.is_zero() {
            return Err(AppError::Config("model timeout must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("invalid {}='{}': {}", key, raw, e))),
    }
}
