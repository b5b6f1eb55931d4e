//! Configuration lue depuis l'environnement (et un éventuel fichier `.env`)

use std::{env, ops::Range, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::analysis::AnalysisPolicy;
use crate::consts::*;
use crate::models::{DeficiencyType, Severity};

pub const ENV_DB: &str = "VITADETECT_DB";
pub const ENV_LOG: &str = "VITADETECT_LOG";
pub const ENV_EXPORT_DIR: &str = "VITADETECT_EXPORT_DIR";
pub const ENV_ANALYSIS: &str = "VITADETECT_ANALYSIS";
pub const ENV_LATENCY_MS: &str = "VITADETECT_LATENCY_MS";
pub const ENV_CONFIDENCE_MIN: &str = "VITADETECT_CONFIDENCE_MIN";
pub const ENV_CONFIDENCE_MAX: &str = "VITADETECT_CONFIDENCE_MAX";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub export_dir: PathBuf,
    pub policy: AnalysisPolicy,
    pub latency: Duration,
    pub confidence: Range<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.into(),
            log_path: DEFAULT_LOG_PATH.into(),
            export_dir: DEFAULT_EXPORT_DIR.into(),
            policy: AnalysisPolicy::Random,
            latency: Duration::from_millis(DEFAULT_LATENCY_MS),
            confidence: DEFAULT_CONFIDENCE_MIN..DEFAULT_CONFIDENCE_MAX,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construit la configuration à partir d'une fonction de recherche
    /// quelconque; les clés absentes gardent leur valeur par défaut.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(ENV_DB) {
            config.db_path = path.into();
        }
        if let Some(path) = lookup(ENV_LOG) {
            config.log_path = path.into();
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR) {
            config.export_dir = dir.into();
        }
        if let Some(policy) = lookup(ENV_ANALYSIS) {
            config.policy = parse_policy(&policy).ok_or(ConfigError::InvalidValue {
                key: ENV_ANALYSIS,
                value: policy,
            })?;
        }
        if let Some(ms) = lookup(ENV_LATENCY_MS) {
            config.latency = Duration::from_millis(parse(ENV_LATENCY_MS, ms)?);
        }
        if let Some(min) = lookup(ENV_CONFIDENCE_MIN) {
            config.confidence.start = parse(ENV_CONFIDENCE_MIN, min)?;
        }
        if let Some(max) = lookup(ENV_CONFIDENCE_MAX) {
            config.confidence.end = parse(ENV_CONFIDENCE_MAX, max)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

/// `random`, ou `fixed` (vitamine A, sévérité modérée)
fn parse_policy(value: &str) -> Option<AnalysisPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "random" => Some(AnalysisPolicy::Random),
        "fixed" => Some(AnalysisPolicy::Fixed(DeficiencyType::A, Severity::Moderate)),
        _ => None,
    }
}
