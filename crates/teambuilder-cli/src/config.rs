// Configuration loading and parsing (teambuilder.toml plus command-line overrides).

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use teambuilder_core::engine::EngineConfig;

/// Date format for `as_of` in the config file and on the command line.
pub const AS_OF_FORMAT: &str = "%Y-%m-%d";

/// Output directory when neither the file nor the command line names one.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub engine: EngineConfig,
    /// Reference date for player ages.
    pub as_of: NaiveDate,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Also write debug_players.csv.
    pub debug: bool,
    /// Also write team_report.json.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// teambuilder.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub division: DivisionSection,
    pub output: OutputSection,
}

/// `[division]` table. Every key is optional; the command line may supply it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DivisionSection {
    pub team_size: Option<usize>,
    pub min_team_size: Option<usize>,
    pub max_team_size: Option<usize>,
    pub seed: Option<u64>,
    pub as_of: Option<String>,
    pub keep_siblings_together: Option<bool>,
}

/// `[output]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub dir: Option<String>,
    pub debug: Option<bool>,
    pub json: Option<bool>,
}

/// Values given on the command line. Anything set here wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub team_size: Option<usize>,
    pub min_team_size: Option<usize>,
    pub max_team_size: Option<usize>,
    pub seed: Option<u64>,
    pub as_of: Option<String>,
    pub siblings: bool,
    pub debug: bool,
    pub json: bool,
    pub output_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read and parse a config file.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Assemble the run configuration from an optional config file and the
/// command-line overrides. `today` is the fallback `as_of` date.
pub fn load_config(path: Option<&Path>, overrides: &Overrides, today: NaiveDate) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) => load_config_file(p)?,
        None => ConfigFile::default(),
    };
    resolve(file, overrides, today)
}

/// Merge file values with overrides, fill defaults, and validate.
pub fn resolve(file: ConfigFile, overrides: &Overrides, today: NaiveDate) -> Result<Config, ConfigError> {
    let division = file.division;
    let team_size = overrides
        .team_size
        .or(division.team_size)
        .ok_or_else(|| ConfigError::ValidationError {
            field: "division.team_size".into(),
            message: "must be set in the config file or with --team-size".into(),
        })?;

    let mut engine = EngineConfig::new(team_size);
    if let Some(min) = overrides.min_team_size.or(division.min_team_size) {
        engine.min_team_size = min;
    }
    engine.max_team_size = overrides.max_team_size.or(division.max_team_size);
    engine.random_seed = overrides.seed.or(division.seed);
    engine.keep_siblings_together = overrides.siblings || division.keep_siblings_together.unwrap_or(false);

    let as_of = match overrides.as_of.as_deref().or(division.as_of.as_deref()) {
        Some(raw) => parse_as_of(raw)?,
        None => today,
    };

    let output = OutputConfig {
        dir: overrides
            .output_dir
            .clone()
            .or_else(|| file.output.dir.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        debug: overrides.debug || file.output.debug.unwrap_or(false),
        json: overrides.json || file.output.json.unwrap_or(false),
    };

    let config = Config { engine, as_of, output };
    validate(&config)?;
    Ok(config)
}

fn parse_as_of(raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), AS_OF_FORMAT).map_err(|e| ConfigError::ValidationError {
        field: "division.as_of".into(),
        message: format!("expected YYYY-MM-DD, got '{raw}' ({e})"),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let engine = &config.engine;

    if engine.team_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "division.team_size".into(),
            message: "must be greater than 0".into(),
        });
    }

    if engine.min_team_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "division.min_team_size".into(),
            message: "must be greater than 0".into(),
        });
    }

    if let Some(max) = engine.max_team_size {
        if max < engine.min_team_size {
            return Err(ConfigError::ValidationError {
                field: "division.max_team_size".into(),
                message: format!("must be >= min_team_size ({}), got {max}", engine.min_team_size),
            });
        }
    }

    if config.output.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "output.dir".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
