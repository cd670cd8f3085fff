//! Configuration parsing and management for covdiff.
//!
//! This crate provides:
//! - The `covdiff.toml` file format (`Config`)
//! - Action inputs read from `INPUT_*` environment variables
//! - Precedence handling (CLI > action inputs > config file > defaults)
//! - The file filter applied to diff and coverage names

use std::path::{Path, PathBuf};

use covdiff_ports::PathFilter;
use serde::Deserialize;
use thiserror::Error;

/// Name of the configuration file searched for by [`discover_config`].
pub const CONFIG_FILE_NAME: &str = "covdiff.toml";

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),

    /// No coverage profile was configured anywhere.
    #[error("missing coverage file")]
    MissingCoverage,

    /// No diff file was configured anywhere.
    #[error("missing diff file")]
    MissingDiff,
}

// ============================================================================
// Configuration Types
// ============================================================================

/// File selection settings (`[files]`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    /// Only names ending with this extension are considered.
    #[serde(default)]
    pub extension: Option<String>,
    /// Names containing this marker are test files and skipped.
    #[serde(default)]
    pub test_marker: Option<String>,
    /// Names containing any of these segments are vendored and skipped.
    #[serde(default)]
    pub vendor_dirs: Option<Vec<String>>,
    /// Glob patterns for files to include (allowlist).
    /// If empty, all files are included.
    #[serde(default)]
    pub include: Vec<String>,
    /// Glob patterns for files to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Contents of a `covdiff.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Root of the repository checkout.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Go coverage profile.
    #[serde(default)]
    pub coverprofile: Option<PathBuf>,

    /// Unified diff of the change.
    #[serde(default)]
    pub diff: Option<PathBuf>,

    /// Module path that prefixes names in the coverage profile.
    #[serde(default)]
    pub module: Option<String>,

    /// Exclude `package main` files from measurement.
    #[serde(default)]
    pub ignore_main: Option<bool>,

    /// Minimum coverage on new lines (0-100).
    #[serde(default)]
    pub min_coverage_pct: Option<u32>,

    #[serde(default)]
    pub files: FilesConfig,
}

// ============================================================================
// Configuration Loading
// ============================================================================

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Load configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(pct) = config.min_coverage_pct {
        validate_pct(pct)?;
    }
    Ok(())
}

fn validate_pct(pct: u32) -> Result<(), ConfigError> {
    if pct > 100 {
        return Err(ConfigError::InvalidValue(format!(
            "min_coverage_pct must be between 0 and 100, got {pct}"
        )));
    }
    Ok(())
}

/// Find and load `covdiff.toml` in `start` or its parent directories.
pub fn discover_config_from(start: &Path) -> Result<Option<(PathBuf, Config)>, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            let config = load_config(&config_path)?;
            return Ok(Some((config_path, config)));
        }

        if !current.pop() {
            return Ok(None);
        }
    }
}

/// Find and load `covdiff.toml` starting from the current directory.
pub fn discover_config() -> Result<Option<(PathBuf, Config)>, ConfigError> {
    match std::env::current_dir() {
        Ok(dir) => discover_config_from(&dir),
        Err(_) => Ok(None),
    }
}

// ============================================================================
// Action Inputs
// ============================================================================

/// Inputs supplied by a CI action runner as `INPUT_<NAME>` variables.
///
/// Empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInputs {
    pub path: Option<PathBuf>,
    pub coverprofile: Option<PathBuf>,
    pub diff: Option<PathBuf>,
    pub module: Option<String>,
    pub ignore_main: Option<bool>,
    pub min_coverage_pct: Option<u32>,
}

impl ActionInputs {
    /// Read inputs through `lookup`, which maps a variable name to its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdiff_config::ActionInputs;
    ///
    /// let inputs = ActionInputs::from_lookup(|key| match key {
    ///     "INPUT_COVERPROFILE" => Some("cover.out".to_string()),
    ///     "INPUT_IGNORE-MAIN" => Some("true".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert!(inputs.coverprofile.is_some());
    /// assert_eq!(inputs.ignore_main, Some(true));
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("INPUT_{}", name.to_uppercase())).filter(|v| !v.trim().is_empty())
        };

        let ignore_main = get("ignore-main")
            .map(|v| parse_bool("ignore-main", &v))
            .transpose()?;
        let min_coverage_pct = get("min-coverage")
            .map(|v| {
                let pct = v.trim().parse::<u32>().map_err(|_| {
                    ConfigError::InvalidValue(format!("min-coverage must be an integer, got {v:?}"))
                })?;
                validate_pct(pct)?;
                Ok::<u32, ConfigError>(pct)
            })
            .transpose()?;

        Ok(Self {
            path: get("path").map(PathBuf::from),
            coverprofile: get("coverprofile").map(PathBuf::from),
            diff: get("diff").map(PathBuf::from),
            module: get("module"),
            ignore_main,
            min_coverage_pct,
        })
    }

    /// Read inputs from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{name} must be true or false, got {value:?}"
        ))),
    }
}

// ============================================================================
// Precedence Resolution
// ============================================================================

/// CLI override options.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub path: Option<PathBuf>,
    pub coverprofile: Option<PathBuf>,
    pub diff: Option<PathBuf>,
    pub module: Option<String>,
    pub ignore_main: Option<bool>,
    pub min_coverage_pct: Option<u32>,
}

/// Effective configuration with all values resolved.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub repo_path: PathBuf,
    pub coverprofile: PathBuf,
    pub diff: PathBuf,
    pub module: String,
    pub ignore_main: bool,
    pub min_coverage_pct: Option<u32>,
    pub files: FileFilter,
    /// Publish the percentage as a CI output variable.
    pub github_output: bool,
}

/// Resolve effective configuration from config file, action inputs, and CLI overrides.
///
/// Precedence: CLI > action inputs > config file > defaults. The CI output is
/// enabled when the coverage profile was supplied as an action input.
pub fn resolve_config(
    config: Option<&Config>,
    inputs: &ActionInputs,
    cli: &CliOverrides,
) -> Result<EffectiveConfig, ConfigError> {
    let file = config.cloned().unwrap_or_default();

    let coverprofile = cli
        .coverprofile
        .clone()
        .or_else(|| inputs.coverprofile.clone())
        .or(file.coverprofile)
        .ok_or(ConfigError::MissingCoverage)?;
    let diff = cli
        .diff
        .clone()
        .or_else(|| inputs.diff.clone())
        .or(file.diff)
        .ok_or(ConfigError::MissingDiff)?;
    let repo_path = cli
        .path
        .clone()
        .or_else(|| inputs.path.clone())
        .or(file.path)
        .unwrap_or_else(|| PathBuf::from("."));
    let module = cli
        .module
        .clone()
        .or_else(|| inputs.module.clone())
        .or(file.module)
        .unwrap_or_default();
    let ignore_main = cli
        .ignore_main
        .or(inputs.ignore_main)
        .or(file.ignore_main)
        .unwrap_or(false);
    let min_coverage_pct = cli
        .min_coverage_pct
        .or(inputs.min_coverage_pct)
        .or(file.min_coverage_pct);
    if let Some(pct) = min_coverage_pct {
        validate_pct(pct)?;
    }

    let files = FileFilter::from_config(&file.files, &module)?;

    Ok(EffectiveConfig {
        repo_path,
        coverprofile,
        diff,
        module,
        ignore_main,
        min_coverage_pct,
        files,
        github_output: inputs.coverprofile.is_some(),
    })
}

// ============================================================================
// Path Filtering
// ============================================================================

/// Check if a path matches any of the given glob patterns.
pub fn matches_any_pattern(path: &str, patterns: &[glob::Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(path))
}

/// Filter a path based on include/exclude patterns.
///
/// Returns `true` if the path should be included in evaluation.
pub fn should_include_path(
    path: &str,
    include_patterns: &[glob::Pattern],
    exclude_patterns: &[glob::Pattern],
) -> bool {
    // If exclude patterns match, exclude the path
    if matches_any_pattern(path, exclude_patterns) {
        return false;
    }

    // If include patterns are specified and path doesn't match, exclude it
    if !include_patterns.is_empty() && !matches_any_pattern(path, include_patterns) {
        return false;
    }

    true
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p)
                .map_err(|e| ConfigError::InvalidValue(format!("bad glob {p:?}: {e}")))
        })
        .collect()
}

/// Decides which diff and coverage names take part in the computation.
///
/// A name is skipped when it contains the test marker, lacks the extension,
/// contains a vendored directory, or fails the include/exclude globs. Globs
/// are matched against the repository-relative name; the module prefix of
/// coverage names is removed first.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extension: String,
    test_marker: String,
    vendor_dirs: Vec<String>,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
    module: String,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            extension: ".go".to_string(),
            test_marker: "_test.go".to_string(),
            vendor_dirs: vec!["vendor/".to_string()],
            include: Vec::new(),
            exclude: Vec::new(),
            module: String::new(),
        }
    }
}

impl FileFilter {
    /// Build a filter from `[files]`, falling back to Go defaults.
    pub fn from_config(files: &FilesConfig, module: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            extension: files.extension.clone().unwrap_or(defaults.extension),
            test_marker: files.test_marker.clone().unwrap_or(defaults.test_marker),
            vendor_dirs: files.vendor_dirs.clone().unwrap_or(defaults.vendor_dirs),
            include: compile_patterns(&files.include)?,
            exclude: compile_patterns(&files.exclude)?,
            module: module.trim_end_matches('/').to_string(),
        })
    }

    fn relative<'a>(&self, path: &'a str) -> &'a str {
        if self.module.is_empty() {
            return path;
        }
        path.strip_prefix(self.module.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    }
}

impl PathFilter for FileFilter {
    fn should_skip(&self, path: &str) -> bool {
        if !self.test_marker.is_empty() && path.contains(&self.test_marker) {
            return true;
        }
        if !path.ends_with(&self.extension) {
            return true;
        }
        if self
            .vendor_dirs
            .iter()
            .any(|dir| !dir.is_empty() && path.contains(dir.as_str()))
        {
            return true;
        }
        !should_include_path(self.relative(path), &self.include, &self.exclude)
    }
}

// ============================================================================
// Tests
// ============================================================================
