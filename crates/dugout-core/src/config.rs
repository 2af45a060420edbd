// Configuration loading and parsing (league.toml, strategy.toml).

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

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

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub roster: RosterRules,
}

/// Capacity and registration rules applied to every team in the league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RosterRules {
    /// Maximum number of players registered on the active roster.
    #[serde(default = "default_active_limit")]
    pub active_limit: usize,
    /// Pitchers the auto-fill aims for on an unconstrained roster.
    #[serde(default = "default_target_pitchers")]
    pub target_pitchers: usize,
    /// Batters (lineup + bench) the auto-fill aims for.
    #[serde(default = "default_target_batters")]
    pub target_batters: usize,
    /// Rotation slots the auto-fill populates (of the eight available).
    #[serde(default = "default_rotation_starters")]
    pub rotation_starters: usize,
    /// Re-registration penalty after an active-roster demotion.
    #[serde(default = "default_demotion_cooldown_days")]
    pub demotion_cooldown_days: u32,
}

fn default_active_limit() -> usize {
    31
}

fn default_target_pitchers() -> usize {
    15
}

fn default_target_batters() -> usize {
    16
}

fn default_rotation_starters() -> usize {
    6
}

fn default_demotion_cooldown_days() -> u32 {
    10
}

impl Default for RosterRules {
    fn default() -> Self {
        Self {
            active_limit: default_active_limit(),
            target_pitchers: default_target_pitchers(),
            target_batters: default_target_batters(),
            rotation_starters: default_rotation_starters(),
            demotion_cooldown_days: default_demotion_cooldown_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    assignment: AssignmentSection,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct AssignmentSection {
    priority_mode: PriorityMode,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub priority_mode: PriorityMode,
}

/// Which signal the auto-assignment leans on when ranking candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMode {
    /// Raw ability dominates; condition barely moves the score.
    Ability,
    /// Day-to-day form dominates.
    Condition,
    #[default]
    Balanced,
}

impl PriorityMode {
    /// Parse a settings string (`ability`, `condition`, `balanced`).
    pub fn from_str_mode(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ability" => Some(PriorityMode::Ability),
            "condition" => Some(PriorityMode::Condition),
            "balanced" => Some(PriorityMode::Balanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityMode::Ability => "ability",
            PriorityMode::Condition => "condition",
            PriorityMode::Balanced => "balanced",
        }
    }
}

impl fmt::Display for PriorityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let league = league_file.league;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let config = Config {
        league,
        strategy: StrategyConfig {
            priority_mode: strategy_file.assignment.priority_mode,
        },
        db_path: strategy_file.database.path,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` from `defaults/`, never overwriting a file the user already
/// has. `*.example` files stay behind. Returns the paths that were written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "neither defaults/ nor config/ directory found in {}; \
             run from the project root or ensure defaults/ is present",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut copied = Vec::new();
    for source in default_files(&defaults_dir)? {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_if_missing(&source, &target)? {
            copied.push(target);
        }
    }
    Ok(copied)
}

/// Regular files under `defaults/`, sorted, minus the `.example` templates.
fn default_files(defaults_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = std::fs::read_dir(defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        let is_example = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !is_example {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy `source` to `target` unless `target` exists. `create_new` makes the
/// existence check and the create one step.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("cannot create {}: {e}", target.display()))),
    };
    let content = std::fs::read(source)
        .map_err(|e| copy_error(format!("cannot read {}: {e}", source.display())))?;
    std::io::Write::write_all(&mut dest, &content)
        .map_err(|e| copy_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Pick the directory configuration is loaded from.
///
/// The working directory wins when it carries `config/` or `defaults/`;
/// otherwise the per-user data directory is used.
pub fn resolve_base_dir() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        return Ok(cwd);
    }
    match directories::ProjectDirs::from("", "", "dugout") {
        Some(dirs) => Ok(dirs.data_dir().to_path_buf()),
        None => Ok(cwd),
    }
}

/// Convenience wrapper: resolves the base directory, copies default config
/// files, then loads.
pub fn load_config() -> Result<(PathBuf, Config), ConfigError> {
    let base = resolve_base_dir()?;
    ensure_config_files(&base)?;
    let config = load_config_from(&base)?;
    Ok((base, config))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_rules(&config.league.roster)?;

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

/// Smallest active roster that can hold a full lineup and a starter.
pub const MIN_ACTIVE_LIMIT: usize = 10;

/// Check roster rules for internal consistency.
pub fn validate_rules(rules: &RosterRules) -> Result<(), ConfigError> {
    // Below the targets the auto-fill shrinks the bench and bullpen, but a
    // legal save always needs nine starters and one starting pitcher.
    if rules.active_limit < MIN_ACTIVE_LIMIT {
        return Err(ConfigError::ValidationError {
            field: "league.roster.active_limit".into(),
            message: format!(
                "must be at least {MIN_ACTIVE_LIMIT}, got {}",
                rules.active_limit
            ),
        });
    }

    if rules.target_batters < 9 {
        return Err(ConfigError::ValidationError {
            field: "league.roster.target_batters".into(),
            message: format!("must be at least 9, got {}", rules.target_batters),
        });
    }

    if rules.target_pitchers == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.roster.target_pitchers".into(),
            message: "must be greater than 0".into(),
        });
    }

    if !(1..=8).contains(&rules.rotation_starters) {
        return Err(ConfigError::ValidationError {
            field: "league.roster.rotation_starters".into(),
            message: format!(
                "must be between 1 and 8 inclusive, got {}",
                rules.rotation_starters
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
