// Configuration loading and parsing (config/scorecast.toml).

use serde::Deserialize;
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
// scorecast.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire scorecast.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
    store: StoreSection,
    game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the fixture provider (football-data.org v4 or compatible).
    pub base_url: String,
    /// API token. May be empty; sync then fails with an auth error upstream.
    #[serde(default)]
    pub token: String,
    /// Competition code, e.g. `PL`.
    pub competition: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StoreSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Season label new groups start in, e.g. `2025-26`.
    pub season: String,
    /// Fixture count for placeholder gameweeks created before a sync.
    pub placeholder_fixtures: u32,
    /// How many recent audit entries group views display.
    pub audit_display_limit: usize,
}

/// The assembled application config.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub game: GameConfig,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/scorecast.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("scorecast.toml");
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        api: file.api,
        game: file.game,
        db_path: file.store.path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure `config/scorecast.toml` exists, copying the packaged default into
/// place on first run. Returns true when the file was copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<bool, ConfigError> {
    let source = base_dir.join("defaults").join("scorecast.toml");
    let config_dir = base_dir.join("config");
    let target = config_dir.join("scorecast.toml");

    if target.exists() {
        return Ok(false);
    }

    if !source.exists() {
        // An existing config/ without the file is left to the loader, which
        // reports FileNotFound with the right path. Neither directory
        // existing means we're being run from the wrong place.
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(false);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "failed to copy {} to {}: {e}",
            source.display(),
            target.display()
        ),
    })?;

    Ok(true)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
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
    if config.api.base_url.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    if config.api.competition.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.competition".into(),
            message: "must not be empty".into(),
        });
    }

    if config.game.season.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "game.season".into(),
            message: "must not be empty".into(),
        });
    }

    if config.game.placeholder_fixtures == 0 {
        return Err(ConfigError::ValidationError {
            field: "game.placeholder_fixtures".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.game.audit_display_limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "game.audit_display_limit".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.db_path.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "store.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID_TOML: &str = r#"
[api]
base_url = "https://api.football-data.org/v4"
token = "secret"
competition = "PL"

[store]
path = "scorecast.db"

[game]
season = "2025-26"
placeholder_fixtures = 10
audit_display_limit = 50
"#;

    /// Helper: set up a temp dir with the given config/scorecast.toml content.
    fn write_config(dir_name: &str, toml_text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(dir_name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("scorecast.toml"), toml_text).unwrap();
        tmp
    }

    #[test]
    fn load_valid_config() {
        let tmp = write_config("scorecast_config_valid", VALID_TOML);
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.api.base_url, "https://api.football-data.org/v4");
        assert_eq!(config.api.token, "secret");
        assert_eq!(config.api.competition, "PL");
        assert_eq!(config.db_path, "scorecast.db");
        assert_eq!(config.game.season, "2025-26");
        assert_eq!(config.game.placeholder_fixtures, 10);
        assert_eq!(config.game.audit_display_limit, 50);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_token_defaults_to_empty() {
        let toml_text = VALID_TOML.replace("token = \"secret\"\n", "");
        let tmp = write_config("scorecast_config_no_token", &toml_text);
        let config = load_config_from(&tmp).expect("token should be optional");
        assert!(config.api.token.is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("scorecast_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("scorecast.toml"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = write_config("scorecast_config_bad_toml", "this is not valid [[[ toml");

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => {
                assert!(path.ends_with("scorecast.toml"));
            }
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_placeholder_fixtures() {
        let toml_text = VALID_TOML.replace("placeholder_fixtures = 10", "placeholder_fixtures = 0");
        let tmp = write_config("scorecast_config_zero_placeholders", &toml_text);

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "game.placeholder_fixtures");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_base_url() {
        let toml_text = VALID_TOML.replace(
            "base_url = \"https://api.football-data.org/v4\"",
            "base_url = \"\"",
        );
        let tmp = write_config("scorecast_config_empty_url", &toml_text);

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "api.base_url");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_season() {
        let toml_text = VALID_TOML.replace("season = \"2025-26\"", "season = \"\"");
        let tmp = write_config("scorecast_config_empty_season", &toml_text);

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "game.season");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_audit_display_limit() {
        let toml_text = VALID_TOML.replace("audit_display_limit = 50", "audit_display_limit = 0");
        let tmp = write_config("scorecast_config_zero_audit", &toml_text);

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "game.audit_display_limit");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_file() {
        let tmp = std::env::temp_dir().join("scorecast_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join("scorecast.toml"), VALID_TOML).unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied);
        assert!(tmp.join("config/scorecast.toml").exists());
        load_config_from(&tmp).expect("copied default should load");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_keeps_existing_file() {
        let tmp = std::env::temp_dir().join("scorecast_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        fs::write(defaults_dir.join("scorecast.toml"), VALID_TOML).unwrap();
        fs::write(config_dir.join("scorecast.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(!copied);

        let content = fs::read_to_string(config_dir.join("scorecast.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("scorecast_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
