use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::{ValidationRule, ValidationRules};
use crate::persistence::DEFAULT_SLOT_KEY;

pub const DEFAULT_CONFIG_FILE: &str = "blindquote.toml";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub pricing: PricingConfig,
    pub rules: RulesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub url: String,
    pub slot_key: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PricingConfig {
    /// TOML price book. The built-in book is used when unset.
    pub matrix_path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    pub width_min: u32,
    pub width_max: u32,
    pub height_min: u32,
    pub height_max: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub storage_url: Option<String>,
    pub slot_key: Option<String>,
    pub matrix_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                url: "sqlite://blindquote.db".to_string(),
                slot_key: DEFAULT_SLOT_KEY.to_string(),
                max_connections: 1,
                timeout_secs: 30,
            },
            pricing: PricingConfig::default(),
            rules: RulesConfig { width_min: 1, width_max: 3300, height_min: 1, height_max: 3300 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl RulesConfig {
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            width: ValidationRule::new(self.width_min, self.width_max, "Width"),
            height: ValidationRule::new(self.height_min, self.height_max, "Height"),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(storage) = patch.storage {
            if let Some(url) = storage.url {
                self.storage.url = url;
            }
            if let Some(slot_key) = storage.slot_key {
                self.storage.slot_key = slot_key;
            }
            if let Some(max_connections) = storage.max_connections {
                self.storage.max_connections = max_connections;
            }
            if let Some(timeout_secs) = storage.timeout_secs {
                self.storage.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(matrix_path) = pricing.matrix_path {
                self.pricing.matrix_path = Some(matrix_path);
            }
        }

        if let Some(rules) = patch.rules {
            if let Some(width_min) = rules.width_min {
                self.rules.width_min = width_min;
            }
            if let Some(width_max) = rules.width_max {
                self.rules.width_max = width_max;
            }
            if let Some(height_min) = rules.height_min {
                self.rules.height_min = height_min;
            }
            if let Some(height_max) = rules.height_max {
                self.rules.height_max = height_max;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BLINDQUOTE_STORAGE_URL") {
            self.storage.url = value;
        }
        if let Some(value) = read_env("BLINDQUOTE_STORAGE_SLOT_KEY") {
            self.storage.slot_key = value;
        }
        if let Some(value) = read_env("BLINDQUOTE_STORAGE_MAX_CONNECTIONS") {
            self.storage.max_connections =
                parse_u32("BLINDQUOTE_STORAGE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("BLINDQUOTE_STORAGE_TIMEOUT_SECS") {
            self.storage.timeout_secs = parse_u64("BLINDQUOTE_STORAGE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BLINDQUOTE_PRICING_MATRIX_PATH") {
            self.pricing.matrix_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("BLINDQUOTE_RULES_WIDTH_MIN") {
            self.rules.width_min = parse_u32("BLINDQUOTE_RULES_WIDTH_MIN", &value)?;
        }
        if let Some(value) = read_env("BLINDQUOTE_RULES_WIDTH_MAX") {
            self.rules.width_max = parse_u32("BLINDQUOTE_RULES_WIDTH_MAX", &value)?;
        }
        if let Some(value) = read_env("BLINDQUOTE_RULES_HEIGHT_MIN") {
            self.rules.height_min = parse_u32("BLINDQUOTE_RULES_HEIGHT_MIN", &value)?;
        }
        if let Some(value) = read_env("BLINDQUOTE_RULES_HEIGHT_MAX") {
            self.rules.height_max = parse_u32("BLINDQUOTE_RULES_HEIGHT_MAX", &value)?;
        }

        let log_level =
            read_env("BLINDQUOTE_LOGGING_LEVEL").or_else(|| read_env("BLINDQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BLINDQUOTE_LOGGING_FORMAT").or_else(|| read_env("BLINDQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(storage_url) = overrides.storage_url {
            self.storage.url = storage_url;
        }
        if let Some(slot_key) = overrides.slot_key {
            self.storage.slot_key = slot_key;
        }
        if let Some(matrix_path) = overrides.matrix_path {
            self.pricing.matrix_path = Some(matrix_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_storage(&self.storage)?;
        validate_rules(&self.rules)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    let url = storage.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "storage.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if storage.slot_key.trim().is_empty() {
        return Err(ConfigError::Validation("storage.slot_key must not be empty".to_string()));
    }

    if storage.max_connections == 0 {
        return Err(ConfigError::Validation(
            "storage.max_connections must be greater than zero".to_string(),
        ));
    }

    if storage.timeout_secs == 0 || storage.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "storage.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_rules(rules: &RulesConfig) -> Result<(), ConfigError> {
    for (name, min, max) in [
        ("width", rules.width_min, rules.width_max),
        ("height", rules.height_min, rules.height_max),
    ] {
        if min == 0 {
            return Err(ConfigError::Validation(format!(
                "rules.{name}_min must be greater than zero"
            )));
        }
        if min > max {
            return Err(ConfigError::Validation(format!(
                "rules.{name}_min ({min}) must not exceed rules.{name}_max ({max})"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    pricing: Option<PricingPatch>,
    rules: Option<RulesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    url: Option<String>,
    slot_key: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    matrix_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesPatch {
    width_min: Option<u32>,
    width_max: Option<u32>,
    height_min: Option<u32>,
    height_max: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::product::Dimension;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_a_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("does-not-exist.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.storage.slot_key == "roller_blind_quote_v2", "default slot key")?;
        ensure(config.pricing.matrix_path.is_none(), "built-in price book by default")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logs by default")?;

        let rules = config.rules.validation_rules();
        ensure(rules.rule_for(Dimension::Width).accepts(5), "width 5 accepted by default")?;
        ensure(!rules.rule_for(Dimension::Height).accepts(3301), "height above max rejected")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_BLINDQUOTE_DB", "sqlite://interpolated.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("blindquote.toml");
            fs::write(
                &path,
                r#"
[storage]
url = "${TEST_BLINDQUOTE_DB}"
slot_key = "showroom"

[rules]
width_max = 2400
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.storage.url == "sqlite://interpolated.db",
                "storage url should be interpolated from environment",
            )?;
            ensure(config.storage.slot_key == "showroom", "slot key should come from file")?;
            ensure(config.rules.width_max == 2400, "width max should come from file")?;
            ensure(config.rules.height_max == 3300, "untouched keys keep defaults")
        })();

        clear_vars(&["TEST_BLINDQUOTE_DB"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_BLINDQUOTE_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("blindquote.toml");
        fs::write(&path, "[storage]\nurl = \"${TEST_BLINDQUOTE_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_BLINDQUOTE_UNSET"),
            "error should name the missing variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BLINDQUOTE_LOG_LEVEL", "warn");
        env::set_var("BLINDQUOTE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["BLINDQUOTE_LOG_LEVEL", "BLINDQUOTE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BLINDQUOTE_STORAGE_URL", "sqlite://from-env.db");
        env::set_var("BLINDQUOTE_RULES_HEIGHT_MAX", "2800");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("blindquote.toml");
            fs::write(
                &path,
                r#"
[storage]
url = "sqlite://from-file.db"
slot_key = "from-file"

[rules]
height_max = 2000

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    slot_key: Some("from-override".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.storage.url == "sqlite://from-env.db", "env url should win over file")?;
            ensure(config.storage.slot_key == "from-override", "override slot key should win")?;
            ensure(config.rules.height_max == 2800, "env height max should win over file")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&["BLINDQUOTE_STORAGE_URL", "BLINDQUOTE_RULES_HEIGHT_MAX"]);
        result
    }

    #[test]
    fn malformed_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BLINDQUOTE_RULES_WIDTH_MIN", "wide");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "BLINDQUOTE_RULES_WIDTH_MIN"),
                "error should name the offending variable",
            ),
        };

        clear_vars(&["BLINDQUOTE_RULES_WIDTH_MIN"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BLINDQUOTE_RULES_WIDTH_MIN", "4000");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("rules.width_min")
            );
            ensure(has_message, "validation failure should mention rules.width_min")
        })();

        clear_vars(&["BLINDQUOTE_RULES_WIDTH_MIN"]);
        result
    }

    #[test]
    fn non_sqlite_storage_url_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                storage_url: Some("postgres://localhost/quotes".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("storage.url")),
            "non-sqlite url should fail validation",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("missing/blindquote.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
