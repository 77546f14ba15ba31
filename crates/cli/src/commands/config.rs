use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use blindquote_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use toml::Value;

/// Keys rendered by `blindquote config`, with the environment variable that overrides each.
const FIELDS: &[(&str, &str)] = &[
    ("storage.url", "BLINDQUOTE_STORAGE_URL"),
    ("storage.slot_key", "BLINDQUOTE_STORAGE_SLOT_KEY"),
    ("storage.max_connections", "BLINDQUOTE_STORAGE_MAX_CONNECTIONS"),
    ("storage.timeout_secs", "BLINDQUOTE_STORAGE_TIMEOUT_SECS"),
    ("pricing.matrix_path", "BLINDQUOTE_PRICING_MATRIX_PATH"),
    ("rules.width_min", "BLINDQUOTE_RULES_WIDTH_MIN"),
    ("rules.width_max", "BLINDQUOTE_RULES_WIDTH_MAX"),
    ("rules.height_min", "BLINDQUOTE_RULES_HEIGHT_MIN"),
    ("rules.height_max", "BLINDQUOTE_RULES_HEIGHT_MAX"),
    ("logging.level", "BLINDQUOTE_LOGGING_LEVEL"),
    ("logging.format", "BLINDQUOTE_LOGGING_FORMAT"),
];

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_key) in FIELDS {
        lines.push(render_line(
            key_path,
            &field_value(&config, key_path),
            field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    lines.join("\n")
}

fn field_value(config: &AppConfig, key_path: &str) -> String {
    match key_path {
        "storage.url" => config.storage.url.clone(),
        "storage.slot_key" => config.storage.slot_key.clone(),
        "storage.max_connections" => config.storage.max_connections.to_string(),
        "storage.timeout_secs" => config.storage.timeout_secs.to_string(),
        "pricing.matrix_path" => config
            .pricing
            .matrix_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<built-in>".to_string()),
        "rules.width_min" => config.rules.width_min.to_string(),
        "rules.width_max" => config.rules.width_max.to_string(),
        "rules.height_min" => config.rules.height_min.to_string(),
        "rules.height_max" => config.rules.height_max.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format),
        _ => "<unknown>".to_string(),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
