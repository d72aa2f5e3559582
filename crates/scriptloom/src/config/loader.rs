use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// `~/.scriptloom/scriptloom.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".scriptloom").join("scriptloom.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

/// Loads the file if it exists; a missing file means all defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    load_config(path)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.pipeline.chapter_batch_size == 0 {
        return Err(ConfigError::Validation {
            message: "pipeline.chapter_batch_size must be at least 1".to_string(),
        });
    }

    if config.api.request_timeout_secs == 0 || config.api.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "api timeouts must be greater than zero".to_string(),
        });
    }

    if config.pipeline.pause_poll_ms == 0 || config.queue.pause_poll_ms == 0 {
        return Err(ConfigError::Validation {
            message: "pause_poll_ms must be greater than zero".to_string(),
        });
    }

    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation {
            message: format!("api.base_url is not an http(s) URL: {}", config.api.base_url),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_object_is_all_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.pipeline.chapter_batch_size, 3);
        assert_eq!(config.queue.cooldown_secs, 300);
        assert_eq!(config.api.request_timeout_secs, 300);
        assert_eq!(
            config.rate_limit.min_call_spacing(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "database_path": "/tmp/scripts.db",
            "api": {
                "base_url": "http://localhost:8080/v1beta",
                "text_model": "gemini-2.0-flash",
                "request_timeout_secs": 60
            },
            "rate_limit": { "min_call_spacing_ms": 2500 },
            "pipeline": { "chapter_batch_size": 2, "strict_chapter_split": true },
            "queue": { "cooldown_secs": 30 }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/scripts.db")));
        assert_eq!(config.api.text_model, "gemini-2.0-flash");
        assert_eq!(config.api.image_model, "imagen-4.0-generate-001");
        assert_eq!(config.api.request_timeout_secs, 60);
        assert_eq!(config.rate_limit.min_call_spacing_ms, 2500);
        assert_eq!(config.pipeline.chapter_batch_size, 2);
        assert!(config.pipeline.strict_chapter_split);
        assert_eq!(config.pipeline.pause_poll_ms, 500);
        assert_eq!(config.queue.cooldown_secs, 30);
        assert_eq!(config.queue.pause_poll_ms, 1000);
    }

    #[test]
    fn test_unknown_field_fails_schema() {
        let result = load_config_from_str(r#"{ "workers": 4 }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_wrong_type_fails_schema() {
        let result = load_config_from_str(r#"{ "queue": { "cooldown_secs": "five" } }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = load_config_from_str(r#"{ "pipeline": { "chapter_batch_size": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = load_config_from_str(r#"{ "api": { "connect_timeout_secs": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let result = load_config_from_str(r#"{ "api": { "base_url": "ftp://x" } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scriptloom.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{ "queue": {{ "cooldown_secs": 5 }} }}"#).unwrap();

        assert_eq!(load_config(&path).unwrap().queue.cooldown_secs, 5);

        let missing = dir.path().join("absent.json");
        assert!(matches!(
            load_config(&missing),
            Err(ConfigError::ReadFile { .. })
        ));
        assert_eq!(load_config_or_default(&missing).unwrap(), Config::default());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with(".scriptloom/scriptloom.json"));
    }
}
