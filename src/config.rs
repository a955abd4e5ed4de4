//! Configuration management for Marginalia

use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Overlay appearance and note behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    pub highlight_color: String,
    pub annotation_color: String,
    /// Ask before deleting a note that has text
    pub warn_on_close: bool,
    pub default_cols: u32,
    pub default_rows: u32,
    pub min_cols: u32,
    pub min_rows: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            highlight_color: "#fff580".to_string(),
            annotation_color: "#fff580".to_string(),
            warn_on_close: true,
            default_cols: 30,
            default_rows: 5,
            min_cols: 5,
            min_rows: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite:./marginalia.db".to_string(),
            },
            overlay: OverlayConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = OverlayConfig::default();
        Ok(Config {
            database: DatabaseConfig {
                url: var_or("DATABASE_URL", "sqlite:./marginalia.db")?,
            },
            overlay: OverlayConfig {
                highlight_color: var_or("HIGHLIGHT_COLOR", &defaults.highlight_color)?,
                annotation_color: var_or("ANNOTATION_COLOR", &defaults.annotation_color)?,
                warn_on_close: match var_or("ANNOTATIONS_WARN_ON_CLOSE", "true")?
                    .to_ascii_lowercase()
                    .as_str()
                {
                    "false" | "0" | "no" | "off" => false,
                    _ => true,
                },
                ..defaults
            },
        })
    }
}

/// Read a variable, falling back when it is unset (non-UTF-8 is an error)
fn var_or(name: &str, default: &str) -> Result<String, env::VarError> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite:./marginalia.db");
        assert_eq!(config.overlay.highlight_color, "#fff580");
        assert!(config.overlay.warn_on_close);
        assert_eq!(
            (config.overlay.default_cols, config.overlay.default_rows),
            (30, 5)
        );
        assert_eq!((config.overlay.min_cols, config.overlay.min_rows), (5, 2));
    }

    #[test]
    fn test_var_or_falls_back_when_unset() {
        assert_eq!(
            var_or("MARGINALIA_TEST_SURELY_UNSET", "fallback").unwrap(),
            "fallback"
        );
    }
}
