//! Loading `PiretConfig` from TOML

use super::types::PiretConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl PiretConfig {
    /// Parse a configuration from TOML text; missing tables and keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PiretConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluator.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "evaluator.max_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        for (field, name) in [
            ("session.default_namespace", &self.session.default_namespace),
            ("session.builtin_namespace", &self.session.builtin_namespace),
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    message: format!("{:?} is not a valid namespace name", name),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(PiretConfig::from_toml_str("").unwrap(), PiretConfig::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = PiretConfig::from_toml_str(
            r#"
            [evaluator]
            max_depth = 64

            [session]
            default_namespace = "scratch"
            "#,
        )
        .unwrap();
        assert_eq!(config.evaluator.max_depth, 64);
        assert_eq!(config.session.default_namespace, "scratch");
        assert_eq!(config.session.builtin_namespace, "piret.builtin");
        assert!(config.session.refer_builtins);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            PiretConfig::from_toml_str("[evaluator]\nmax_dpth = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PiretConfig::from_toml_str("[evaluator]\nmax_depth = 0"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            PiretConfig::from_toml_str("[session]\ndefault_namespace = \"a/b\""),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
