//! `docpage.toml` configuration.
//!
//! ```toml
//! [validation]
//! duplicate_definitions = "warn"   # allow | warn | deny
//! directives = "silent"            # silent | warn
//!
//! [build]
//! source = "content"
//! output = "public"
//! threads = 0                      # 0 = one per CPU
//!
//! [render]
//! site_title = "Docs"
//! standalone = true
//! navigation = true
//! ```
//!
//! Every section and key is optional. Unknown keys are rejected to catch
//! typos early.

use std::fs;
use std::path::{Path, PathBuf};

use docpage::parser::ParseOptions;
use renderer::RenderOptions;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "docpage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocpageConfig {
    pub validation: ParseOptions,
    pub build: BuildConfig,
    pub render: RenderOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Worker threads for site builds; 0 lets rayon decide.
    pub threads: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("content"),
            output: PathBuf::from("public"),
            threads: 0,
        }
    }
}

impl DocpageConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: DocpageConfig = toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Load `explicit` (which must exist), or `docpage.toml` in the current
    /// directory when present, or fall back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Self::load(path);
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            debug!(path = %default.display(), "loading config");
            Self::load(default)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.source == self.build.output {
            return Err(ConfigError::Validation(format!(
                "build.source and build.output are both {}",
                self.build.source.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpage::parser::{DirectivePolicy, DuplicatePolicy};

    fn parse(content: &str) -> Result<DocpageConfig, ConfigError> {
        DocpageConfig::parse(content, Path::new("docpage.toml"))
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, DocpageConfig::default());
        assert_eq!(config.validation.duplicate_definitions, DuplicatePolicy::Warn);
        assert_eq!(config.validation.directives, DirectivePolicy::Silent);
        assert!(config.render.standalone);
    }

    #[test]
    fn partial_sections_override_defaults() {
        let config = parse(
            r#"
            [validation]
            duplicate_definitions = "deny"

            [build]
            threads = 4

            [render]
            site_title = "OpenTelemetry"
            navigation = false
            "#,
        )
        .unwrap();
        assert_eq!(config.validation.duplicate_definitions, DuplicatePolicy::Deny);
        assert_eq!(config.validation.directives, DirectivePolicy::Silent);
        assert_eq!(config.build.threads, 4);
        assert_eq!(config.build.source, PathBuf::from("content"));
        assert_eq!(config.render.site_title.as_deref(), Some("OpenTelemetry"));
        assert!(!config.render.navigation);
        assert!(config.render.standalone);
    }

    #[test]
    fn unknown_keys_and_values_are_rejected() {
        assert!(matches!(parse("[build]\nthread = 2\n"), Err(ConfigError::Toml { .. })));
        assert!(matches!(
            parse("[validation]\nduplicate_definitions = \"maybe\"\n"),
            Err(ConfigError::Toml { .. })
        ));
        assert!(matches!(parse("[theme]\n"), Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn source_and_output_must_differ() {
        let err = parse("[build]\nsource = \"site\"\noutput = \"site\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("docpage.toml");
        assert!(matches!(
            DocpageConfig::discover(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
