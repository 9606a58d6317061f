//! Configuration for the Groovy position manager.
//!
//! ```toml
//! [resolution]
//! stratum = "Java"
//! strata_min_vm_version = "1.4"
//! max_scope_depth = 256
//! max_nested_depth = 64
//!
//! [logging]
//! level = "debug"
//! json = false
//! ```

use std::path::Path;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Stratum passed to line lookups on VMs that support strata.
    #[serde(default = "ResolutionConfig::default_stratum")]
    pub stratum: String,

    /// Oldest VM version whose line lookups accept a stratum.
    #[serde(default = "ResolutionConfig::default_strata_min_vm_version")]
    pub strata_min_vm_version: String,

    /// Bound on upward walks through the lexical scope tree.
    #[serde(default = "ResolutionConfig::default_max_scope_depth")]
    pub max_scope_depth: usize,

    /// Bound on how deep the nested runtime type search descends.
    #[serde(default = "ResolutionConfig::default_max_nested_depth")]
    pub max_nested_depth: usize,
}

impl ResolutionConfig {
    fn default_stratum() -> String {
        nova_jdwp::JAVA_STRATUM.to_owned()
    }

    fn default_strata_min_vm_version() -> String {
        "1.4".to_owned()
    }

    fn default_max_scope_depth() -> usize {
        256
    }

    fn default_max_nested_depth() -> usize {
        64
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            stratum: Self::default_stratum(),
            strata_min_vm_version: Self::default_strata_min_vm_version(),
            max_scope_depth: Self::default_max_scope_depth(),
            max_nested_depth: Self::default_max_nested_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    /// Configured directives with level names lower-cased and `warning`
    /// accepted for `warn`: `"WARNING, nova_jdwp=Debug"` yields
    /// `"warn,nova_jdwp=debug"`. Unknown words pass through untouched.
    pub fn directives(&self) -> String {
        let directives: Vec<String> = self
            .level
            .split(',')
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .map(|directive| match directive.rsplit_once('=') {
                Some((target, level)) => format!("{target}={}", level_name(level)),
                None => level_name(directive),
            })
            .collect();
        if directives.is_empty() {
            Self::default_level()
        } else {
            directives.join(",")
        }
    }

    /// Effective filter: the configured directives, with `RUST_LOG` merged in
    /// when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let config_directives = self.directives();
        let fallback = || {
            tracing_subscriber::EnvFilter::try_new(&config_directives).unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::default()
                    .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
            })
        };

        match std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
        {
            Some(env_directives) => {
                tracing_subscriber::EnvFilter::try_new(format!("{config_directives},{env_directives}"))
                    .unwrap_or_else(|_| fallback())
            }
            None => fallback(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroovyDebugConfig {
    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` embeds a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl GroovyDebugConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

const LEVEL_NAMES: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

fn level_name(word: &str) -> String {
    let word = word.trim();
    let lower = word.to_ascii_lowercase();
    if lower == "warning" {
        "warn".to_owned()
    } else if LEVEL_NAMES.contains(&lower.as_str()) {
        lower
    } else {
        word.to_owned()
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber writing to stderr.
///
/// Only the first call has an effect; a subscriber installed by the host
/// process is left in place.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_writer(std::io::stderr);
        let result = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if let Err(err) = result {
            tracing::debug!(error = %err, "tracing subscriber already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = GroovyDebugConfig::load_from_str("").unwrap();
        assert_eq!(config, GroovyDebugConfig::default());
        assert_eq!(config.resolution.stratum, "Java");
        assert_eq!(config.resolution.strata_min_vm_version, "1.4");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = GroovyDebugConfig::load_from_str(
            r#"
[resolution]
stratum = "Groovy"
max_nested_depth = 8

[logging]
level = "WARNING"
json = true
"#,
        )
        .unwrap();
        assert_eq!(config.resolution.stratum, "Groovy");
        assert_eq!(config.resolution.max_nested_depth, 8);
        assert_eq!(config.resolution.max_scope_depth, 256);
        assert!(config.logging.json);
        assert_eq!(config.logging.directives(), "warn");
    }

    #[test]
    fn level_names_are_normalized_per_directive() {
        let logging = |level: &str| LoggingConfig {
            level: level.to_owned(),
            json: false,
        };
        assert_eq!(
            logging(" Debug , nova_jdwp=WARNING ").directives(),
            "debug,nova_jdwp=warn"
        );
        assert_eq!(
            logging("nova_groovy_debug::prepare=TRACE,hyper").directives(),
            "nova_groovy_debug::prepare=trace,hyper"
        );
        assert_eq!(logging(" , ").directives(), "info");
    }

    #[test]
    fn load_from_path_reports_io_and_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            GroovyDebugConfig::load_from_path(&missing),
            Err(ConfigError::Io { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[resolution]\nmax_scope_depth = \"deep\"\n").unwrap();
        let err = GroovyDebugConfig::load_from_path(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(!err.to_string().contains("max_scope_depth = "));

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[resolution]\nmax_scope_depth = 4\n").unwrap();
        let config = GroovyDebugConfig::load_from_path(&good).unwrap();
        assert_eq!(config.resolution.max_scope_depth, 4);
    }
}
