//! Settings for log output.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing_subscriber::{filter::Directive, EnvFilter};

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Which log events are kept, as `tracing` filter directives.
    ///
    /// In the config files this is a list. From the environment
    /// (`PRICEWISE_LOGGING__LEVELS`) it is a comma separated string. Either
    /// way, directives from `RUST_LOG` are appended afterwards, so they win
    /// over the configured ones.
    ///
    /// ```yaml
    /// # config/local.yaml
    /// logging:
    ///   levels: [INFO, pricewise_serpapi=DEBUG, reqwest=WARN]
    /// ```
    pub levels: LogLevels,

    /// The format to output logs in.
    pub format: LogFormat,
}

/// The format to write log events in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line output for people reading a terminal.
    Pretty,

    /// Newline delimited JSON, for log aggregators.
    Json,

    /// One line per event.
    Compact,
}

/// A validated list of `tracing` filter directives, such as `INFO` or
/// `pricewise_web=DEBUG`.
///
/// Every entry is known to parse as a [`Directive`]. They are kept as text
/// because a `Directive` can't be serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LevelsInput", into = "Vec<String>")]
pub struct LogLevels(Vec<String>);

/// The shapes `logging.levels` can take in configuration.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelsInput {
    /// A comma separated string, as given by environment variables.
    Joined(String),
    /// A list of strings, each of which may itself be comma separated.
    List(Vec<String>),
}

impl LogLevels {
    /// The directives, in the order they apply.
    #[must_use]
    pub fn directives(&self) -> &[String] {
        &self.0
    }

    /// Build a filter for a `tracing-subscriber` registry. Later directives
    /// override earlier ones for the same target.
    #[must_use]
    pub fn to_env_filter(&self) -> EnvFilter {
        self.0
            .iter()
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::default(), EnvFilter::add_directive)
    }

    /// Append the directives found in `RUST_LOG`, if it is set.
    fn with_rust_log(mut self) -> anyhow::Result<Self> {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            let overrides: Self = rust_log.parse().context("RUST_LOG")?;
            self.0.extend(overrides.0);
        }
        Ok(self)
    }
}

impl FromStr for LogLevels {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut directives = vec![];
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            // Crate names are written with underscores in log targets, so a
            // hyphen means the directive will never match anything.
            if part.contains('-') {
                bail!("log target in {:?} must use underscores, not hyphens", part);
            }
            part.parse::<Directive>()
                .with_context(|| format!("invalid log directive {:?}", part))?;
            directives.push(part.to_string());
        }
        Ok(Self(directives))
    }
}

impl TryFrom<LevelsInput> for LogLevels {
    type Error = anyhow::Error;

    fn try_from(input: LevelsInput) -> Result<Self, Self::Error> {
        let joined = match input {
            LevelsInput::Joined(s) => s,
            LevelsInput::List(items) => items.join(","),
        };
        joined.parse::<Self>()?.with_rust_log()
    }
}

impl From<LogLevels> for Vec<String> {
    fn from(levels: LogLevels) -> Self {
        levels.0
    }
}

impl fmt::Display for LogLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}
