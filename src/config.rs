//! Rendering configuration.
//!
//! YAML file with precedence: CLI > file > defaults.
//!
//! ```yaml
//! threshold: 0.5
//! dpi: 150
//! score_decimals: 3
//! format: png
//! output_dir: charts
//! ```

use crate::error::{Error, Result};
use crate::plots::RenderOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Scalable vector graphics with all annotations.
    #[default]
    Svg,
    /// Raster preview of the geometry.
    Png,
}

impl OutputFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Decision threshold on the model score.
    pub threshold: f64,
    /// Output resolution in dots per inch.
    pub dpi: f32,
    /// Decimals of printed scores.
    pub score_decimals: usize,
    /// Output format when the output path does not say.
    pub format: OutputFormat,
    /// Directory for outputs without an explicit path.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            dpi: 100.0,
            score_decimals: 2,
            format: OutputFormat::Svg,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location, `<config dir>/counterplots/config.yaml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("counterplots").join("config.yaml"))
    }

    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            Error::ConfigParse {
                line,
                message: e.to_string(),
            }
        })
    }

    /// Loads configuration with fallback to defaults.
    ///
    /// A missing file is expected; a file that exists but does not load is
    /// reported at warn level before falling back.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Self::default()
            }
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(Error::ConfigInvalid {
                key: "threshold".into(),
                message: format!("{} is not inside (0, 1)", self.threshold),
            });
        }
        if !(self.dpi > 0.0 && self.dpi.is_finite()) {
            return Err(Error::ConfigInvalid {
                key: "dpi".into(),
                message: format!("{} is not a positive resolution", self.dpi),
            });
        }
        Ok(())
    }

    /// Chart settings derived from this configuration.
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            threshold: self.threshold,
            dpi: self.dpi,
            score_decimals: self.score_decimals,
        }
    }
}
