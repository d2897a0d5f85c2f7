// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for drumgrid.
//!
//! Settings for new patterns, the transport, share links and logging.
//! Files are YAML, or TOML when the extension is `.toml`. Every field has a
//! default so an empty file is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::codec::{PatternCodec, MAX_ENCODED_LEN};
use crate::pattern::{clamp_bars, clamp_bpm, DrumPattern, Subdivision, DEFAULT_BPM, DEFAULT_NAME};

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Settings for newly created patterns
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub share: ShareConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from a YAML or TOML file and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            _ => Self::from_yaml(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a configuration from TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Clamp out-of-range values into their supported ranges.
    ///
    /// Fails only for settings that have no sensible clamp.
    pub fn validate(&mut self) -> Result<()> {
        self.pattern.bpm = clamp_bpm(self.pattern.bpm) as f64;
        self.pattern.bars = clamp_bars(self.pattern.bars);
        if self.share.max_encoded_len == 0 {
            bail!("share.max_encoded_len must be greater than zero");
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            bail!("unknown logging.level {:?}", self.logging.level);
        }
        Ok(())
    }

    /// Empty pattern with the configured defaults
    pub fn new_pattern(&self) -> DrumPattern {
        let mut pattern = DrumPattern::new(
            Some(&self.pattern.name),
            self.pattern.bars,
            self.pattern.subdivision,
        );
        pattern.set_bpm(self.pattern.bpm);
        pattern
    }

    /// Codec with the configured length limit
    pub fn codec(&self) -> PatternCodec {
        PatternCodec::new(self.share.max_encoded_len)
    }
}

/// Defaults for new patterns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Tempo in BPM
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    #[serde(default = "default_bars")]
    pub bars: u8,
    #[serde(default)]
    pub subdivision: Subdivision,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_bpm() -> f64 {
    DEFAULT_BPM as f64
}

fn default_bars() -> u8 {
    1
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            bpm: default_bpm(),
            bars: default_bars(),
            subdivision: Subdivision::default(),
        }
    }
}

/// Transport settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    /// Wrap at the end of the pattern instead of stopping
    #[serde(default = "default_true")]
    pub looping: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            looping: default_true(),
        }
    }
}

/// Share link settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareConfig {
    /// Quiet period before the URL is rewritten, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Longest encoded pattern accepted or produced
    #[serde(default = "default_max_encoded_len")]
    pub max_encoded_len: usize,
    /// Page that share links point at
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_max_encoded_len() -> usize {
    MAX_ENCODED_LEN
}

impl ShareConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_encoded_len: default_max_encoded_len(),
            base_url: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn or error
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Parsed level, falling back to info
    pub fn max_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}
