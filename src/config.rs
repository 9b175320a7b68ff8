//! Deck configuration.
//!
//! Handles loading, validating, and merging `config.toml` files. Settings are
//! layered, each layer overriding the one before it:
//!
//! 1. stock defaults
//! 2. the file named by `--config`, or `config.toml` in the `--directory` root
//! 3. `config.toml` in the deck's own directory (recursive mode)
//! 4. command line flags (`--small`, `--large`, `--rounded`, `--oneperpage`)
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Bigger, Blacker Cards"   # PDF document title
//!
//! [card]
//! width = 2.0              # inches
//! height = 2.0             # inches
//! rounded = false          # rounded cut lines
//! one_per_page = false     # page size = card size
//!
//! [text]
//! family = "Helvetica"     # Helvetica, Times, Courier or a family from [fonts]
//! style = "bold"           # normal, italic, bold, bold_italic
//! max_size = 30.0          # points
//! min_size = 6.0           # points
//! line_spacing = 0.9       # line advance / font size
//!
//! [fonts]
//! # directory = "fonts"    # TTF/OTF files
//!
//! [icon]
//! # file = "icon.png"
//! size = 0.3               # icon height in inches
//!
//! [backs]
//! enabled = false
//! text = "Cards<br>Against<br>Humanity"
//! ```
//!
//! Config files are sparse; unknown keys are rejected to catch typos early.
//! Relative paths are resolved against the directory of the file that sets
//! them, so a root `config.toml` can point every sub-deck at one icon.

use crate::fonts::FontStyle;
use crate::geometry::{CardGeometry, LARGE_CARD_INCHES, MM_PER_INCH, SMALL_CARD_INCHES};
use crate::layout::FitParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Deck configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    /// Title written into the PDF metadata.
    pub title: String,
    pub card: CardConfig,
    pub text: TextConfig,
    pub fonts: FontsConfig,
    pub icon: IconConfig,
    pub backs: BacksConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            title: "Bigger, Blacker Cards".to_string(),
            card: CardConfig::default(),
            text: TextConfig::default(),
            fonts: FontsConfig::default(),
            icon: IconConfig::default(),
            backs: BacksConfig::default(),
        }
    }
}

/// Physical card size and layout flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardConfig {
    /// Card width in inches.
    pub width: f64,
    /// Card height in inches.
    pub height: f64,
    pub rounded: bool,
    pub one_per_page: bool,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            width: SMALL_CARD_INCHES.0,
            height: SMALL_CARD_INCHES.1,
            rounded: false,
            one_per_page: false,
        }
    }
}

/// Card text typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub family: String,
    pub style: FontStyle,
    pub max_size: f64,
    pub min_size: f64,
    pub line_spacing: f64,
}

impl Default for TextConfig {
    fn default() -> Self {
        let fit = FitParams::default();
        Self {
            family: "Helvetica".to_string(),
            style: FontStyle::Bold,
            max_size: fit.max_size,
            min_size: fit.min_size,
            line_spacing: fit.line_spacing,
        }
    }
}

impl TextConfig {
    pub fn fit_params(&self) -> FitParams {
        FitParams {
            max_size: self.max_size,
            min_size: self.min_size,
            line_spacing: self.line_spacing,
            ..FitParams::default()
        }
    }
}

/// Where custom typefaces live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    pub directory: Option<PathBuf>,
}

/// Card icon settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconConfig {
    /// Image file; when unset, `icon.png` in the deck directory is used if present.
    pub file: Option<PathBuf>,
    /// Icon height in inches.
    pub size: f64,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            file: None,
            size: 0.3,
        }
    }
}

impl IconConfig {
    pub fn size_mm(&self) -> f64 {
        self.size * MM_PER_INCH
    }
}

/// Trailing page of card backs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacksConfig {
    pub enabled: bool,
    /// Back text; `<br>` breaks lines like in deck files.
    pub text: String,
}

impl Default for BacksConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text: "Cards<br>Against<br>Humanity".to_string(),
        }
    }
}

impl DeckConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("card.width", self.card.width), ("card.height", self.card.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a positive number of inches"
                )));
            }
        }
        if !self.text.min_size.is_finite() || self.text.min_size <= 0.0 {
            return Err(ConfigError::Validation(
                "text.min_size must be positive".into(),
            ));
        }
        if self.text.max_size < self.text.min_size {
            return Err(ConfigError::Validation(
                "text.max_size must be at least text.min_size".into(),
            ));
        }
        if !self.text.line_spacing.is_finite() || self.text.line_spacing <= 0.0 {
            return Err(ConfigError::Validation(
                "text.line_spacing must be positive".into(),
            ));
        }
        if self.text.family.trim().is_empty() {
            return Err(ConfigError::Validation(
                "text.family must not be empty".into(),
            ));
        }
        if !self.icon.size.is_finite() || self.icon.size < 0.0 {
            return Err(ConfigError::Validation(
                "icon.size must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Page layout for the configured card.
    pub fn geometry(&self) -> CardGeometry {
        CardGeometry::compute(
            self.card.width,
            self.card.height,
            self.card.rounded,
            self.card.one_per_page,
        )
    }

    /// Apply command line flags on top of file configuration.
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some((width, height)) = overrides.card_size() {
            self.card.width = width;
            self.card.height = height;
        }
        if overrides.rounded {
            self.card.rounded = true;
        }
        if overrides.one_per_page {
            self.card.one_per_page = true;
        }
        self
    }
}

/// Card flags given on the command line. Flags can only switch features on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CliOverrides {
    pub small: bool,
    pub large: bool,
    pub rounded: bool,
    pub one_per_page: bool,
}

impl CliOverrides {
    /// Requested card size in inches. `--large` wins over `--small`.
    pub fn card_size(&self) -> Option<(f64, f64)> {
        if self.large {
            Some(LARGE_CARD_INCHES)
        } else if self.small {
            Some(SMALL_CARD_INCHES)
        } else {
            None
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(DeckConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Keys holding file system paths, as `(section, key)`.
const PATH_KEYS: [(&str, &str); 2] = [("fonts", "directory"), ("icon", "file")];

/// Rewrite relative path values in a raw config so they are relative to `dir`.
pub fn anchor_paths(value: &mut toml::Value, dir: &Path) {
    for (section, key) in PATH_KEYS {
        let Some(entry) = value.get_mut(section).and_then(|s| s.get_mut(key)) else {
            continue;
        };
        let anchored = match entry.as_str() {
            Some(path) if Path::new(path).is_relative() => {
                dir.join(path).to_string_lossy().into_owned()
            }
            _ => continue,
        };
        *entry = toml::Value::String(anchored);
    }
}

/// Read one config file as a raw TOML value. The file must exist.
///
/// Relative paths in the file come back anchored to the file's directory.
pub fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let mut value: toml::Value = toml::from_str(&content)?;
    anchor_paths(&mut value, path.parent().unwrap_or(Path::new("")));
    Ok(value)
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.is_file() {
        return Ok(None);
    }
    load_config_file(&config_path).map(Some)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DeckConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DeckConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory over stock defaults.
pub fn load_config(dir: &Path) -> Result<DeckConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Bigger, Blacker Cards configuration
# ===================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Config is read from (later wins):
#   the file given with --config, or config.toml in the --directory root
#   config.toml in each deck directory (with --recursive)
#   command line flags (--small, --large, --rounded, --oneperpage)
#
# Unknown keys will cause an error.

# Title stored in the PDF document metadata.
title = "Bigger, Blacker Cards"

# ---------------------------------------------------------------------------
# Card size and layout
# ---------------------------------------------------------------------------
[card]
# Card size in inches. --small sets 2 x 2, --large sets 2.74 x 3.74.
width = 2.0
height = 2.0

# Draw cut lines with rounded corners (1/8 inch radius).
rounded = false

# One card per page, with the page the size of the card.
one_per_page = false

# ---------------------------------------------------------------------------
# Card text
# ---------------------------------------------------------------------------
[text]
# Built-in families: Helvetica, Times, Courier.
# Families found in [fonts] directory can be used by name.
family = "Helvetica"

# One of: normal, italic, bold, bold_italic.
style = "bold"

# Text starts at max_size points and shrinks until it fits the card.
# Text that still overflows at min_size is cut off.
max_size = 30.0
min_size = 6.0

# Distance between baselines as a multiple of the font size.
line_spacing = 0.9

# ---------------------------------------------------------------------------
# Custom fonts
# ---------------------------------------------------------------------------
[fonts]
# Directory of .ttf/.otf files. Like every path here, it is relative to the
# directory holding this file, so a root config.toml can serve all sub-decks.
# Style is taken from the file name: Family.ttf, Family_Bold.ttf,
# Family_Italic.ttf, Family_Bold_Italic.ttf.
# directory = "fonts"

# ---------------------------------------------------------------------------
# Icon
# ---------------------------------------------------------------------------
[icon]
# Image drawn in the lower-left corner of every card. Defaults to icon.png
# in the deck directory when that file exists.
# file = "icon.png"

# Icon height in inches.
size = 0.3

# ---------------------------------------------------------------------------
# Card backs
# ---------------------------------------------------------------------------
[backs]
# Append one page of card backs to each document.
enabled = false

# Back text; <br> starts a new line.
text = "Cards<br>Against<br>Humanity"
"##
}
