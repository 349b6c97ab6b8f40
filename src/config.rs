//! Configuration and color scheme management for vmux.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.vmux/config.toml`
//! - Built-in color schemes (default, solarized-dark, nord, tokyo-night)
//! - The `Color` type shared with the frame model
//!
//! # Configuration File
//!
//! ```toml
//! default_window_name = "zsh"
//! default_session_name = "0"
//! color_scheme = "nord"
//! display_panes_ms = 1000
//! detach_on_destroy = true
//!
//! [status]
//! show_clock = true
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name given to every new window
    pub default_window_name: String,
    /// Name of the session created at startup
    pub default_session_name: String,
    /// Color scheme name
    pub color_scheme: String,
    /// How long the pane-number overlay stays up (milliseconds)
    pub display_panes_ms: u64,
    /// Detach when the last window of a session closes, even if other
    /// sessions remain
    pub detach_on_destroy: bool,
    /// Status bar settings
    pub status: StatusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_window_name: "zsh".to_string(),
            default_session_name: "0".to_string(),
            color_scheme: "default".to_string(),
            display_panes_ms: 1000,
            detach_on_destroy: true,
            status: StatusConfig::default(),
        }
    }
}

/// Status bar configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub show_clock: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { show_clock: true }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Directory holding the config file and the log
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".vmux"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the color scheme
    pub fn color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB), serialized as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => Some(Self {
                r: u8::from_str_radix(&hex[0..2], 16).ok()?,
                g: u8::from_str_radix(&hex[2..4], 16).ok()?,
                b: u8::from_str_radix(&hex[4..6], 16).ok()?,
            }),
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self {
                    r: nibble(0)?,
                    g: nibble(1)?,
                    b: nibble(2)?,
                })
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color: {}", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Color scheme definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    pub name: String,

    // Canvas defaults
    pub default_fg: Color,
    pub default_bg: Color,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub message_bg: Color,
    pub message_fg: Color,

    // Pane colors
    pub pane_border: Color,
    pub pane_border_active: Color,

    // Selection colors
    pub selection_bg: Color,
    pub selection_fg: Color,

    // Overlay colors (window list, help, pane numbers, clock)
    pub selector_bg: Color,
    pub selector_fg: Color,
    pub selector_selected_bg: Color,
    pub selector_selected_fg: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    /// Default color scheme (tmux green status bar)
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),

            default_fg: Color::new(229, 229, 229),
            default_bg: Color::new(0, 0, 0),

            status_bar_bg: Color::new(0, 175, 0),
            status_bar_fg: Color::new(0, 0, 0),
            message_bg: Color::new(255, 215, 0),
            message_fg: Color::new(0, 0, 0),

            pane_border: Color::new(128, 128, 128),
            pane_border_active: Color::new(0, 175, 0),

            selection_bg: Color::new(255, 215, 0),
            selection_fg: Color::new(0, 0, 0),

            selector_bg: Color::new(0, 0, 139),
            selector_fg: Color::new(255, 255, 255),
            selector_selected_bg: Color::new(255, 255, 255),
            selector_selected_fg: Color::new(0, 0, 0),
        }
    }

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),

            default_fg: Color::new(131, 148, 150),
            default_bg: Color::new(0, 43, 54),

            status_bar_bg: Color::new(7, 54, 66),
            status_bar_fg: Color::new(147, 161, 161),
            message_bg: Color::new(181, 137, 0),
            message_fg: Color::new(0, 43, 54),

            pane_border: Color::new(7, 54, 66),
            pane_border_active: Color::new(38, 139, 210),

            selection_bg: Color::new(38, 139, 210),
            selection_fg: Color::new(253, 246, 227),

            selector_bg: Color::new(0, 43, 54),
            selector_fg: Color::new(147, 161, 161),
            selector_selected_bg: Color::new(38, 139, 210),
            selector_selected_fg: Color::new(253, 246, 227),
        }
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),

            default_fg: Color::new(216, 222, 233),
            default_bg: Color::new(46, 52, 64),

            status_bar_bg: Color::new(59, 66, 82),
            status_bar_fg: Color::new(216, 222, 233),
            message_bg: Color::new(163, 190, 140),
            message_fg: Color::new(46, 52, 64),

            pane_border: Color::new(59, 66, 82),
            pane_border_active: Color::new(136, 192, 208),

            selection_bg: Color::new(76, 86, 106),
            selection_fg: Color::new(236, 239, 244),

            selector_bg: Color::new(46, 52, 64),
            selector_fg: Color::new(216, 222, 233),
            selector_selected_bg: Color::new(136, 192, 208),
            selector_selected_fg: Color::new(46, 52, 64),
        }
    }

    /// Tokyo Night scheme
    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night".to_string(),

            default_fg: Color::new(192, 202, 245),
            default_bg: Color::new(26, 27, 38),

            status_bar_bg: Color::new(36, 40, 59),
            status_bar_fg: Color::new(169, 177, 214),
            message_bg: Color::new(158, 206, 106),
            message_fg: Color::new(26, 27, 38),

            pane_border: Color::new(41, 46, 66),
            pane_border_active: Color::new(122, 162, 247),

            selection_bg: Color::new(51, 59, 91),
            selection_fg: Color::new(192, 202, 245),

            selector_bg: Color::new(26, 27, 38),
            selector_fg: Color::new(169, 177, 214),
            selector_selected_bg: Color::new(122, 162, 247),
            selector_selected_fg: Color::new(26, 27, 38),
        }
    }

    /// Get scheme by name; unknown names fall back to the default scheme
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solarized-dark" | "solarized_dark" => Self::solarized_dark(),
            "nord" => Self::nord(),
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            _ => Self::default_scheme(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "solarized-dark", "nord", "tokyo-night"]
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
