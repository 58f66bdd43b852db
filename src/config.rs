//! Application configuration and color theme, loaded from
//! `~/.config/vintui/config.toml` when present.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Manages the config directory and config file paths.
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }
}

/// Complete application configuration. Missing fields in the user's file
/// fall back to the defaults via `serde(default)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub table_header: String,
    pub modal_border: String,
    pub modal_border_error: String,
    pub series_1: String,
    pub series_2: String,
    pub series_3: String,
    pub series_4: String,
    pub mean_line: String,
    pub heatmap_positive: String,
    pub heatmap_negative: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            // The dashboard's signature wine purple, as in the source data's
            // branding, with an ANSI fallback handled at parse time.
            primary: "#9a4eae".to_string(),
            secondary: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "black".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            table_header: "white".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_error: "red".to_string(),
            series_1: "#9a4eae".to_string(),
            series_2: "#d0e68c".to_string(),
            series_3: "cyan".to_string(),
            series_4: "yellow".to_string(),
            mean_line: "yellow".to_string(),
            heatmap_positive: "green".to_string(),
            heatmap_negative: "red".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults overlaid with the user's config.toml
    /// when one exists.
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        let config_path = config_manager.config_path("config.toml");

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                eyre!(
                    "Failed to read config file at {}: {}",
                    config_path.display(),
                    e
                )
            })?;
            toml::from_str(&content).map_err(|e| {
                eyre!(
                    "Failed to parse config file at {}: {}",
                    config_path.display(),
                    e
                )
            })?
        } else {
            AppConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }
        // All colors must parse before the theme is built.
        Theme::from_config(&self.theme)?;
        Ok(())
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Parse a color string: hex, indexed(0-255), or a named ANSI color.
pub fn parse_color(s: &str) -> Result<Color> {
    let trimmed = s.trim();

    if trimmed.starts_with('#') && trimmed.len() == 7 {
        let (r, g, b) = parse_hex(trimmed)?;
        return Ok(Color::Rgb(r, g, b));
    }

    if trimmed.to_lowercase().starts_with("indexed(") && trimmed.ends_with(')') {
        let num_str = &trimmed[8..trimmed.len() - 1];
        let num = num_str.parse::<u8>().map_err(|_| {
            eyre!(
                "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                trimmed
            )
        })?;
        return Ok(Color::Indexed(num));
    }

    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "black" => Ok(Color::Black),
        "red" => Ok(Color::Red),
        "green" => Ok(Color::Green),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "magenta" => Ok(Color::Magenta),
        "cyan" => Ok(Color::Cyan),
        "white" => Ok(Color::White),
        "gray" | "grey" | "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => {
            Ok(Color::Indexed(8))
        }
        "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),
        "reset" => Ok(Color::Reset),
        _ => Err(eyre!(
            "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
             indexed(n), or hex colors (#ff0000)",
            trimmed
        )),
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let c = &config.colors;
        let entries: [(&str, &str); 20] = [
            ("primary", &c.primary),
            ("secondary", &c.secondary),
            ("success", &c.success),
            ("error", &c.error),
            ("warning", &c.warning),
            ("dimmed", &c.dimmed),
            ("background", &c.background),
            ("controls_bg", &c.controls_bg),
            ("text_primary", &c.text_primary),
            ("text_secondary", &c.text_secondary),
            ("table_header", &c.table_header),
            ("modal_border", &c.modal_border),
            ("modal_border_error", &c.modal_border_error),
            ("series_1", &c.series_1),
            ("series_2", &c.series_2),
            ("series_3", &c.series_3),
            ("series_4", &c.series_4),
            ("mean_line", &c.mean_line),
            ("heatmap_positive", &c.heatmap_positive),
            ("heatmap_negative", &c.heatmap_negative),
        ];

        let mut colors = HashMap::new();
        for (name, value) in entries {
            colors.insert(name.to_string(), parse_color(value)?);
        }

        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}
