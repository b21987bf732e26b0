use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use crate::glass::GlassStyle;

pub const APP_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));
pub const HOME_ENV: &str = "GLASSMEMO_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    /// Overrides the palette picked by `general.appearance`.
    #[serde(default)]
    pub theme: Option<ThemeConfig>,
}

impl AppConfig {
    pub fn theme(&self) -> ThemeConfig {
        self.theme
            .clone()
            .unwrap_or_else(|| ThemeConfig::for_appearance(self.general.appearance))
    }

    /// Glass style for surfaces; `adaptive` follows the appearance.
    pub fn glass_style(&self) -> GlassStyle {
        match (self.general.glass_style, self.general.appearance) {
            (GlassStyle::Adaptive, Appearance::Dark) => GlassStyle::Dark,
            (GlassStyle::Adaptive, Appearance::Light) => GlassStyle::Light,
            (style, _) => style,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub glass_style: GlassStyle,
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u16,
    #[serde(default = "default_floating_widget")]
    pub floating_widget: bool,
}

fn default_animation_fps() -> u16 {
    10
}

fn default_floating_widget() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            appearance: Appearance::default(),
            glass_style: GlassStyle::default(),
            animation_fps: default_animation_fps(),
            floating_widget: default_floating_widget(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ThemeConfig {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub pinned: Color,
    pub danger: Color,
    pub success: Color,
    pub selection_bg: Color,
}

impl ThemeConfig {
    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(15, 23, 42),
            foreground: Color::Rgb(241, 245, 249),
            muted: Color::Rgb(148, 163, 184),
            accent: Color::Rgb(96, 165, 250),
            border: Color::Rgb(71, 85, 105),
            pinned: Color::Rgb(96, 165, 250),
            danger: Color::Rgb(239, 68, 68),
            success: Color::Rgb(80, 250, 123),
            selection_bg: Color::Rgb(30, 41, 59),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(248, 250, 252),
            foreground: Color::Rgb(15, 23, 42),
            muted: Color::Rgb(71, 85, 105),
            accent: Color::Rgb(59, 130, 246),
            border: Color::Rgb(203, 213, 225),
            pinned: Color::Rgb(59, 130, 246),
            danger: Color::Rgb(239, 68, 68),
            success: Color::Rgb(22, 163, 74),
            selection_bg: Color::Rgb(226, 232, 240),
        }
    }

    pub fn for_appearance(appearance: Appearance) -> Self {
        match appearance {
            Appearance::Dark => Self::dark(),
            Appearance::Light => Self::light(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self::dark()
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let mut path = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    path.push(".glassmemo");
    path
}

pub fn load_config() -> AppConfig {
    let dir = get_config_dir();
    fs::create_dir_all(&dir).ok();
    load_config_from(&dir.join("config.toml"))
}

pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        let default_config = AppConfig::default();
        if let Ok(toml_str) = toml::to_string_pretty(&default_config) {
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                options.mode(0o600);
            }
            if let Ok(mut file) = options.open(path) {
                let _ = file.write_all(toml_str.as_bytes());
            }
        }
        return default_config;
    }

    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to parse {}: {}", path.display(), e);
                eprintln!("Failed to parse config.toml: {}.", e);
                let backup_path = path.with_extension("toml.bak");
                if let Err(backup_err) = fs::rename(path, &backup_path) {
                    eprintln!("Failed to backup corrupted config: {}", backup_err);
                } else {
                    eprintln!("Corrupted config backed up to {:?}", backup_path);
                }
                eprintln!("Using default configuration.");
                AppConfig::default()
            }
        },
        Err(e) => {
            eprintln!("Failed to read config file: {}. Using default.", e);
            AppConfig::default()
        }
    }
}
