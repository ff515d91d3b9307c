use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

const QUALIFIER: &str = "net.roblillack";
const ORGANIZATION: &str = "Markflow";
const APPLICATION: &str = "markflow";
const CONFIG_FILE_NAME: &str = "markflow.toml";

/// Spacing and flow options for paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphConfig {
    pub space_before: f32,
    pub space_after: f32,
    pub space_between_lines: f32,
    pub centered: bool,
    /// Render soft breaks as line breaks instead of a single space
    pub soft_break_is_newline: bool,
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        ParagraphConfig {
            space_before: 5.0,
            space_after: 5.0,
            space_between_lines: 2.0,
            centered: false,
            soft_break_is_newline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub paragraph: ParagraphConfig,
    pub text_color: u32,
    pub link_color: u32,
    pub code_color: u32,
    pub selection_color: u32,
    pub link_hover_background: u32,
    /// Outline every paragraph with a translucent box
    pub debug_overlay: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        MarkdownConfig {
            paragraph: ParagraphConfig::default(),
            text_color: 0xFFFFFFFF,
            link_color: 0x5555FFFF,
            code_color: 0xAAAAAAFF,
            selection_color: 0x3399FF80,
            link_hover_background: 0xFFFFFF30,
            debug_overlay: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "unable to read config: {err}"),
            ConfigError::Parse(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl MarkdownConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from `path` if it exists, falling back to the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to load config file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}
