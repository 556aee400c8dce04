use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use thiserror::Error;

use crate::export::{
    DEFAULT_EXPORT_FILENAME, DEFAULT_FOOTER, ExportLayout, ExportOptions, FontConfig,
};
use crate::theme::ThemeId;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "snipview";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_filename")]
    pub filename: String,

    #[serde(default = "default_footer")]
    pub footer: String,

    /// Where images are written. Defaults to the user's download directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_font: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_font: Option<PathBuf>,

    #[serde(default)]
    pub layout: ExportLayout,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            footer: default_footer(),
            directory: None,
            code_font: None,
            ui_font: None,
            layout: ExportLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default)]
    pub export: ExportSettings,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_theme() -> String {
    ThemeId::default().name().to_string()
}

fn default_filename() -> String {
    DEFAULT_EXPORT_FILENAME.to_string()
}

fn default_footer() -> String {
    DEFAULT_FOOTER.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: default_theme(),
            export: ExportSettings::default(),
        }
    }
}

impl Settings {
    pub fn theme_id(&self) -> ThemeId {
        ThemeId::from_name(&self.theme)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            layout: self.export.layout.clone(),
            theme: self.theme_id(),
            footer: self.export.footer.clone(),
            filename: self.export.filename.clone(),
        }
    }

    pub fn font_config(&self) -> FontConfig {
        FontConfig {
            code_font: self.export.code_font.clone(),
            ui_font: self.export.ui_font.clone(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load the user's settings into the global slot, writing a default file
/// when there is none yet.
pub fn load_settings() {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Parse errors are logged and leave the current settings in place.
pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match load_settings_from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {path:?}");
                if settings.version > CURRENT_VERSION {
                    warn!(
                        "Settings file version {} is newer than supported {}",
                        settings.version, CURRENT_VERSION
                    );
                }
                set_settings(settings);
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

pub fn load_settings_from_str(content: &str) -> Result<Settings, SettingsError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match generate_settings_yaml(settings) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> Result<String, SettingsError> {
    let mut content = String::from(SETTINGS_HEADER);
    content.push_str(&serde_yaml::to_string(settings)?);
    Ok(content)
}

const SETTINGS_HEADER: &str = r#"# snipview settings
#
# theme: "Oceanic Next" or "Catppuccin Mocha"
# export.directory: where saved images go (defaults to the download folder)
# export.code_font / export.ui_font: font files to use instead of system fonts
# export.layout: image geometry in pixels
"#;

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn get_theme() -> ThemeId {
    SETTINGS
        .read()
        .map(|s| s.theme_id())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(load_settings_from_str("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_export_section_keeps_defaults() {
        let settings = load_settings_from_str(
            "theme: catppuccin mocha\nexport:\n  footer: \"Made by me\"\n  layout:\n    width: 1024\n",
        )
        .unwrap();

        assert_eq!(settings.theme_id(), ThemeId::CatppuccinMocha);
        assert_eq!(settings.export.footer, "Made by me");
        assert_eq!(settings.export.filename, DEFAULT_EXPORT_FILENAME);
        assert_eq!(settings.export.layout.width, 1024);
        assert_eq!(settings.export.layout.line_height, 24);

        let options = settings.export_options();
        assert_eq!(options.footer, "Made by me");
        assert_eq!(options.theme, ThemeId::CatppuccinMocha);
    }

    #[test]
    fn unknown_theme_falls_back() {
        let settings = load_settings_from_str("theme: Solarized\n").unwrap();
        assert_eq!(settings.theme_id(), ThemeId::OceanicNext);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            load_settings_from_str("export: [1, 2"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn generated_file_parses_back() {
        let mut settings = Settings::default();
        settings.export.directory = Some(PathBuf::from("/tmp/shots"));
        let yaml = generate_settings_yaml(&settings).unwrap();
        assert!(yaml.starts_with("# snipview settings"));
        assert_eq!(load_settings_from_str(&yaml).unwrap(), settings);
    }

    #[test]
    fn font_paths_flow_into_font_config() {
        let settings =
            load_settings_from_str("export:\n  code_font: /fonts/mono.ttf\n").unwrap();
        let fonts = settings.font_config();
        assert_eq!(fonts.code_font, Some(PathBuf::from("/fonts/mono.ttf")));
        assert_eq!(fonts.ui_font, None);
    }
}
