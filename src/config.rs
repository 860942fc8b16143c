use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{capture::VhsParams, compositor::LayoutConstants, error::ConfigError, theme::Theme};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the stored session and the last exported strip.
    pub storage_dir: PathBuf,
    pub font_path: Option<PathBuf>,
    pub download_name: String,
    pub theme: Theme,
    pub date_stamp: bool,
    /// Folder or image used as the camera; the test pattern when unset.
    pub source: Option<PathBuf>,
    pub vhs: VhsParams,
    pub layout: LayoutConstants,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".photostrip"),
            font_path: None,
            download_name: "final-photo-strip.png".into(),
            theme: Theme::Classic,
            date_stamp: false,
            source: None,
            vhs: VhsParams::default(),
            layout: LayoutConstants::default(),
        }
    }
}

/// Reads settings as JSON or TOML depending on the extension; anything else
/// tries JSON first.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let data = fs::read_to_string(path)?;
    let settings = match path.extension().and_then(|ext| ext.to_str()).unwrap_or("") {
        "json" => serde_json::from_str(&data)?,
        "toml" => toml::from_str(&data)?,
        _ => match serde_json::from_str(&data) {
            Ok(settings) => settings,
            Err(_) => toml::from_str(&data)?,
        },
    };
    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Settings from `path` when given and present, otherwise defaults.
pub fn settings_or_default(path: Option<&Path>) -> Settings {
    match path {
        Some(path) if path.exists() => load_settings(path).unwrap_or_else(|err| {
            log::error!("Ignoring {}: {err}", path.display());
            Settings::default()
        }),
        Some(path) => {
            log::warn!("{} not found, using defaults", path.display());
            Settings::default()
        }
        None => Settings::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.toml");
        fs::write(
            &path,
            "theme = \"space\"\ndate_stamp = true\n[vhs]\noffset = 5\n[layout]\nspacing = 10\n",
        )
        .unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.theme, Theme::Space);
        assert!(settings.date_stamp);
        assert_eq!(settings.vhs.offset, 5);
        assert_eq!(settings.vhs.green_gain, 1.1);
        assert_eq!(settings.layout.spacing, 10);
        assert_eq!(settings.layout.canvas_width, 400);
        assert_eq!(settings.download_name, "final-photo-strip.png");
    }

    #[test]
    fn json_and_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("booth.json");
        fs::write(&json, r#"{"theme":"neon","download_name":"strip.png"}"#).unwrap();
        assert_eq!(load_settings(&json).unwrap().theme, Theme::Neon);

        let other = dir.path().join("booth.conf");
        fs::write(&other, "theme = \"hearts\"").unwrap();
        assert_eq!(load_settings(&other).unwrap().theme, Theme::Hearts);
    }

    #[test]
    fn broken_file_is_an_error_but_defaults_are_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.toml");
        fs::write(&path, "theme = [").unwrap();
        assert!(matches!(load_settings(&path), Err(ConfigError::Toml(_))));
        assert_eq!(settings_or_default(Some(&path)), Settings::default());
        assert_eq!(settings_or_default(Some(&dir.path().join("missing.toml"))), Settings::default());
    }
}
