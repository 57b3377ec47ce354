//! Persisted application preferences.
//!
//! Stored as a plain `key=value` file so a corrupt or hand-edited file can
//! never take the application down: unknown keys and unparseable lines are
//! skipped and everything else falls back to defaults.

use std::path::{Path, PathBuf};

/// UI theme mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Application preferences, persisted across sessions.
///
/// Session *content* (field values, uploaded photos, generated graphics) is
/// deliberately never persisted — only these ambient toggles are.
#[derive(Clone, PartialEq, Debug)]
pub struct AppSettings {
    /// Theme mode (Light or Dark)
    pub theme_mode: ThemeMode,
    /// Override for the templates directory. Empty string = auto-probe
    /// (`./templates`, then `<exe dir>/templates`).
    pub templates_dir: String,
    /// Open a save dialog automatically after a graphic is generated.
    pub prompt_save: bool,
    /// Ask for confirmation before clearing the generated-graphics list.
    pub confirm_clear: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::Light,
            templates_dir: String::new(),
            prompt_save: true,
            confirm_clear: true,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/stencilfe/stencilfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\StencilFE\stencilfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/StencilFE/stencilfe_settings.cfg
    /// Fallback:   same directory as the executable.
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("stencilfe");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("stencilfe_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA% keeps the settings inside the user profile instead of
            // a possibly world-writable EXE directory.
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| {
                    std::env::current_exe()
                        .ok()
                        .and_then(|p| p.parent().map(|d| d.to_string_lossy().into_owned()))
                        .unwrap_or_default()
                });
            let config_dir = PathBuf::from(appdata).join("StencilFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("stencilfe_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("StencilFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("stencilfe_settings.cfg"));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("stencilfe_settings.cfg")))
        }
    }

    /// Serialize the settings as `key=value` lines.
    fn to_config_string(&self) -> String {
        let mode_str = match self.theme_mode {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        format!(
            "theme_mode={mode_str}\n\
             templates_dir={}\n\
             prompt_save={}\n\
             confirm_clear={}\n",
            self.templates_dir, self.prompt_save, self.confirm_clear,
        )
    }

    /// Apply a single `key=value` line; silently ignores anything unknown.
    fn apply_line(&mut self, line: &str) {
        let Some((key, val)) = line.split_once('=') else {
            return;
        };
        let val = val.trim();
        match key.trim() {
            "theme_mode" => {
                self.theme_mode = match val {
                    "dark" => ThemeMode::Dark,
                    _ => ThemeMode::Light,
                };
            }
            "templates_dir" => {
                self.templates_dir = val.to_string();
            }
            "prompt_save" => {
                self.prompt_save = val == "true";
            }
            "confirm_clear" => {
                self.confirm_clear = val == "true";
            }
            _ => {}
        }
    }

    /// Save settings to disk.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else {
            return;
        };
        self.save_to(&path);
    }

    pub(crate) fn save_to(&self, path: &Path) {
        let _ = std::fs::write(path, self.to_config_string());
    }

    /// Load settings from disk (returns defaults if the file is missing or corrupt).
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub(crate) fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        let mut s = Self::default();
        for line in content.lines() {
            s.apply_line(line);
        }
        s
    }
}
