// padrs Settings Module
// Daemon settings loaded from a TOML file

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mirror::MirrorConfig;

/// Daemon settings.
///
/// Loaded from a TOML file (default: ~/.config/padrs/settings.toml).
/// Everything has a working default, so a missing file is not an error.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Sampling period of the mirror loop, in milliseconds.
    poll_interval_ms: u64,

    /// Backoff after a failed controller reacquire, in milliseconds.
    reacquire_delay_ms: u64,

    /// Whether the virtual controller subsystem starts at all.
    controller_enabled: bool,

    /// Tear down the host display surface when the observed process exits.
    close_on_exit: bool,

    /// Hold duration of injected controller presses, in milliseconds.
    pad_hold_ms: u64,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    mirror: Option<MirrorToml>,

    #[serde(default)]
    rules: Option<RulesToml>,

    #[serde(default)]
    general: Option<GeneralToml>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct MirrorToml {
    #[serde(default)]
    enabled: Option<bool>,

    #[serde(default)]
    poll_interval_ms: Option<u64>,

    #[serde(default)]
    reacquire_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct RulesToml {
    #[serde(default)]
    pad_hold_ms: Option<u64>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct GeneralToml {
    #[serde(default)]
    close_on_exit: Option<bool>,
}

impl Settings {
    /// Create settings with every default in place.
    pub fn new() -> Self {
        Self {
            poll_interval_ms: 16,
            reacquire_delay_ms: 1000,
            controller_enabled: true,
            close_on_exit: false,
            pad_hold_ms: 60,
            source_path: None,
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let toml_settings: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(mirror) = toml_settings.mirror {
            if let Some(enabled) = mirror.enabled {
                settings.controller_enabled = enabled;
            }
            if let Some(interval) = mirror.poll_interval_ms {
                if interval == 0 {
                    return Err(SettingsError::InvalidValue(
                        "mirror.poll_interval_ms must be greater than zero".to_string(),
                    ));
                }
                settings.poll_interval_ms = interval;
            }
            if let Some(delay) = mirror.reacquire_delay_ms {
                settings.reacquire_delay_ms = delay;
            }
        }

        if let Some(rules) = toml_settings.rules {
            if let Some(hold) = rules.pad_hold_ms {
                settings.pad_hold_ms = hold;
            }
        }

        if let Some(general) = toml_settings.general {
            if let Some(close) = general.close_on_exit {
                settings.close_on_exit = close;
            }
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("padrs").join("settings.toml"))
    }

    /// Load from default location (~/.config/padrs/settings.toml)
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        // Return default settings if file doesn't exist
        Ok(Self::new())
    }

    /// Reload settings from the original file
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        if let Some(ref path) = self.source_path {
            let new_settings = Self::from_file(path)?;
            *self = new_settings;
            Ok(())
        } else {
            Err(SettingsError::InvalidValue(
                "No source path set".to_string(),
            ))
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reacquire_delay(&self) -> Duration {
        Duration::from_millis(self.reacquire_delay_ms)
    }

    pub fn controller_enabled(&self) -> bool {
        self.controller_enabled
    }

    pub fn close_on_exit(&self) -> bool {
        self.close_on_exit
    }

    pub fn pad_hold(&self) -> Duration {
        Duration::from_millis(self.pad_hold_ms)
    }

    /// Mirror timing knobs derived from these settings.
    pub fn mirror_config(&self) -> MirrorConfig {
        MirrorConfig {
            poll_interval: self.poll_interval(),
            reacquire_delay: self.reacquire_delay(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# padrs Settings
# Place this file at: ~/.config/padrs/settings.toml

[mirror]
# Whether the virtual controller mirror starts at all
enabled = true

# Sampling period of the mirror loop (milliseconds)
poll_interval_ms = 16

# Backoff after a failed controller reacquire (milliseconds)
reacquire_delay_ms = 1000

[rules]
# Hold duration of injected controller presses (milliseconds)
pad_hold_ms = 60

[general]
# Tear down the display surface when the observed process exits
close_on_exit = false
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::new();
        assert_eq!(settings.poll_interval(), Duration::from_millis(16));
        assert_eq!(settings.reacquire_delay(), Duration::from_secs(1));
        assert!(settings.controller_enabled());
        assert!(!settings.close_on_exit());
    }

    #[test]
    fn test_settings_from_toml() {
        let toml = r#"
[mirror]
enabled = false
poll_interval_ms = 8
reacquire_delay_ms = 2500

[rules]
pad_hold_ms = 120

[general]
close_on_exit = true
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert!(!settings.controller_enabled());
        assert_eq!(settings.poll_interval(), Duration::from_millis(8));
        assert_eq!(settings.reacquire_delay(), Duration::from_millis(2500));
        assert_eq!(settings.pad_hold(), Duration::from_millis(120));
        assert!(settings.close_on_exit());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
[general]
close_on_exit = true
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_millis(16));
        assert!(settings.controller_enabled());
        assert!(settings.close_on_exit());
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let toml = r#"
[mirror]
poll_interval_ms = 0
"#;
        assert!(matches!(
            Settings::from_toml(toml),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_default_content_parses() {
        let settings = Settings::from_toml(default_settings_content()).unwrap();
        assert!(settings.controller_enabled());
        assert_eq!(settings.pad_hold(), Duration::from_millis(60));
    }

    #[test]
    fn test_reload_without_source_path_errors() {
        let mut settings = Settings::new();
        assert!(matches!(
            settings.reload(),
            Err(SettingsError::InvalidValue(_))
        ));
    }
}
