use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file name inside the config directory.
pub const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/dilly-ai/`
/// - Linux: `~/.config/dilly-ai/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/dilly-ai/`
///
/// Falls back to `~/.dilly-ai/` if platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("dilly-ai"))
        .unwrap_or_else(dotdir)
}

fn dotdir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dilly-ai")
}

/// Load a JSON config file, returning Default if missing or corrupt.
/// Logs warnings when the file exists but cannot be read or parsed,
/// so corrupt files are visible instead of silently resetting state.
pub(crate) fn load_json_config<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("could not read config {}: {e}", path.display());
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("corrupt config {}: {e}. Using defaults.", path.display());
            T::default()
        }
    }
}

/// Save a JSON config file atomically (temp file + rename).
/// Sets 0600 permissions on Unix since the file may hold an API key.
pub(crate) fn save_json_config<T: Serialize>(
    dir: &Path,
    filename: &str,
    config: &T,
) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let target = dir.join(filename);
    let temp = dir.join(format!("{}.tmp.{}", filename, std::process::id()));

    std::fs::write(&temp, &json)
        .map_err(|e| format!("Failed to write temp config: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    std::fs::rename(&temp, &target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })?;

    Ok(target)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Plain-text API key; the keyring and environment take precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Chat-completion endpoint (full URL)
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Extension directories searched after `~/.vscode/extensions`
    #[serde(default)]
    pub extension_dirs: Vec<PathBuf>,
    /// Wrap replies in the document language's comment syntax
    #[serde(default = "default_true")]
    pub wrap_in_comment: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            api_endpoint: default_api_endpoint(),
            extension_dirs: Vec::new(),
            wrap_in_comment: true,
        }
    }
}

pub fn settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE)
}

pub fn load_settings() -> Settings {
    load_json_config(&settings_path())
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf, String> {
    save_json_config(&config_dir(), SETTINGS_FILE, settings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
