//! Installed editor extension discovery.
//!
//! Extensions live in VS Code style extension directories:
//! `{extensions_dir}/{publisher.name-version}/package.json`. Each manifest may
//! contribute languages under `contributes.languages[].id`.
//!
//! The comment syntax resolver only talks to the `ExtensionHost` trait so it
//! can be driven by a real extension directory or by an in-memory fixture.

use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Name of the per-extension manifest file.
const MANIFEST_FILE: &str = "package.json";

/// An installed extension, read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledExtension {
    pub id: String,
    pub root: PathBuf,
    pub languages: Vec<String>,
}

impl InstalledExtension {
    pub fn contributes_language(&self, language_id: &str) -> bool {
        self.languages.iter().any(|l| l == language_id)
    }
}

/// Narrow view of the editor environment used by the resolver.
pub trait ExtensionHost {
    /// Installed extensions, in the order "first match" is decided on.
    fn installed_extensions(&self) -> Vec<InstalledExtension>;

    /// Every file named `file_name` at any depth under `root`, sorted by path.
    fn find_files(&self, root: &Path, file_name: &str) -> Vec<PathBuf> {
        find_files_recursive(root, file_name)
    }

    fn read_file(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Recursive `**/{file_name}` glob under `root`.
///
/// The root is escaped so directory names containing glob metacharacters are
/// matched literally. Unreadable entries are logged and skipped.
pub(crate) fn find_files_recursive(root: &Path, file_name: &str) -> Vec<PathBuf> {
    let Some(root_str) = root.to_str() else {
        tracing::warn!(root = %root.display(), "extension root is not valid UTF-8; skipping");
        return Vec::new();
    };

    let pattern = format!(
        "{}/**/{}",
        glob::Pattern::escape(root_str.trim_end_matches(['/', '\\'])),
        glob::Pattern::escape(file_name)
    );

    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(%pattern, "invalid glob pattern: {e}");
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("skipping unreadable path: {e}");
                None
            }
        })
        .collect();
    found.sort();
    found
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The subset of an extension's `package.json` that matters here.
#[derive(Debug, Deserialize)]
struct ExtensionManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    contributes: Option<Contributes>,
}

#[derive(Debug, Default, Deserialize)]
struct Contributes {
    #[serde(default)]
    languages: Vec<LanguageContribution>,
}

#[derive(Debug, Deserialize)]
struct LanguageContribution {
    #[serde(default)]
    id: Option<String>,
}

impl ExtensionManifest {
    /// `publisher.name`, or whichever half exists, or the directory name.
    fn extension_id(&self, dir_name: &str) -> String {
        match (self.publisher.as_deref(), self.name.as_deref()) {
            (Some(publisher), Some(name)) if !publisher.is_empty() && !name.is_empty() => {
                format!("{publisher}.{name}")
            }
            (_, Some(name)) if !name.is_empty() => name.to_string(),
            _ => dir_name.to_string(),
        }
    }

    fn language_ids(&self) -> Vec<String> {
        let Some(contributes) = &self.contributes else {
            return Vec::new();
        };
        contributes
            .languages
            .iter()
            .filter_map(|lang| lang.id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

/// Numeric components of a version string; non-numeric suffixes are ignored.
/// "1.10.2-beta" -> [1, 10, 2]
fn version_key(version: Option<&str>) -> Vec<u64> {
    version
        .unwrap_or_default()
        .split(['.', '-', '+'])
        .map_while(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect()
}

fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    version_key(a).cmp(&version_key(b))
}

/// Parse one extension directory. `None` if it has no usable manifest.
fn read_extension(path: &Path) -> Option<(InstalledExtension, Option<String>)> {
    let dir_name = path.file_name()?.to_str()?.to_string();

    let manifest_path = path.join(MANIFEST_FILE);
    let manifest_data = match std::fs::read_to_string(&manifest_path) {
        Ok(d) => d,
        Err(err) => {
            tracing::warn!(extension = %dir_name, "failed to read {MANIFEST_FILE}: {err}");
            return None;
        }
    };

    let manifest: ExtensionManifest = match serde_json::from_str(&manifest_data) {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(extension = %dir_name, "invalid {MANIFEST_FILE}: {err}");
            return None;
        }
    };

    let ext = InstalledExtension {
        id: manifest.extension_id(&dir_name),
        root: path.to_path_buf(),
        languages: manifest.language_ids(),
    };
    Some((ext, manifest.version))
}

/// Scan one extensions directory, sorted by directory name.
/// Invalid extensions are logged and skipped, never an error. When several
/// versions of one extension sit side by side, only the newest is kept (in
/// the position of the first).
pub(crate) fn scan_extensions_dir(dir: &Path) -> Vec<InstalledExtension> {
    if !dir.exists() {
        return Vec::new();
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), "failed to read extensions dir: {err}");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect();
    paths.sort();

    let mut found: Vec<(InstalledExtension, Option<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (ext, version) in paths.iter().filter_map(|p| read_extension(p)) {
        match index.get(&ext.id) {
            Some(&i) => {
                if compare_versions(version.as_deref(), found[i].1.as_deref()) == Ordering::Greater {
                    tracing::debug!(id = %ext.id, root = %ext.root.display(), "newer version replaces older");
                    found[i] = (ext, version);
                }
            }
            None => {
                index.insert(ext.id.clone(), found.len());
                found.push((ext, version));
            }
        }
    }
    found.into_iter().map(|(ext, _)| ext).collect()
}

// ---------------------------------------------------------------------------
// Directory-backed host
// ---------------------------------------------------------------------------

/// Default search path: the per-user `~/.vscode/extensions`, then the
/// built-in extension directories of the usual VS Code installs. Missing
/// directories are skipped at scan time.
pub fn default_extension_dirs() -> Vec<PathBuf> {
    let mut search = Vec::new();
    if let Some(home) = dirs::home_dir() {
        search.push(home.join(".vscode").join("extensions"));
    }
    search.extend(builtin_extension_dirs());
    search
}

#[cfg(target_os = "macos")]
fn builtin_extension_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(
        "/Applications/Visual Studio Code.app/Contents/Resources/app/extensions",
    )]
}

#[cfg(target_os = "windows")]
fn builtin_extension_dirs() -> Vec<PathBuf> {
    dirs::data_local_dir()
        .map(|local| {
            vec![local
                .join("Programs")
                .join("Microsoft VS Code")
                .join("resources")
                .join("app")
                .join("extensions")]
        })
        .unwrap_or_default()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn builtin_extension_dirs() -> Vec<PathBuf> {
    [
        "/usr/share/code/resources/app/extensions",
        "/opt/visual-studio-code/resources/app/extensions",
        "/snap/code/current/usr/share/code/resources/app/extensions",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

/// Host backed by one or more extension directories on disk.
#[derive(Debug, Clone, Default)]
pub struct DirectoryExtensionHost {
    dirs: Vec<PathBuf>,
}

impl DirectoryExtensionHost {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl ExtensionHost for DirectoryExtensionHost {
    /// Directories are scanned in order; a duplicate extension id keeps its
    /// first occurrence.
    fn installed_extensions(&self) -> Vec<InstalledExtension> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        for dir in &self.dirs {
            for ext in scan_extensions_dir(dir) {
                if seen.insert(ext.id.clone()) {
                    all.push(ext);
                } else {
                    tracing::debug!(id = %ext.id, root = %ext.root.display(), "duplicate extension ignored");
                }
            }
        }
        all
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
