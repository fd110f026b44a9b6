//! Shared application settings (library path, scan tunables).
//!
//! All front-ends read the same file, `~/.config/rom-warden/settings.toml`,
//! so library-path resolution stays consistent between them.

use std::io;
use std::path::{Path, PathBuf};

/// Canonical path to the settings file: `~/.config/rom-warden/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("rom-warden").join("settings.toml")
}

/// Resolve the library root path using a priority chain:
///
/// 1. Caller override (if `Some`)
/// 2. Saved `library.current_root` in `settings.toml`
/// 3. Current working directory
pub fn resolve_library_path(override_path: Option<PathBuf>) -> PathBuf {
    if let Some(p) = override_path {
        return p;
    }
    if let Some(p) = load_library_path() {
        return p;
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn load_library_path() -> Option<PathBuf> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    let root = doc.get("library")?.get("current_root")?.as_str()?;
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

/// Save (or clear) the library path in `settings.toml`.
///
/// Uses `toml::Value` for a surgical update so unrelated fields (scan
/// tunables, dedup thresholds) are preserved, and writes atomically via a
/// temp file rename.
pub fn save_library_path(path: Option<&Path>) -> io::Result<()> {
    update_settings(|table| {
        let library = table
            .entry("library")
            .or_insert_with(|| toml::Value::Table(Default::default()));
        let lib_table = library
            .as_table_mut()
            .ok_or_else(|| io::Error::other("[library] is not a table"))?;
        match path {
            Some(p) => {
                lib_table.insert(
                    "current_root".to_string(),
                    toml::Value::String(p.to_string_lossy().into_owned()),
                );
            }
            None => {
                lib_table.remove("current_root");
            }
        }
        Ok(())
    })
}

/// Read `scan.workers`, if configured.
pub fn load_worker_count() -> Option<usize> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    let workers = doc.get("scan")?.get("workers")?.as_integer()?;
    usize::try_from(workers).ok()
}

/// Read `dedup.fuzzy_threshold`, if configured.
pub fn load_fuzzy_threshold() -> Option<f64> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    doc.get("dedup")?.get("fuzzy_threshold")?.as_float()
}

/// Read `dedup.region_priority` (an array of region names, best first),
/// if configured. Unrecognized names are dropped with a warning.
pub fn load_region_priority() -> Option<Vec<rom_warden_core::Region>> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    let list = doc.get("dedup")?.get("region_priority")?.as_array()?;

    let mut regions = Vec::with_capacity(list.len());
    for value in list {
        let Some(name) = value.as_str() else {
            continue;
        };
        match rom_warden_core::Region::from_tag(name) {
            Some(region) => regions.push(region),
            None => log::warn!("settings: unknown region '{name}' in region_priority"),
        }
    }
    if regions.is_empty() {
        None
    } else {
        Some(regions)
    }
}

fn update_settings(
    edit: impl FnOnce(&mut toml::map::Map<String, toml::Value>) -> io::Result<()>,
) -> io::Result<()> {
    let settings = settings_path();
    let mut doc: toml::Value = if let Ok(contents) = std::fs::read_to_string(&settings) {
        contents
            .parse()
            .unwrap_or_else(|_| toml::Value::Table(Default::default()))
    } else {
        toml::Value::Table(Default::default())
    };

    let table = doc
        .as_table_mut()
        .ok_or_else(|| io::Error::other("settings.toml root is not a table"))?;
    edit(table)?;

    if let Some(parent) = settings.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(&doc).map_err(io::Error::other)?;
    let tmp = settings.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, &settings)?;

    Ok(())
}
