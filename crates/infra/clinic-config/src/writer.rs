//! Atomic writes for configuration files.

use anyhow::{Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Writes `value` as pretty JSON, replacing `path` atomically.
///
/// Missing parent directories are created.
pub fn write_pretty_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("Failed to serialize config to JSON")?;

    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(json.as_bytes()))
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClinicConfig;
    use tempfile::TempDir;

    #[test]
    fn writes_into_new_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clinic").join("clinic.json");

        write_pretty_json_atomic(&path, &ClinicConfig::default()).unwrap();

        let written: ClinicConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.identity.realm, "CBT");
    }

    #[test]
    fn overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clinic.json");

        write_pretty_json_atomic(&path, &serde_json::json!({"version": 1})).unwrap();
        write_pretty_json_atomic(&path, &serde_json::json!({"version": 2})).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"version\": 2"));
        assert!(!content.contains("\"version\": 1"));
    }
}
