//! Two-layer configuration loader with environment overrides.
//!
//! 1. Read `~/.config/clinic/clinic.json` (global)
//! 2. Read `./clinic.json` (local)
//! 3. Merge the two as JSON values (RFC 7396), local on top
//! 4. Deserialize once into [`ClinicConfig`]
//! 5. Apply `CLINIC_*` environment overrides
//! 6. Run advisory validation

use crate::{merge::merge_patch, types::ClinicConfig, validation::AdvisoryWarning};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Filename for local config.
pub const LOCAL_FILE: &str = "clinic.json";

/// Directory name under the user config dir for global config.
pub const GLOBAL_DIR: &str = "clinic";

/// Filename for global config.
pub const GLOBAL_FILE: &str = "clinic.json";

/// REST base URL override.
pub const ENV_API_BASE_URL: &str = "CLINIC_API_BASE_URL";
/// Static REST bearer token (env-only).
pub const ENV_API_TOKEN: &str = "CLINIC_API_TOKEN";
/// Chat base URL override.
pub const ENV_CHAT_BASE_URL: &str = "CLINIC_CHAT_BASE_URL";
/// Chat timeout override, in seconds.
pub const ENV_CHAT_TIMEOUT_SECS: &str = "CLINIC_CHAT_TIMEOUT_SECS";
/// Identity server override.
pub const ENV_OIDC_URL: &str = "CLINIC_OIDC_URL";
/// Realm override.
pub const ENV_OIDC_REALM: &str = "CLINIC_OIDC_REALM";
/// Client id override.
pub const ENV_OIDC_CLIENT_ID: &str = "CLINIC_OIDC_CLIENT_ID";
/// Anonymous REST access (`true` or `1`).
pub const ENV_ALLOW_ANONYMOUS: &str = "CLINIC_ALLOW_ANONYMOUS";
/// Log level override.
pub const ENV_LOG_LEVEL: &str = "CLINIC_LOG_LEVEL";
/// JSON logs (`true` or `1`).
pub const ENV_LOG_JSON: &str = "CLINIC_LOG_JSON";

/// Resolved paths for config files.
#[derive(Debug, Clone)]
pub struct ClinicConfigPaths {
    /// Path to local config (`./clinic.json`).
    pub local: PathBuf,

    /// Path to global config (`~/.config/clinic/clinic.json`).
    pub global: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct LoadedClinicConfig {
    /// The merged configuration.
    pub config: ClinicConfig,

    /// Advisory warnings, including unusable env values.
    pub warnings: Vec<AdvisoryWarning>,

    /// Config files that were considered.
    pub paths: ClinicConfigPaths,
}

/// Global config file path.
///
/// Returns `~/.config/clinic/clinic.json` on Unix-like systems.
pub fn global_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config dir")?;
    Ok(base.join(GLOBAL_DIR).join(GLOBAL_FILE))
}

/// Local config file path for a given directory.
pub fn local_config_path(local_dir: &Path) -> PathBuf {
    local_dir.join(LOCAL_FILE)
}

/// Loads the global config and `local_dir/clinic.json`, then env overrides.
pub fn load_merged(local_dir: &Path) -> Result<LoadedClinicConfig> {
    load_from(ClinicConfigPaths {
        local: local_config_path(local_dir),
        global: global_config_path()?,
    })
}

/// Same as [`load_merged`] with explicit file locations.
pub fn load_from(paths: ClinicConfigPaths) -> Result<LoadedClinicConfig> {
    let global_v = read_json_object_or_empty(&paths.global)?;
    let local_v = read_json_object_or_empty(&paths.local)?;

    let mut cfg: ClinicConfig = serde_json::from_value(merge_patch(global_v, local_v))
        .context("Failed to deserialize merged clinic config")?;

    let mut warnings = apply_env_overrides(&mut cfg);
    warnings.extend(crate::validation::validate(&cfg));

    Ok(LoadedClinicConfig {
        config: cfg,
        warnings,
        paths,
    })
}

/// Applies `CLINIC_*` overrides; returns warnings for values that could not be used.
fn apply_env_overrides(cfg: &mut ClinicConfig) -> Vec<AdvisoryWarning> {
    let mut warnings = vec![];

    if let Some(v) = env_trimmed(ENV_API_BASE_URL) {
        cfg.services.api.base_url = v;
    }
    if let Some(k) = env_trimmed(ENV_API_TOKEN) {
        cfg.services.api.api_token = Some(secrecy::SecretString::from(k));
    }

    if let Some(v) = env_trimmed(ENV_CHAT_BASE_URL) {
        cfg.services.chat.base_url = v;
    }
    if let Some(v) = env_trimmed(ENV_CHAT_TIMEOUT_SECS) {
        match v.parse() {
            Ok(secs) => cfg.services.chat.timeout_secs = secs,
            Err(_) => warnings.push(AdvisoryWarning {
                code: "env.chat_timeout.invalid",
                path: "services.chat.timeout_secs",
                message: format!("Ignoring {ENV_CHAT_TIMEOUT_SECS}='{v}': not a number of seconds"),
            }),
        }
    }

    if let Some(v) = env_trimmed(ENV_OIDC_URL) {
        cfg.identity.url = v;
    }
    if let Some(v) = env_trimmed(ENV_OIDC_REALM) {
        cfg.identity.realm = v;
    }
    if let Some(v) = env_trimmed(ENV_OIDC_CLIENT_ID) {
        cfg.identity.client_id = v;
    }

    if let Some(v) = env_trimmed(ENV_ALLOW_ANONYMOUS) {
        cfg.auth.allow_anonymous = is_truthy(&v);
    }

    if let Some(v) = env_trimmed(ENV_LOG_LEVEL) {
        cfg.logging.level = v;
    }
    if let Some(v) = env_trimmed(ENV_LOG_JSON) {
        cfg.logging.json = is_truthy(&v);
    }

    warnings
}

fn is_truthy(v: &str) -> bool {
    v.eq_ignore_ascii_case("true") || v == "1"
}

/// Reads and normalizes an env var (trim, empty is unset).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads a JSON object; a missing file reads as `{}`.
fn read_json_object_or_empty(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let v: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match v {
        Value::Object(_) => Ok(v),
        _ => anyhow::bail!("Config root must be a JSON object: {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    struct EnvVar(&'static str);

    impl EnvVar {
        fn set(key: &'static str, value: &str) -> Self {
            // SAFETY: env-mutating tests run under #[serial(env)]
            unsafe { std::env::set_var(key, value) };
            Self(key)
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            // SAFETY: env-mutating tests run under #[serial(env)]
            unsafe { std::env::remove_var(self.0) };
        }
    }

    fn paths_in(temp: &TempDir) -> ClinicConfigPaths {
        ClinicConfigPaths {
            local: temp.path().join("repo").join(LOCAL_FILE),
            global: temp.path().join("home").join(GLOBAL_DIR).join(GLOBAL_FILE),
        }
    }

    fn write(path: &Path, json: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    #[test]
    #[serial(env)]
    fn no_files_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = load_from(paths_in(&temp)).unwrap();

        assert_eq!(loaded.config.services.api.base_url, "http://localhost:8080/api");
        assert_eq!(loaded.config.identity.client_id, "cbtclient");
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    #[serial(env)]
    fn local_overrides_global_per_key() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write(
            &paths.global,
            r#"{"identity": {"url": "https://id.clinique.ma", "realm": "Global"}}"#,
        );
        write(&paths.local, r#"{"identity": {"realm": "Local"}}"#);

        let loaded = load_from(paths).unwrap();

        assert_eq!(loaded.config.identity.url, "https://id.clinique.ma");
        assert_eq!(loaded.config.identity.realm, "Local");
    }

    #[test]
    #[serial(env)]
    fn env_overrides_files() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write(&paths.local, r#"{"services": {"chat": {"base_url": "http://file:5000/api"}}}"#);

        let _url = EnvVar::set(ENV_CHAT_BASE_URL, "  http://env:5000/api ");
        let _timeout = EnvVar::set(ENV_CHAT_TIMEOUT_SECS, "45");
        let _anon = EnvVar::set(ENV_ALLOW_ANONYMOUS, "TRUE");
        let _token = EnvVar::set(ENV_API_TOKEN, "tok");

        let loaded = load_from(paths).unwrap();

        assert_eq!(loaded.config.services.chat.base_url, "http://env:5000/api");
        assert_eq!(loaded.config.services.chat.timeout_secs, 45);
        assert!(loaded.config.auth.allow_anonymous);
        assert!(loaded.config.services.api.api_token.is_some());
    }

    #[test]
    #[serial(env)]
    fn bad_env_timeout_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let _timeout = EnvVar::set(ENV_CHAT_TIMEOUT_SECS, "soon");

        let loaded = load_from(paths_in(&temp)).unwrap();

        assert_eq!(loaded.config.services.chat.timeout_secs, 30);
        assert_eq!(loaded.warnings[0].code, "env.chat_timeout.invalid");
    }

    #[test]
    #[serial(env)]
    fn file_values_reach_validation() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write(&paths.local, r#"{"logging": {"level": "chatty"}}"#);

        let loaded = load_from(paths).unwrap();
        assert!(loaded.warnings.iter().any(|w| w.code == "logging.level.invalid"));
    }

    #[test]
    fn invalid_json_errors() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write(&paths.local, "not json");

        let err = load_from(paths).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn non_object_root_errors() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        write(&paths.global, "[1, 2]");

        let err = load_from(paths).unwrap_err();
        assert!(err.to_string().contains("must be a JSON object"));
    }

    #[test]
    fn paths_point_at_clinic_files() {
        let temp = TempDir::new().unwrap();
        assert_eq!(local_config_path(temp.path()), temp.path().join("clinic.json"));
        if let Ok(global) = global_config_path() {
            assert!(global.ends_with("clinic/clinic.json"));
        }
    }
}
