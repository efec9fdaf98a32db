//! Advisory validation for [`ClinicConfig`].
//!
//! Problems are reported as warnings; the config is still usable.

use crate::types::ClinicConfig;

/// Longest chat timeout accepted without a warning, in seconds.
pub const MAX_CHAT_TIMEOUT_SECS: u64 = 300;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// An advisory warning about a configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryWarning {
    /// Machine-readable warning code.
    pub code: &'static str,

    /// Human-readable warning message.
    pub message: String,

    /// JSON path to the problematic config field.
    pub path: &'static str,
}

impl std::fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Collects advisory warnings for `cfg`.
pub fn validate(cfg: &ClinicConfig) -> Vec<AdvisoryWarning> {
    let mut warnings = vec![];

    for (url, path, code) in [
        (
            &cfg.services.api.base_url,
            "services.api.base_url",
            "services.api.base_url.invalid",
        ),
        (
            &cfg.services.chat.base_url,
            "services.chat.base_url",
            "services.chat.base_url.invalid",
        ),
        (&cfg.identity.url, "identity.url", "identity.url.invalid"),
        (
            &cfg.identity.redirect_uri,
            "identity.redirect_uri",
            "identity.redirect_uri.invalid",
        ),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            warnings.push(AdvisoryWarning {
                code,
                path,
                message: format!("Expected an http(s) URL, got: '{url}'"),
            });
        }
    }

    let timeout = cfg.services.chat.timeout_secs;
    if timeout == 0 || timeout > MAX_CHAT_TIMEOUT_SECS {
        warnings.push(AdvisoryWarning {
            code: "services.chat.timeout_secs.out_of_range",
            path: "services.chat.timeout_secs",
            message: format!("Expected 1..={MAX_CHAT_TIMEOUT_SECS} seconds, got {timeout}"),
        });
    }

    if cfg.identity.realm.trim().is_empty() {
        warnings.push(AdvisoryWarning {
            code: "identity.realm.empty",
            path: "identity.realm",
            message: "Value cannot be empty".into(),
        });
    }
    if cfg.identity.client_id.trim().is_empty() {
        warnings.push(AdvisoryWarning {
            code: "identity.client_id.empty",
            path: "identity.client_id",
            message: "Value cannot be empty".into(),
        });
    }

    if !LOG_LEVELS.contains(&cfg.logging.level.to_lowercase().as_str()) {
        warnings.push(AdvisoryWarning {
            code: "logging.level.invalid",
            path: "logging.level",
            message: format!(
                "Unknown log level '{}'. Expected one of: {}",
                cfg.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(cfg: &ClinicConfig) -> Vec<&'static str> {
        validate(cfg).into_iter().map(|w| w.code).collect()
    }

    #[test]
    fn default_config_has_no_warnings() {
        let warnings = validate(&ClinicConfig::default());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn non_http_urls_warn() {
        let mut cfg = ClinicConfig::default();
        cfg.services.chat.base_url = "localhost:5000".into();
        cfg.identity.url = "ftp://id.local".into();

        assert_eq!(
            codes(&cfg),
            vec!["services.chat.base_url.invalid", "identity.url.invalid"]
        );
    }

    #[test]
    fn timeout_bounds() {
        let mut cfg = ClinicConfig::default();
        cfg.services.chat.timeout_secs = 0;
        assert_eq!(codes(&cfg), vec!["services.chat.timeout_secs.out_of_range"]);

        cfg.services.chat.timeout_secs = MAX_CHAT_TIMEOUT_SECS;
        assert!(codes(&cfg).is_empty());

        cfg.services.chat.timeout_secs = MAX_CHAT_TIMEOUT_SECS + 1;
        assert_eq!(codes(&cfg), vec!["services.chat.timeout_secs.out_of_range"]);
    }

    #[test]
    fn blank_realm_and_client_warn() {
        let mut cfg = ClinicConfig::default();
        cfg.identity.realm = " ".into();
        cfg.identity.client_id = String::new();

        assert_eq!(
            codes(&cfg),
            vec!["identity.realm.empty", "identity.client_id.empty"]
        );
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut cfg = ClinicConfig::default();
        cfg.logging.level = "DEBUG".into();
        assert!(codes(&cfg).is_empty());

        cfg.logging.level = "verbose".into();
        assert_eq!(codes(&cfg), vec!["logging.level.invalid"]);
    }

    #[test]
    fn warning_display() {
        let warning = AdvisoryWarning {
            code: "identity.realm.empty",
            path: "identity.realm",
            message: "Value cannot be empty".into(),
        };
        assert_eq!(
            warning.to_string(),
            "[identity.realm.empty] identity.realm: Value cannot be empty"
        );
    }
}
