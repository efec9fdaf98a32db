//! JSON Schema for `clinic.json`, for editor completion and validation.

use crate::types::ClinicConfig;
use schemars::{Schema, generate::SchemaSettings};

/// Schema of [`ClinicConfig`].
pub fn schema() -> Schema {
    SchemaSettings::default()
        .into_generator()
        .into_root_schema_for::<ClinicConfig>()
}

/// Schema as pretty-printed JSON.
pub fn schema_json_pretty() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&schema())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> jsonschema::Validator {
        jsonschema::validator_for(&serde_json::to_value(schema()).unwrap()).unwrap()
    }

    #[test]
    fn schema_names_the_root_type() {
        let json = schema_json_pretty().unwrap();
        assert!(json.contains("ClinicConfig"));
        assert!(json.contains("\"identity\""));
    }

    #[test]
    fn schema_excludes_secrets() {
        assert!(!schema_json_pretty().unwrap().contains("api_token"));
    }

    #[test]
    fn default_config_validates() {
        let config = serde_json::to_value(ClinicConfig::default()).unwrap();
        let result = validator().validate(&config);
        assert!(result.is_ok(), "default config rejected: {:?}", result.err());
    }

    #[test]
    fn wrong_types_are_rejected() {
        let config = serde_json::json!({"services": {"chat": {"timeout_secs": "thirty"}}});
        assert!(validator().validate(&config).is_err());
    }
}
