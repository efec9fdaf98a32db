//! Reads role claims out of an access token.
//!
//! The signature is not checked. Roles only drive what the UI offers; the
//! backend enforces access with its own verification.

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct RoleList {
    #[serde(default)]
    roles: Vec<String>,
}

/// Claims of interest in a Keycloak access token
#[derive(Debug, Default, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    realm_access: Option<RoleList>,
    #[serde(default)]
    resource_access: HashMap<String, RoleList>,
    /// Login name
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
}

impl AccessClaims {
    /// Decodes the payload segment of a JWT; `None` if it is not one
    #[must_use]
    pub fn decode_unverified(jwt: &str) -> Option<Self> {
        let payload = jwt.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Realm roles
    #[must_use]
    pub fn realm_roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|r| r.roles.as_slice())
            .unwrap_or(&[])
    }

    /// Roles granted on `client_id`
    #[must_use]
    pub fn client_roles(&self, client_id: &str) -> &[String] {
        self.resource_access
            .get(client_id)
            .map(|r| r.roles.as_slice())
            .unwrap_or(&[])
    }

    /// Realm roles followed by `client_id` roles, without duplicates
    #[must_use]
    pub fn roles(&self, client_id: &str) -> Vec<String> {
        let mut roles: Vec<String> = self.realm_roles().to_vec();
        for role in self.client_roles(client_id) {
            if !roles.contains(role) {
                roles.push(role.clone());
            }
        }
        roles
    }
}

#[cfg(test)]
pub(crate) fn fake_jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_realm_and_client_roles() {
        let jwt = fake_jwt(&serde_json::json!({
            "realm_access": {"roles": ["dentiste", "offline_access"]},
            "resource_access": {
                "cbtclient": {"roles": ["admin", "dentiste"]},
                "account": {"roles": ["manage-account"]}
            },
            "preferred_username": "dr.sara"
        }));
        let claims = AccessClaims::decode_unverified(&jwt).unwrap();
        assert_eq!(
            claims.roles("cbtclient"),
            vec!["dentiste", "offline_access", "admin"]
        );
        assert!(!claims.roles("cbtclient").contains(&"manage-account".to_string()));
        assert_eq!(claims.preferred_username.as_deref(), Some("dr.sara"));
    }

    #[test]
    fn opaque_tokens_have_no_claims() {
        assert!(AccessClaims::decode_unverified("not-a-jwt").is_none());
        assert!(AccessClaims::decode_unverified("a.!!!.c").is_none());
    }
}
