//! On-disk persistence for the login session.
//!
//! Tokens and an in-progress login (PKCE verifier) are kept as JSON under the
//! user's config dir so the next process can restore the session silently.

use std::io::Write;
use std::path::{Path, PathBuf};

use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{pkce::PkceChallenge, provider::Token};
use crate::error::AuthError;

const SESSION_FILE: &str = "session.json";
const PENDING_FILE: &str = "pending-login.json";

#[derive(Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl From<&Token> for StoredToken {
    fn from(t: &Token) -> Self {
        Self {
            access_token: t.access_token.expose_secret().to_string(),
            refresh_token: t.refresh_token.as_ref().map(|s| s.expose_secret().to_string()),
            id_token: t.id_token.as_ref().map(|s| s.expose_secret().to_string()),
            expires_at: t.expires_at,
        }
    }
}

impl From<StoredToken> for Token {
    fn from(s: StoredToken) -> Self {
        Self {
            access_token: SecretString::from(s.access_token),
            refresh_token: s.refresh_token.map(SecretString::from),
            id_token: s.id_token.map(SecretString::from),
            expires_at: s.expires_at,
        }
    }
}

/// Directory-backed token store
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    /// Store rooted at `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.config/clinic` on Unix-like systems
    pub fn default_location() -> Result<Self, AuthError> {
        let base = dirs::config_dir()
            .ok_or_else(|| AuthError::Store("could not determine config dir".into()))?;
        Ok(Self::new(base.join("clinic")))
    }

    /// Directory holding the files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saved tokens, if any
    pub fn load(&self) -> Result<Option<Token>, AuthError> {
        Ok(self.read::<StoredToken>(SESSION_FILE)?.map(Token::from))
    }

    /// Persists tokens
    pub fn save(&self, token: &Token) -> Result<(), AuthError> {
        self.write(SESSION_FILE, &StoredToken::from(token))
    }

    /// Forgets saved tokens
    pub fn clear(&self) -> Result<(), AuthError> {
        self.remove(SESSION_FILE)
    }

    /// Persists an in-progress login
    pub fn save_pending(&self, pkce: &PkceChallenge) -> Result<(), AuthError> {
        self.write(PENDING_FILE, pkce)
    }

    /// Takes the in-progress login, removing it
    pub fn take_pending(&self) -> Result<Option<PkceChallenge>, AuthError> {
        let pending = self.read(PENDING_FILE)?;
        if pending.is_some() {
            self.remove(PENDING_FILE)?;
        }
        Ok(pending)
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AuthError> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| AuthError::Store(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AuthError::Store(format!("parse {}: {e}", path.display())))
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AuthError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AuthError::Store(format!("create {}: {e}", self.dir.display())))?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| AuthError::Store(e.to_string()))?;

        AtomicFile::new(&path, AllowOverwrite)
            .write(|f| f.write_all(json.as_bytes()))
            .map_err(|e| AuthError::Store(format!("write {}: {e}", path.display())))?;

        restrict_permissions(&path);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), AuthError> {
        let path = self.dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Store(format!("remove {}: {e}", path.display()))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), error = %e, "could not restrict token file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token() -> Token {
        Token {
            access_token: SecretString::from("access".to_string()),
            refresh_token: Some(SecretString::from("refresh".to_string())),
            id_token: None,
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn save_load_clear() {
        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path().join("nested"));

        assert!(store.load().unwrap().is_none());
        store.save(&token()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "access");
        assert_eq!(
            loaded.refresh_token.unwrap().expose_secret(),
            "refresh"
        );

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn pending_login_is_taken_once() {
        let temp = TempDir::new().unwrap();
        let store = TokenStore::new(temp.path());
        let pkce = PkceChallenge::generate();

        store.save_pending(&pkce).unwrap();
        assert_eq!(store.take_pending().unwrap(), Some(pkce));
        assert_eq!(store.take_pending().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(SESSION_FILE), "{nope").unwrap();
        let err = TokenStore::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }
}
