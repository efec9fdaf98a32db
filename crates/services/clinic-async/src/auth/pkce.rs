use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// PKCE (S256) verifier/challenge pair plus the anti-forgery state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceChallenge {
    /// Secret kept until the code exchange
    pub verifier: String,
    /// `base64url(sha256(verifier))`, sent with the authorization request
    pub challenge: String,
    /// Random state echoed by the callback
    pub state: String,
}

impl PkceChallenge {
    /// Generates a fresh random challenge
    #[must_use]
    pub fn generate() -> Self {
        let verifier = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>());
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        let state = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 16]>());

        Self {
            verifier,
            challenge,
            state,
        }
    }
}
