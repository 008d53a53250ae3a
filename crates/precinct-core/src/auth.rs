//! Authentication and caller identity
//!
//! Bearer-token / API-key resolution to an officer identity. Keys are
//! stored as SHA-256 hashes and compared in constant time. The
//! high-command capability lives here, on the credential, precisely so it
//! can never be granted through a roster action: unit caretakers manage
//! ranks, not credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials provided
    #[error("authentication required")]
    MissingCredentials,

    /// Invalid token or API key
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token has been revoked
    #[error("token revoked")]
    TokenRevoked,

    /// Internal error
    #[error("auth internal error: {0}")]
    Internal(String),
}

/// Auth result type
pub type Result<T> = std::result::Result<T, AuthError>;

/// Credential-level capability, outside the unit rank model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Organization-wide oversight: bypasses per-unit membership checks
    HighCommand,
}

/// Authenticated caller attached to each request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Officer identity id the credential resolves to
    pub officer_id: String,
    /// Capabilities granted to the credential itself
    pub capabilities: Vec<Capability>,
}

impl AuthContext {
    /// Context for an ordinary officer credential
    #[must_use]
    pub fn officer(officer_id: impl Into<String>) -> Self {
        Self { officer_id: officer_id.into(), capabilities: Vec::new() }
    }

    /// Context carrying the high-command capability
    #[must_use]
    pub fn high_command(officer_id: impl Into<String>) -> Self {
        Self { officer_id: officer_id.into(), capabilities: vec![Capability::HighCommand] }
    }

    /// Whether the credential carries the given capability
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Internal representation of a stored API key
#[derive(Debug, Clone)]
struct StoredKey {
    /// SHA-256 hash of the key (the raw key is never stored)
    key_hash: [u8; 32],
    /// Officer this key belongs to
    officer_id: String,
    /// Credential capabilities
    capabilities: Vec<Capability>,
    /// Human-readable label
    label: String,
    /// When the key was created
    created_at: DateTime<Utc>,
    /// Whether the key has been revoked
    revoked: bool,
}

/// Token storage and validation
pub struct AuthStore {
    /// key_hash_hex -> StoredKey
    keys: RwLock<HashMap<String, StoredKey>>,
    /// Whether auth is enabled
    enabled: bool,
}

impl AuthStore {
    /// Create a new auth store
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { keys: RwLock::new(HashMap::new()), enabled }
    }

    /// Check if authentication is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn hash_key(key: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    fn hash_to_hex(hash: &[u8; 32]) -> String {
        hash.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Generate a new API key bound to an officer
    ///
    /// Returns the raw key (only shown once) and its hash for revocation.
    pub fn generate_key(
        &self,
        officer_id: &str,
        capabilities: Vec<Capability>,
        label: &str,
    ) -> Result<(String, String)> {
        let raw_key = format!("precinct_{}", Uuid::new_v4().as_simple());
        let key_hash = Self::hash_key(&raw_key);
        let key_hash_hex = Self::hash_to_hex(&key_hash);

        let stored = StoredKey {
            key_hash,
            officer_id: officer_id.to_string(),
            capabilities,
            label: label.to_string(),
            created_at: Utc::now(),
            revoked: false,
        };

        let mut keys = self
            .keys
            .write()
            .map_err(|e| AuthError::Internal(format!("lock poisoned: {e}")))?;
        keys.insert(key_hash_hex.clone(), stored);

        info!(
            officer_id = %officer_id,
            label = %label,
            key_prefix = %&raw_key[..12],
            "API key generated"
        );

        Ok((raw_key, key_hash_hex))
    }

    /// Validate a token and resolve the caller
    pub fn validate_token(&self, token: &str) -> Result<AuthContext> {
        if !self.enabled {
            // Auth disabled: anonymous high command, for local development.
            return Ok(AuthContext::high_command("anonymous"));
        }

        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let token_hash = Self::hash_key(token);
        let token_hash_hex = Self::hash_to_hex(&token_hash);

        let keys = self
            .keys
            .read()
            .map_err(|e| AuthError::Internal(format!("lock poisoned: {e}")))?;

        if let Some(stored) = keys.get(&token_hash_hex) {
            let hashes_match: bool = stored.key_hash.ct_eq(&token_hash).into();
            if !hashes_match {
                return Err(AuthError::InvalidCredentials);
            }

            if stored.revoked {
                return Err(AuthError::TokenRevoked);
            }

            debug!(officer_id = %stored.officer_id, label = %stored.label, "token validated");

            Ok(AuthContext {
                officer_id: stored.officer_id.clone(),
                capabilities: stored.capabilities.clone(),
            })
        } else {
            warn!("invalid token attempt");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Revoke a key by its hash
    pub fn revoke_key(&self, key_hash_hex: &str) -> Result<()> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| AuthError::Internal(format!("lock poisoned: {e}")))?;

        if let Some(stored) = keys.get_mut(key_hash_hex) {
            stored.revoked = true;
            info!(officer_id = %stored.officer_id, label = %stored.label, "API key revoked");
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// List all keys (non-sensitive info only)
    pub fn list_keys(&self) -> Result<Vec<ApiKeyInfo>> {
        let keys = self
            .keys
            .read()
            .map_err(|e| AuthError::Internal(format!("lock poisoned: {e}")))?;

        Ok(keys
            .iter()
            .map(|(hash_hex, stored)| ApiKeyInfo {
                key_hash: hash_hex.clone(),
                officer_id: stored.officer_id.clone(),
                label: stored.label.clone(),
                capabilities: stored.capabilities.clone(),
                created_at: stored.created_at,
                revoked: stored.revoked,
            })
            .collect())
    }

    /// Count of active (non-revoked) keys
    #[must_use]
    pub fn active_key_count(&self) -> usize {
        self.keys
            .read()
            .map(|keys| keys.values().filter(|k| !k.revoked).count())
            .unwrap_or(0)
    }
}

/// Non-sensitive API key information for listing
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyInfo {
    /// Hash of the key (for identification/revocation)
    pub key_hash: String,
    /// Owning officer id
    pub officer_id: String,
    /// Human-readable label
    pub label: String,
    /// Credential capabilities
    pub capabilities: Vec<Capability>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether revoked
    pub revoked: bool,
}
