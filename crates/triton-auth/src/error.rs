//! Error types for request signing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for signing operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while loading keys or producing signatures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The private key is passphrase-protected and has not been unlocked.
    #[error("key {fingerprint} is locked: unlock it with its passphrase before signing")]
    KeyLocked {
        /// MD5 fingerprint of the locked key.
        fingerprint: String,
    },

    /// The passphrase did not decrypt the key.
    #[error("failed to unlock key {fingerprint}: {reason}")]
    UnlockFailed {
        /// MD5 fingerprint of the key.
        fingerprint: String,
        /// Reason reported by the decoder.
        reason: String,
    },

    /// Key material could not be parsed or is an unsupported type.
    #[error("key format error: {message}")]
    KeyFormat {
        /// Description of the format problem.
        message: String,
    },

    /// No key matching the requested fingerprint was found.
    #[error("no key matching \"{key_id}\" found in {location}")]
    KeyNotFound {
        /// The key id that was searched for.
        key_id: String,
        /// Where the search happened (file path or "ssh-agent").
        location: String,
    },

    /// The SSH agent is not reachable.
    #[error("ssh-agent unavailable: {message}")]
    AgentUnavailable {
        /// Additional context.
        message: String,
    },

    /// The SSH agent answered but produced no usable signature.
    #[error("ssh-agent did not return a signature: {message}")]
    AgentSignature {
        /// Additional context.
        message: String,
    },

    /// Producing a signature with local key material failed.
    #[error("signing failed: {message}")]
    Signature {
        /// Additional context.
        message: String,
    },

    /// Reading a key file failed.
    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        /// Path of the key file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// IO error talking to the agent.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// Creates a `KeyFormat` error with a message.
    #[must_use]
    pub fn key_format(message: impl Into<String>) -> Self {
        Self::KeyFormat {
            message: message.into(),
        }
    }

    /// Creates an `AgentUnavailable` error with a message.
    #[must_use]
    pub fn agent_unavailable(message: impl Into<String>) -> Self {
        Self::AgentUnavailable {
            message: message.into(),
        }
    }

    /// Creates an `AgentSignature` error with a message.
    #[must_use]
    pub fn agent_signature(message: impl Into<String>) -> Self {
        Self::AgentSignature {
            message: message.into(),
        }
    }

    /// Creates a `Signature` error with a message.
    #[must_use]
    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature {
            message: message.into(),
        }
    }

    /// Returns true if this error means the key needs a passphrase.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::KeyLocked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_locked_display() {
        let err = AuthError::KeyLocked {
            fingerprint: "aa:bb".to_string(),
        };
        assert!(err.to_string().contains("aa:bb"));
        assert!(err.to_string().contains("locked"));
        assert!(err.is_locked());
    }

    #[test]
    fn test_key_not_found_display() {
        let err = AuthError::KeyNotFound {
            key_id: "SHA256:abc".to_string(),
            location: "ssh-agent".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no key matching \"SHA256:abc\" found in ssh-agent"
        );
    }

    #[test]
    fn test_helpers_build_variants() {
        assert!(matches!(
            AuthError::key_format("bad"),
            AuthError::KeyFormat { .. }
        ));
        assert!(matches!(
            AuthError::agent_unavailable("no socket"),
            AuthError::AgentUnavailable { .. }
        ));
        assert!(!AuthError::signature("x").is_locked());
    }
}
