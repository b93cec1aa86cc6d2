//! ssh-agent signing.
//!
//! Wraps russh's agent client: each call opens the `$SSH_AUTH_SOCK` Unix
//! socket, lists identities or requests one signature, and hands the result
//! back as `ssh-key` types.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{AuthError, Result};
use crate::keypair::SignatureAlgorithm;

/// Environment variable naming the agent socket.
pub const SSH_AUTH_SOCK: &str = "SSH_AUTH_SOCK";

/// A public key held by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    /// SSH wire-format public key blob.
    pub blob: Vec<u8>,
    /// Agent-provided comment (usually the key file path).
    pub comment: String,
}

/// Client for a running ssh-agent.
#[derive(Debug, Clone)]
pub struct AgentClient {
    socket: PathBuf,
}

impl AgentClient {
    /// Creates a client for the agent listening on `socket`.
    #[must_use]
    pub fn new(socket: impl AsRef<Path>) -> Self {
        Self {
            socket: socket.as_ref().to_path_buf(),
        }
    }

    /// Creates a client from `$SSH_AUTH_SOCK`.
    pub fn from_env() -> Result<Self> {
        std::env::var_os(SSH_AUTH_SOCK)
            .filter(|v| !v.is_empty())
            .map(Self::new)
            .ok_or_else(|| AuthError::agent_unavailable(format!("{SSH_AUTH_SOCK} is not set")))
    }

    /// Path of the agent socket.
    #[must_use]
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Lists the identities the agent holds.
    #[cfg(unix)]
    pub async fn identities(&self) -> Result<Vec<AgentIdentity>> {
        let mut agent = self.connect().await?;
        let keys = agent
            .request_identities()
            .await
            .map_err(|e| AuthError::agent_unavailable(format!("failed to list identities: {e}")))?;

        let identities = keys
            .iter()
            .map(|key| {
                let blob = key
                    .to_bytes()
                    .map_err(|e| AuthError::key_format(format!("agent key encode error: {e}")))?;
                Ok(AgentIdentity {
                    blob,
                    comment: key.comment().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(count = identities.len(), "listed ssh-agent identities");
        Ok(identities)
    }

    /// Asks the agent to sign `data` with the key identified by `key_blob`.
    ///
    /// RSA keys request an `rsa-sha2-256` signature.
    #[cfg(unix)]
    pub async fn sign(
        &self,
        key_blob: &[u8],
        algorithm: SignatureAlgorithm,
        data: &[u8],
    ) -> Result<ssh_key::Signature> {
        use russh::keys::HashAlg;

        let public = russh::keys::PublicKey::from_bytes(key_blob)
            .map_err(|e| AuthError::key_format(format!("agent key decode error: {e}")))?;
        let hash = (algorithm == SignatureAlgorithm::RsaSha256).then_some(HashAlg::Sha256);

        let mut agent = self.connect().await?;
        let sig = agent
            .sign_request_signature(&public, hash, data)
            .await
            .map_err(|e| AuthError::agent_signature(e.to_string()))?;
        if sig.as_bytes().is_empty() {
            return Err(AuthError::agent_signature("empty signature payload"));
        }
        trace!(format = %sig.algorithm(), "agent produced signature");

        let format = ssh_key::Algorithm::new(sig.algorithm().as_str())
            .map_err(|e| AuthError::agent_signature(format!("unknown signature format: {e}")))?;
        ssh_key::Signature::new(format, sig.as_bytes().to_vec())
            .map_err(|e| AuthError::agent_signature(format!("malformed signature: {e}")))
    }

    #[cfg(unix)]
    async fn connect(
        &self,
    ) -> Result<russh::keys::agent::client::AgentClient<tokio::net::UnixStream>> {
        let stream = tokio::net::UnixStream::connect(&self.socket)
            .await
            .map_err(|e| {
                AuthError::agent_unavailable(format!("connect {}: {e}", self.socket.display()))
            })?;
        Ok(russh::keys::agent::client::AgentClient::connect(stream))
    }

    /// Lists the identities the agent holds.
    #[cfg(not(unix))]
    pub async fn identities(&self) -> Result<Vec<AgentIdentity>> {
        Err(unsupported())
    }

    /// Asks the agent to sign `data` with the key identified by `key_blob`.
    #[cfg(not(unix))]
    pub async fn sign(
        &self,
        _key_blob: &[u8],
        _algorithm: SignatureAlgorithm,
        _data: &[u8],
    ) -> Result<ssh_key::Signature> {
        Err(unsupported())
    }
}

#[cfg(not(unix))]
fn unsupported() -> AuthError {
    AuthError::agent_unavailable("ssh-agent signing is only supported on Unix platforms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_socket_path() {
        let client = AgentClient::new("/tmp/agent.sock");
        assert_eq!(client.socket(), Path::new("/tmp/agent.sock"));
    }

    #[tokio::test]
    async fn test_missing_socket_is_unavailable() {
        let client = AgentClient::new("/nonexistent/triton-agent.sock");
        let err = client.identities().await.expect_err("should fail");
        assert!(matches!(err, AuthError::AgentUnavailable { .. }));
    }
}
