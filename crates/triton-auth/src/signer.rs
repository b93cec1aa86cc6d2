//! HTTP Signature request signing.
//!
//! CloudAPI authenticates every request by a signature over the `Date`
//! header:
//!
//! ```text
//! Date: Thu, 01 Jan 2026 00:00:00 GMT
//! Authorization: Signature keyId="/<account>/keys/<md5>",algorithm="rsa-sha256",headers="date",signature="<base64>"
//! ```
//!
//! Sub-users sign with `keyId="/<account>/users/<login>/keys/<md5>"`.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use tracing::trace;

use crate::error::Result;
use crate::keypair::KeyPair;

/// Formats a timestamp as an RFC 1123 HTTP date.
#[must_use]
pub fn rfc1123_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Header values produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// Value for the `Date` header.
    pub date: String,
    /// Value for the `Authorization` header.
    pub authorization: String,
}

/// Signs requests on behalf of an account (and optionally a sub-user).
#[derive(Debug, Clone)]
pub struct RequestSigner {
    account: String,
    user: Option<String>,
    key: Arc<KeyPair>,
}

impl RequestSigner {
    /// Creates a signer for `account` using `key`.
    #[must_use]
    pub fn new(account: impl Into<String>, key: KeyPair) -> Self {
        Self {
            account: account.into(),
            user: None,
            key: Arc::new(key),
        }
    }

    /// Signs as the sub-user `user` of the account.
    #[must_use]
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user.filter(|u| !u.is_empty());
        self
    }

    /// Login account used in the key id.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Sub-user login, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The signing key.
    #[must_use]
    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    /// The `keyId` signature parameter.
    #[must_use]
    pub fn key_id(&self) -> String {
        match &self.user {
            Some(user) => format!(
                "/{}/users/{}/keys/{}",
                self.account,
                user,
                self.key.fingerprint()
            ),
            None => format!("/{}/keys/{}", self.account, self.key.fingerprint()),
        }
    }

    /// Signs a request dated now.
    pub async fn sign(&self) -> Result<AuthHeaders> {
        self.sign_at(Utc::now()).await
    }

    /// Signs a request dated `at`.
    pub async fn sign_at(&self, at: DateTime<Utc>) -> Result<AuthHeaders> {
        let date = rfc1123_date(at);
        let signing_string = format!("date: {date}");
        let signature = self.key.sign(signing_string.as_bytes()).await?;
        let authorization = format!(
            "Signature keyId=\"{}\",algorithm=\"{}\",headers=\"date\",signature=\"{}\"",
            self.key_id(),
            self.key.algorithm(),
            STANDARD.encode(signature)
        );
        trace!(key_id = %self.key_id(), "signed request");
        Ok(AuthHeaders {
            date,
            authorization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn signer() -> RequestSigner {
        let key = KeyPair::from_ed25519(
            &ed25519_dalek::SigningKey::from_bytes(&[1u8; 32]),
            String::new(),
        )
        .expect("key");
        RequestSigner::new("alice", key)
    }

    #[test_case(2026, 3, 5, 7, 8, 9, "Thu, 05 Mar 2026 07:08:09 GMT" ; "single digit day")]
    #[test_case(2025, 12, 31, 23, 59, 59, "Wed, 31 Dec 2025 23:59:59 GMT" ; "year end")]
    fn test_rfc1123_date(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, expected: &str) {
        let at = Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("valid");
        assert_eq!(rfc1123_date(at), expected);
    }

    #[test]
    fn test_key_id_account_and_user() {
        let s = signer();
        let fp = s.key().fingerprint().to_string();
        assert_eq!(s.key_id(), format!("/alice/keys/{fp}"));

        let s = s.with_user(Some("bob".to_string()));
        assert_eq!(s.key_id(), format!("/alice/users/bob/keys/{fp}"));

        let s = s.with_user(Some(String::new()));
        assert!(s.user().is_none());
    }

    #[tokio::test]
    async fn test_authorization_header_verifies() {
        use ed25519_dalek::Verifier;

        let s = signer();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid");
        let headers = s.sign_at(at).await.expect("sign");
        assert_eq!(headers.date, "Thu, 01 Jan 2026 00:00:00 GMT");
        assert!(headers.authorization.starts_with("Signature keyId=\"/alice/keys/"));
        assert!(headers.authorization.contains("algorithm=\"ed25519-sha512\""));
        assert!(headers.authorization.contains("headers=\"date\""));

        let b64 = headers
            .authorization
            .split("signature=\"")
            .nth(1)
            .and_then(|rest| rest.strip_suffix('"'))
            .expect("signature param");
        let raw = STANDARD.decode(b64).expect("base64");
        let sig = ed25519_dalek::Signature::from_slice(&raw).expect("64 bytes");
        let verifying = ed25519_dalek::SigningKey::from_bytes(&[1u8; 32]).verifying_key();
        assert!(verifying
            .verify(format!("date: {}", headers.date).as_bytes(), &sig)
            .is_ok());
    }
}
