//! SSH public key fingerprints.
//!
//! CloudAPI identifies keys by the MD5 colon-hex fingerprint of the public
//! key blob (`a1:b2:...`). OpenSSH prints `SHA256:<base64>` by default, so
//! profiles may carry either form.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use sha2::{Digest, Sha256};

/// MD5 fingerprint in colon-separated lowercase hex.
#[must_use]
pub fn md5_fingerprint(public_blob: &[u8]) -> String {
    let digest = md5::compute(public_blob);
    digest
        .0
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// SHA-256 fingerprint in OpenSSH form (`SHA256:<unpadded base64>`).
#[must_use]
pub fn sha256_fingerprint(public_blob: &[u8]) -> String {
    let digest = Sha256::digest(public_blob);
    format!("SHA256:{}", STANDARD_NO_PAD.encode(digest))
}

/// Returns true if `key_id` names the key with the given public blob.
///
/// Accepts `MD5:aa:bb:..`, bare `aa:bb:..` (case-insensitive) and
/// `SHA256:...`.
#[must_use]
pub fn matches_key_id(key_id: &str, public_blob: &[u8]) -> bool {
    let key_id = key_id.trim();
    if let Some(sha) = key_id.strip_prefix("SHA256:") {
        return sha256_fingerprint(public_blob)
            .strip_prefix("SHA256:")
            .is_some_and(|ours| ours == sha.trim_end_matches('='));
    }
    let md5 = key_id
        .strip_prefix("MD5:")
        .or_else(|| key_id.strip_prefix("md5:"))
        .unwrap_or(key_id);
    md5.eq_ignore_ascii_case(&md5_fingerprint(public_blob))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &[u8] = b"\x00\x00\x00\x0bssh-ed25519\x00\x00\x00\x20abcdefghijklmnopqrstuvwxyz012345";

    #[test]
    fn test_md5_fingerprint_shape() {
        let fp = md5_fingerprint(BLOB);
        assert_eq!(fp.len(), 47);
        assert_eq!(fp.matches(':').count(), 15);
        assert!(fp.chars().all(|c| c == ':' || c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sha256_fingerprint_prefix() {
        let fp = sha256_fingerprint(BLOB);
        assert!(fp.starts_with("SHA256:"));
        assert!(!fp.ends_with('='));
    }

    #[test]
    fn test_matches_key_id_forms() {
        let md5 = md5_fingerprint(BLOB);
        let sha = sha256_fingerprint(BLOB);
        assert!(matches_key_id(&md5, BLOB));
        assert!(matches_key_id(&md5.to_uppercase(), BLOB));
        assert!(matches_key_id(&format!("MD5:{md5}"), BLOB));
        assert!(matches_key_id(&sha, BLOB));
        assert!(matches_key_id(&format!("{sha}="), BLOB));
        assert!(!matches_key_id("SHA256:nope", BLOB));
        assert!(!matches_key_id("00:11", BLOB));
    }
}
