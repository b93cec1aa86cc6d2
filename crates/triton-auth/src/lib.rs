//! # triton-auth
//!
//! Request signing for the Triton CloudAPI.
//!
//! Provides:
//! - SSH key pairs loaded from OpenSSH/PEM files or backed by ssh-agent
//! - MD5 and SHA-256 key fingerprints
//! - HTTP Signature `Authorization` headers over the `Date` header
//!
//! ```text
//! ┌──────────┐  sign("date: ...")  ┌──────────────┐
//! │ KeyPair  │◄────────────────────│ RequestSigner│──► Date + Authorization
//! └────┬─────┘                     └──────────────┘
//!      │ local key or ssh-agent
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod error;
pub mod fingerprint;
pub mod keypair;
pub mod signer;

pub use agent::{AgentClient, AgentIdentity, SSH_AUTH_SOCK};
pub use error::{AuthError, Result};
pub use fingerprint::{matches_key_id, md5_fingerprint, sha256_fingerprint};
pub use keypair::{KeyPair, SignatureAlgorithm};
pub use signer::{AuthHeaders, RequestSigner, rfc1123_date};
