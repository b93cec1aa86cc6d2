use serde::{Deserialize, Serialize};

use super::{Extra, impl_resource};

/// An SSH public key registered with an account or user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SshKey {
    /// Key name.
    pub name: String,
    /// MD5 fingerprint.
    pub fingerprint: String,
    /// OpenSSH public key text.
    pub key: String,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(SshKey, id = fingerprint, name = name);

/// Body of `CreateKey`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateKeyOptions {
    /// OpenSSH public key text.
    pub key: String,
    /// Key name; defaults server-side to the fingerprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
