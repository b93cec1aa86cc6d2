//! Profiles and client configuration.
//!
//! A [`Profile`] is the identity bundle for one CloudAPI endpoint:
//! - endpoint URL and account login
//! - optional act-as account and RBAC sub-user
//! - key id (MD5 or SHA256 fingerprint) and optional key file
//! - TLS verification and API version overrides
//! - RBAC roles to assume
//!
//! Profiles are stored as JSON using CloudAPI's key spelling (`keyId`,
//! `actAsAccount`, ...).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Accept-Version sent when neither profile nor client overrides it.
pub const DEFAULT_ACCEPT_VERSION: &str = "~8||~7";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "TRITONTEST_CLI_CONFIG_DIR";

/// Identity bundle for one CloudAPI endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// CloudAPI endpoint, e.g. `https://us-east-1.api.example.com`.
    pub url: String,
    /// Login account used to sign requests.
    pub account: String,
    /// Account to act as (operators only); requests address this account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_as_account: Option<String>,
    /// RBAC sub-user login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Key fingerprint (MD5 colon-hex or `SHA256:...`).
    pub key_id: String,
    /// Private key file. Without one the key is looked up in ssh-agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// Skip TLS certificate verification.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    /// Accept-Version range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_version: Option<String>,
    /// RBAC roles to assume (`as-role`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Profile {
    /// Loads a profile from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a `Usage` error if the file cannot be read, parsed or
    /// validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::usage(format!(
                "failed to read profile '{}': {e}",
                path.display()
            ))
        })?;
        let mut profile = Self::from_json(&content)?;
        if profile.name.is_none() {
            profile.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(profile)
    }

    /// Parses and validates a profile from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(content)
            .map_err(|e| Error::usage(format!("invalid profile JSON: {e}")))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Checks required fields and the endpoint URL.
    pub fn validate(&self) -> Result<()> {
        if self.account.is_empty() {
            return Err(Error::usage("profile account cannot be empty"));
        }
        if self.key_id.is_empty() {
            return Err(Error::usage("profile keyId cannot be empty"));
        }
        let url = self.endpoint()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::usage(format!(
                "profile url must be http or https, got '{}'",
                self.url
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::usage(format!("profile url '{}' has no host", self.url)));
        }
        Ok(())
    }

    /// Parsed endpoint URL.
    pub fn endpoint(&self) -> Result<Url> {
        Url::parse(&self.url)
            .map_err(|e| Error::usage(format!("invalid profile url '{}': {e}", self.url)))
    }

    /// Account addressed by request paths: the act-as account if set,
    /// otherwise the login account.
    #[must_use]
    pub fn path_account(&self) -> &str {
        self.act_as_account
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.account)
    }

    /// Directory-safe identifier for this profile: `<account>@<host>`.
    #[must_use]
    pub fn cache_slug(&self) -> String {
        let host = Url::parse(&self.url)
            .ok()
            .and_then(|u| {
                u.host_str().map(|h| match u.port() {
                    Some(port) => format!("{h}:{port}"),
                    None => h.to_string(),
                })
            })
            .unwrap_or_else(|| self.url.clone());
        format!("{}@{host}", self.path_account())
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Transport settings for a [`crate::WireClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Accept-Version range, overridden by the profile's.
    pub accept_version: String,
    /// User-Agent header.
    pub user_agent: String,
    /// Keep idle connections for reuse.
    pub connection_pooling: bool,
    /// Per-request timeout.
    pub request_timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            accept_version: DEFAULT_ACCEPT_VERSION.to_string(),
            user_agent: default_user_agent(),
            connection_pooling: true,
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Settings for one-shot CLI use: no idle connection pool.
    #[must_use]
    pub fn for_cli() -> Self {
        Self {
            connection_pooling: false,
            ..Self::default()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.accept_version.trim().is_empty() {
            return Err(Error::usage("accept version cannot be empty"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::usage("user agent cannot be empty"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::usage("connect timeout must be positive"));
        }
        Ok(())
    }
}

/// `triton/<version> (<arch>-<os>)`.
#[must_use]
pub fn default_user_agent() -> String {
    format!(
        "triton/{} ({}-{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}

/// Configuration directory: `$TRITONTEST_CLI_CONFIG_DIR` or `~/.triton`.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".triton"))
        .ok_or_else(|| Error::usage("cannot determine home directory for configuration"))
}

/// Directory holding named profile files.
pub fn profiles_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("profiles.d")
}

/// Per-profile cache directory below `config_dir`.
pub fn cache_dir(config_dir: &Path, profile: &Profile) -> PathBuf {
    config_dir.join("cache").join(profile.cache_slug())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            url: "https://cloudapi.example.com".to_string(),
            account: "alice".to_string(),
            key_id: "aa:bb".to_string(),
            ..Profile::default()
        }
    }

    #[test]
    fn test_profile_json_key_spelling() {
        let json = r#"{
            "url": "https://cloudapi.example.com",
            "account": "alice",
            "keyId": "SHA256:abc",
            "user": "bob",
            "actAsAccount": "acme",
            "insecure": true,
            "acceptVersion": "~9",
            "roles": ["ops"]
        }"#;
        let p = Profile::from_json(json).expect("valid profile");
        assert_eq!(p.key_id, "SHA256:abc");
        assert_eq!(p.user.as_deref(), Some("bob"));
        assert_eq!(p.act_as_account.as_deref(), Some("acme"));
        assert!(p.insecure);
        assert_eq!(p.accept_version.as_deref(), Some("~9"));
        assert_eq!(p.roles, vec!["ops".to_string()]);
        assert_eq!(p.path_account(), "acme");
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut p = profile();
        p.account.clear();
        assert!(p.validate().is_err());

        let mut p = profile();
        p.key_id.clear();
        assert!(p.validate().is_err());

        let mut p = profile();
        p.url = "ftp://cloudapi.example.com".to_string();
        assert!(p.validate().is_err());

        let mut p = profile();
        p.url = "not a url".to_string();
        assert!(p.validate().is_err());

        assert!(profile().validate().is_ok());
    }

    #[test]
    fn test_cache_slug() {
        let mut p = profile();
        assert_eq!(p.cache_slug(), "alice@cloudapi.example.com");
        p.url = "http://127.0.0.1:8080/".to_string();
        assert_eq!(p.cache_slug(), "alice@127.0.0.1_8080");
    }

    #[test]
    fn test_from_file_defaults_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("east.json");
        std::fs::write(
            &path,
            r#"{"url":"https://x.example.com","account":"a","keyId":"k"}"#,
        )
        .expect("write");
        let p = Profile::from_file(&path).expect("load");
        assert_eq!(p.name.as_deref(), Some("east"));
    }

    #[test]
    fn test_client_config_defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.accept_version, "~8||~7");
        assert!(cfg.user_agent.starts_with("triton/"));
        assert!(cfg.connection_pooling);
        assert!(!ClientConfig::for_cli().connection_pooling);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_cache_dir_layout() {
        let dir = cache_dir(Path::new("/cfg"), &profile());
        assert_eq!(dir, PathBuf::from("/cfg/cache/alice@cloudapi.example.com"));
    }
}
