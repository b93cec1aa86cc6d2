//! Profile assembly and key loading.
//!
//! Precedence, highest first: command-line flags, `TRITON_*` environment
//! variables (read by clap), `SDC_*` environment variables, then the named
//! profile file.

use std::path::Path;

use tracing::debug;
use triton_auth::{AgentClient, KeyPair};
use triton_cloudapi::{Profile, profiles_dir};

use crate::cli::ProfileArgs;
use crate::error::CliError;

/// Legacy variables consulted when the `TRITON_*` ones are unset.
const SDC_URL: &str = "SDC_URL";
const SDC_ACCOUNT: &str = "SDC_ACCOUNT";
const SDC_USER: &str = "SDC_USER";
const SDC_KEY_ID: &str = "SDC_KEY_ID";
const SDC_TESTING: &str = "SDC_TESTING";

/// Builds the effective profile.
///
/// `env` looks up environment variables; `config_dir` holds `profiles.d`.
pub fn resolve_profile<E>(args: &ProfileArgs, config_dir: &Path, env: E) -> Result<Profile, CliError>
where
    E: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| env(name).filter(|v| !v.is_empty());

    let mut profile = match &args.profile {
        Some(name) => {
            let path = profiles_dir(config_dir).join(format!("{name}.json"));
            debug!(path = %path.display(), "loading profile");
            Profile::from_file(&path)?
        }
        None => Profile {
            name: Some("env".to_string()),
            ..Profile::default()
        },
    };

    if let Some(url) = args.url.clone().or_else(|| lookup(SDC_URL)) {
        profile.url = url;
    }
    if let Some(account) = args.account.clone().or_else(|| lookup(SDC_ACCOUNT)) {
        profile.account = account;
    }
    if let Some(user) = args.user.clone().or_else(|| lookup(SDC_USER)) {
        profile.user = Some(user);
    }
    if let Some(key_id) = args.key_id.clone().or_else(|| lookup(SDC_KEY_ID)) {
        profile.key_id = key_id;
    }
    if let Some(key_file) = &args.key_file {
        profile.key_file = Some(key_file.clone());
    }
    if args.insecure || lookup(SDC_TESTING).is_some() {
        profile.insecure = true;
    }
    if let Some(act_as) = &args.act_as {
        profile.act_as_account = Some(act_as.clone());
    }
    if !args.role.is_empty() {
        profile.roles.clone_from(&args.role);
    }

    if args.profile.is_none() && (profile.url.is_empty() || profile.account.is_empty()) {
        return Err(CliError::Config(
            "no profile: pass --profile, or set TRITON_URL, TRITON_ACCOUNT and TRITON_KEY_ID"
                .to_string(),
        ));
    }
    profile.validate()?;
    Ok(profile)
}

/// Loads the signing key named by the profile: the key file if one is
/// set, otherwise the matching ssh-agent identity.
pub async fn load_key(profile: &Profile) -> Result<KeyPair, CliError> {
    let key = match &profile.key_file {
        Some(path) => {
            let key = KeyPair::from_file(path)?;
            if key.is_locked() {
                return Err(CliError::Config(format!(
                    "key file {} is encrypted; load it into ssh-agent instead",
                    path.display()
                )));
            }
            if !key.matches(&profile.key_id) {
                return Err(CliError::Config(format!(
                    "key file {} does not match key id {}",
                    path.display(),
                    profile.key_id
                )));
            }
            key
        }
        None => KeyPair::from_agent(AgentClient::from_env()?, &profile.key_id).await?,
    };
    debug!(fingerprint = key.fingerprint(), agent = key.is_agent(), "signing key loaded");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn profile_from_flags() {
        let args = ProfileArgs {
            url: Some("https://cloudapi.example.com".into()),
            account: Some("alice".into()),
            key_id: Some("SHA256:abc".into()),
            role: vec!["ops".into()],
            ..ProfileArgs::default()
        };
        let p = resolve_profile(&args, Path::new("/nonexistent"), env(&[])).expect("profile");
        assert_eq!(p.account, "alice");
        assert_eq!(p.roles, vec!["ops".to_string()]);
        assert!(!p.insecure);
    }

    #[test]
    fn sdc_variables_are_fallbacks() {
        let args = ProfileArgs {
            account: Some("alice".into()),
            ..ProfileArgs::default()
        };
        let vars = env(&[
            ("SDC_URL", "https://sdc.example.com"),
            ("SDC_ACCOUNT", "ignored"),
            ("SDC_KEY_ID", "aa:bb"),
            ("SDC_TESTING", "1"),
        ]);
        let p = resolve_profile(&args, Path::new("/nonexistent"), vars).expect("profile");
        assert_eq!(p.url, "https://sdc.example.com");
        assert_eq!(p.account, "alice");
        assert_eq!(p.key_id, "aa:bb");
        assert!(p.insecure);
    }

    #[test]
    fn named_profile_with_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let profiles = dir.path().join("profiles.d");
        std::fs::create_dir_all(&profiles).expect("mkdir");
        std::fs::write(
            profiles.join("east.json"),
            r#"{"url":"https://east.example.com","account":"alice","keyId":"aa:bb"}"#,
        )
        .expect("write");

        let args = ProfileArgs {
            profile: Some("east".into()),
            user: Some("bob".into()),
            ..ProfileArgs::default()
        };
        let p = resolve_profile(&args, dir.path(), env(&[])).expect("profile");
        assert_eq!(p.name.as_deref(), Some("east"));
        assert_eq!(p.url, "https://east.example.com");
        assert_eq!(p.user.as_deref(), Some("bob"));
    }

    #[test]
    fn missing_profile_is_config_error() {
        let err = resolve_profile(&ProfileArgs::default(), Path::new("/nonexistent"), env(&[]))
            .expect_err("nothing configured");
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn unknown_named_profile_fails() {
        let args = ProfileArgs {
            profile: Some("nope".into()),
            ..ProfileArgs::default()
        };
        assert!(resolve_profile(&args, Path::new("/nonexistent"), env(&[])).is_err());
    }
}
