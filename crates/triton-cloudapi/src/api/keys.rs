use reqwest::Method;

use super::{CloudApi, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{CreateKeyOptions, SshKey};

impl CloudApi {
    /// `GET /:account/keys`.
    pub async fn list_keys(&self) -> Result<Vec<SshKey>> {
        self.get_json(&self.path(&["keys"]), QueryParams::new()).await
    }

    /// `GET /:account/keys/:name-or-fingerprint`.
    pub async fn get_key(&self, name_or_fingerprint: &str) -> Result<SshKey> {
        self.get_json(&self.path(&["keys", name_or_fingerprint]), QueryParams::new())
            .await
    }

    /// `POST /:account/keys`.
    pub async fn create_key(&self, options: &CreateKeyOptions) -> Result<SshKey> {
        self.send_json(
            Method::POST,
            &self.path(&["keys"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `DELETE /:account/keys/:name-or-fingerprint`.
    pub async fn delete_key(&self, name_or_fingerprint: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["keys", name_or_fingerprint]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `GET /:account/users/:user/keys`.
    pub async fn list_user_keys(&self, user: &str) -> Result<Vec<SshKey>> {
        self.get_json(&self.path(&["users", user, "keys"]), QueryParams::new())
            .await
    }

    /// `GET /:account/users/:user/keys/:name-or-fingerprint`.
    pub async fn get_user_key(&self, user: &str, name_or_fingerprint: &str) -> Result<SshKey> {
        self.get_json(
            &self.path(&["users", user, "keys", name_or_fingerprint]),
            QueryParams::new(),
        )
        .await
    }

    /// `POST /:account/users/:user/keys`.
    pub async fn create_user_key(&self, user: &str, options: &CreateKeyOptions) -> Result<SshKey> {
        self.send_json(
            Method::POST,
            &self.path(&["users", user, "keys"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `DELETE /:account/users/:user/keys/:name-or-fingerprint`.
    pub async fn delete_user_key(&self, user: &str, name_or_fingerprint: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["users", user, "keys", name_or_fingerprint]),
            QueryParams::new(),
            None,
        )
        .await
    }
}
