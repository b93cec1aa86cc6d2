//! Typed CloudAPI operations.
//!
//! [`CloudApi`] has one method per server endpoint. Each composes
//! `/<account>/<collection>[/<id>][/<sub>]`, folds options into a query,
//! and decodes the JSON body into a record from [`crate::types`].

mod account;
mod changefeed;
mod fwrules;
mod images;
mod keys;
mod machines;
mod networks;
mod packages;
mod rbac;
mod role_tags;
mod volumes;
mod vpcs;

pub use changefeed::ChangeFeed;
pub use machines::{DEFAULT_PAGE_SIZE, MachinePages};
pub use role_tags::{ROLE_TAG_COLLECTIONS, RoleTagTarget};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use triton_auth::{KeyPair, RequestSigner};

use crate::config::{ClientConfig, Profile};
use crate::error::Result;
use crate::query::{QueryParams, resource_path};
use crate::wire::{RequestOptions, WireClient, WireResponse};

/// Client for one account on one CloudAPI endpoint.
#[derive(Debug, Clone)]
pub struct CloudApi {
    wire: WireClient,
    account: String,
}

impl CloudApi {
    /// Builds the signer and wire client for `profile`.
    ///
    /// Requests are signed as the profile's login account (and sub-user);
    /// paths address the act-as account when one is set.
    pub fn new(profile: &Profile, config: &ClientConfig, key: KeyPair) -> Result<Self> {
        let signer = RequestSigner::new(profile.account.clone(), key).with_user(profile.user.clone());
        let wire = WireClient::new(profile, config, signer)?;
        Ok(Self::from_wire(wire, profile.path_account()))
    }

    /// Wraps an existing wire client.
    #[must_use]
    pub fn from_wire(wire: WireClient, account: impl Into<String>) -> Self {
        Self {
            wire,
            account: account.into(),
        }
    }

    /// Account addressed by request paths.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Underlying wire client.
    #[must_use]
    pub fn wire(&self) -> &WireClient {
        &self.wire
    }

    /// `/<account>/<segments...>`.
    #[must_use]
    pub fn path(&self, segments: &[&str]) -> String {
        resource_path(&self.account, segments)
    }

    /// Issues a raw request against this account.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<WireResponse> {
        self.wire.request(method, path, options).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: QueryParams,
    ) -> Result<T> {
        self.wire
            .request(Method::GET, path, RequestOptions::query(query))
            .await?
            .json()
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: QueryParams,
        body: Option<Value>,
    ) -> Result<T> {
        let options = RequestOptions {
            query,
            body,
            headers: Vec::new(),
        };
        self.wire.request(method, path, options).await?.json()
    }

    pub(crate) async fn send_empty(
        &self,
        method: Method,
        path: &str,
        query: QueryParams,
        body: Option<Value>,
    ) -> Result<()> {
        let options = RequestOptions {
            query,
            body,
            headers: Vec::new(),
        };
        self.wire.request(method, path, options).await?;
        Ok(())
    }
}

pub(crate) fn to_body<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| crate::error::Error::internal(format!("cannot serialize request body: {e}")))
}

pub(crate) fn action_query(action: &str) -> QueryParams {
    let mut q = QueryParams::new();
    q.insert("action", action);
    q
}
