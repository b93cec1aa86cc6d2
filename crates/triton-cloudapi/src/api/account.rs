use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::Value;

use super::{CloudApi, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{Account, AccountConfig, ProvisioningLimit};

impl CloudApi {
    /// `GET /--ping`: server liveness and version.
    pub async fn ping(&self) -> Result<Value> {
        let body: Option<Value> = self.get_json("/--ping", QueryParams::new()).await?;
        Ok(body.unwrap_or(Value::Null))
    }

    /// `GET /:account`.
    pub async fn get_account(&self) -> Result<Account> {
        self.get_json(&self.path(&[]), QueryParams::new()).await
    }

    /// `POST /:account` with the fields to change.
    pub async fn update_account(&self, fields: &serde_json::Map<String, Value>) -> Result<Account> {
        self.send_json(
            Method::POST,
            &self.path(&[]),
            QueryParams::new(),
            Some(Value::Object(fields.clone())),
        )
        .await
    }

    /// `GET /:account/config`.
    pub async fn get_config(&self) -> Result<AccountConfig> {
        self.get_json(&self.path(&["config"]), QueryParams::new()).await
    }

    /// `PUT /:account/config`.
    pub async fn update_config(&self, config: &AccountConfig) -> Result<AccountConfig> {
        self.send_json(
            Method::PUT,
            &self.path(&["config"]),
            QueryParams::new(),
            Some(to_body(config)?),
        )
        .await
    }

    /// `GET /:account/datacenters`: name to URL.
    pub async fn list_datacenters(&self) -> Result<BTreeMap<String, String>> {
        self.get_json(&self.path(&["datacenters"]), QueryParams::new())
            .await
    }

    /// `GET /:account/services`: name to URL.
    pub async fn list_services(&self) -> Result<BTreeMap<String, String>> {
        self.get_json(&self.path(&["services"]), QueryParams::new()).await
    }

    /// `GET /:account/limits`: provisioning limits.
    pub async fn get_account_limits(&self) -> Result<Vec<ProvisioningLimit>> {
        self.get_json(&self.path(&["limits"]), QueryParams::new()).await
    }
}
