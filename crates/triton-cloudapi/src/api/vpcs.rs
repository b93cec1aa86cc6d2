use reqwest::Method;
use serde_json::Value;

use super::{CloudApi, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{CreateVpcOptions, Network, Vpc};

impl CloudApi {
    /// `GET /:account/vpcs`.
    pub async fn list_vpcs(&self) -> Result<Vec<Vpc>> {
        self.get_json(&self.path(&["vpcs"]), QueryParams::new()).await
    }

    /// `GET /:account/vpcs/:id`.
    pub async fn get_vpc(&self, id: &str) -> Result<Vpc> {
        self.get_json(&self.path(&["vpcs", id]), QueryParams::new()).await
    }

    /// `POST /:account/vpcs`.
    pub async fn create_vpc(&self, options: &CreateVpcOptions) -> Result<Vpc> {
        self.send_json(
            Method::POST,
            &self.path(&["vpcs"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/vpcs/:id` with validated update fields.
    pub async fn update_vpc(&self, id: &str, fields: &serde_json::Map<String, Value>) -> Result<Vpc> {
        self.send_json(
            Method::POST,
            &self.path(&["vpcs", id]),
            QueryParams::new(),
            Some(Value::Object(fields.clone())),
        )
        .await
    }

    /// `DELETE /:account/vpcs/:id`.
    pub async fn delete_vpc(&self, id: &str) -> Result<()> {
        self.send_empty(Method::DELETE, &self.path(&["vpcs", id]), QueryParams::new(), None)
            .await
    }

    /// `GET /:account/vpcs/:id/networks`.
    pub async fn list_vpc_networks(&self, id: &str) -> Result<Vec<Network>> {
        self.get_json(&self.path(&["vpcs", id, "networks"]), QueryParams::new())
            .await
    }
}
