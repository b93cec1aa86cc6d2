use reqwest::Method;
use serde_json::json;

use super::{CloudApi, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{
    CreateFabricNetworkOptions, CreateFabricVlanOptions, FabricVlan, Network, NetworkIp,
};

impl CloudApi {
    /// `GET /:account/networks`.
    pub async fn list_networks(&self) -> Result<Vec<Network>> {
        self.get_json(&self.path(&["networks"]), QueryParams::new()).await
    }

    /// `GET /:account/networks/:id`.
    pub async fn get_network(&self, id: &str) -> Result<Network> {
        self.get_json(&self.path(&["networks", id]), QueryParams::new())
            .await
    }

    /// `GET /:account/fabrics/default/vlans`.
    pub async fn list_fabric_vlans(&self) -> Result<Vec<FabricVlan>> {
        self.get_json(
            &self.path(&["fabrics", "default", "vlans"]),
            QueryParams::new(),
        )
        .await
    }

    /// `GET /:account/fabrics/default/vlans/:vlan_id`.
    pub async fn get_fabric_vlan(&self, vlan_id: u16) -> Result<FabricVlan> {
        let vlan = vlan_id.to_string();
        self.get_json(
            &self.path(&["fabrics", "default", "vlans", &vlan]),
            QueryParams::new(),
        )
        .await
    }

    /// `POST /:account/fabrics/default/vlans`.
    pub async fn create_fabric_vlan(&self, options: &CreateFabricVlanOptions) -> Result<FabricVlan> {
        self.send_json(
            Method::POST,
            &self.path(&["fabrics", "default", "vlans"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `DELETE /:account/fabrics/default/vlans/:vlan_id`.
    pub async fn delete_fabric_vlan(&self, vlan_id: u16) -> Result<()> {
        let vlan = vlan_id.to_string();
        self.send_empty(
            Method::DELETE,
            &self.path(&["fabrics", "default", "vlans", &vlan]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `GET /:account/fabrics/default/vlans/:vlan_id/networks`.
    pub async fn list_fabric_networks(&self, vlan_id: u16) -> Result<Vec<Network>> {
        let vlan = vlan_id.to_string();
        self.get_json(
            &self.path(&["fabrics", "default", "vlans", &vlan, "networks"]),
            QueryParams::new(),
        )
        .await
    }

    /// `POST /:account/fabrics/default/vlans/:vlan_id/networks`.
    pub async fn create_fabric_network(
        &self,
        vlan_id: u16,
        options: &CreateFabricNetworkOptions,
    ) -> Result<Network> {
        let vlan = vlan_id.to_string();
        self.send_json(
            Method::POST,
            &self.path(&["fabrics", "default", "vlans", &vlan, "networks"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `DELETE /:account/fabrics/default/vlans/:vlan_id/networks/:id`.
    pub async fn delete_fabric_network(&self, vlan_id: u16, id: &str) -> Result<()> {
        let vlan = vlan_id.to_string();
        self.send_empty(
            Method::DELETE,
            &self.path(&["fabrics", "default", "vlans", &vlan, "networks", id]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `GET /:account/networks/:id/ips`.
    pub async fn list_network_ips(&self, network: &str) -> Result<Vec<NetworkIp>> {
        self.get_json(&self.path(&["networks", network, "ips"]), QueryParams::new())
            .await
    }

    /// `GET /:account/networks/:id/ips/:ip`.
    pub async fn get_network_ip(&self, network: &str, ip: &str) -> Result<NetworkIp> {
        self.get_json(
            &self.path(&["networks", network, "ips", ip]),
            QueryParams::new(),
        )
        .await
    }

    /// `PUT /:account/networks/:id/ips/:ip`: reserves or releases an address.
    pub async fn update_network_ip(
        &self,
        network: &str,
        ip: &str,
        reserved: bool,
    ) -> Result<NetworkIp> {
        self.send_json(
            Method::PUT,
            &self.path(&["networks", network, "ips", ip]),
            QueryParams::new(),
            Some(json!({ "reserved": reserved })),
        )
        .await
    }
}
