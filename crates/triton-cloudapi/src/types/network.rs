use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Extra, impl_resource};

/// A network the account can provision on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Network {
    /// Network UUID.
    pub id: String,
    /// Network name.
    pub name: String,
    /// Whether the network is public.
    #[serde(default)]
    pub public: bool,
    /// Whether this is a fabric (overlay) network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabric: Option<bool>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// CIDR subnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    /// Gateway address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// First provisionable address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_start_ip: Option<String>,
    /// Last provisionable address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_end_ip: Option<String>,
    /// DNS resolvers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<Vec<String>>,
    /// Fabric VLAN id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(Network, id = id, name = name);

/// A fabric VLAN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FabricVlan {
    /// VLAN id (0-4095).
    pub vlan_id: u16,
    /// VLAN name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body of `CreateFabricVLAN`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateFabricVlanOptions {
    /// VLAN id (0-4095).
    pub vlan_id: u16,
    /// VLAN name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `CreateFabricNetwork`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateFabricNetworkOptions {
    /// Network name.
    pub name: String,
    /// CIDR subnet.
    pub subnet: String,
    /// First provisionable address.
    pub provision_start_ip: String,
    /// Last provisionable address.
    pub provision_end_ip: String,
    /// Gateway address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// DNS resolvers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<Vec<String>>,
    /// Static routes (`{subnet: gateway}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Value>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Provision a NAT zone on the gateway address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_nat: Option<bool>,
}

/// An address on a network.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkIp {
    /// The address.
    pub ip: String,
    /// Whether the address is reserved.
    #[serde(default)]
    pub reserved: bool,
    /// Whether the address is managed by the platform.
    #[serde(default)]
    pub managed: bool,
    /// Owning account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_uuid: Option<String>,
    /// Instance using the address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belongs_to_uuid: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}
