use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Extra, impl_resource};

/// A machine image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Image {
    /// Image UUID.
    pub id: String,
    /// Image name.
    pub name: String,
    /// Image version.
    #[serde(default)]
    pub version: String,
    /// Operating system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Image type (`zone-dataset`, `zvol`, `lx-dataset`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    /// Lifecycle state (`active`, `creating`, `failed`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Whether the image is public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    /// Owning account UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Publication timestamp (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accounts the image is shared with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<Vec<String>>,
    /// Image tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, Value>>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(Image, id = id, name = name);

impl Image {
    /// `name@version`.
    #[must_use]
    pub fn name_at_version(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Filters for `ListImages`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ListImagesOptions {
    /// Exact name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Operating system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Public or private images only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    /// State (`all` lists every state).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Owner UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Image type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
}

impl ListImagesOptions {
    /// True when no filter is set (the full listing).
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of `CreateImageFromMachine`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateImageOptions {
    /// Source instance UUID.
    pub machine: String,
    /// Image name.
    pub name: String,
    /// Image version.
    pub version: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Homepage URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// EULA URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eula: Option<String>,
    /// Accounts to share with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<Vec<String>>,
    /// Image tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, Value>>,
}

/// Arguments of `ImportImageFromDatacenter`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportImageOptions {
    /// Source datacenter name.
    pub datacenter: String,
    /// Image UUID in the source datacenter.
    pub id: String,
}
