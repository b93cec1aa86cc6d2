use serde::{Deserialize, Serialize};

use super::{Extra, impl_resource};

/// An instance size package.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Package {
    /// Package UUID.
    pub id: String,
    /// Package name.
    pub name: String,
    /// Memory in MiB.
    #[serde(default)]
    pub memory: u64,
    /// Disk in MiB.
    #[serde(default)]
    pub disk: u64,
    /// Swap in MiB.
    #[serde(default)]
    pub swap: u64,
    /// Virtual CPUs (0 for OS containers).
    #[serde(default)]
    pub vcpus: u64,
    /// Lightweight process cap.
    #[serde(default)]
    pub lwps: u64,
    /// Package version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Package group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this is the default package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(Package, id = id, name = name);

/// Filters for `ListPackages`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ListPackagesOptions {
    /// Exact name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Memory in MiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// Disk in MiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    /// Swap in MiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap: Option<u64>,
    /// Lightweight process cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lwps: Option<u64>,
    /// Virtual CPUs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<u64>,
    /// Version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}
