use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Extra, impl_resource};
use crate::error::{Error, Result};
use crate::query::QueryParams;

/// A virtual machine instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Machine {
    /// Instance UUID.
    pub id: String,
    /// Instance name (alias).
    #[serde(default)]
    pub name: String,
    /// Instance type (`smartmachine`, `virtualmachine`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    /// Brand (`joyent`, `lx`, `bhyve`, `kvm`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub state: String,
    /// Image UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Memory in MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// Disk in MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    /// Addresses.
    #[serde(default)]
    pub ips: Vec<String>,
    /// Primary address.
    #[serde(default, rename = "primaryIp", skip_serializing_if = "Option::is_none")]
    pub primary_ip: Option<String>,
    /// Network UUIDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<String>>,
    /// Tags.
    #[serde(default)]
    pub tags: BTreeMap<String, Value>,
    /// Customer metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
    /// Whether the firewall is enabled.
    #[serde(default)]
    pub firewall_enabled: bool,
    /// Whether deletion protection is on.
    #[serde(default)]
    pub deletion_protection: bool,
    /// Whether this is a Docker container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<bool>,
    /// Compute node UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_node: Option<String>,
    /// CNS DNS names; only present on single-instance GETs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_names: Option<Vec<String>>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(Machine, id = id, name = name);

impl Machine {
    /// True if the record carries `field` with a non-null value, as the
    /// server would spell it.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.get(field).cloned())
            .is_some_and(|v| !v.is_null())
    }
}

/// Filters for `ListMachines`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMachinesOptions {
    /// Exact name.
    pub name: Option<String>,
    /// Image UUID.
    pub image: Option<String>,
    /// State.
    pub state: Option<String>,
    /// Memory in MiB.
    pub memory: Option<u64>,
    /// Instance type.
    pub machine_type: Option<String>,
    /// Brand.
    pub brand: Option<String>,
    /// Docker containers only.
    pub docker: Option<bool>,
    /// Include destroyed instances.
    pub tombstone: Option<u64>,
    /// Tag filters (`tag.<key>=<value>`).
    pub tags: BTreeMap<String, String>,
    /// Caller-supplied page size; disables pagination.
    pub limit: Option<u64>,
    /// Starting offset.
    pub offset: Option<u64>,
}

impl ListMachinesOptions {
    /// Query parameters, without `limit`/`offset`.
    #[must_use]
    pub fn filter_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.insert_opt("name", self.name.as_deref())
            .insert_opt("image", self.image.as_deref())
            .insert_opt("state", self.state.as_deref())
            .insert_opt("memory", self.memory)
            .insert_opt("type", self.machine_type.as_deref())
            .insert_opt("brand", self.brand.as_deref())
            .insert_opt("docker", self.docker)
            .insert_opt("tombstone", self.tombstone);
        for (k, v) in &self.tags {
            q.insert(format!("tag.{k}"), v.clone());
        }
        q
    }
}

/// Body of `CreateMachine`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateMachineOptions {
    /// Instance name.
    pub name: Option<String>,
    /// Image UUID.
    pub image: String,
    /// Package UUID or name.
    pub package: String,
    /// Network UUIDs.
    pub networks: Option<Vec<String>>,
    /// Affinity rules.
    pub affinity: Option<Vec<String>>,
    /// Customer metadata (`metadata.<key>`).
    pub metadata: BTreeMap<String, Value>,
    /// Tags (`tag.<key>`).
    pub tags: BTreeMap<String, Value>,
    /// Enable the firewall.
    pub firewall_enabled: Option<bool>,
    /// Enable deletion protection.
    pub deletion_protection: Option<bool>,
    /// Volumes to mount.
    pub volumes: Option<Vec<Value>>,
    /// Extra top-level fields passed through.
    pub extra: Extra,
}

impl CreateMachineOptions {
    /// Wire body with metadata and tags flattened into dotted keys.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = self.extra.clone();
        if let Some(name) = &self.name {
            body.insert("name".into(), Value::String(name.clone()));
        }
        body.insert("image".into(), Value::String(self.image.clone()));
        body.insert("package".into(), Value::String(self.package.clone()));
        if let Some(networks) = &self.networks {
            body.insert("networks".into(), networks.clone().into());
        }
        if let Some(affinity) = &self.affinity {
            body.insert("affinity".into(), affinity.clone().into());
        }
        if let Some(enabled) = self.firewall_enabled {
            body.insert("firewall_enabled".into(), Value::Bool(enabled));
        }
        if let Some(protect) = self.deletion_protection {
            body.insert("deletion_protection".into(), Value::Bool(protect));
        }
        if let Some(volumes) = &self.volumes {
            body.insert("volumes".into(), Value::Array(volumes.clone()));
        }
        for (k, v) in &self.metadata {
            body.insert(format!("metadata.{k}"), v.clone());
        }
        for (k, v) in &self.tags {
            body.insert(format!("tag.{k}"), v.clone());
        }
        Value::Object(body)
    }
}

/// An instance snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Snapshot name.
    pub name: String,
    /// State (`queued`, `creating`, `created`, `failed`, `deleted`).
    #[serde(default)]
    pub state: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

/// A network interface on an instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Nic {
    /// MAC address.
    pub mac: String,
    /// Whether this is the primary NIC.
    #[serde(default)]
    pub primary: bool,
    /// Address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Netmask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    /// Gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// State (`provisioning`, `running`, `stopped`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Network UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body of `AddNic`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AddNicOptions {
    /// Network UUID, or a network object (`{ipv4_uuid, ipv4_ips}`).
    pub network: Value,
}

/// A bhyve instance disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Disk {
    /// Disk UUID.
    pub id: String,
    /// Size in MiB.
    #[serde(default)]
    pub size: u64,
    /// Whether this is the boot disk.
    #[serde(default)]
    pub boot: bool,
    /// State (`creating`, `running`, `resizing`, `failed`, `deleted`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// PCI slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci_slot: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body of `CreateMachineDisk`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateDiskOptions {
    /// Size in MiB, or `remaining`.
    pub size: DiskSize,
    /// PCI slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci_slot: Option<String>,
}

/// Size of a new disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiskSize {
    /// Fixed size in MiB.
    Mebibytes(u64),
    /// All remaining space (`"remaining"` on the wire).
    #[default]
    Remaining,
}

impl Serialize for DiskSize {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Mebibytes(n) => s.serialize_u64(*n),
            Self::Remaining => s.serialize_str("remaining"),
        }
    }
}

impl<'de> Deserialize<'de> for DiskSize {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }
        match Repr::deserialize(d)? {
            Repr::Number(n) => Ok(Self::Mebibytes(n)),
            Repr::Text(t) if t == "remaining" => Ok(Self::Remaining),
            Repr::Text(t) => Err(serde::de::Error::custom(format!(
                "invalid disk size \"{t}\": expected MiB or \"remaining\""
            ))),
        }
    }
}

/// One audit-log entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Action name (`start`, `stop`, `provision`, ...).
    pub action: String,
    /// Whether the action succeeded (`yes`/`no`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    /// When the action happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Caller details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Value>,
    /// Action parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Checks that tag values are strings, numbers or booleans.
pub fn validate_tags(tags: &Map<String, Value>) -> Result<()> {
    for (k, v) in tags {
        if !(v.is_string() || v.is_number() || v.is_boolean()) {
            return Err(Error::usage(format!(
                "tag \"{k}\" must be a string, number or boolean, got {v}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_field() {
        let mut m = Machine {
            id: "b4f0b46c-0000-4000-8000-000000000000".to_string(),
            ..Machine::default()
        };
        assert!(!m.has_field("dns_names"));
        m.dns_names = Some(vec!["web.example".to_string()]);
        assert!(m.has_field("dns_names"));
        assert!(m.has_field("state"));
    }

    #[test]
    fn test_list_filter_query_tags() {
        let mut opts = ListMachinesOptions {
            name: Some("web".to_string()),
            limit: Some(5),
            ..ListMachinesOptions::default()
        };
        opts.tags.insert("role".to_string(), "db".to_string());
        let q = opts.filter_query();
        assert_eq!(q.get("name"), Some("web"));
        assert_eq!(q.get("tag.role"), Some("db"));
        assert_eq!(q.get("limit"), None);
    }

    #[test]
    fn test_create_body_flattens_metadata_and_tags() {
        let mut opts = CreateMachineOptions {
            name: Some("web0".to_string()),
            image: "img".to_string(),
            package: "pkg".to_string(),
            ..CreateMachineOptions::default()
        };
        opts.metadata.insert("user-script".to_string(), json!("#!/bin/sh"));
        opts.tags.insert("env".to_string(), json!("prod"));
        let body = opts.to_body();
        assert_eq!(body["metadata.user-script"], json!("#!/bin/sh"));
        assert_eq!(body["tag.env"], json!("prod"));
        assert_eq!(body["image"], json!("img"));
        assert!(body.get("networks").is_none());
    }

    #[test]
    fn test_disk_size_wire_shape() {
        let fixed = serde_json::to_value(CreateDiskOptions {
            size: DiskSize::Mebibytes(10240),
            pci_slot: None,
        })
        .expect("serialize");
        assert_eq!(fixed, json!({"size": 10240}));
        let rest = serde_json::to_value(CreateDiskOptions::default()).expect("serialize");
        assert_eq!(rest, json!({"size": "remaining"}));
        let parsed: CreateDiskOptions =
            serde_json::from_value(json!({"size": "remaining"})).expect("deserialize");
        assert_eq!(parsed.size, DiskSize::Remaining);
    }

    #[test]
    fn test_validate_tags() {
        let ok = json!({"a": "x", "b": 1, "c": true});
        assert!(validate_tags(ok.as_object().expect("object")).is_ok());
        let bad = json!({"a": {"nested": 1}});
        assert!(validate_tags(bad.as_object().expect("object")).is_err());
    }
}
