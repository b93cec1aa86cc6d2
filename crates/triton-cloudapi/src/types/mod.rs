//! CloudAPI resource records.
//!
//! Every record keeps fields it does not model in `extra`, so a value read
//! from the server serializes back without loss.

mod account;
mod changefeed;
mod fwrule;
mod image;
mod key;
mod machine;
mod network;
mod package;
mod rbac;
mod volume;
mod vpc;

pub use account::{Account, AccountConfig, ProvisioningLimit};
pub use changefeed::{ChangeFeedEvent, ChangeKind, ChangeFeedSubscription, VALID_SUB_RESOURCES};
pub use fwrule::{CreateFirewallRuleOptions, FirewallRule, UpdateFirewallRuleOptions};
pub use image::{CreateImageOptions, Image, ImportImageOptions, ListImagesOptions};
pub use key::{CreateKeyOptions, SshKey};
pub use machine::{
    AddNicOptions, AuditEntry, CreateDiskOptions, CreateMachineOptions, Disk, DiskSize,
    ListMachinesOptions, Machine, Nic, Snapshot, validate_tags,
};
pub use network::{
    CreateFabricNetworkOptions, CreateFabricVlanOptions, FabricVlan, Network, NetworkIp,
};
pub use package::{ListPackagesOptions, Package};
pub use rbac::{
    CreatePolicyOptions, CreateRoleOptions, CreateUserOptions, Policy, Role, RoleMember, User,
};
pub use volume::{CreateVolumeOptions, ListVolumesOptions, Volume, VolumeSize};
pub use vpc::{CreateVpcOptions, Vpc};

/// Unmodelled fields of a record.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// A resource with a canonical id and an optional name.
pub trait Resource {
    /// Canonical id (usually a UUID).
    fn id(&self) -> &str;
    /// Human name, for kinds that have one.
    fn name(&self) -> Option<&str>;
}

macro_rules! impl_resource {
    ($ty:ty, id = $id:ident, name = $name:ident) => {
        impl $crate::types::Resource for $ty {
            fn id(&self) -> &str {
                &self.$id
            }
            fn name(&self) -> Option<&str> {
                Some(self.$name.as_str())
            }
        }
    };
    ($ty:ty, id = $id:ident, opt_name = $name:ident) => {
        impl $crate::types::Resource for $ty {
            fn id(&self) -> &str {
                &self.$id
            }
            fn name(&self) -> Option<&str> {
                self.$name.as_deref()
            }
        }
    };
    ($ty:ty, id = $id:ident) => {
        impl $crate::types::Resource for $ty {
            fn id(&self) -> &str {
                &self.$id
            }
            fn name(&self) -> Option<&str> {
                None
            }
        }
    };
}
pub(crate) use impl_resource;
