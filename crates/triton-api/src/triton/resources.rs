//! Lookups for the remaining kinds, VPC updates, keys and role tags.

use serde_json::{Map, Value};
use tracing::info;
use triton_cloudapi::types::{
    FirewallRule, ListPackagesOptions, Network, Package, Policy, Role, SshKey, User, Vpc,
};
use triton_cloudapi::{Result, RoleTagTarget};

use super::{Lookup, TritonApi};
use crate::kv::{VPC_UPDATE_FIELDS, validate_update};
use crate::resolver::{ResourceKind, remap_not_found};

/// Lookup for kinds whose list endpoint takes no name filter: the full
/// listing is the candidate set.
macro_rules! full_list_lookup {
    ($ty:ty, $kind:expr, get = |$api:ident, $id:ident| $get:expr, list = |$lapi:ident| $list:expr) => {
        impl Lookup for $ty {
            const KIND: ResourceKind = $kind;

            async fn get_by_id($api: &TritonApi, $id: &str) -> Result<Self> {
                $get.await
            }

            async fn list_candidates($lapi: &TritonApi, _query: &str) -> Result<Vec<Self>> {
                $list.await
            }
        }
    };
}

full_list_lookup!(
    Package,
    ResourceKind::Package,
    get = |api, id| api.cloudapi.get_package(id),
    list = |api| api.cloudapi.list_packages(&ListPackagesOptions::default())
);
full_list_lookup!(
    Network,
    ResourceKind::Network,
    get = |api, id| api.cloudapi.get_network(id),
    list = |api| api.cloudapi.list_networks()
);
full_list_lookup!(
    Vpc,
    ResourceKind::Vpc,
    get = |api, id| api.cloudapi.get_vpc(id),
    list = |api| api.cloudapi.list_vpcs()
);
full_list_lookup!(
    FirewallRule,
    ResourceKind::FirewallRule,
    get = |api, id| api.cloudapi.get_firewall_rule(id),
    list = |api| api.cloudapi.list_firewall_rules()
);
full_list_lookup!(
    User,
    ResourceKind::User,
    get = |api, id| api.cloudapi.get_user(id, false),
    list = |api| api.cloudapi.list_users()
);
full_list_lookup!(
    Role,
    ResourceKind::Role,
    get = |api, id| api.cloudapi.get_role(id),
    list = |api| api.cloudapi.list_roles()
);
full_list_lookup!(
    Policy,
    ResourceKind::Policy,
    get = |api, id| api.cloudapi.get_policy(id),
    list = |api| api.cloudapi.list_policies()
);

impl TritonApi {
    /// Resolves a package identifier.
    pub async fn get_package(&self, ident: &str) -> Result<Package> {
        self.resolve(ident).await
    }

    /// Resolves a network identifier.
    pub async fn get_network(&self, ident: &str) -> Result<Network> {
        self.resolve(ident).await
    }

    /// Resolves a VPC identifier.
    pub async fn get_vpc(&self, ident: &str) -> Result<Vpc> {
        self.resolve(ident).await
    }

    /// Updates VPC attributes after checking them against the VPC update
    /// vocabulary.
    pub async fn update_vpc(&self, ident: &str, fields: &Map<String, Value>) -> Result<Vpc> {
        validate_update(fields, VPC_UPDATE_FIELDS)?;
        let vpc = self.get_vpc(ident).await?;
        let updated = self.cloudapi.update_vpc(&vpc.id, fields).await?;
        info!(id = %vpc.id, "vpc updated");
        Ok(updated)
    }

    /// Resolves a firewall rule by id or short id.
    pub async fn get_firewall_rule(&self, ident: &str) -> Result<FirewallRule> {
        self.resolve(ident).await
    }

    /// Resolves an RBAC user by id, short id or login.
    pub async fn get_user(&self, ident: &str) -> Result<User> {
        self.resolve(ident).await
    }

    /// Resolves an RBAC role.
    pub async fn get_role(&self, ident: &str) -> Result<Role> {
        self.resolve(ident).await
    }

    /// Resolves an RBAC policy.
    pub async fn get_policy(&self, ident: &str) -> Result<Policy> {
        self.resolve(ident).await
    }

    /// Fetches an account key by name or fingerprint.
    pub async fn get_key(&self, ident: &str) -> Result<SshKey> {
        self.cloudapi
            .get_key(ident)
            .await
            .map_err(|e| remap_not_found(ResourceKind::Key, ident, e))
    }

    async fn role_tag_target(&self, kind: ResourceKind, ident: &str) -> Result<RoleTagTarget> {
        let id = self.resolve_id(kind, ident).await?;
        RoleTagTarget::new(kind.collection(), Some(&id))
    }

    /// Role tags of the `kind` resource named by `ident`.
    pub async fn get_role_tags(&self, kind: ResourceKind, ident: &str) -> Result<Vec<String>> {
        let target = self.role_tag_target(kind, ident).await?;
        self.cloudapi.get_role_tags(&target).await
    }

    /// Replaces the role tags of the `kind` resource named by `ident`.
    pub async fn set_role_tags(
        &self,
        kind: ResourceKind,
        ident: &str,
        roles: &[String],
    ) -> Result<Vec<String>> {
        let target = self.role_tag_target(kind, ident).await?;
        let tags = self.cloudapi.set_role_tags(&target, roles).await?;
        info!(%target, ?tags, "role tags set");
        Ok(tags)
    }
}
