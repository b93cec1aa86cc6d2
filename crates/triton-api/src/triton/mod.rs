//! The orchestrator: identifier resolution plus multi-step operations.
//!
//! [`TritonApi`] wraps a [`CloudApi`] and adds:
//! - resolution of user identifiers (UUID, short id, name, `name@version`)
//! - act-then-wait operations driven by [`crate::PollWaiter`]
//! - the image artifact cache
//! - fan-out over several identifiers

mod images;
mod instances;
mod resources;
mod volumes;

pub use instances::InstanceAction;

use std::time::Duration;

use tracing::debug;
use triton_cloudapi::types::Resource;
use triton_cloudapi::{CloudApi, Error, Result};

use crate::cache::{ArtifactCache, DEFAULT_IMAGE_TTL};
use crate::resolver::{ResourceKind, pick, remap_not_found};
use crate::shortid::is_uuid;

/// CloudAPI client with resolution, waits and caching.
#[derive(Debug, Clone)]
pub struct TritonApi {
    cloudapi: CloudApi,
    cache: Option<ArtifactCache>,
    image_ttl: Duration,
}

impl TritonApi {
    /// Wraps `cloudapi` without a cache.
    #[must_use]
    pub fn new(cloudapi: CloudApi) -> Self {
        Self {
            cloudapi,
            cache: None,
            image_ttl: DEFAULT_IMAGE_TTL,
        }
    }

    /// Uses `cache` for image listings.
    #[must_use]
    pub fn with_cache(mut self, cache: ArtifactCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Overrides how long cached image listings stay fresh.
    #[must_use]
    pub const fn with_image_cache_ttl(mut self, ttl: Duration) -> Self {
        self.image_ttl = ttl;
        self
    }

    /// The underlying typed client.
    #[must_use]
    pub fn cloudapi(&self) -> &CloudApi {
        &self.cloudapi
    }

    /// The artifact cache, if configured.
    #[must_use]
    pub fn cache(&self) -> Option<&ArtifactCache> {
        self.cache.as_ref()
    }

    /// Resolves `query` to one resource of type `T`.
    pub(crate) async fn resolve<T: Lookup>(&self, query: &str) -> Result<T> {
        let kind = T::KIND;
        if query.is_empty() {
            return Err(Error::usage(format!("empty {kind} identifier")));
        }
        if kind.rules().uuid_get && is_uuid(query) {
            debug!(%kind, id = query, "resolving by UUID");
            return T::get_by_id(self, query)
                .await
                .map_err(|e| remap_not_found(kind, query, e));
        }

        let candidates = T::list_candidates(self, query).await?;
        debug!(%kind, query, candidates = candidates.len(), "resolving from listing");
        pick(
            kind,
            query,
            candidates,
            |c| c.name_matches(query),
            Some(T::tiebreak),
        )
    }

    /// Canonical id of the `kind` resource named by `query`.
    pub async fn resolve_id(&self, kind: ResourceKind, query: &str) -> Result<String> {
        use triton_cloudapi::types::{
            FirewallRule, Image, Machine, Network, Package, Policy, Role, User, Volume, Vpc,
        };
        Ok(match kind {
            ResourceKind::Instance => self.resolve::<Machine>(query).await?.id,
            ResourceKind::Image => self.resolve::<Image>(query).await?.id,
            ResourceKind::Package => self.resolve::<Package>(query).await?.id,
            ResourceKind::Network => self.resolve::<Network>(query).await?.id,
            ResourceKind::Vpc => self.resolve::<Vpc>(query).await?.id,
            ResourceKind::FirewallRule => self.resolve::<FirewallRule>(query).await?.id,
            ResourceKind::Volume => self.resolve::<Volume>(query).await?.id,
            ResourceKind::User => self.resolve::<User>(query).await?.id,
            ResourceKind::Role => self.resolve::<Role>(query).await?.id,
            ResourceKind::Policy => self.resolve::<Policy>(query).await?.id,
            ResourceKind::Key => self.get_key(query).await?.name,
        })
    }
}

/// A resolvable resource type.
pub(crate) trait Lookup: Resource + Sized {
    const KIND: ResourceKind;

    /// Fetches one resource by canonical UUID.
    async fn get_by_id(api: &TritonApi, id: &str) -> Result<Self>;

    /// Lists the candidates `query` may match.
    async fn list_candidates(api: &TritonApi, query: &str) -> Result<Vec<Self>>;

    fn name_matches(&self, query: &str) -> bool {
        self.name() == Some(query)
    }

    fn tiebreak(_matches: Vec<Self>) -> Option<Self> {
        None
    }
}

/// Appends the members of `more` whose ids are not yet in `list`.
pub(crate) fn merge_candidates<T: Resource>(list: &mut Vec<T>, more: Vec<T>) {
    for item in more {
        if !list.iter().any(|c| c.id() == item.id()) {
            list.push(item);
        }
    }
}
