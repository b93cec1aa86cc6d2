//! Volume operations.

use tracing::info;
use triton_cloudapi::types::{CreateVolumeOptions, ListVolumesOptions, Network, Volume};
use triton_cloudapi::{Error, Result};

use super::{Lookup, TritonApi, merge_candidates};
use crate::fanout::fan_out;
use crate::resolver::ResourceKind;
use crate::shortid::normalize_short_id;
use crate::wait::{PollWaiter, WaitOptions};

impl Lookup for Volume {
    const KIND: ResourceKind = ResourceKind::Volume;

    async fn get_by_id(api: &TritonApi, id: &str) -> Result<Self> {
        api.cloudapi.get_volume(id).await
    }

    async fn list_candidates(api: &TritonApi, query: &str) -> Result<Vec<Self>> {
        let by_name = ListVolumesOptions {
            name: Some(query.to_string()),
            ..ListVolumesOptions::default()
        };
        let mut candidates = api.cloudapi.list_volumes(&by_name).await?;
        if !normalize_short_id(query).is_empty() {
            let all = api
                .cloudapi
                .list_volumes(&ListVolumesOptions::default())
                .await?;
            merge_candidates(&mut candidates, all);
        }
        Ok(candidates)
    }
}

impl TritonApi {
    /// Resolves a volume identifier.
    pub async fn get_volume(&self, ident: &str) -> Result<Volume> {
        self.resolve(ident).await
    }

    /// Creates a volume; `options.networks` holds network identifiers.
    ///
    /// With `wait`, returns once the volume is `ready`; a `failed` volume
    /// is an error.
    pub async fn create_volume(
        &self,
        options: &CreateVolumeOptions,
        wait: Option<WaitOptions>,
    ) -> Result<Volume> {
        let mut resolved = options.clone();
        if let Some(idents) = &options.networks {
            let mut ids = Vec::with_capacity(idents.len());
            for ident in idents {
                ids.push(self.resolve::<Network>(ident).await?.id);
            }
            resolved.networks = Some(ids);
        }
        let volume = self.cloudapi.create_volume(&resolved).await?;
        info!(id = %volume.id, name = %volume.name, "volume creation started");
        let Some(wait) = wait else {
            return Ok(volume);
        };
        let id = volume.id.as_str();
        PollWaiter::new(wait)
            .wait(
                &format!("volume {id} to be ready"),
                move || async move {
                    let v = self.cloudapi.get_volume(id).await?;
                    if v.state.as_deref() == Some("failed") {
                        return Err(Error::internal(format!("creation of volume {id} failed")));
                    }
                    Ok(v)
                },
                |v| v.state.as_deref() == Some("ready"),
            )
            .await
    }

    /// Deletes a volume, optionally waiting until it is gone.
    pub async fn delete_volume(&self, ident: &str, wait: Option<WaitOptions>) -> Result<Volume> {
        let volume = self.get_volume(ident).await?;
        let id = volume.id.as_str();
        self.cloudapi.delete_volume(id).await?;
        info!(id, "volume delete requested");
        if let Some(wait) = wait {
            PollWaiter::new(wait)
                .wait(
                    &format!("volume {id} to be deleted"),
                    move || async move {
                        match self.cloudapi.get_volume(id).await {
                            Ok(v) => Ok(Some(v)),
                            Err(e) if e.is_not_found() || e.is_gone() => Ok(None),
                            Err(e) => Err(e),
                        }
                    },
                    |v: &Option<Volume>| {
                        v.as_ref()
                            .is_none_or(|v| v.state.as_deref() == Some("deleted"))
                    },
                )
                .await?;
        }
        Ok(volume)
    }

    /// Deletes every volume concurrently.
    pub async fn delete_volumes(
        &self,
        idents: &[String],
        wait: Option<WaitOptions>,
    ) -> Result<Vec<Volume>> {
        fan_out(idents.iter().map(|ident| self.delete_volume(ident, wait))).await
    }
}
