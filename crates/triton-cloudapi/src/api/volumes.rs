use reqwest::Method;
use serde_json::Value;

use super::{CloudApi, action_query, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{CreateVolumeOptions, ListVolumesOptions, Volume, VolumeSize};

impl CloudApi {
    /// `GET /:account/volumes`. Not paginated.
    pub async fn list_volumes(&self, options: &ListVolumesOptions) -> Result<Vec<Volume>> {
        self.get_json(
            &self.path(&["volumes"]),
            QueryParams::from_options(options)?,
        )
        .await
    }

    /// `GET /:account/volumes/:id`.
    pub async fn get_volume(&self, id: &str) -> Result<Volume> {
        self.get_json(&self.path(&["volumes", id]), QueryParams::new())
            .await
    }

    /// `POST /:account/volumes`.
    pub async fn create_volume(&self, options: &CreateVolumeOptions) -> Result<Volume> {
        self.send_json(
            Method::POST,
            &self.path(&["volumes"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/volumes/:id?action=update`.
    pub async fn update_volume(
        &self,
        id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<Volume> {
        self.send_json(
            Method::POST,
            &self.path(&["volumes", id]),
            action_query("update"),
            Some(Value::Object(fields.clone())),
        )
        .await
    }

    /// `DELETE /:account/volumes/:id`.
    pub async fn delete_volume(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["volumes", id]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `GET /:account/volumesizes`.
    pub async fn list_volume_sizes(&self, volume_type: Option<&str>) -> Result<Vec<VolumeSize>> {
        let mut q = QueryParams::new();
        q.insert_opt("type", volume_type);
        self.get_json(&self.path(&["volumesizes"]), q).await
    }
}
