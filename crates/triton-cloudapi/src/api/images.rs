use reqwest::Method;
use serde_json::{Value, json};

use super::{CloudApi, action_query, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{CreateImageOptions, Image, ImportImageOptions, ListImagesOptions};

impl CloudApi {
    /// `GET /:account/images`. Not paginated.
    pub async fn list_images(&self, options: &ListImagesOptions) -> Result<Vec<Image>> {
        self.get_json(
            &self.path(&["images"]),
            QueryParams::from_options(options)?,
        )
        .await
    }

    /// `GET /:account/images/:id`.
    pub async fn get_image(&self, id: &str) -> Result<Image> {
        self.get_json(&self.path(&["images", id]), QueryParams::new())
            .await
    }

    /// `POST /:account/images`: creates an image from a stopped instance.
    pub async fn create_image_from_machine(&self, options: &CreateImageOptions) -> Result<Image> {
        self.send_json(
            Method::POST,
            &self.path(&["images"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/images/:id?action=update`.
    pub async fn update_image(
        &self,
        id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<Image> {
        self.send_json(
            Method::POST,
            &self.path(&["images", id]),
            action_query("update"),
            Some(Value::Object(fields.clone())),
        )
        .await
    }

    /// `DELETE /:account/images/:id`.
    pub async fn delete_image(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["images", id]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `POST /:account/images/:id?action=export`: exports to Manta.
    pub async fn export_image(&self, id: &str, manta_path: &str) -> Result<Value> {
        let mut q = action_query("export");
        q.insert("manta_path", manta_path);
        let body: Option<Value> = self
            .send_json(Method::POST, &self.path(&["images", id]), q, None)
            .await?;
        Ok(body.unwrap_or(Value::Null))
    }

    /// `POST /:account/images/:id?action=clone`: copies a shared image
    /// into the account.
    pub async fn clone_image(&self, id: &str) -> Result<Image> {
        self.send_json(
            Method::POST,
            &self.path(&["images", id]),
            action_query("clone"),
            None,
        )
        .await
    }

    /// `POST /:account/images/:id?action=share`.
    pub async fn share_image(&self, id: &str, account: &str) -> Result<Image> {
        self.send_json(
            Method::POST,
            &self.path(&["images", id]),
            action_query("share"),
            Some(json!({ "account": account })),
        )
        .await
    }

    /// `POST /:account/images/:id?action=unshare`.
    pub async fn unshare_image(&self, id: &str, account: &str) -> Result<Image> {
        self.send_json(
            Method::POST,
            &self.path(&["images", id]),
            action_query("unshare"),
            Some(json!({ "account": account })),
        )
        .await
    }

    /// `POST /:account/images?action=import-from-datacenter`.
    pub async fn import_image_from_datacenter(&self, options: &ImportImageOptions) -> Result<Image> {
        let mut q = action_query("import-from-datacenter");
        q.insert("datacenter", options.datacenter.as_str())
            .insert("id", options.id.as_str());
        self.send_json(Method::POST, &self.path(&["images"]), q, None)
            .await
    }
}
