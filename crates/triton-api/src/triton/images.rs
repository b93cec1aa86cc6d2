//! Image operations with the cached listing.

use serde_json::{Map, Value};
use tracing::{debug, info};
use triton_cloudapi::Result;
use triton_cloudapi::types::{Image, ListImagesOptions};

use super::{Lookup, TritonApi, merge_candidates};
use crate::cache::IMAGES_KEY;
use crate::kv::{IMAGE_UPDATE_FIELDS, validate_update};
use crate::resolver::{ResourceKind, image_name_matches, latest_published};
use crate::shortid::normalize_short_id;

impl Lookup for Image {
    const KIND: ResourceKind = ResourceKind::Image;

    async fn get_by_id(api: &TritonApi, id: &str) -> Result<Self> {
        if let Some(image) = api
            .cached_images()
            .await
            .and_then(|images| images.into_iter().find(|i| i.id == id))
        {
            debug!(id, "image served from cache");
            return Ok(image);
        }
        api.cloudapi.get_image(id).await
    }

    async fn list_candidates(api: &TritonApi, query: &str) -> Result<Vec<Self>> {
        let base = query.split_once('@').map_or(query, |(name, _)| name);
        let by_name = ListImagesOptions {
            name: Some(base.to_string()),
            ..ListImagesOptions::default()
        };
        let mut candidates = api.list_images(&by_name).await?;
        if !normalize_short_id(query).is_empty() {
            let all = api.list_images(&ListImagesOptions::default()).await?;
            merge_candidates(&mut candidates, all);
        }
        Ok(candidates)
    }

    fn name_matches(&self, query: &str) -> bool {
        image_name_matches(self, query)
    }

    fn tiebreak(matches: Vec<Self>) -> Option<Self> {
        latest_published(matches)
    }
}

impl TritonApi {
    async fn cached_images(&self) -> Option<Vec<Image>> {
        self.cache.as_ref()?.get_json(IMAGES_KEY, self.image_ttl).await
    }

    async fn store_images(&self, images: &[Image]) {
        if let Some(cache) = &self.cache {
            cache.put_json(IMAGES_KEY, images).await;
        }
    }

    /// Lists images. The unfiltered listing is served from and written to
    /// the artifact cache.
    pub async fn list_images(&self, options: &ListImagesOptions) -> Result<Vec<Image>> {
        let unfiltered = options.is_unfiltered();
        if unfiltered {
            if let Some(images) = self.cached_images().await {
                debug!(count = images.len(), "image listing served from cache");
                return Ok(images);
            }
        }
        let images = self.cloudapi.list_images(options).await?;
        if unfiltered {
            self.store_images(&images).await;
        }
        Ok(images)
    }

    /// Resolves an image identifier (`UUID`, short id, `name` or
    /// `name@version`).
    pub async fn get_image(&self, ident: &str) -> Result<Image> {
        self.resolve(ident).await
    }

    /// Updates image attributes after checking them against the image
    /// update vocabulary, then refreshes the cached copy.
    pub async fn update_image(&self, ident: &str, fields: &Map<String, Value>) -> Result<Image> {
        validate_update(fields, IMAGE_UPDATE_FIELDS)?;
        let image = self.get_image(ident).await?;
        self.cloudapi.update_image(&image.id, fields).await?;
        let updated = self.cloudapi.get_image(&image.id).await?;
        info!(id = %updated.id, "image updated");
        if let Some(mut images) = self.cached_images().await {
            if let Some(slot) = images.iter_mut().find(|i| i.id == updated.id) {
                *slot = updated.clone();
                self.store_images(&images).await;
            }
        }
        Ok(updated)
    }

    /// Deletes an image and drops it from the cached listing.
    pub async fn delete_image(&self, ident: &str) -> Result<Image> {
        let image = self.get_image(ident).await?;
        self.cloudapi.delete_image(&image.id).await?;
        info!(id = %image.id, name = %image.name_at_version(), "image deleted");
        if let Some(mut images) = self.cached_images().await {
            let before = images.len();
            images.retain(|i| i.id != image.id);
            if images.len() != before {
                self.store_images(&images).await;
            }
        }
        Ok(image)
    }
}
