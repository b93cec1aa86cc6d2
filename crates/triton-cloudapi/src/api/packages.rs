use super::CloudApi;
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{ListPackagesOptions, Package};

impl CloudApi {
    /// `GET /:account/packages`.
    pub async fn list_packages(&self, options: &ListPackagesOptions) -> Result<Vec<Package>> {
        self.get_json(
            &self.path(&["packages"]),
            QueryParams::from_options(options)?,
        )
        .await
    }

    /// `GET /:account/packages/:name-or-id`.
    pub async fn get_package(&self, name_or_id: &str) -> Result<Package> {
        self.get_json(&self.path(&["packages", name_or_id]), QueryParams::new())
            .await
    }
}
