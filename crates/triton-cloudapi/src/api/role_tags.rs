use std::fmt;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use super::CloudApi;
use crate::error::{Error, Result};
use crate::query::{QueryParams, encode_segment};
use crate::wire::RequestOptions;

/// Collections whose resources accept role tags.
pub const ROLE_TAG_COLLECTIONS: &[&str] = &[
    "machines",
    "images",
    "packages",
    "networks",
    "fwrules",
    "keys",
    "users",
    "roles",
    "policies",
    "datacenters",
    "services",
    "vpcs",
    "volumes",
];

const ROLE_TAG_HEADER: &str = "role-tag";

/// A role-taggable resource: a whole collection or one member of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTagTarget {
    collection: String,
    id: Option<String>,
}

impl RoleTagTarget {
    /// Target for `collection`, or for member `id` of it.
    ///
    /// # Errors
    ///
    /// Returns a `Usage` error if the collection does not accept role tags.
    pub fn new(collection: &str, id: Option<&str>) -> Result<Self> {
        if !ROLE_TAG_COLLECTIONS.contains(&collection) {
            return Err(Error::usage(format!(
                "resource type \"{collection}\" does not accept role tags (valid: {})",
                ROLE_TAG_COLLECTIONS.join(", ")
            )));
        }
        Ok(Self {
            collection: collection.to_string(),
            id: id.filter(|i| !i.is_empty()).map(str::to_string),
        })
    }

    /// Parses `/<account>/<collection>[/<id>]`, optionally as a full URL.
    ///
    /// `~` as the account means "the current account".
    ///
    /// # Errors
    ///
    /// Returns a `Usage` error for any other shape, for another account, or
    /// for a collection outside [`ROLE_TAG_COLLECTIONS`].
    pub fn parse(resource: &str, account: &str) -> Result<Self> {
        let invalid = || Error::usage(format!("invalid resource URL: \"{resource}\""));

        let path = match url::Url::parse(resource) {
            Ok(url) if url.has_host() => url.path().to_string(),
            _ => resource.to_string(),
        };
        let segments: Vec<&str> = path
            .strip_prefix('/')
            .ok_or_else(invalid)?
            .trim_end_matches('/')
            .split('/')
            .collect();

        let (owner, collection, id) = match segments.as_slice() {
            [owner, collection] => (*owner, *collection, None),
            [owner, collection, id] if !id.is_empty() => (*owner, *collection, Some(*id)),
            _ => return Err(invalid()),
        };
        if owner != "~" && owner != account && owner != encode_segment(account) {
            return Err(invalid());
        }
        if !ROLE_TAG_COLLECTIONS.contains(&collection) {
            return Err(invalid());
        }
        Self::new(collection, id)
    }

    /// Collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Member id, if this targets one resource.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for RoleTagTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{id}", self.collection),
            None => f.write_str(&self.collection),
        }
    }
}

impl CloudApi {
    fn role_tag_path(&self, target: &RoleTagTarget) -> String {
        match &target.id {
            Some(id) => self.path(&[&target.collection, id]),
            None => self.path(&[&target.collection]),
        }
    }

    /// Role tags on `target`, read from the `role-tag` header of its GET.
    pub async fn get_role_tags(&self, target: &RoleTagTarget) -> Result<Vec<String>> {
        let resp = self
            .request(
                Method::GET,
                &self.role_tag_path(target),
                RequestOptions::query(QueryParams::new()),
            )
            .await?;
        Ok(resp.header(ROLE_TAG_HEADER).map(split_role_tags).unwrap_or_default())
    }

    /// Replaces the role tags on `target`.
    ///
    /// Returns the tags the server reports, falling back to `roles`.
    pub async fn set_role_tags(&self, target: &RoleTagTarget, roles: &[String]) -> Result<Vec<String>> {
        debug!(target = %target, ?roles, "setting role tags");
        let resp = self
            .request(
                Method::PUT,
                &self.role_tag_path(target),
                RequestOptions::body(json!({ "role-tag": roles })),
            )
            .await?;
        let reported = resp
            .body
            .as_ref()
            .and_then(|b| b.get(ROLE_TAG_HEADER))
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            });
        Ok(reported.unwrap_or_else(|| roles.to_vec()))
    }
}

fn split_role_tags(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/alice/machines", "machines", None ; "collection")]
    #[test_case("/alice/machines/abc/", "machines", Some("abc") ; "member with slash")]
    #[test_case("/~/vpcs/v1", "vpcs", Some("v1") ; "tilde account")]
    #[test_case("https://cloudapi.example.com/alice/images/i1", "images", Some("i1") ; "full url")]
    fn test_parse_target(input: &str, collection: &str, id: Option<&str>) {
        let t = RoleTagTarget::parse(input, "alice").expect("valid target");
        assert_eq!(t.collection(), collection);
        assert_eq!(t.id(), id);
    }

    #[test_case("/bob/machines" ; "other account")]
    #[test_case("/alice/disks/abc" ; "not whitelisted")]
    #[test_case("alice/machines" ; "relative")]
    #[test_case("/alice/machines/abc/snapshots" ; "too deep")]
    #[test_case("/alice" ; "too shallow")]
    fn test_parse_rejects(input: &str) {
        let err = RoleTagTarget::parse(input, "alice").expect_err("invalid");
        assert_eq!(err.name(), "UsageError");
        assert!(err.to_string().contains("invalid resource URL"));
    }

    #[test]
    fn test_new_rejects_unknown_collection() {
        assert!(RoleTagTarget::new("disks", None).is_err());
        let t = RoleTagTarget::new("fwrules", Some("r1")).expect("valid");
        assert_eq!(t.to_string(), "fwrules/r1");
    }

    #[test]
    fn test_split_role_tags() {
        assert_eq!(split_role_tags("ops, dev,,"), vec!["ops", "dev"]);
        assert!(split_role_tags("").is_empty());
    }
}
