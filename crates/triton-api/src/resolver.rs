//! Identifier resolution rules.
//!
//! A user may name a resource by full UUID, by short id (UUID prefix), by
//! name, or for images by `name@version`. [`ResourceKind::rules`] says which
//! shapes each kind supports and [`pick`] applies the decision table to a
//! candidate list:
//!
//! 1. exactly one name match wins;
//! 2. several name matches go to the kind's tiebreak, else are ambiguous;
//! 3. otherwise exactly one short-id match wins;
//! 4. no match is not-found, several are ambiguous.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use triton_cloudapi::types::{Image, Resource};
use triton_cloudapi::{Error, Result};

use crate::shortid::normalize_short_id;

/// Kinds of resolvable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Virtual machine instance.
    Instance,
    /// Machine image.
    Image,
    /// Instance package.
    Package,
    /// Network.
    Network,
    /// Virtual private cloud.
    Vpc,
    /// Firewall rule.
    FirewallRule,
    /// Shared volume.
    Volume,
    /// RBAC sub-user.
    User,
    /// RBAC role.
    Role,
    /// RBAC policy.
    Policy,
    /// Account SSH key.
    Key,
}

/// Identifier shapes a kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRules {
    /// A full UUID is fetched with one direct GET.
    pub uuid_get: bool,
    /// Candidates match by name.
    pub by_name: bool,
    /// Candidates match by short id.
    pub by_short_id: bool,
    /// The list endpoint can filter by `name=`.
    pub name_filter: bool,
    /// Several name matches are settled by a tiebreak instead of being
    /// ambiguous.
    pub tiebreak: bool,
}

impl ResourceKind {
    /// Every kind.
    pub const ALL: [Self; 11] = [
        Self::Instance,
        Self::Image,
        Self::Package,
        Self::Network,
        Self::Vpc,
        Self::FirewallRule,
        Self::Volume,
        Self::User,
        Self::Role,
        Self::Policy,
        Self::Key,
    ];

    /// Human name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Image => "image",
            Self::Package => "package",
            Self::Network => "network",
            Self::Vpc => "vpc",
            Self::FirewallRule => "firewall rule",
            Self::Volume => "volume",
            Self::User => "user",
            Self::Role => "role",
            Self::Policy => "policy",
            Self::Key => "key",
        }
    }

    /// CloudAPI collection holding this kind.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Instance => "machines",
            Self::Image => "images",
            Self::Package => "packages",
            Self::Network => "networks",
            Self::Vpc => "vpcs",
            Self::FirewallRule => "fwrules",
            Self::Volume => "volumes",
            Self::User => "users",
            Self::Role => "roles",
            Self::Policy => "policies",
            Self::Key => "keys",
        }
    }

    /// Resolution rules for this kind.
    #[must_use]
    pub const fn rules(self) -> KindRules {
        let listed = KindRules {
            uuid_get: true,
            by_name: true,
            by_short_id: true,
            name_filter: false,
            tiebreak: false,
        };
        match self {
            Self::Instance | Self::Volume => KindRules {
                name_filter: true,
                ..listed
            },
            Self::Image => KindRules {
                name_filter: true,
                tiebreak: true,
                ..listed
            },
            Self::FirewallRule => KindRules {
                by_name: false,
                ..listed
            },
            Self::Key => KindRules {
                uuid_get: false,
                by_name: true,
                by_short_id: false,
                name_filter: false,
                tiebreak: false,
            },
            Self::Package | Self::Network | Self::Vpc | Self::User | Self::Role | Self::Policy => {
                listed
            }
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "instance" | "inst" | "machine" | "vm" => Ok(Self::Instance),
            "image" | "img" => Ok(Self::Image),
            "package" | "pkg" => Ok(Self::Package),
            "network" | "net" => Ok(Self::Network),
            "vpc" => Ok(Self::Vpc),
            "fwrule" | "firewall-rule" => Ok(Self::FirewallRule),
            "volume" | "vol" => Ok(Self::Volume),
            "user" => Ok(Self::User),
            "role" => Ok(Self::Role),
            "policy" => Ok(Self::Policy),
            "key" => Ok(Self::Key),
            other => Err(Error::usage(format!("unknown resource type \"{other}\""))),
        }
    }
}

/// Applies the decision table to `candidates`.
///
/// `is_name_match` decides name matches (ignored when the kind has no
/// names); `tiebreak` settles several name matches.
///
/// # Errors
///
/// `ResourceNotFound` when nothing matches, `AmbiguousIdentifier` when
/// several candidates match and no tiebreak applies.
pub fn pick<T, N>(
    kind: ResourceKind,
    query: &str,
    candidates: Vec<T>,
    is_name_match: N,
    tiebreak: Option<fn(Vec<T>) -> Option<T>>,
) -> Result<T>
where
    T: Resource,
    N: Fn(&T) -> bool,
{
    let rules = kind.rules();
    let short = if rules.by_short_id {
        normalize_short_id(query)
    } else {
        String::new()
    };

    let (mut name_matches, rest): (Vec<T>, Vec<T>) = if rules.by_name {
        candidates.into_iter().partition(|c| is_name_match(c))
    } else {
        (Vec::new(), candidates)
    };

    match name_matches.len() {
        0 => {}
        1 => return Ok(name_matches.remove(0)),
        _ => {
            if let Some(tiebreak) = tiebreak.filter(|_| rules.tiebreak) {
                let ids = ids_of(&name_matches);
                return tiebreak(name_matches).ok_or_else(|| ambiguous(kind, query, ids));
            }
            return Err(ambiguous(kind, query, ids_of(&name_matches)));
        }
    }

    if short.is_empty() {
        return Err(not_found(kind, query));
    }
    let mut short_matches: Vec<T> = rest
        .into_iter()
        .filter(|c| c.id().starts_with(&short))
        .collect();
    match short_matches.len() {
        0 => Err(not_found(kind, query)),
        1 => Ok(short_matches.remove(0)),
        _ => Err(ambiguous(kind, query, ids_of(&short_matches))),
    }
}

fn ids_of<T: Resource>(items: &[T]) -> Vec<String> {
    items.iter().map(|i| i.id().to_string()).collect()
}

/// `ResourceNotFound` naming `kind` and `query`.
#[must_use]
pub fn not_found(kind: ResourceKind, query: &str) -> Error {
    Error::not_found(format!("no {kind} with id or name \"{query}\" was found"))
}

fn ambiguous(kind: ResourceKind, query: &str, ids: Vec<String>) -> Error {
    Error::ambiguous(
        format!(
            "{kind} \"{query}\" is ambiguous: it matches {} ({})",
            ids.len(),
            ids.join(", ")
        ),
        ids,
    )
}

/// Remaps a server not-found on a direct GET to `ResourceNotFound`.
#[must_use]
pub fn remap_not_found(kind: ResourceKind, query: &str, err: Error) -> Error {
    if err.is_not_found() {
        not_found(kind, query)
    } else {
        err
    }
}

/// Image name matching: `name@version` or plain `name`.
#[must_use]
pub fn image_name_matches(image: &Image, query: &str) -> bool {
    match query.split_once('@') {
        Some((name, version)) => image.name == name && image.version == version,
        None => image.name == query,
    }
}

/// Latest `published_at` among `images`.
pub fn latest_published(images: Vec<Image>) -> Option<Image> {
    images.into_iter().max_by(|a, b| {
        published(a)
            .cmp(&published(b))
            .then_with(|| a.published_at.cmp(&b.published_at))
    })
}

fn published(image: &Image) -> Option<DateTime<FixedOffset>> {
    image
        .published_at
        .as_deref()
        .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use triton_cloudapi::types::{FirewallRule, Machine};

    fn machine(id: &str, name: &str) -> Machine {
        Machine {
            id: id.to_string(),
            name: name.to_string(),
            ..Machine::default()
        }
    }

    fn image(id: &str, name: &str, version: &str, published_at: &str) -> Image {
        Image {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            published_at: Some(published_at.to_string()),
            ..Image::default()
        }
    }

    fn by_name(m: &Machine, q: &str) -> bool {
        m.name == q
    }

    const A: &str = "b4f0b46c-1111-4222-8333-444444444444";
    const B: &str = "b4f0b46d-1111-4222-8333-444444444444";
    const C: &str = "b4f0ffff-1111-4222-8333-444444444444";

    #[test]
    fn test_short_id_unique_prefix() {
        let found = pick(
            ResourceKind::Instance,
            "b4f0b46c",
            vec![machine(A, "a"), machine(B, "b")],
            |m| by_name(m, "b4f0b46c"),
            None,
        )
        .expect("unique");
        assert_eq!(found.id, A);
    }

    #[test]
    fn test_short_id_ambiguous() {
        let err = pick(
            ResourceKind::Instance,
            "b4f0",
            vec![machine(A, "a"), machine(B, "b"), machine(C, "c")],
            |m| by_name(m, "b4f0"),
            None,
        )
        .expect_err("ambiguous");
        assert_eq!(err.name(), "AmbiguousIdentifierError");
        assert!(matches!(err, Error::AmbiguousIdentifier { candidates, .. } if candidates.len() == 3));
    }

    #[test]
    fn test_name_beats_short_id() {
        let found = pick(
            ResourceKind::Instance,
            "b4f0b46d",
            vec![machine(A, "b4f0b46d"), machine(B, "b")],
            |m| by_name(m, "b4f0b46d"),
            None,
        )
        .expect("name match");
        assert_eq!(found.id, A);
    }

    #[test]
    fn test_duplicate_names_without_tiebreak_are_ambiguous() {
        let err = pick(
            ResourceKind::Instance,
            "web",
            vec![machine(A, "web"), machine(B, "web")],
            |m| by_name(m, "web"),
            None,
        )
        .expect_err("ambiguous");
        assert_eq!(err.name(), "AmbiguousIdentifierError");
    }

    #[test]
    fn test_not_found() {
        let err = pick(
            ResourceKind::Instance,
            "nope",
            vec![machine(A, "web")],
            |m| by_name(m, "nope"),
            None,
        )
        .expect_err("missing");
        assert!(err.is_not_found());
        assert_eq!(err.name(), "ResourceNotFoundError");
    }

    #[test]
    fn test_image_name_at_version_takes_latest() {
        let images = vec![
            image(A, "base-64", "18.4.0", "2018-10-01T00:00:00Z"),
            image(B, "base-64", "18.4.0", "2018-12-01T00:00:00Z"),
            image(C, "base-64", "19.1.0", "2019-03-01T00:00:00Z"),
        ];
        let found = pick(
            ResourceKind::Image,
            "base-64@18.4.0",
            images.clone(),
            |i| image_name_matches(i, "base-64@18.4.0"),
            Some(latest_published),
        )
        .expect("tiebreak");
        assert_eq!(found.id, B);

        let found = pick(
            ResourceKind::Image,
            "base-64",
            images,
            |i| image_name_matches(i, "base-64"),
            Some(latest_published),
        )
        .expect("latest by name");
        assert_eq!(found.id, C);
    }

    #[test]
    fn test_firewall_rules_have_no_names() {
        let rule = FirewallRule {
            id: A.to_string(),
            ..FirewallRule::default()
        };
        let found = pick(ResourceKind::FirewallRule, "b4f0b46c", vec![rule], |_| true, None)
            .expect("short id");
        assert_eq!(found.id, A);
    }

    #[test]
    fn test_kind_rules_table() {
        assert!(ResourceKind::Instance.rules().name_filter);
        assert!(ResourceKind::Image.rules().tiebreak);
        assert!(!ResourceKind::FirewallRule.rules().by_name);
        assert!(!ResourceKind::Key.rules().uuid_get);
        assert!(!ResourceKind::Package.rules().name_filter);
        for kind in ResourceKind::ALL {
            assert!(triton_cloudapi::ROLE_TAG_COLLECTIONS.contains(&kind.collection()));
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("vm".parse::<ResourceKind>().expect("alias"), ResourceKind::Instance);
        assert_eq!("fwrule".parse::<ResourceKind>().expect("alias"), ResourceKind::FirewallRule);
        assert!("disk".parse::<ResourceKind>().is_err());
    }
}
