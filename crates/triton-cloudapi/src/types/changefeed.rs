use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Extra;
use crate::error::{Error, Result};

/// Sub-resources a change-feed subscription may name.
pub const VALID_SUB_RESOURCES: &[&str] = &[
    "alias",
    "customer_metadata",
    "destroyed",
    "nics",
    "owner_uuid",
    "server_uuid",
    "state",
    "tags",
];

/// First frame sent on the change-feed websocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFeedSubscription {
    /// Resource kind; always `vm`.
    pub resource: String,
    /// Sub-resources to watch.
    pub sub_resources: Vec<String>,
    /// Restrict to these instance UUIDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vms: Option<Vec<String>>,
}

impl ChangeFeedSubscription {
    /// Watches every sub-resource of `vm`, optionally for some instances.
    #[must_use]
    pub fn all(vms: Option<Vec<String>>) -> Self {
        Self {
            resource: "vm".to_string(),
            sub_resources: VALID_SUB_RESOURCES.iter().map(|s| (*s).to_string()).collect(),
            vms: vms.filter(|v| !v.is_empty()),
        }
    }

    /// Watches the given sub-resources.
    ///
    /// # Errors
    ///
    /// Returns a `Usage` error naming the first unknown sub-resource.
    pub fn new(sub_resources: Vec<String>, vms: Option<Vec<String>>) -> Result<Self> {
        if let Some(bad) = sub_resources
            .iter()
            .find(|s| !VALID_SUB_RESOURCES.contains(&s.as_str()))
        {
            return Err(Error::usage(format!(
                "invalid change-feed sub-resource \"{bad}\" (valid: {})",
                VALID_SUB_RESOURCES.join(", ")
            )));
        }
        if sub_resources.is_empty() {
            return Ok(Self::all(vms));
        }
        Ok(Self {
            resource: "vm".to_string(),
            sub_resources,
            vms: vms.filter(|v| !v.is_empty()),
        })
    }
}

/// What changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeKind {
    /// Resource kind (`vm`).
    #[serde(default)]
    pub resource: String,
    /// Sub-resources touched.
    #[serde(default)]
    pub sub_resources: Vec<String>,
}

/// One change-feed event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFeedEvent {
    /// Publication time (milliseconds since the epoch, as text or number).
    #[serde(default)]
    pub published: Value,
    /// What changed.
    #[serde(default)]
    pub change_kind: ChangeKind,
    /// State of the resource after the change.
    #[serde(default)]
    pub resource_state: Value,
    /// Changed resource UUID.
    #[serde(default)]
    pub changed_resource_id: String,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscription_wire_shape() {
        let sub = ChangeFeedSubscription::new(vec!["state".to_string()], Some(vec!["abc".to_string()]))
            .expect("valid");
        assert_eq!(
            serde_json::to_value(&sub).expect("serialize"),
            json!({"resource": "vm", "subResources": ["state"], "vms": ["abc"]})
        );
        let all = ChangeFeedSubscription::new(Vec::new(), None).expect("valid");
        assert_eq!(all.sub_resources.len(), VALID_SUB_RESOURCES.len());
        assert!(serde_json::to_value(&all).expect("serialize").get("vms").is_none());
    }

    #[test]
    fn test_subscription_rejects_unknown() {
        let err = ChangeFeedSubscription::new(vec!["disks".to_string()], None).expect_err("invalid");
        assert_eq!(err.name(), "UsageError");
    }

    #[test]
    fn test_event_parse() {
        let ev: ChangeFeedEvent = serde_json::from_value(json!({
            "published": "1700000000000",
            "changeKind": {"resource": "vm", "subResources": ["state"]},
            "resourceState": "stopped",
            "changedResourceId": "b4f0b46c-1111-4222-8333-444444444444"
        }))
        .expect("event");
        assert_eq!(ev.change_kind.sub_resources, vec!["state".to_string()]);
        assert_eq!(ev.resource_state, json!("stopped"));
    }
}
