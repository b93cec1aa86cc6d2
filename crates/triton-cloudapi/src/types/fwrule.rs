use serde::{Deserialize, Serialize};

use super::{Extra, impl_resource};

/// A firewall rule. Rules have no names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FirewallRule {
    /// Rule UUID.
    pub id: String,
    /// Rule text, e.g. `FROM any TO all vms ALLOW tcp PORT 22`.
    pub rule: String,
    /// Whether the rule is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Global (operator) rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
    /// Whether matches are logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<bool>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(FirewallRule, id = id);

/// Body of `CreateFirewallRule`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateFirewallRuleOptions {
    /// Rule text.
    pub rule: String,
    /// Enable on creation.
    #[serde(default)]
    pub enabled: bool,
    /// Log matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<bool>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `UpdateFirewallRule`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateFirewallRuleOptions {
    /// New rule text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// New enabled state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// New log flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<bool>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
