use reqwest::Method;

use super::{CloudApi, to_body};
use crate::error::Result;
use crate::query::QueryParams;
use crate::types::{CreateFirewallRuleOptions, FirewallRule, Machine, UpdateFirewallRuleOptions};

impl CloudApi {
    /// `GET /:account/fwrules`. Not paginated.
    pub async fn list_firewall_rules(&self) -> Result<Vec<FirewallRule>> {
        self.get_json(&self.path(&["fwrules"]), QueryParams::new()).await
    }

    /// `GET /:account/fwrules/:id`.
    pub async fn get_firewall_rule(&self, id: &str) -> Result<FirewallRule> {
        self.get_json(&self.path(&["fwrules", id]), QueryParams::new())
            .await
    }

    /// `POST /:account/fwrules`.
    pub async fn create_firewall_rule(
        &self,
        options: &CreateFirewallRuleOptions,
    ) -> Result<FirewallRule> {
        self.send_json(
            Method::POST,
            &self.path(&["fwrules"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/fwrules/:id`.
    pub async fn update_firewall_rule(
        &self,
        id: &str,
        options: &UpdateFirewallRuleOptions,
    ) -> Result<FirewallRule> {
        self.send_json(
            Method::POST,
            &self.path(&["fwrules", id]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/fwrules/:id/enable`.
    pub async fn enable_firewall_rule(&self, id: &str) -> Result<FirewallRule> {
        self.send_json(
            Method::POST,
            &self.path(&["fwrules", id, "enable"]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `POST /:account/fwrules/:id/disable`.
    pub async fn disable_firewall_rule(&self, id: &str) -> Result<FirewallRule> {
        self.send_json(
            Method::POST,
            &self.path(&["fwrules", id, "disable"]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `DELETE /:account/fwrules/:id`.
    pub async fn delete_firewall_rule(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["fwrules", id]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `GET /:account/fwrules/:id/machines`: instances a rule applies to.
    pub async fn list_firewall_rule_machines(&self, id: &str) -> Result<Vec<Machine>> {
        self.get_json(&self.path(&["fwrules", id, "machines"]), QueryParams::new())
            .await
    }

    /// `GET /:account/machines/:id/fwrules`: rules applying to an instance.
    pub async fn list_machine_firewall_rules(&self, machine: &str) -> Result<Vec<FirewallRule>> {
        self.get_json(&self.path(&["machines", machine, "fwrules"]), QueryParams::new())
            .await
    }
}
