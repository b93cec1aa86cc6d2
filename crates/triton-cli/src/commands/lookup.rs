//! List/get commands for packages, networks, firewall rules and keys.

use std::io::Write;

use triton_api::TritonApi;
use triton_cloudapi::types::ListPackagesOptions;

use crate::cli::LookupCommands;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Resource kinds served by [`LookupCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// Packages.
    Package,
    /// Networks.
    Network,
    /// Firewall rules.
    FirewallRule,
    /// Account SSH keys.
    Key,
}

/// Lookup command executor.
pub struct LookupCommand<'a> {
    api: &'a TritonApi,
    kind: LookupKind,
}

impl<'a> LookupCommand<'a> {
    /// Create a new lookup command for `kind`.
    #[must_use]
    pub const fn new(api: &'a TritonApi, kind: LookupKind) -> Self {
        Self { api, kind }
    }

    /// Execute a list or get subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &LookupCommands,
    ) -> Result<(), CliError> {
        let cloudapi = self.api.cloudapi();
        match (self.kind, command) {
            (LookupKind::Package, LookupCommands::List) => {
                let packages = cloudapi.list_packages(&ListPackagesOptions::default()).await?;
                format.write(writer, &packages)
            }
            (LookupKind::Package, LookupCommands::Get { ident }) => {
                format.write(writer, &self.api.get_package(ident).await?)
            }
            (LookupKind::Network, LookupCommands::List) => {
                format.write(writer, &cloudapi.list_networks().await?)
            }
            (LookupKind::Network, LookupCommands::Get { ident }) => {
                format.write(writer, &self.api.get_network(ident).await?)
            }
            (LookupKind::FirewallRule, LookupCommands::List) => {
                format.write(writer, &cloudapi.list_firewall_rules().await?)
            }
            (LookupKind::FirewallRule, LookupCommands::Get { ident }) => {
                format.write(writer, &self.api.get_firewall_rule(ident).await?)
            }
            (LookupKind::Key, LookupCommands::List) => {
                format.write(writer, &cloudapi.list_keys().await?)
            }
            (LookupKind::Key, LookupCommands::Get { ident }) => {
                format.write(writer, &self.api.get_key(ident).await?)
            }
        }
    }
}
