//! Account and RBAC command implementation.

use std::io::Write;

use triton_api::{ResourceKind, TritonApi};

use crate::cli::RbacCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// RBAC command executor. Also serves `account`.
pub struct RbacCommand<'a> {
    api: &'a TritonApi,
}

impl<'a> RbacCommand<'a> {
    /// Create a new RBAC command.
    #[must_use]
    pub const fn new(api: &'a TritonApi) -> Self {
        Self { api }
    }

    /// Show the account record.
    pub async fn account<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let account = self.api.cloudapi().get_account().await?;
        format.write(writer, &account)
    }

    /// Execute an RBAC subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &RbacCommands,
    ) -> Result<(), CliError> {
        let cloudapi = self.api.cloudapi();
        match command {
            RbacCommands::Users => format.write(writer, &cloudapi.list_users().await?),
            RbacCommands::User { ident } => format.write(writer, &self.api.get_user(ident).await?),
            RbacCommands::Roles => format.write(writer, &cloudapi.list_roles().await?),
            RbacCommands::Role { ident } => format.write(writer, &self.api.get_role(ident).await?),
            RbacCommands::Policies => format.write(writer, &cloudapi.list_policies().await?),
            RbacCommands::Policy { ident } => {
                format.write(writer, &self.api.get_policy(ident).await?)
            }
            RbacCommands::RoleTags { kind, ident } => {
                let kind: ResourceKind = kind.parse()?;
                let tags = self.api.get_role_tags(kind, ident).await?;
                format.write(writer, &tags)
            }
            RbacCommands::SetRoleTags { kind, ident, roles } => {
                let kind: ResourceKind = kind.parse()?;
                let roles: Vec<String> = roles.iter().filter(|r| !r.is_empty()).cloned().collect();
                let tags = self.api.set_role_tags(kind, ident, &roles).await?;
                if format.is_json() {
                    format.write(writer, &tags)
                } else if tags.is_empty() {
                    format.write(writer, &Message::success(format!("Cleared role tags on {ident}")))
                } else {
                    format.write(
                        writer,
                        &Message::success(format!("Set role tags on {ident}: {}", tags.join(", "))),
                    )
                }
            }
        }
    }
}
