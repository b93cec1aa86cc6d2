//! VPC command implementation.

use std::io::Write;

use triton_api::{TritonApi, VPC_UPDATE_FIELDS};

use super::read_update;
use crate::cli::VpcCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat, short_id};

/// VPC command executor.
pub struct VpcCommand<'a> {
    api: &'a TritonApi,
}

impl<'a> VpcCommand<'a> {
    /// Create a new VPC command.
    #[must_use]
    pub const fn new(api: &'a TritonApi) -> Self {
        Self { api }
    }

    /// Execute a VPC subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &VpcCommands,
    ) -> Result<(), CliError> {
        match command {
            VpcCommands::List => {
                let vpcs = self.api.cloudapi().list_vpcs().await?;
                format.write(writer, &vpcs)?;
            }
            VpcCommands::Get { ident } => {
                format.write(writer, &self.api.get_vpc(ident).await?)?;
            }
            VpcCommands::Update(args) => {
                let fields = read_update(args, VPC_UPDATE_FIELDS)?;
                let vpc = self.api.update_vpc(&args.ident, &fields).await?;
                if format.is_json() {
                    format.write(writer, &vpc)?;
                } else {
                    format.write(
                        writer,
                        &Message::success(format!("Updated VPC {} ({})", vpc.name, short_id(&vpc.id))),
                    )?;
                }
            }
            VpcCommands::Delete { ident } => {
                let vpc = self.api.get_vpc(ident).await?;
                self.api.cloudapi().delete_vpc(&vpc.id).await?;
                format.write(
                    writer,
                    &Message::success(format!("Deleted VPC {} ({})", vpc.name, short_id(&vpc.id))),
                )?;
            }
        }
        Ok(())
    }
}
