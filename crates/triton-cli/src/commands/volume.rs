//! Volume command implementation.

use std::io::Write;

use triton_api::{TritonApi, parse_volume_size};
use triton_cloudapi::types::{CreateVolumeOptions, ListVolumesOptions, Volume};

use crate::cli::VolumeCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat, short_id};

/// Volume command executor.
pub struct VolumeCommand<'a> {
    api: &'a TritonApi,
}

impl<'a> VolumeCommand<'a> {
    /// Create a new volume command.
    #[must_use]
    pub const fn new(api: &'a TritonApi) -> Self {
        Self { api }
    }

    /// Execute a volume subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &VolumeCommands,
    ) -> Result<(), CliError> {
        match command {
            VolumeCommands::List => {
                let volumes = self
                    .api
                    .cloudapi()
                    .list_volumes(&ListVolumesOptions::default())
                    .await?;
                format.write(writer, &volumes)?;
            }
            VolumeCommands::Get { ident } => {
                format.write(writer, &self.api.get_volume(ident).await?)?;
            }
            VolumeCommands::Create {
                name,
                size,
                networks,
                volume_type,
                wait,
            } => {
                let options = CreateVolumeOptions {
                    name: name.clone(),
                    size: size.as_deref().map(parse_volume_size).transpose()?,
                    networks: (!networks.is_empty()).then(|| networks.clone()),
                    volume_type: volume_type.clone(),
                    tags: None,
                };
                let volume = self.api.create_volume(&options, wait.options()).await?;
                let verb = if wait.wait { "Created" } else { "Creating" };
                report(writer, format, &volume, verb)?;
            }
            VolumeCommands::Delete { idents, wait } => {
                let volumes = self.api.delete_volumes(idents, wait.options()).await?;
                let verb = if wait.wait { "Deleted" } else { "Deleting" };
                for volume in &volumes {
                    report(writer, format, volume, verb)?;
                }
            }
        }
        Ok(())
    }
}

fn report<W: Write>(
    writer: &mut W,
    format: &OutputFormat,
    volume: &Volume,
    verb: &str,
) -> Result<(), CliError> {
    if format.is_json() {
        return format.write(writer, volume);
    }
    format.write(
        writer,
        &Message::success(format!(
            "{verb} volume {} ({})",
            volume.name,
            short_id(&volume.id)
        )),
    )
}
