//! Image command implementation.

use std::io::Write;

use triton_api::{IMAGE_UPDATE_FIELDS, TritonApi, fan_out};
use triton_cloudapi::types::ListImagesOptions;

use super::read_update;
use crate::cli::ImageCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat, short_id};

/// Image command executor.
pub struct ImageCommand<'a> {
    api: &'a TritonApi,
}

impl<'a> ImageCommand<'a> {
    /// Create a new image command.
    #[must_use]
    pub const fn new(api: &'a TritonApi) -> Self {
        Self { api }
    }

    /// Execute an image subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ImageCommands,
    ) -> Result<(), CliError> {
        match command {
            ImageCommands::List { name, os } => {
                let options = ListImagesOptions {
                    name: name.clone(),
                    os: os.clone(),
                    ..ListImagesOptions::default()
                };
                let images = self.api.list_images(&options).await?;
                format.write(writer, &images)?;
            }
            ImageCommands::Get { ident } => {
                let image = self.api.get_image(ident).await?;
                format.write(writer, &image)?;
            }
            ImageCommands::Update(args) => {
                let fields = read_update(args, IMAGE_UPDATE_FIELDS)?;
                let image = self.api.update_image(&args.ident, &fields).await?;
                if format.is_json() {
                    format.write(writer, &image)?;
                } else {
                    format.write(
                        writer,
                        &Message::success(format!(
                            "Updated image {} ({})",
                            image.name_at_version(),
                            short_id(&image.id)
                        )),
                    )?;
                }
            }
            ImageCommands::Delete { idents } => {
                let deleted =
                    fan_out(idents.iter().map(|ident| self.api.delete_image(ident))).await?;
                for image in &deleted {
                    format.write(
                        writer,
                        &Message::success(format!(
                            "Deleted image {} ({})",
                            image.name_at_version(),
                            short_id(&image.id)
                        )),
                    )?;
                }
            }
        }
        Ok(())
    }
}
