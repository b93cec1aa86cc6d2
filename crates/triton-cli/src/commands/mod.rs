//! CLI command implementations.
//!
//! Each submodule implements one command family over a [`triton_api::TritonApi`]:
//! - [`instance`] - Instances, their tags, snapshots and NICs
//! - [`image`] - Images
//! - [`lookup`] - Packages, networks, firewall rules and keys
//! - [`vpc`] - VPCs
//! - [`volume`] - Volumes
//! - [`rbac`] - Account, RBAC and role tags
//! - [`changefeed`] - The change-feed stream

pub mod changefeed;
pub mod image;
pub mod instance;
pub mod lookup;
pub mod rbac;
pub mod volume;
pub mod vpc;

pub use changefeed::ChangefeedCommand;
pub use image::ImageCommand;
pub use instance::InstanceCommand;
pub use lookup::{LookupCommand, LookupKind};
pub use rbac::RbacCommand;
pub use volume::VolumeCommand;
pub use vpc::VpcCommand;

use std::io::Read;

use serde_json::{Map, Value};
use triton_api::{FieldType, KvOptions, parse_kvs, parse_update_args, parse_update_json};

use crate::cli::UpdateArgs;
use crate::error::CliError;

/// `key=value` options for tags and metadata: literal keys, values required.
fn strict_kv() -> KvOptions {
    KvOptions {
        fail_on_empty_value: true,
        disable_dotted: true,
        ..KvOptions::default()
    }
}

/// Parses tag or metadata arguments.
pub(crate) fn parse_pairs(args: &[String]) -> Result<Map<String, Value>, CliError> {
    Ok(parse_kvs(args, &strict_kv())?)
}

/// Reads the fields of an `update` command from arguments or a JSON file.
pub(crate) fn read_update(
    args: &UpdateArgs,
    vocabulary: &[(&str, FieldType)],
) -> Result<Map<String, Value>, CliError> {
    let fields = match &args.file {
        Some(path) if path.as_os_str() == "-" => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            parse_update_json(&text, vocabulary)?
        }
        Some(path) => parse_update_json(&std::fs::read_to_string(path)?, vocabulary)?,
        None => parse_update_args(&args.fields, vocabulary)?,
    };
    if fields.is_empty() {
        return Err(CliError::InvalidArgument("no fields to update".to_string()));
    }
    Ok(fields)
}
