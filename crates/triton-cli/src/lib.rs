//! # triton-cli
//!
//! Command-line interface for Triton CloudAPI.
//!
//! Provides commands for:
//! - Instances, with their tags, snapshots and NICs
//! - Images, packages, networks, VPCs and volumes
//! - Firewall rules, SSH keys, the account and RBAC
//! - The instance change feed
//!
//! # Architecture
//!
//! Commands resolve a [`triton_cloudapi::Profile`] from flags, environment
//! and profile files ([`profile`]), load the signing key from a file or
//! ssh-agent, and call the orchestration layer in `triton-api`.
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   signed HTTPS   ┌──────────┐
//! │ triton-cli  │──►│ triton-api │─────────────────►│ CloudAPI │
//! └─────────────┘   └────────────┘   (+ websocket)  └──────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod profile;

pub use cli::{Cli, Commands, Format, ProfileArgs, WaitArgs};
pub use error::{CliError, EXIT_NOT_FOUND};
pub use output::{OutputFormat, TableDisplay};
pub use profile::{load_key, resolve_profile};
