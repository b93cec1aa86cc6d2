//! # triton-cloudapi
//!
//! Typed client for the Triton CloudAPI.
//!
//! Provides:
//! - [`Profile`] and [`ClientConfig`]: endpoint identity and transport settings
//! - [`WireClient`]: signed JSON requests with gzip, length and MD5 checks
//! - [`CloudApi`]: one method per endpoint, with paginated machine listing
//! - [`ChangeFeed`]: the instance change-feed websocket
//! - [`Error`]: the error taxonomy shared by every layer above
//!
//! ```text
//! CloudApi ──► WireClient ──► RequestSigner (triton-auth)
//!    │              │
//!    │              └── decode: gunzip → length → MD5 → JSON → status
//!    └── /<account>/<collection>[/<id>][/<sub>]
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod query;
pub mod types;
pub mod wire;

pub use api::{
    ChangeFeed, CloudApi, DEFAULT_PAGE_SIZE, MachinePages, ROLE_TAG_COLLECTIONS, RoleTagTarget,
};
pub use config::{
    CONFIG_DIR_ENV, ClientConfig, DEFAULT_ACCEPT_VERSION, Profile, cache_dir, config_dir,
    default_user_agent, profiles_dir,
};
pub use error::{Error, Result, error_name_for_code};
pub use query::{QueryParams, encode_segment, resource_path};
pub use types::Resource;
pub use wire::{RequestOptions, WireClient, WireResponse, content_md5, decode_response};
