//! # triton-api
//!
//! The layer between the CLI and CloudAPI.
//!
//! Provides:
//! - [`TritonApi`]: identifier resolution and wait-capable operations
//! - [`PollWaiter`]: polling until a resource reaches a state
//! - [`ArtifactCache`]: per-profile cache of image listings
//! - [`fan_out`]: concurrent sub-operations with error aggregation
//! - input helpers: short ids, `key=value` arguments, volume sizes
//!
//! ```text
//! ident ──► resolve ──► CloudApi GET/LIST ──► pick (name > short id)
//!                                                │
//! action ◄────────────────────────────────────────┘
//!    └──► PollWaiter ──► poll until done | Timeout
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod fanout;
pub mod kv;
pub mod resolver;
pub mod shortid;
pub mod volume_size;
pub mod wait;

mod triton;

pub use cache::{ArtifactCache, DEFAULT_IMAGE_TTL, IMAGES_KEY};
pub use fanout::fan_out;
pub use kv::{
    FieldType, IMAGE_UPDATE_FIELDS, KvOptions, VPC_UPDATE_FIELDS, parse_kv, parse_kvs,
    parse_update_args, parse_update_json, validate_update,
};
pub use resolver::{KindRules, ResourceKind};
pub use shortid::{is_uuid, normalize_short_id};
pub use triton::{InstanceAction, TritonApi};
pub use triton_cloudapi::{Error, Result};
pub use volume_size::parse_volume_size;
pub use wait::{DEFAULT_POLL_INTERVAL, PollWaiter, WaitOptions};
