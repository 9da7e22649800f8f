#![deny(unsafe_code)]
#![warn(missing_docs)]

//! A production-oriented, blocking Redfish / Swordfish client library.
//!
//! The crate implements:
//! - session login (`X-Auth-Token`) and HTTP basic authentication
//! - typed resources that remember their ETag and the body they came from
//! - diff-then-PATCH updates gated by an allowlist of writable properties
//! - OData `$expand` / `$levels` / `$skip` / `$top` queries
//! - collection traversal with a bounded pool of worker threads
//! - task monitors and `Retry-After` handling
//! - vendor overlays decoded from `Oem` properties
//!
//! ```no_run
//! use redfish::{Client, GenericResource};
//!
//! # fn main() -> redfish::Result<()> {
//! let client = Client::builder("https://bmc.example")
//!     .username("admin")
//!     .password("secret")
//!     .insecure(true)
//!     .connect()?;
//!
//! let root = client.service_root()?;
//! for chassis in root.chassis::<GenericResource>()?.items {
//!     println!("{} {:?}", chassis.entity.id, chassis.status);
//! }
//! client.logout()?;
//! # Ok(())
//! # }
//! ```

mod client;
mod collection;
mod debug;
mod entity;
mod error;
mod observe;
pub mod oem;
mod patch;
pub mod query;
mod retry_after;
pub mod schemas;
mod secret;
mod service_root;
mod session;
pub mod task;
pub mod transport;
mod types;

pub use crate::client::{
    Client, ClientBuilder, ClientConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_SERVICE_ROOT,
};
pub use crate::collection::{Collection, Members, get_collection, get_collection_objects, get_objects};
pub use crate::entity::{Entity, Resource, decode_response, get_object};
pub use crate::error::{CollectionError, Error, ExtendedInfo, Result, ServiceError};
pub use crate::patch::{check_allowed, patch_payload, patch_payload_with_mappings};
pub use crate::retry_after::{parse_retry_after, parse_retry_after_at};
pub use crate::schemas::GenericResource;
pub use crate::secret::Secret;
pub use crate::service_root::{
    DeepOperations, ExpandQuery, ProtocolFeaturesSupported, ServiceRoot, ServiceRootLinks,
};
pub use crate::session::{DEFAULT_SESSIONS_URI, Session};
pub use crate::types::{ActionTarget, Health, Link, State, Status};
