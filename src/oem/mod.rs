//! Vendor overlays decoded from the `Oem` properties of a base resource.
//!
//! A base record keeps the exact bytes it was decoded from. An overlay takes a
//! decoded base, re-reads those bytes for the vendor sub-tree and keeps the
//! base (and with it the client) next to the vendor fields. Building an
//! overlay never touches the network.

pub mod ami;
pub mod hpe;

use serde::de::DeserializeOwned;

use crate::entity::Entity;
use crate::error::{Error, Result};

/// Decode `T` from the body `entity` was decoded from.
///
/// `T` describes the path to the vendor data with nested records; everything
/// it does not name is ignored.
pub(crate) fn from_raw<T: DeserializeOwned>(entity: &Entity) -> Result<T> {
    let raw = entity
        .raw_json()
        .ok_or(Error::InvalidArgument("entity has no retained body"))?;
    Ok(serde_json::from_slice(raw)?)
}
