//! Records for the resources this crate navigates itself.
//!
//! Anything else can be decoded into [`GenericResource`] or into a caller-defined
//! record implementing [`Resource`](crate::Resource).
#![allow(missing_docs)]

mod computer_system;
mod message_registry;
mod session;
mod task;
mod update_service;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Entity;
use crate::types::Status;

pub use computer_system::{Boot, ComputerSystem, ComputerSystemActions, ComputerSystemLinks, ResetType};
pub use message_registry::{
    MessageId, MessageRegistry, MessageRegistryFile, MessageRegistryMessage, RegistryLocation,
};
pub use session::SessionResource;
pub use task::{Task, TaskService, TaskState};
pub use update_service::{SimpleUpdateParameters, UpdateService, UpdateServiceActions};

/// Identity, status and OEM data of any resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenericResource {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(rename = "@odata.type", default, skip_serializing)]
    pub odata_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing)]
    pub oem: Option<Value>,
}

crate::impl_resource!(GenericResource);
