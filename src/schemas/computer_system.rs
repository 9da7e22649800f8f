use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::Result;
use crate::types::{ActionTarget, Link, Status};

/// Reset flavours accepted by `#ComputerSystem.Reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetType {
    /// Power on.
    On,
    /// Immediate power off.
    ForceOff,
    /// Orderly OS shutdown, then power off.
    GracefulShutdown,
    /// Orderly OS shutdown, then restart.
    GracefulRestart,
    /// Immediate restart.
    ForceRestart,
    /// Non-maskable interrupt.
    Nmi,
    /// Power on regardless of policy.
    ForceOn,
    /// Simulate a power button press.
    PushPowerButton,
    /// Power off, then on.
    PowerCycle,
}

impl fmt::Display for ResetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One-time or persistent boot override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Boot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_source_override_enabled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_source_override_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_source_override_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boot_order: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputerSystemActions {
    #[serde(rename = "#ComputerSystem.Reset", default)]
    pub reset: ActionTarget,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputerSystemLinks {
    #[serde(default)]
    pub chassis: Vec<Link>,
    #[serde(default)]
    pub managed_by: Vec<Link>,
}

/// A computer system (`#ComputerSystem`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputerSystem {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default)]
    pub asset_tag: String,
    #[serde(default)]
    pub bios_version: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(rename = "IndicatorLED", default)]
    pub indicator_led: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub power_state: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(rename = "SKU", default)]
    pub sku: String,
    #[serde(default)]
    pub system_type: String,
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub boot: Boot,
    #[serde(default)]
    pub bios: Link,
    #[serde(default)]
    pub processors: Link,
    #[serde(default)]
    pub memory: Link,
    #[serde(default)]
    pub storage: Link,
    #[serde(default)]
    pub ethernet_interfaces: Link,
    #[serde(default, skip_serializing)]
    pub actions: ComputerSystemActions,
    #[serde(default, skip_serializing)]
    pub links: ComputerSystemLinks,
}

crate::impl_resource!(ComputerSystem);

impl ComputerSystem {
    /// Properties a client may change with [`Resource::update`](crate::Resource::update).
    pub const WRITABLE: &'static [&'static str] = &["AssetTag", "Boot", "HostName", "IndicatorLED"];

    /// Invoke `#ComputerSystem.Reset`.
    pub fn reset(&self, reset_type: ResetType) -> Result<()> {
        #[derive(Serialize)]
        struct Payload {
            #[serde(rename = "ResetType")]
            reset_type: ResetType,
        }
        self.entity
            .post(&self.actions.reset.target, &Payload { reset_type })
    }
}
