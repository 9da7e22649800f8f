//! AMI MegaRAC overlays.
#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::oem::from_raw;
use crate::schemas;
use crate::types::ActionTarget;

/// How the BMC treats the host when it reboots itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerBootMode {
    /// Leave the host alone.
    None,
    /// Soft reset the host.
    SoftReset,
    /// Reset the host after a timeout.
    ResetTimeout,
    /// A mode this crate does not know.
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ManagerBootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// `Oem.Ami.ManagerBootConfiguration`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagerBootConfiguration {
    #[serde(default)]
    pub manager_boot_mode: ManagerBootMode,
    #[serde(rename = "ManagerBootMode@Redfish.AllowableValues", default)]
    pub allowable_values: Vec<ManagerBootMode>,
}

/// CRCs the BIOS reported for each inventory group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Crc {
    /// One single-entry map per group, e.g. `{"PCIE": 17555861}`.
    #[serde(default)]
    pub group_crc_list: Vec<BTreeMap<String, u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Inventory {
    #[serde(default)]
    pub crc: Crc,
}

/// `Oem.Ami.Bios` of a computer system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bios {
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub redfish_version: String,
    #[serde(rename = "RTPVersion", alias = "RtpVersion", default)]
    pub rtp_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_table_tags: Option<String>,
}

#[derive(Deserialize)]
struct SystemBody {
    #[serde(rename = "Oem", default)]
    oem: SystemOem,
}

#[derive(Default, Deserialize)]
struct SystemOem {
    #[serde(rename = "Ami", default)]
    ami: SystemAmi,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SystemAmi {
    #[serde(alias = "BIOS", default)]
    bios: Bios,
    #[serde(default)]
    manager_boot_configuration: ManagerBootConfiguration,
    #[serde(rename = "SSIFMode", default)]
    ssif_mode: String,
}

/// A computer system with its AMI extensions.
#[derive(Debug, Clone)]
pub struct ComputerSystem {
    /// The standard record.
    pub base: schemas::ComputerSystem,
    /// BIOS inventory reported to the BMC.
    pub bios: Bios,
    /// Host handling across BMC reboots.
    pub manager_boot_configuration: ManagerBootConfiguration,
    /// `Enabled` when the SSIF IPMI interface is on.
    pub ssif_mode: String,
}

impl ComputerSystem {
    /// Layer the AMI fields over `base`.
    pub fn from_computer_system(base: &schemas::ComputerSystem) -> Result<Self> {
        let body: SystemBody = from_raw(&base.entity)?;
        Ok(Self {
            base: base.clone(),
            bios: body.oem.ami.bios,
            manager_boot_configuration: body.oem.ami.manager_boot_configuration,
            ssif_mode: body.oem.ami.ssif_mode,
        })
    }
}

impl Deref for ComputerSystem {
    type Target = schemas::ComputerSystem;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// `Oem.AMIUpdateService`: progress of the running update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AmiUpdateService {
    /// Flash progress, e.g. `"45% done"`.
    #[serde(default)]
    pub flash_percentage: String,
    /// Keep the configuration across the update.
    #[serde(default)]
    pub preserve_configuration: bool,
    #[serde(default)]
    pub update_information: String,
    /// `Preparing`, `Downloading`, `Verifying` or `Flashing`.
    #[serde(default)]
    pub update_status: String,
    /// Usually `BMC`.
    #[serde(default)]
    pub update_target: String,
}

/// Which BMC image is active and what each slot holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DualImageConfigurations {
    #[serde(default)]
    pub active_image: String,
    #[serde(default)]
    pub boot_image: String,
    #[serde(default)]
    pub firmware_image1_name: String,
    #[serde(default)]
    pub firmware_image1_version: String,
    #[serde(default)]
    pub firmware_image2_name: String,
    #[serde(default)]
    pub firmware_image2_version: String,
}

/// `Oem.BMC` of the update service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bmc {
    #[serde(default)]
    pub dual_image_configurations: DualImageConfigurations,
}

/// `Oem.BIOS` of the update service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiosUpdate {
    /// Keep NVRAM contents when flashing the BIOS.
    #[serde(rename = "BIOSPreserveNVRAM", default)]
    pub preserve_nvram: bool,
}

#[derive(Deserialize)]
struct UpdateBody {
    #[serde(rename = "Oem", default)]
    oem: UpdateOem,
    #[serde(rename = "Actions", default)]
    actions: UpdateActions,
}

#[derive(Default, Deserialize)]
struct UpdateOem {
    #[serde(rename = "AMIUpdateService", default)]
    update_service: AmiUpdateService,
    #[serde(rename = "BMC", default)]
    bmc: Bmc,
    #[serde(rename = "BIOS", default)]
    bios: BiosUpdate,
}

#[derive(Default, Deserialize)]
struct UpdateActions {
    #[serde(rename = "Oem", default)]
    oem: UpdateOemActions,
}

#[derive(Default, Deserialize)]
struct UpdateOemActions {
    #[serde(rename = "#UpdateService.UploadCABundle", default)]
    upload_ca_bundle: ActionTarget,
}

/// An update service with its AMI extensions.
#[derive(Debug, Clone)]
pub struct UpdateService {
    /// The standard record.
    pub base: schemas::UpdateService,
    pub ami_update_service: AmiUpdateService,
    pub bmc: Bmc,
    pub bios: BiosUpdate,
    upload_ca_bundle_target: String,
}

impl UpdateService {
    /// Layer the AMI fields over `base`.
    pub fn from_update_service(base: &schemas::UpdateService) -> Result<Self> {
        let body: UpdateBody = from_raw(&base.entity)?;
        Ok(Self {
            base: base.clone(),
            ami_update_service: body.oem.update_service,
            bmc: body.oem.bmc,
            bios: body.oem.bios,
            upload_ca_bundle_target: body.actions.oem.upload_ca_bundle.target,
        })
    }

    /// Target of `#UpdateService.UploadCABundle`, when the service offers it.
    pub fn upload_ca_bundle_target(&self) -> Option<&str> {
        Some(self.upload_ca_bundle_target.as_str()).filter(|t| !t.is_empty())
    }

    /// Invoke `#UpdateService.UploadCABundle`.
    ///
    /// The service does not document any parameters, so the action is posted
    /// with an empty object.
    pub fn upload_ca_bundle(&self) -> Result<()> {
        let target = self
            .upload_ca_bundle_target()
            .ok_or(Error::Unsupported("upload ca bundle is not supported by this system"))?;
        self.base.entity.post(target, &serde_json::Map::new())
    }
}

impl Deref for UpdateService {
    type Target = schemas::UpdateService;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::header::HeaderMap;

    use crate::client::Client;
    use crate::entity::decode_raw;
    use crate::transport::{Request, Response, Transport};

    #[derive(Clone, Default)]
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Transport for Counting {
        fn send(&self, _request: Request) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(204, HeaderMap::new(), Vec::new()))
        }
    }

    const SYSTEM: &str = r##"{
        "@odata.id": "/redfish/v1/Systems/System_0",
        "Id": "System_0",
        "Name": "System",
        "Oem": {
            "Ami": {
                "@odata.type": "#AMIBIOSInventoryCRC.v1_0_0.AMIBIOSInventoryCRC",
                "Bios": {
                    "Inventory": {
                        "Crc": {
                            "@odata.id": "/redfish/v1/Systems/System_0/Oem/Ami/Inventory/Crc",
                            "GroupCrcList": [
                                {"PCIE": 17555861},
                                {"CERTIFICATE": 0},
                                {"CPU": 2772866038}
                            ]
                        }
                    },
                    "RedfishVersion": "1.15.1",
                    "RtpVersion": "RB_1.0.17"
                },
                "ManagerBootConfiguration": {
                    "ManagerBootMode": "None",
                    "ManagerBootMode@Redfish.AllowableValues": ["None", "SoftReset", "ResetTimeout"]
                },
                "SSIFMode": "Enabled"
            }
        }
    }"##;

    fn client(transport: &Counting) -> Client {
        Client::builder("https://bmc.example")
            .transport(transport.clone())
            .build()
            .expect("client")
    }

    #[test]
    fn computer_system_overlay_reads_retained_body() {
        let transport = Counting::default();
        let client = client(&transport);
        let base: schemas::ComputerSystem = decode_raw(
            &client,
            "/redfish/v1/Systems/System_0",
            Arc::from(SYSTEM.as_bytes()),
            None,
        )
        .expect("decode");

        let system = ComputerSystem::from_computer_system(&base).expect("overlay");
        assert_eq!(system.entity.id, "System_0");
        assert_eq!(system.entity.name, "System");
        assert_eq!(
            system.bios.inventory.crc.group_crc_list[0].get("PCIE"),
            Some(&17555861)
        );
        assert_eq!(system.bios.rtp_version, "RB_1.0.17");
        assert_eq!(
            system.manager_boot_configuration.manager_boot_mode,
            ManagerBootMode::None
        );
        assert_eq!(system.manager_boot_configuration.allowable_values.len(), 3);
        assert_eq!(system.ssif_mode, "Enabled");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn overlay_needs_a_retained_body() {
        let base = schemas::ComputerSystem::default();
        assert!(matches!(
            ComputerSystem::from_computer_system(&base),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn update_service_overlay_and_ca_bundle() {
        let body = r##"{
            "@odata.id": "/redfish/v1/UpdateService",
            "Id": "UpdateService",
            "Actions": {
                "Oem": {
                    "#UpdateService.UploadCABundle": {
                        "target": "/redfish/v1/UpdateService/Actions/Oem/UpdateService.UploadCABundle"
                    }
                }
            },
            "Oem": {
                "AMIUpdateService": {"FlashPercentage": "45% done", "UpdateStatus": "Flashing", "UpdateTarget": "BMC"},
                "BMC": {"DualImageConfigurations": {"ActiveImage": "Image1", "FirmwareImage2Version": "2.1"}},
                "BIOS": {"BIOSPreserveNVRAM": true}
            }
        }"##;
        let transport = Counting::default();
        let client = client(&transport);
        let base: schemas::UpdateService = decode_raw(
            &client,
            "/redfish/v1/UpdateService",
            Arc::from(body.as_bytes()),
            None,
        )
        .expect("decode");

        let service = UpdateService::from_update_service(&base).expect("overlay");
        assert_eq!(service.ami_update_service.update_status, "Flashing");
        assert_eq!(service.bmc.dual_image_configurations.active_image, "Image1");
        assert!(service.bios.preserve_nvram);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

        service.upload_ca_bundle().expect("upload");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_ca_bundle_action_is_unsupported() {
        let transport = Counting::default();
        let client = client(&transport);
        let base: schemas::UpdateService = decode_raw(
            &client,
            "/redfish/v1/UpdateService",
            Arc::from(&b"{\"Id\": \"UpdateService\"}"[..]),
            None,
        )
        .expect("decode");

        let service = UpdateService::from_update_service(&base).expect("overlay");
        assert!(matches!(
            service.upload_ca_bundle(),
            Err(Error::Unsupported(_))
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
