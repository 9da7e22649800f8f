//! The service root (`/redfish/v1/`) and typed navigation from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Client;
use crate::client::core::DEFAULT_SERVICE_ROOT;
use crate::collection::{Members, get_collection_objects};
use crate::entity::{Entity, Resource, get_object};
use crate::error::{Error, Result};
use crate::query::QueryOption;
use crate::schemas::{
    MessageId, MessageRegistry, MessageRegistryFile, MessageRegistryMessage, RegistryLocation,
    SessionResource, Task, TaskService,
};
use crate::secret::Secret;
use crate::session::{DEFAULT_SESSIONS_URI, Session, create_session, delete_session};
use crate::types::Link;

/// `DeepOperations` of [`ProtocolFeaturesSupported`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeepOperations {
    /// Deep PATCH is supported.
    #[serde(rename = "DeepPATCH", default)]
    pub deep_patch: bool,
    /// Deep POST is supported.
    #[serde(rename = "DeepPOST", default)]
    pub deep_post: bool,
    /// Deepest level a deep operation may reach.
    #[serde(default)]
    pub max_levels: Option<u32>,
}

/// `ExpandQuery` of [`ProtocolFeaturesSupported`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpandQuery {
    /// `$expand=*` is supported.
    #[serde(default)]
    pub expand_all: bool,
    /// `$levels` is supported.
    #[serde(default)]
    pub levels: bool,
    /// `$expand=~` is supported.
    #[serde(default)]
    pub links: bool,
    /// Largest `$levels` value accepted.
    #[serde(default)]
    pub max_levels: Option<u32>,
    /// `$expand=.` is supported.
    #[serde(default)]
    pub no_links: bool,
}

/// Optional protocol features the service implements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProtocolFeaturesSupported {
    /// Deep PATCH/POST support.
    #[serde(default)]
    pub deep_operations: Option<DeepOperations>,
    /// `excerpt` query parameter is supported.
    #[serde(default)]
    pub excerpt_query: bool,
    /// `$expand` support.
    #[serde(default)]
    pub expand_query: Option<ExpandQuery>,
    /// `$filter` is supported.
    #[serde(default)]
    pub filter_query: bool,
    /// `only` query parameter is supported.
    #[serde(default)]
    pub only_member_query: bool,
    /// `$select` is supported.
    #[serde(default)]
    pub select_query: bool,
    /// `$top` and `$skip` are supported.
    #[serde(default)]
    pub top_skip_query: bool,
    /// Several requests may be in flight on one connection.
    #[serde(rename = "MultipleHTTPRequests", default)]
    pub multiple_http_requests: bool,
}

/// `Links` of the service root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRootLinks {
    /// The session collection.
    #[serde(default)]
    pub sessions: Link,
    /// The manager that provides this service.
    #[serde(default)]
    pub manager_providing_service: Link,
}

/// The service root.
///
/// Link fields are plain URIs; the accessor methods of the same name fetch
/// the target on demand. A singleton accessor returns `Ok(None)` and a
/// collection accessor an empty [`Members`] when the service does not
/// advertise the link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRoot {
    /// Identity of the root (`/redfish/v1/`).
    #[serde(flatten)]
    pub entity: Entity,
    /// `@odata.type`.
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,
    /// Description of the service.
    #[serde(default)]
    pub description: String,
    /// Product the service is part of.
    #[serde(default)]
    pub product: String,
    /// Redfish protocol version, e.g. `1.15.0`.
    #[serde(default)]
    pub redfish_version: String,
    /// Service UUID.
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    /// Vendor of the service.
    #[serde(default)]
    pub vendor: String,
    /// Identifier set by the service owner.
    #[serde(default)]
    pub service_identification: String,
    /// Optional protocol features.
    #[serde(default)]
    pub protocol_features_supported: ProtocolFeaturesSupported,
    /// Vendor extensions.
    #[serde(default)]
    pub oem: Option<Value>,

    /// `AccountService`.
    #[serde(default)]
    pub account_service: Link,
    /// `AggregationService`.
    #[serde(default)]
    pub aggregation_service: Link,
    /// `AutomationNodes` collection.
    #[serde(default)]
    pub automation_nodes: Link,
    /// `Cables` collection.
    #[serde(default)]
    pub cables: Link,
    /// `CertificateService`.
    #[serde(default)]
    pub certificate_service: Link,
    /// `Chassis` collection.
    #[serde(default)]
    pub chassis: Link,
    /// `ComponentIntegrity` collection.
    #[serde(default)]
    pub component_integrity: Link,
    /// `CompositionService`.
    #[serde(default)]
    pub composition_service: Link,
    /// `EventService`.
    #[serde(default)]
    pub event_service: Link,
    /// `Fabrics` collection.
    #[serde(default)]
    pub fabrics: Link,
    /// `Facilities` collection.
    #[serde(default)]
    pub facilities: Link,
    /// `JobService`.
    #[serde(default)]
    pub job_service: Link,
    /// `JsonSchemas` collection.
    #[serde(rename = "JsonSchemas", alias = "JSONSchemas", default)]
    pub json_schemas: Link,
    /// `KeyService`.
    #[serde(default)]
    pub key_service: Link,
    /// `LicenseService`.
    #[serde(default)]
    pub license_service: Link,
    /// `Managers` collection.
    #[serde(default)]
    pub managers: Link,
    /// `NVMeDomains` collection.
    #[serde(rename = "NVMeDomains", default)]
    pub nvme_domains: Link,
    /// `PowerEquipment`.
    #[serde(default)]
    pub power_equipment: Link,
    /// `RegisteredClients` collection.
    #[serde(default)]
    pub registered_clients: Link,
    /// `Registries` collection of message registry files.
    #[serde(default)]
    pub registries: Link,
    /// `ResourceBlocks` collection.
    #[serde(default)]
    pub resource_blocks: Link,
    /// `ServiceConditions`.
    #[serde(default)]
    pub service_conditions: Link,
    /// `SessionService`.
    #[serde(default)]
    pub session_service: Link,
    /// `Storage` collection.
    #[serde(default)]
    pub storage: Link,
    /// `StorageServices` collection.
    #[serde(default)]
    pub storage_services: Link,
    /// `StorageSystems` collection.
    #[serde(default)]
    pub storage_systems: Link,
    /// `Systems` collection.
    #[serde(default)]
    pub systems: Link,
    /// The task service.
    #[serde(rename = "Tasks", default)]
    pub task_service: Link,
    /// `TelemetryService`.
    #[serde(default)]
    pub telemetry_service: Link,
    /// `ThermalEquipment`.
    #[serde(default)]
    pub thermal_equipment: Link,
    /// `UpdateService`.
    #[serde(default)]
    pub update_service: Link,
    /// `Links`: sessions and the providing manager.
    #[serde(default)]
    pub links: ServiceRootLinks,
}

crate::impl_resource!(ServiceRoot);

macro_rules! singletons {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<T: Resource>(&self) -> Result<Option<T>> {
                self.singleton(&self.$name)
            }
        )+
    };
}

macro_rules! collections {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<T: Resource>(&self) -> Result<Members<T>> {
                self.members(&self.$name, &[])
            }
        )+
    };
}

impl ServiceRoot {
    /// GET the service root.
    pub fn get(client: &Client) -> Result<Self> {
        get_object(client, DEFAULT_SERVICE_ROOT, &[])
    }

    singletons! {
        /// `AccountService`.
        account_service,
        /// `AggregationService`.
        aggregation_service,
        /// `CertificateService`.
        certificate_service,
        /// `CompositionService`.
        composition_service,
        /// `EventService`.
        event_service,
        /// `JobService`.
        job_service,
        /// `KeyService`.
        key_service,
        /// `LicenseService`.
        license_service,
        /// `PowerEquipment`.
        power_equipment,
        /// `ServiceConditions`.
        service_conditions,
        /// `SessionService`.
        session_service,
        /// `TaskService`, advertised as `Tasks`.
        task_service,
        /// `TelemetryService`.
        telemetry_service,
        /// `ThermalEquipment`.
        thermal_equipment,
        /// `UpdateService`.
        update_service,
    }

    collections! {
        /// Members of `AutomationNodes`.
        automation_nodes,
        /// Members of `Cables`.
        cables,
        /// Members of `Chassis`.
        chassis,
        /// Members of `ComponentIntegrity`.
        component_integrity,
        /// Members of `Fabrics`.
        fabrics,
        /// Members of `Facilities`.
        facilities,
        /// Members of `JsonSchemas`.
        json_schemas,
        /// Members of `Managers`.
        managers,
        /// Members of `NVMeDomains`.
        nvme_domains,
        /// Members of `RegisteredClients`.
        registered_clients,
        /// Members of `Registries`.
        registries,
        /// Members of `ResourceBlocks`.
        resource_blocks,
        /// Members of `Storage`.
        storage,
        /// Members of `StorageServices`.
        storage_services,
        /// Members of `StorageSystems`.
        storage_systems,
        /// Members of `Systems`.
        systems,
    }

    /// The manager providing this service, from `Links.ManagerProvidingService`.
    pub fn manager_providing_service<T: Resource>(&self) -> Result<Option<T>> {
        self.singleton(&self.links.manager_providing_service)
    }

    /// Members of the collection at `link`, with query options.
    pub fn members<T: Resource>(&self, link: &Link, options: &[QueryOption]) -> Result<Members<T>> {
        if link.is_empty() {
            return Ok(Members::default());
        }
        get_collection_objects(self.entity.bound_client()?, link.as_str(), options)
    }

    /// URI of the session collection, falling back to the well-known path.
    pub fn sessions_uri(&self) -> &str {
        if self.links.sessions.is_empty() {
            DEFAULT_SESSIONS_URI
        } else {
            self.links.sessions.as_str()
        }
    }

    /// Log in and make the client use the new session.
    pub fn create_session(&self, username: &str, password: &Secret) -> Result<Session> {
        create_session(
            self.entity.bound_client()?,
            self.sessions_uri(),
            username,
            password,
        )
    }

    /// Delete the session at `uri`; the client forgets it if it was its own.
    pub fn delete_session(&self, uri: &str) -> Result<()> {
        delete_session(self.entity.bound_client()?, uri)
    }

    /// Open sessions.
    pub fn sessions(&self) -> Result<Members<SessionResource>> {
        get_collection_objects(self.entity.bound_client()?, self.sessions_uri(), &[])
    }

    /// Tasks of the task service; empty when the service advertises none.
    pub fn tasks(&self) -> Result<Members<Task>> {
        match self.task_service::<TaskService>()? {
            Some(service) => service.tasks(),
            None => Ok(Members::default()),
        }
    }

    /// Every message registry referenced from `Registries`, in every language.
    pub fn message_registries(&self) -> Result<Vec<MessageRegistry>> {
        self.registries_where(|_| true)
    }

    /// The message registry at `uri`.
    pub fn message_registry(&self, uri: &str) -> Result<MessageRegistry> {
        get_object(self.entity.bound_client()?, uri, &[])
    }

    /// Message registries published in `language`, e.g. `en`.
    pub fn message_registries_by_language(&self, language: &str) -> Result<Vec<MessageRegistry>> {
        let language = non_empty(language, "empty language")?;
        self.registries_where(|location| location.language == language)
    }

    /// The registry `registry` (name and `major.minor`, e.g. `Base.1.8`) in `language`.
    pub fn message_registry_by_language(
        &self,
        registry: &str,
        language: &str,
    ) -> Result<MessageRegistry> {
        let registry = non_empty(registry, "empty registry")?;
        let language = non_empty(language, "empty language")?;
        let files = self.registries::<MessageRegistryFile>()?.into_result()?;
        let location = files
            .iter()
            .filter(|file| file.registry == registry)
            .flat_map(|file| &file.location)
            .find(|location| location.language == language)
            .ok_or_else(|| Error::NotFound(format!("message registry {registry} ({language})")))?;
        self.message_registry(&location.uri)
    }

    /// Look up a `MessageId` such as `Base.1.8.PropertyNotWritable`, as found in
    /// [`ExtendedInfo`](crate::ExtendedInfo), in the registries published in `language`.
    pub fn message_by_language(
        &self,
        message_id: &str,
        language: &str,
    ) -> Result<MessageRegistryMessage> {
        let id = MessageId::parse(message_id)?;
        self.message_registries_by_language(language)?
            .into_iter()
            .filter(|registry| registry.publishes(&id))
            .find_map(|mut registry| registry.messages.remove(id.message_key))
            .ok_or_else(|| Error::NotFound(format!("message {}", message_id.trim())))
    }

    fn registries_where(
        &self,
        keep: impl Fn(&RegistryLocation) -> bool,
    ) -> Result<Vec<MessageRegistry>> {
        let files = self.registries::<MessageRegistryFile>()?.into_result()?;
        files
            .iter()
            .flat_map(|file| &file.location)
            .filter(|location| keep(*location))
            .map(|location| self.message_registry(&location.uri))
            .collect()
    }

    fn singleton<T: Resource>(&self, link: &Link) -> Result<Option<T>> {
        if link.is_empty() {
            return Ok(None);
        }
        get_object(self.entity.bound_client()?, link.as_str(), &[]).map(Some)
    }
}

fn non_empty<'a>(value: &'a str, what: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::InvalidArgument(what))
    } else {
        Ok(value)
    }
}
