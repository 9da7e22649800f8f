use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Entity;
use crate::error::{Error, Result};

/// One published copy of a registry, from `MessageRegistryFile.Location`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistryLocation {
    #[serde(default)]
    pub language: String,
    /// Registry hosted by the service itself.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub archive_uri: String,
    #[serde(default)]
    pub archive_file: String,
    /// Registry on the publisher's site, e.g. dmtf.org.
    #[serde(default)]
    pub publication_uri: String,
}

/// A member of the service root's `Registries` collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageRegistryFile {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub languages: Vec<String>,
    /// Registry name with major and minor version, e.g. `Base.1.8`.
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub location: Vec<RegistryLocation>,
}

crate::impl_resource!(MessageRegistryFile);

/// One entry of [`MessageRegistry::messages`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageRegistryMessage {
    #[serde(default)]
    pub description: String,
    /// Message text with `%1`, `%2`, ... placeholders.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message_severity: String,
    #[serde(default)]
    pub number_of_args: u32,
    #[serde(default)]
    pub param_types: Vec<String>,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub oem: Option<Value>,
}

/// A message registry in one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageRegistry {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(rename = "@odata.type", default)]
    pub odata_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub registry_prefix: String,
    #[serde(default)]
    pub registry_version: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub owning_entity: String,
    #[serde(default)]
    pub messages: BTreeMap<String, MessageRegistryMessage>,
}

crate::impl_resource!(MessageRegistry);

impl MessageRegistry {
    /// Whether `id` names a message of this registry's prefix and `major.minor` version.
    pub fn publishes(&self, id: &MessageId<'_>) -> bool {
        self.registry_prefix == id.registry_prefix
            && self
                .registry_version
                .strip_prefix(id.major_minor.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }
}

/// A `MessageId` split into its parts.
///
/// `Base.1.8.PropertyNotWritable` names the message `PropertyNotWritable` of
/// registry prefix `Base`, version `1.8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId<'a> {
    pub registry_prefix: &'a str,
    pub major_minor: String,
    pub message_key: &'a str,
}

impl<'a> MessageId<'a> {
    /// Split `Prefix.Major.Minor.Key`.
    pub fn parse(id: &'a str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidArgument("empty message id"));
        }
        let mut parts = id.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(major), Some(minor), Some(key), None)
                if ![prefix, major, minor, key].contains(&"") =>
            {
                Ok(Self {
                    registry_prefix: prefix,
                    major_minor: format!("{major}.{minor}"),
                    message_key: key,
                })
            }
            _ => Err(Error::validation(format!("invalid message id {id}"))),
        }
    }
}
