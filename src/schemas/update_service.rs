use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::Result;
use crate::task::{Accepted, post_with_task};
use crate::types::{ActionTarget, Link, Status};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceActions {
    #[serde(rename = "#UpdateService.SimpleUpdate", default)]
    pub simple_update: ActionTarget,
    #[serde(rename = "#UpdateService.StartUpdate", default)]
    pub start_update: ActionTarget,
}

/// Parameters of `#UpdateService.SimpleUpdate`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleUpdateParameters {
    /// URI of the image to pull.
    #[serde(rename = "ImageURI")]
    pub image_uri: String,
    /// `HTTP`, `HTTPS`, `TFTP`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_protocol: Option<String>,
    /// Components to apply the image to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// The firmware update service (`#UpdateService`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateService {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service_enabled: Option<bool>,
    #[serde(default)]
    pub http_push_uri: String,
    #[serde(default)]
    pub multipart_http_push_uri: String,
    #[serde(default)]
    pub http_push_uri_targets: Vec<String>,
    #[serde(default)]
    pub http_push_uri_targets_busy: Option<bool>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub firmware_inventory: Link,
    #[serde(default)]
    pub software_inventory: Link,
    #[serde(default, skip_serializing)]
    pub actions: UpdateServiceActions,
}

crate::impl_resource!(UpdateService);

impl UpdateService {
    /// Properties a client may change with [`Resource::update`](crate::Resource::update).
    pub const WRITABLE: &'static [&'static str] =
        &["HttpPushUriTargets", "HttpPushUriTargetsBusy", "ServiceEnabled"];

    /// Invoke `#UpdateService.SimpleUpdate`; the service usually answers with a task.
    pub fn simple_update(&self, parameters: &SimpleUpdateParameters) -> Result<Accepted> {
        let client = self.entity.bound_client()?;
        post_with_task(
            client,
            &self.actions.simple_update.target,
            parameters,
            &self.entity.headers(),
        )
    }
}
