use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// A session resource under the session collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionResource {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
}

crate::impl_resource!(SessionResource);
