use serde::{Deserialize, Serialize};

use crate::collection::{Members, get_collection_objects};
use crate::entity::Entity;
use crate::error::{ExtendedInfo, Result};
use crate::types::{Health, Link, Status};

/// Execution state of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    New,
    Starting,
    Running,
    Suspended,
    Interrupted,
    Pending,
    Stopping,
    Completed,
    Killed,
    Exception,
    Service,
    Cancelling,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Whether the task will not progress any further.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Killed | Self::Exception | Self::Cancelled
        )
    }
}

/// A long-running operation (`#Task`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default)]
    pub task_state: Option<TaskState>,
    #[serde(default)]
    pub task_status: Option<Health>,
    #[serde(default)]
    pub percent_complete: Option<u32>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub task_monitor: String,
    #[serde(default)]
    pub messages: Vec<ExtendedInfo>,
}

crate::impl_resource!(Task);

/// The task service, advertised by the service root as `Tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskService {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(default)]
    pub service_enabled: Option<bool>,
    #[serde(default)]
    pub date_time: String,
    #[serde(default)]
    pub completed_task_over_write_policy: String,
    #[serde(default)]
    pub life_cycle_event_on_task_state_change: bool,
    #[serde(default)]
    pub status: Status,
    /// The task collection.
    #[serde(default)]
    pub tasks: Link,
}

crate::impl_resource!(TaskService);

impl TaskService {
    pub const WRITABLE: &'static [&'static str] = &["ServiceEnabled"];

    /// Every task in the task collection.
    pub fn tasks(&self) -> Result<Members<Task>> {
        get_collection_objects(self.entity.bound_client()?, self.tasks.as_str(), &[])
    }
}
