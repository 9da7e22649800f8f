use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A reference to another resource.
///
/// Decodes from `{"@odata.id": "..."}` or the older `{"href": "..."}` form; any
/// other shape decodes to an empty link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(String);

impl Link {
    /// Create a link to `uri`.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The target URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the link points nowhere.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn from_value(value: &Value) -> Self {
        let uri = value
            .get("@odata.id")
            .and_then(Value::as_str)
            .or_else(|| value.get("href").and_then(Value::as_str))
            .unwrap_or_default();
        Self(uri.to_owned())
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Link {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Link {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl AsRef<str> for Link {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Link> for String {
    fn from(link: Link) -> Self {
        link.0
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("@odata.id", &self.0)?;
        map.end()
    }
}

/// Target of an action under `Actions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
    /// URI to POST the action to.
    #[serde(default)]
    pub target: String,
    /// Link to the `ActionInfo` describing the parameters.
    #[serde(rename = "@Redfish.ActionInfo", default, skip_serializing_if = "String::is_empty")]
    pub action_info: String,
}

/// Health of a resource.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    /// Normal.
    OK,
    /// A condition requires attention.
    Warning,
    /// A critical condition requires immediate attention.
    Critical,
    /// Any value this crate does not know yet.
    #[serde(other)]
    Unknown,
}

/// Lifecycle state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// Enabled and available.
    Enabled,
    /// Disabled.
    Disabled,
    /// Enabled but only in standby.
    StandbyOffline,
    /// Part of a redundancy set, awaiting failover.
    StandbySpare,
    /// Testing.
    InTest,
    /// Coming up.
    Starting,
    /// Not present.
    Absent,
    /// Present but unavailable.
    UnavailableOffline,
    /// Deferring.
    Deferring,
    /// Quiesced.
    Quiesced,
    /// Updating.
    Updating,
    /// Qualified.
    Qualified,
    /// Degraded.
    Degraded,
    /// Any value this crate does not know yet.
    #[serde(other)]
    Unknown,
}

/// `Status` common property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    /// Health of this resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
    /// Health of this resource and its dependents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_rollup: Option<Health>,
    /// Lifecycle state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
}
