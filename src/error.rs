use std::collections::BTreeMap;
use std::fmt;
use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP stack failed (connect, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// I/O error while streaming a body.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A body could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a status outside the accepted set.
    #[error("{0}")]
    Service(Box<ServiceError>),

    /// Invalid caller-supplied argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Caller-side validation failed before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Some members of a collection could not be retrieved.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// An empty `Retry-After` value.
    #[error("retry-after value is empty")]
    IsEmpty,

    /// A negative `Retry-After` delay.
    #[error("retry-after value is negative")]
    IsNegative,

    /// A `Retry-After` value that is neither an HTTP-date nor a delay in seconds.
    #[error("retry-after value {0:?} is neither a date nor a number of seconds")]
    InvalidRetryAfter(String),

    /// The service does not offer the requested feature or action.
    #[error("{0}")]
    Unsupported(&'static str),

    /// A lookup found nothing, e.g. a message registry or a registry message.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation needs a session but the client holds none.
    #[error("client not authenticated")]
    NotAuthenticated,

    /// A task monitor could not be followed.
    #[error("task monitor error: {0}")]
    Task(String),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn task(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }

    /// The decoded service error, when this error came from a non-accepted status.
    pub fn service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(&**err),
            _ => None,
        }
    }

    /// HTTP status code reported by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service(err) => Some(err.status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the failure happened below HTTP (connect, TLS, timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_))
    }
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Self::Service(Box::new(err))
    }
}

/// One entry of `@Message.ExtendedInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtendedInfo {
    /// Registry-qualified message identifier, e.g. `Base.1.8.PropertyNotWritable`.
    #[serde(default)]
    pub message_id: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Substitution arguments for the message.
    #[serde(default)]
    pub message_args: Vec<String>,
    /// Severity (`OK`, `Warning`, `Critical`).
    #[serde(default)]
    pub severity: String,
    /// Suggested resolution.
    #[serde(default)]
    pub resolution: String,
}

/// An error reported by the service in the Redfish error envelope.
///
/// When the body does not carry the envelope, `code` and `extended_info` stay
/// empty and `message` holds the raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// HTTP status code.
    pub status: u16,
    /// `error.code`.
    pub code: String,
    /// `error.message`, or the raw body.
    pub message: String,
    /// `error.@Message.ExtendedInfo`.
    pub extended_info: Vec<ExtendedInfo>,
    /// Parsed `Retry-After` header of the failed response.
    pub retry_after: Option<DateTime<Utc>>,
    raw: String,
}

#[derive(Deserialize)]
struct Envelope {
    error: EnvelopeBody,
}

#[derive(Deserialize)]
struct EnvelopeBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(rename = "@Message.ExtendedInfo", default)]
    extended_info: Vec<ExtendedInfo>,
}

impl ServiceError {
    /// Build a service error from a status code and the response body.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(body).into_owned();
        match serde_json::from_slice::<Envelope>(body) {
            Ok(Envelope { error }) => Self {
                status,
                code: error.code,
                message: error.message,
                extended_info: error.extended_info,
                retry_after: None,
                raw,
            },
            Err(_) => Self {
                status,
                code: String::new(),
                message: raw.clone(),
                extended_info: Vec::new(),
                retry_after: None,
                raw,
            },
        }
    }

    pub(crate) fn with_retry_after(mut self, retry_after: Option<DateTime<Utc>>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// The body exactly as the service sent it.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == 0 {
            return f.write_str(&self.raw);
        }
        write!(f, "{}: {}", self.status, self.raw)
    }
}

impl std::error::Error for ServiceError {}

/// Per-member failures of a collection fetch, keyed by member URI.
#[derive(Debug, Default)]
pub struct CollectionError {
    /// Failed member URI to the error that occurred fetching it.
    pub failures: BTreeMap<String, Error>,
}

#[derive(Serialize)]
struct FailedItem<'a> {
    link: &'a str,
    error: String,
}

impl CollectionError {
    /// Whether no member failed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed members.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn insert(&mut self, link: impl Into<String>, err: Error) {
        self.failures.insert(link.into(), err);
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<FailedItem<'_>> = self
            .failures
            .iter()
            .map(|(link, err)| FailedItem {
                link,
                error: err.to_string(),
            })
            .collect();
        let json = serde_json::to_string(&items).map_err(|_| fmt::Error)?;
        write!(f, "failed to retrieve some items: {json}")
    }
}

impl std::error::Error for CollectionError {}
