pub(crate) mod blocking;

pub(crate) mod core;

pub use self::blocking::{Client, ClientBuilder, ClientConfig, DEFAULT_MAX_CONCURRENCY};
pub use self::core::DEFAULT_SERVICE_ROOT;
