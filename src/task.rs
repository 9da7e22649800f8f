//! Asynchronous operations: `202 Accepted` with a task monitor in `Location`.
//!
//! A service that cannot finish a request immediately answers `202 Accepted`,
//! points `Location` at a task monitor and may suggest when to look again with
//! `Retry-After`. Polling the monitor keeps answering `202` until the operation
//! is over, then returns the operation's own response.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::client::Client;
use crate::client::blocking::MONITOR_OK;
use crate::entity::decode_raw;
use crate::error::{Error, Result};
use crate::retry_after::parse_retry_after;
use crate::schemas::Task;
use crate::transport::{Part, Response};

/// Outcome of a request that may run as a task.
#[derive(Debug)]
pub enum Accepted {
    /// The service finished the request synchronously.
    Completed(Response),
    /// The service queued the request; follow the monitor.
    Pending(TaskMonitor),
}

/// A task monitor returned with `202 Accepted`.
#[derive(Debug, Clone)]
pub struct TaskMonitor {
    /// Monitor URI from `Location`.
    pub uri: String,
    /// Earliest time to poll again, from `Retry-After`.
    pub retry_after: Option<DateTime<Utc>>,
    /// The task representation sent along with the `202`, if any.
    pub task: Option<Task>,
}

/// POST a JSON payload and report whether it runs as a task.
pub fn post_with_task<P: Serialize + ?Sized>(
    client: &Client,
    uri: &str,
    payload: &P,
    headers: &HeaderMap,
) -> Result<Accepted> {
    let response = client.post_with_headers(uri, payload, headers)?;
    accepted(client, response)
}

/// POST a multipart body and report whether it runs as a task.
pub fn post_multipart_with_task(
    client: &Client,
    uri: &str,
    parts: Vec<Part>,
    headers: &HeaderMap,
) -> Result<Accepted> {
    let response = client.post_multipart_with_headers(uri, parts, headers)?;
    accepted(client, response)
}

/// Classify a write response: anything but `202` is complete.
pub fn accepted(client: &Client, response: Response) -> Result<Accepted> {
    if response.status() != 202 {
        return Ok(Accepted::Completed(response));
    }
    let uri = response
        .location()
        .map(str::to_owned)
        .ok_or_else(|| Error::task("202 Accepted without a Location header"))?;
    let retry_after = retry_after_of(&response);
    let task = task_of(client, &uri, response);
    Ok(Accepted::Pending(TaskMonitor {
        uri,
        retry_after,
        task,
    }))
}

/// Poll `monitor` until the operation finishes and return its final response.
///
/// Between polls the call sleeps until the service's `Retry-After`, or `poll`
/// when none was given. `timeout` bounds the total wait.
pub fn wait_for_task_monitor(
    client: &Client,
    monitor: &TaskMonitor,
    poll: Duration,
    timeout: Option<Duration>,
) -> Result<Response> {
    let start = Instant::now();
    let mut retry_after = monitor.retry_after;
    loop {
        thread::sleep(delay_until(retry_after, poll));

        let response = client.get_accepting(&monitor.uri, MONITOR_OK)?;
        if response.status() != 202 {
            return Ok(response);
        }

        retry_after = retry_after_of(&response);

        #[cfg(feature = "tracing")]
        {
            if let Some(task) = task_of(client, &monitor.uri, response) {
                tracing::debug!(
                    monitor = %monitor.uri,
                    state = ?task.task_state,
                    percent = ?task.percent_complete,
                    "task still running"
                );
            }
        }

        if timeout.is_some_and(|limit| start.elapsed() >= limit) {
            return Err(Error::task(format!(
                "timed out waiting for task monitor {}",
                monitor.uri
            )));
        }
    }
}

fn retry_after_of(response: &Response) -> Option<DateTime<Utc>> {
    response
        .header("retry-after")
        .and_then(|value| parse_retry_after(value).ok())
}

fn task_of(client: &Client, uri: &str, response: Response) -> Option<Task> {
    let body = response.bytes().ok()?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    decode_raw(client, uri, Arc::from(body), None).ok()
}

fn delay_until(retry_after: Option<DateTime<Utc>>, poll: Duration) -> Duration {
    match retry_after {
        Some(at) => (at - Utc::now()).to_std().unwrap_or(Duration::ZERO),
        None => poll,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeDelta;

    #[test]
    fn past_retry_after_means_no_wait() {
        let past = Utc::now() - TimeDelta::seconds(5);
        assert_eq!(delay_until(Some(past), Duration::from_secs(9)), Duration::ZERO);
        assert_eq!(delay_until(None, Duration::from_secs(9)), Duration::from_secs(9));
    }

    #[test]
    fn future_retry_after_is_honoured() {
        let future = Utc::now() + TimeDelta::seconds(30);
        let delay = delay_until(Some(future), Duration::ZERO);
        assert!(delay > Duration::from_secs(25) && delay <= Duration::from_secs(30));
    }
}
