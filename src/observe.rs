use std::time::Duration;

use reqwest::Method;

use crate::error::Error;

pub(crate) fn record_ok(method: &Method, path: &str, elapsed: Duration, status: u16) {
    let _ = (method, path, elapsed, status);

    #[cfg(feature = "metrics")]
    {
        let method = method.as_str().to_owned();
        metrics::counter!("redfish_requests_total", "method" => method.clone(), "outcome" => "ok")
            .increment(1);
        metrics::histogram!("redfish_request_seconds", "method" => method)
            .record(elapsed.as_secs_f64());
    }

    #[cfg(feature = "tracing")]
    {
        tracing::debug!(
            method = %method,
            path,
            status,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "redfish request ok"
        );
    }
}

pub(crate) fn record_err(method: &Method, path: &str, elapsed: Duration, err: &Error) {
    let _ = (method, path, elapsed, err);

    #[cfg(feature = "metrics")]
    {
        let method = method.as_str().to_owned();
        metrics::counter!("redfish_requests_total", "method" => method.clone(), "outcome" => "err")
            .increment(1);
        metrics::counter!("redfish_request_errors_total", "kind" => error_kind(err)).increment(1);
        metrics::histogram!("redfish_request_seconds", "method" => method)
            .record(elapsed.as_secs_f64());
    }

    #[cfg(feature = "tracing")]
    {
        tracing::warn!(
            method = %method,
            path,
            status = err.status(),
            error = %err,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "redfish request failed"
        );
    }
}

#[cfg(feature = "metrics")]
fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::Transport(_) => "transport",
        Error::Io(_) => "io",
        Error::Json(_) => "json",
        Error::Service(_) => "service",
        Error::InvalidArgument(_) | Error::Validation(_) => "invalid_argument",
        Error::Collection(_) => "collection",
        Error::IsEmpty | Error::IsNegative | Error::InvalidRetryAfter(_) => "retry_after",
        Error::Unsupported(_) => "unsupported",
        Error::NotFound(_) => "not_found",
        Error::NotAuthenticated => "not_authenticated",
        Error::Task(_) => "task",
    }
}
