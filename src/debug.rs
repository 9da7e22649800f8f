use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName};
use serde_json::Value;

use crate::client::core::X_AUTH_TOKEN;
use crate::transport::{Body, Request};

pub(crate) fn enabled() -> bool {
    std::env::var("REDFISH_DEBUG")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

pub(crate) fn dump_request(request: &Request) {
    if !enabled() {
        return;
    }
    let mut out = format!("> {} {}", request.method, request.url);
    push_headers(&mut out, &request.headers);
    match &request.body {
        Body::Empty => {}
        Body::Json(bytes) => {
            out.push_str("\n\n");
            out.push_str(&redact_body(bytes));
        }
        Body::Multipart(parts) => {
            out.push_str("\n\n<multipart:");
            for part in parts {
                out.push(' ');
                out.push_str(&part.name);
            }
            out.push('>');
        }
    }
    emit(&out);
}

pub(crate) fn dump_response(status: u16, headers: &HeaderMap) {
    if !enabled() {
        return;
    }
    let mut out = format!("< {status}");
    push_headers(&mut out, headers);
    emit(&out);
}

fn push_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        out.push('\n');
        out.push_str(name.as_str());
        out.push_str(": ");
        if is_credential(name) {
            out.push_str("<redacted>");
        } else {
            out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        }
    }
}

fn is_credential(name: &HeaderName) -> bool {
    *name == X_AUTH_TOKEN || *name == AUTHORIZATION || *name == COOKIE
}

/// Render a JSON body with every `Password` value masked.
fn redact_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut value) => {
            redact_passwords(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn redact_passwords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.eq_ignore_ascii_case("password") {
                    *field = Value::String("<redacted>".into());
                } else {
                    redact_passwords(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_passwords),
        _ => {}
    }
}

fn emit(out: &str) {
    #[cfg(feature = "tracing")]
    tracing::trace!("{out}");

    #[cfg(not(feature = "tracing"))]
    eprintln!("{out}");
}
