use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part as FormPart};

use crate::error::Result;
use crate::transport::{Body, Part, PartContent, Request, Response, Transport};

/// Default bound on connection setup (TCP + TLS handshake).
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTPS transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a transport with the given TLS policy and connect timeout.
    ///
    /// `insecure` disables certificate and host name verification, which is
    /// common for BMCs shipping self-signed certificates.
    pub fn new(insecure: bool, connect_timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Wrap a caller-configured `reqwest` client verbatim.
    pub fn from_client(http: reqwest::blocking::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> Result<Response> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;

        let builder = self.http.request(method, url).headers(headers);
        let builder = match body {
            Body::Empty => builder,
            Body::Json(bytes) => builder.body(bytes),
            Body::Multipart(parts) => builder.multipart(into_form(parts)?),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        Ok(Response::from_reader(status, headers, response))
    }
}

fn into_form(parts: Vec<Part>) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part.content {
            PartContent::Text(text) => form.text(part.name, text),
            PartContent::Json(bytes) => {
                form.part(part.name, FormPart::bytes(bytes).mime_str("application/json")?)
            }
            PartContent::File { file_name, reader } => form.part(
                part.name,
                FormPart::reader(reader)
                    .file_name(file_name)
                    .mime_str("application/octet-stream")?,
            ),
        };
    }
    Ok(form)
}
