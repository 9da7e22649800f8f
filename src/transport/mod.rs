//! The seam between the client and the HTTP stack.

use std::fmt;
use std::io::{self, Read};

use reqwest::Method;
use reqwest::header::{ETAG, HeaderMap, LOCATION};
use serde::de::DeserializeOwned;

use crate::error::Result;

/// A synchronous transport for exchanging HTTP requests with a Redfish service.
///
/// [`HttpTransport`] is the default; tests and proxies can plug in their own.
pub trait Transport: Send + Sync {
    /// Send a fully composed request and return the response with its body unread.
    fn send(&self, request: Request) -> Result<Response>;
}

impl fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<transport>")
    }
}

/// A composed HTTP request.
#[derive(Debug)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL (endpoint + path).
    pub url: String,
    /// Headers, including authentication.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Body,
}

/// The body of a [`Request`].
#[derive(Debug, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A serialized JSON document.
    Json(Vec<u8>),
    /// A `multipart/form-data` body; the transport owns the boundary.
    Multipart(Vec<Part>),
}

impl Body {
    /// The JSON bytes, when this is a JSON body.
    pub fn as_json(&self) -> Option<&[u8]> {
        match self {
            Self::Json(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// One named part of a multipart upload.
#[derive(Debug)]
pub struct Part {
    /// Form field name.
    pub name: String,
    /// Part payload.
    pub content: PartContent,
}

/// Payload of a multipart [`Part`].
pub enum PartContent {
    /// Plain text.
    Text(String),
    /// A JSON document, sent with `Content-Type: application/json`.
    Json(Vec<u8>),
    /// A binary file streamed from a reader.
    File {
        /// File name advertised in `Content-Disposition`.
        file_name: String,
        /// Source of the file bytes.
        reader: Box<dyn Read + Send>,
    },
}

impl fmt::Debug for PartContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Json(bytes) => f.debug_tuple("Json").field(&bytes.len()).finish(),
            Self::File { file_name, .. } => {
                f.debug_struct("File").field("file_name", file_name).finish()
            }
        }
    }
}

impl Part {
    /// A text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: PartContent::Text(value.into()),
        }
    }

    /// A JSON part holding `value`.
    pub fn json<T: serde::Serialize + ?Sized>(name: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            content: PartContent::Json(serde_json::to_vec(value)?),
        })
    }

    /// A file part streamed from `reader`.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        reader: impl Read + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            content: PartContent::File {
                file_name: file_name.into(),
                reader: Box::new(reader),
            },
        }
    }
}

/// An HTTP response whose body has not been consumed yet.
///
/// Dropping a `Response` drains whatever is left of the body so the underlying
/// connection can be released.
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Option<Box<dyn Read + Send>>,
}

impl Response {
    /// Build a response around a streaming body.
    pub fn from_reader(status: u16, headers: HeaderMap, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            headers,
            body: Some(Box::new(body)),
        }
    }

    /// Build a response around an in-memory body.
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self::from_reader(status, headers, io::Cursor::new(body.into()))
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text; `None` when absent or not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `ETag` header, when present and non-empty.
    pub fn etag(&self) -> Option<&str> {
        self.headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    }

    /// The `Location` header, when present and non-empty.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    }

    /// Read the whole body.
    pub fn bytes(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if let Some(mut body) = self.body.take() {
            body.read_to_end(&mut out)?;
        }
        Ok(out)
    }

    /// Read the whole body and decode it as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Drain the remaining body and report any error doing so.
    pub fn cleanup(mut self) -> Result<()> {
        if let Some(mut body) = self.body.take() {
            io::copy(&mut body, &mut io::sink())?;
        }
        Ok(())
    }
}

impl Read for Response {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.body.as_mut() {
            Some(body) => body.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        if let Some(mut body) = self.body.take() {
            let _ = io::copy(&mut body, &mut io::sink());
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers.len())
            .finish()
    }
}

pub(crate) mod blocking;

pub use blocking::HttpTransport;

#[cfg(test)]
mod tests {
    use super::*;

    use reqwest::header::HeaderValue;

    #[test]
    fn etag_and_location_are_read_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("W/\"abc\""));
        headers.insert(LOCATION, HeaderValue::from_static(""));
        let response = Response::new(200, headers, "{}");
        assert_eq!(response.etag(), Some("W/\"abc\""));
        assert_eq!(response.location(), None);
    }

    #[test]
    fn cleanup_drains_body() {
        let response = Response::new(204, HeaderMap::new(), vec![0u8; 1024]);
        response.cleanup().expect("cleanup");
    }

    #[test]
    fn json_decodes_body() {
        let response = Response::new(200, HeaderMap::new(), r#"{"Id":"1"}"#);
        let value: serde_json::Value = response.json().expect("json");
        assert_eq!(value["Id"], "1");
    }
}
