use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, IF_MATCH};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::patch::{check_allowed, patch_payload, patch_payload_with_mappings};
use crate::query::{QueryOption, build_query, parse_query};
use crate::transport::Response;

/// Identity and bookkeeping shared by every resource record.
///
/// Records embed it with `#[serde(flatten)]`. Besides the wire identity it keeps
/// the ETag of the representation it was decoded from, the exact body bytes
/// (for OEM overlays and [`Entity::update_from_raw`]), and the client used to
/// fetch it.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical URI (`@odata.id`).
    #[serde(rename = "@odata.id", default)]
    pub odata_id: String,
    /// Resource identifier (`Id`).
    #[serde(rename = "Id", default)]
    pub id: String,
    /// Display name (`Name`).
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "@odata.etag", default, skip_serializing)]
    etag: Option<String>,
    #[serde(skip)]
    client: Option<Client>,
    #[serde(skip)]
    raw: Option<Arc<[u8]>>,
    #[serde(skip)]
    strip_etag_quotes: bool,
    #[serde(skip)]
    disable_etag_match: bool,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("odata_id", &self.odata_id)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("etag", &self.etag)
            .field("raw_len", &self.raw.as_ref().map(|r| r.len()))
            .finish()
    }
}

impl Entity {
    /// The ETag the service returned with this representation.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Replace the cached ETag.
    pub fn set_etag(&mut self, etag: impl Into<String>) {
        let etag = etag.into();
        self.etag = (!etag.is_empty()).then_some(etag);
    }

    /// The client this entity was fetched with.
    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    /// The body this entity was decoded from, byte for byte.
    pub fn raw_json(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Send the ETag without its surrounding quotes; some services compare it verbatim.
    pub fn set_strip_etag_quotes(&mut self, strip: bool) {
        self.strip_etag_quotes = strip;
    }

    /// Never send `If-Match`, for services that reject their own ETags.
    pub fn set_disable_etag_match(&mut self, disable: bool) {
        self.disable_etag_match = disable;
    }

    /// Headers to send with writes to this entity (`If-Match`).
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.disable_etag_match {
            return headers;
        }
        if let Some(etag) = self.etag.as_deref() {
            let etag = if self.strip_etag_quotes {
                etag.trim_matches('"')
            } else {
                etag
            };
            if let Ok(value) = HeaderValue::from_str(etag) {
                headers.insert(IF_MATCH, value);
            }
        }
        headers
    }

    /// PATCH the fields that differ between `original` and `updated`.
    ///
    /// Every changed field must be listed in `allowed`, otherwise nothing is sent
    /// and the first offending field is reported as read only. An empty diff
    /// sends nothing.
    pub fn update<T: Serialize + ?Sized>(
        &self,
        original: &T,
        updated: &T,
        allowed: &[&str],
    ) -> Result<()> {
        let payload = patch_payload(original, updated)?;
        self.send_patch(payload, allowed)
    }

    /// Like [`Entity::update`], with the original decoded again from the retained
    /// body and the fields in [`Resource::MAPPINGS`] written whole.
    pub fn update_from_raw<T: Resource>(&self, updated: &T, allowed: &[&str]) -> Result<()> {
        let raw = self
            .raw
            .as_deref()
            .ok_or(Error::InvalidArgument("entity has no retained body"))?;
        let mut original: T = serde_json::from_slice(raw)?;
        // Bodies without `@odata.id` were bound to their request URI.
        if original.entity().odata_id.is_empty() {
            original.entity_mut().odata_id = self.odata_id.clone();
        }
        let payload = patch_payload_with_mappings(&original, updated, T::MAPPINGS)?;
        self.send_patch(payload, allowed)
    }

    fn send_patch(&self, payload: Map<String, Value>, allowed: &[&str]) -> Result<()> {
        check_allowed(&payload, allowed)?;
        if payload.is_empty() {
            return Ok(());
        }
        self.patch(&self.odata_id, &payload)
    }

    /// PATCH `payload` to `uri` with this entity's `If-Match`.
    pub fn patch<P: Serialize + ?Sized>(&self, uri: &str, payload: &P) -> Result<()> {
        self.bound_client()?
            .patch_with_headers(uri, payload, &self.headers())?
            .cleanup()
    }

    /// POST `payload` to `uri` with this entity's `If-Match`.
    pub fn post<P: Serialize + ?Sized>(&self, uri: &str, payload: &P) -> Result<()> {
        self.post_with_response(uri, payload)?.cleanup()
    }

    /// POST `payload` to `uri` and hand back the response.
    pub fn post_with_response<P: Serialize + ?Sized>(
        &self,
        uri: &str,
        payload: &P,
    ) -> Result<Response> {
        self.bound_client()?
            .post_with_headers(uri, payload, &self.headers())
    }

    pub(crate) fn bound_client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or(Error::InvalidArgument("entity is not bound to a client"))
    }

    pub(crate) fn raw_arc(&self) -> Option<Arc<[u8]>> {
        self.raw.clone()
    }

    pub(crate) fn bind(
        &mut self,
        client: &Client,
        uri: &str,
        raw: Arc<[u8]>,
        header_etag: Option<String>,
    ) {
        if self.odata_id.is_empty() {
            self.odata_id = parse_query(uri).0.to_owned();
        }
        if self.etag.as_deref().is_none_or(str::is_empty) {
            self.etag = header_etag.filter(|e| !e.is_empty());
        }
        self.client = Some(client.clone());
        self.raw = Some(raw);
    }
}

/// A record decoded from the service that embeds an [`Entity`].
///
/// Implement it with [`impl_resource!`](crate::impl_resource) for structs
/// whose embedded entity field is named `entity`.
pub trait Resource: Serialize + DeserializeOwned + Send {
    /// Wire names of top-level fields that are string-keyed maps rather than
    /// records. [`Resource::update`] writes them whole when they change.
    const MAPPINGS: &'static [&'static str] = &[];

    /// The embedded entity.
    fn entity(&self) -> &Entity;

    /// The embedded entity, mutably.
    fn entity_mut(&mut self) -> &mut Entity;

    /// PATCH what changed since this record was fetched.
    fn update(&self, allowed: &[&str]) -> Result<()> {
        self.entity().update_from_raw(self, allowed)
    }
}

impl Resource for Entity {
    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }
}

/// Implement [`Resource`] for records with a flattened `entity: Entity` field.
#[macro_export]
macro_rules! impl_resource {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Resource for $ty {
                fn entity(&self) -> &$crate::Entity {
                    &self.entity
                }

                fn entity_mut(&mut self) -> &mut $crate::Entity {
                    &mut self.entity
                }
            }
        )+
    };
}

/// GET `uri` (with `options` appended) and decode it as `T`.
pub fn get_object<T: Resource>(client: &Client, uri: &str, options: &[QueryOption]) -> Result<T> {
    let response = client.get(&build_query(uri, options))?;
    decode_response(client, uri, response)
}

/// Decode a response into `T`, binding it to `client`.
pub fn decode_response<T: Resource>(client: &Client, uri: &str, response: Response) -> Result<T> {
    let etag = response.etag().map(str::to_owned);
    let raw: Arc<[u8]> = response.bytes()?.into();
    decode_raw(client, uri, raw, etag)
}

pub(crate) fn decode_raw<T: Resource>(
    client: &Client,
    uri: &str,
    raw: Arc<[u8]>,
    etag: Option<String>,
) -> Result<T> {
    let mut resource: T = serde_json::from_slice(&raw)?;
    resource.entity_mut().bind(client, uri, raw, etag);
    Ok(resource)
}
