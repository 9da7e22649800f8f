//! HPE iLO overlays.

use std::io::Read;
use std::ops::Deref;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::oem::from_raw;
use crate::schemas;
use crate::task::{Accepted, post_multipart_with_task};
use crate::transport::Part;

/// Upload endpoint of iLO firmware that does not advertise `MultipartHttpPushUri`.
pub const DEFAULT_UPLOAD_URI: &str = "/cgi-bin/uploadFile";

/// `Oem.Hpe` of the update service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HpeUpdateService {
    /// Flash state, e.g. `Idle`, `Uploading`, `Flashing`.
    #[serde(default)]
    pub state: String,
    /// Progress of the running flash.
    #[serde(default)]
    pub flash_progress_percent: Option<u32>,
    /// The iLO clock.
    #[serde(default)]
    pub current_time: String,
}

/// The `parameters` part of a firmware upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadParameters {
    /// Keep the image in the iLO repository.
    pub update_repository: bool,
    /// Flash the image after the upload.
    pub update_target: bool,
    /// ETag to tag the repository entry with.
    #[serde(rename = "ETag", skip_serializing_if = "String::is_empty")]
    pub etag: String,
    /// Component section to flash.
    pub section: u32,
}

#[derive(Deserialize)]
struct UpdateBody {
    #[serde(rename = "Oem", default)]
    oem: UpdateOem,
}

#[derive(Default, Deserialize)]
struct UpdateOem {
    #[serde(rename = "Hpe", default)]
    hpe: HpeUpdateService,
}

/// An update service with its HPE extensions.
#[derive(Debug, Clone)]
pub struct UpdateService {
    /// The standard record.
    pub base: schemas::UpdateService,
    /// `Oem.Hpe`.
    pub hpe: HpeUpdateService,
}

impl UpdateService {
    /// Layer the HPE fields over `base`.
    pub fn from_update_service(base: &schemas::UpdateService) -> Result<Self> {
        let body: UpdateBody = from_raw(&base.entity)?;
        Ok(Self {
            base: base.clone(),
            hpe: body.oem.hpe,
        })
    }

    /// Where firmware images are pushed.
    pub fn upload_uri(&self) -> &str {
        if self.base.multipart_http_push_uri.is_empty() {
            DEFAULT_UPLOAD_URI
        } else {
            &self.base.multipart_http_push_uri
        }
    }

    /// Push a firmware image as a multipart form.
    ///
    /// iLO wants the session token inside the form as `sessionKey`. A client
    /// without a session logs in on a temporary one, which is deleted again
    /// once the upload has been answered.
    pub fn upload_firmware(
        &self,
        file_name: &str,
        image: impl Read + Send + 'static,
        parameters: &UploadParameters,
    ) -> Result<Accepted> {
        let client = self.base.entity.bound_client()?;
        let (client, temporary) = match client.session() {
            Ok(_) => (client.clone(), false),
            Err(Error::NotAuthenticated) => (client.clone_with_session()?, true),
            Err(err) => return Err(err),
        };

        let result = client.session().and_then(|session| {
            let parts = vec![
                Part::text("sessionKey", session.token.expose()),
                Part::json("parameters", parameters)?,
                Part::file("file", file_name, image),
            ];
            post_multipart_with_task(&client, self.upload_uri(), parts, &HeaderMap::new())
        });

        if temporary {
            if let Err(err) = client.logout() {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "failed to delete upload session");
                #[cfg(not(feature = "tracing"))]
                let _ = err;
            }
        }
        result
    }
}

impl Deref for UpdateService {
    type Target = schemas::UpdateService;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
