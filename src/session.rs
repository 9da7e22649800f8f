use serde::Serialize;

use crate::client::Client;
use crate::client::core::X_AUTH_TOKEN;
use crate::error::{Error, Result};
use crate::schemas::SessionResource;
use crate::secret::Secret;

/// Fallback session collection for services that do not advertise one.
pub const DEFAULT_SESSIONS_URI: &str = "/redfish/v1/SessionService/Sessions";

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session identifier.
    pub id: String,
    /// Session resource URI; deleting it logs out.
    pub uri: String,
    /// Token sent as `X-Auth-Token`.
    pub token: Secret,
}

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(rename = "UserName")]
    username: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

/// Log in by POSTing credentials to `sessions_uri` and store the token on `client`.
pub(crate) fn create_session(
    client: &Client,
    sessions_uri: &str,
    username: &str,
    password: &Secret,
) -> Result<Session> {
    let credentials = Credentials {
        username,
        password: password.expose(),
    };
    let response = client.post(sessions_uri, &credentials)?;

    let token = response
        .header(X_AUTH_TOKEN.as_str())
        .filter(|t| !t.is_empty())
        .map(Secret::new)
        .ok_or(Error::Unsupported("session created without an X-Auth-Token"))?;
    let location = response.location().map(location_path);
    let body = response.bytes()?;

    // Some services answer the login with an empty or non-JSON body.
    let record = serde_json::from_slice::<SessionResource>(&body).ok();

    let uri = match (location, &record) {
        (Some(location), _) => location,
        (None, Some(record)) if !record.entity.odata_id.is_empty() => {
            record.entity.odata_id.clone()
        }
        _ => return Err(Error::Unsupported("session created without a Location")),
    };
    let id = match &record {
        Some(record) if !record.entity.id.is_empty() => record.entity.id.clone(),
        _ => last_segment(&uri).to_owned(),
    };

    let session = Session { id, uri, token };
    client.store_session(&session);

    #[cfg(feature = "tracing")]
    tracing::info!(session_id = %session.id, uri = %session.uri, "redfish session created");

    Ok(session)
}

/// Log out by deleting `uri`. A session the service no longer knows counts as deleted.
pub(crate) fn delete_session(client: &Client, uri: &str) -> Result<()> {
    let result = match client.delete(uri) {
        Ok(response) => response.cleanup(),
        Err(err) if err.status() == Some(404) => Ok(()),
        Err(err) => Err(err),
    };
    if result.is_ok() {
        client.forget_session(uri);

        #[cfg(feature = "tracing")]
        tracing::info!(uri, "redfish session deleted");
    }
    result
}

/// Reduce an absolute `Location` to its path and query.
fn location_path(location: &str) -> String {
    match reqwest::Url::parse(location) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        },
        Err(_) => location.to_owned(),
    }
}

fn last_segment(uri: &str) -> &str {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_reduced_to_path() {
        assert_eq!(
            location_path("https://10.0.0.1/redfish/v1/SessionService/Sessions/42"),
            "/redfish/v1/SessionService/Sessions/42"
        );
        assert_eq!(
            location_path("/redfish/v1/SessionService/Sessions/42"),
            "/redfish/v1/SessionService/Sessions/42"
        );
    }

    #[test]
    fn id_falls_back_to_last_segment() {
        assert_eq!(last_segment("/redfish/v1/SessionService/Sessions/42/"), "42");
    }
}
