use std::sync::Arc;

use arc_swap::ArcSwapOption;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};

use crate::error::{Error, Result};
use crate::secret::Secret;
use crate::transport::{Body, Request};

/// Path of the service root.
pub const DEFAULT_SERVICE_ROOT: &str = "/redfish/v1/";

pub(crate) const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

const APPLICATION_JSON: &str = "application/json";
const USER_AGENT_VALUE: &str = concat!("redfish-rs/", env!("CARGO_PKG_VERSION"));

/// Credentials and session state of a client.
#[derive(Debug, Clone, Default)]
pub(crate) struct AuthToken {
    pub(crate) token: Option<Secret>,
    /// Session resource URI, used for logout.
    pub(crate) session: String,
    pub(crate) session_id: String,
    pub(crate) username: String,
    pub(crate) password: Option<Secret>,
    pub(crate) basic_auth: bool,
}

impl AuthToken {
    pub(crate) fn has_session(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Request composition shared by every client handle.
#[derive(Debug)]
pub(crate) struct ClientCore {
    endpoint: String,
    auth: ArcSwapOption<AuthToken>,
}

impl ClientCore {
    pub(crate) fn new(endpoint: &str) -> Result<Self> {
        if !endpoint.starts_with("http") {
            return Err(Error::InvalidArgument(
                "endpoint must start with http or https",
            ));
        }
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            auth: ArcSwapOption::empty(),
        })
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn auth(&self) -> Option<Arc<AuthToken>> {
        self.auth.load_full()
    }

    pub(crate) fn set_auth(&self, auth: AuthToken) {
        self.auth.store(Some(Arc::new(auth)));
    }

    /// Drop the session token but keep the credentials it was created from.
    pub(crate) fn clear_session(&self) {
        if let Some(current) = self.auth.load_full() {
            let mut next = (*current).clone();
            next.token = None;
            next.session.clear();
            next.session_id.clear();
            self.auth.store(Some(Arc::new(next)));
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        let mut url = String::with_capacity(self.endpoint.len() + path.len() + 1);
        url.push_str(&self.endpoint);
        if !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);
        url
    }

    pub(crate) fn compose(
        &self,
        method: Method,
        path: &str,
        body: Body,
        custom: Option<&HeaderMap>,
    ) -> Result<Request> {
        if path.is_empty() {
            return Err(Error::InvalidArgument(
                "unable to execute request, no target provided",
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        if matches!(body, Body::Json(_)) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }

        if let Some(auth) = self.auth.load_full() {
            apply_auth(&mut headers, &auth)?;
        }

        if let Some(custom) = custom {
            for (name, value) in custom {
                if value.is_empty() {
                    continue;
                }
                headers.insert(name.clone(), value.clone());
            }
        }

        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        Ok(Request {
            method,
            url: self.url(path),
            headers,
            body,
        })
    }
}

fn apply_auth(headers: &mut HeaderMap, auth: &AuthToken) -> Result<()> {
    if let Some(token) = auth.token.as_ref().filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(token.expose())
            .map_err(|_| Error::InvalidArgument("session token is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(X_AUTH_TOKEN, value);

        let mut cookie = HeaderValue::from_str(&format!("sessionKey={}", token.expose()))
            .map_err(|_| Error::InvalidArgument("session token is not a valid header value"))?;
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
        return Ok(());
    }

    if auth.basic_auth && !auth.username.is_empty() {
        let password = auth.password.as_ref().map(Secret::expose).unwrap_or("");
        let encoded = STANDARD.encode(format!("{}:{}", auth.username, password));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| Error::InvalidArgument("credentials are not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> ClientCore {
        ClientCore::new("https://bmc.example").expect("core")
    }

    #[test]
    fn endpoint_must_be_http() {
        let err = ClientCore::new("ftp://bmc.example").expect_err("expected error");
        assert_eq!(
            err.to_string(),
            "invalid argument: endpoint must start with http or https"
        );
    }

    #[test]
    fn compose_sets_default_headers() {
        let request = core()
            .compose(Method::POST, "/redfish/v1/Systems", Body::Json(b"{}".to_vec()), None)
            .expect("compose");
        assert_eq!(request.url, "https://bmc.example/redfish/v1/Systems");
        assert_eq!(request.headers[ACCEPT], "application/json");
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.headers[CONNECTION], "close");
        assert!(
            request.headers[USER_AGENT]
                .to_str()
                .expect("ascii")
                .starts_with("redfish-rs/")
        );
        assert!(request.headers.get(X_AUTH_TOKEN).is_none());
    }

    #[test]
    fn compose_rejects_empty_path() {
        let err = core()
            .compose(Method::DELETE, "", Body::Empty, None)
            .expect_err("expected error");
        assert!(matches!(
            err,
            Error::InvalidArgument("unable to execute request, no target provided")
        ));
    }

    #[test]
    fn token_is_sent_as_header_and_cookie() {
        let core = core();
        core.set_auth(AuthToken {
            token: Some(Secret::new("tok")),
            ..AuthToken::default()
        });
        let request = core
            .compose(Method::GET, "/redfish/v1/", Body::Empty, None)
            .expect("compose");
        assert_eq!(request.headers[X_AUTH_TOKEN], "tok");
        assert_eq!(request.headers[COOKIE], "sessionKey=tok");
        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn basic_auth_is_used_without_token() {
        let core = core();
        core.set_auth(AuthToken {
            username: "admin".into(),
            password: Some(Secret::new("secret")),
            basic_auth: true,
            ..AuthToken::default()
        });
        let request = core
            .compose(Method::GET, "/redfish/v1/", Body::Empty, None)
            .expect("compose");
        assert_eq!(request.headers[AUTHORIZATION], "Basic YWRtaW46c2VjcmV0");
    }

    #[test]
    fn custom_headers_override_and_skip_empty() {
        let mut custom = HeaderMap::new();
        custom.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));
        custom.insert("if-match", HeaderValue::from_static(""));
        let request = core()
            .compose(Method::GET, "/redfish/v1/", Body::Empty, Some(&custom))
            .expect("compose");
        assert_eq!(request.headers[ACCEPT], "application/octet-stream");
        assert!(request.headers.get("if-match").is_none());
    }
}
