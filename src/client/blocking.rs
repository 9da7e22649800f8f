use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::client::core::{AuthToken, ClientCore, DEFAULT_SERVICE_ROOT};
use crate::error::{Error, Result, ServiceError};
use crate::retry_after::parse_retry_after;
use crate::secret::Secret;
use crate::service_root::ServiceRoot;
use crate::session::{Session, delete_session};
use crate::transport::blocking::DEFAULT_CONNECT_TIMEOUT;
use crate::transport::{Body, HttpTransport, Part, Response, Transport};

const GET_OK: &[u16] = &[200];
const POST_OK: &[u16] = &[200, 201, 202, 204];
const MODIFY_OK: &[u16] = &[200, 202, 204];
pub(crate) const MONITOR_OK: &[u16] = &[200, 201, 202, 204];

/// Default number of member fetches a collection traversal runs at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// A blocking Redfish client.
///
/// `Client` is cheap to clone; clones share the endpoint, the transport and the
/// session token. Every decoded resource keeps a clone to issue follow-up requests.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    core: ClientCore,
    transport: Arc<dyn Transport>,
    max_concurrency: usize,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.core.endpoint())
            .field("max_concurrency", &self.inner.max_concurrency)
            .finish()
    }
}

/// Connection settings for [`Client::connect`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Base URL of the service, e.g. `https://10.0.0.10`.
    pub endpoint: String,
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: Option<Secret>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// A preconfigured HTTP client, used as-is.
    pub http_client: Option<reqwest::blocking::Client>,
    /// A session obtained earlier; preferred over the credentials.
    pub session: Option<Session>,
    /// Authenticate every request with HTTP basic auth instead of a session.
    pub basic_auth: bool,
    /// Connect timeout; defaults to 10 seconds.
    pub timeout: Option<Duration>,
    /// Collection fetch fan-out; defaults to [`DEFAULT_MAX_CONCURRENCY`].
    pub max_concurrency: Option<usize>,
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    endpoint: String,
    username: String,
    password: Option<Secret>,
    insecure: bool,
    timeout: Duration,
    http_client: Option<reqwest::blocking::Client>,
    transport: Option<Arc<dyn Transport>>,
    session: Option<Session>,
    basic_auth: bool,
    max_concurrency: usize,
}

impl ClientBuilder {
    /// Create a new builder.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: String::new(),
            password: None,
            insecure: false,
            timeout: DEFAULT_CONNECT_TIMEOUT,
            http_client: None,
            transport: None,
            session: None,
            basic_auth: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Create a builder from a [`ClientConfig`].
    pub fn from_config(config: ClientConfig) -> Self {
        let ClientConfig {
            endpoint,
            username,
            password,
            insecure,
            http_client,
            session,
            basic_auth,
            timeout,
            max_concurrency,
        } = config;
        Self {
            endpoint,
            username,
            password,
            insecure,
            timeout: timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            http_client,
            transport: None,
            session,
            basic_auth,
            max_concurrency: max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
        }
    }

    /// Set the account name.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the account password.
    pub fn password(mut self, password: impl Into<Secret>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Skip TLS certificate verification.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Set the connect timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured `reqwest` client; `insecure` and `timeout` are then ignored.
    pub fn http_client(mut self, http: reqwest::blocking::Client) -> Self {
        self.http_client = Some(http);
        self
    }

    /// Use a custom [`Transport`]; takes precedence over [`Self::http_client`].
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Reuse a session obtained earlier.
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Authenticate with HTTP basic auth instead of creating a session.
    pub fn basic_auth(mut self, basic_auth: bool) -> Self {
        self.basic_auth = basic_auth;
        self
    }

    /// Set how many collection members are fetched at once (minimum 1).
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Build the [`Client`] without talking to the service.
    pub fn build(self) -> Result<Client> {
        let core = ClientCore::new(&self.endpoint)?;

        let transport: Arc<dyn Transport> = match (self.transport, self.http_client) {
            (Some(transport), _) => transport,
            (None, Some(http)) => Arc::new(HttpTransport::from_client(http)),
            (None, None) => Arc::new(HttpTransport::new(self.insecure, self.timeout)?),
        };

        let mut auth = AuthToken {
            username: self.username,
            password: self.password,
            basic_auth: self.basic_auth,
            ..AuthToken::default()
        };
        if let Some(session) = self.session {
            auth.token = Some(session.token);
            auth.session = session.uri;
            auth.session_id = session.id;
        }
        core.set_auth(auth);

        Ok(Client {
            inner: Arc::new(Inner {
                core,
                transport,
                max_concurrency: self.max_concurrency.max(1),
            }),
        })
    }

    /// Build the [`Client`] and authenticate.
    ///
    /// A configured session or basic auth is used as-is; otherwise a session is
    /// created with the credentials through the service root.
    pub fn connect(self) -> Result<Client> {
        let client = self.build()?;
        client.login_if_needed()?;
        Ok(client)
    }
}

impl Client {
    /// Create a [`ClientBuilder`].
    pub fn builder(endpoint: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(endpoint)
    }

    /// Build a client from `config` and authenticate.
    pub fn connect(config: ClientConfig) -> Result<Client> {
        ClientBuilder::from_config(config).connect()
    }

    /// Base URL of the service.
    pub fn endpoint(&self) -> &str {
        self.inner.core.endpoint()
    }

    /// Collection fetch fan-out.
    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency
    }

    /// Fetch the service root.
    pub fn service_root(&self) -> Result<ServiceRoot> {
        ServiceRoot::get(self)
    }

    /// GET `path`. An empty path fetches the service root.
    pub fn get(&self, path: &str) -> Result<Response> {
        self.get_with_headers(path, &HeaderMap::new())
    }

    /// GET `path` with extra headers.
    pub fn get_with_headers(&self, path: &str, headers: &HeaderMap) -> Result<Response> {
        let path = if path.is_empty() {
            DEFAULT_SERVICE_ROOT
        } else {
            path
        };
        self.execute(Method::GET, path, Body::Empty, Some(headers), GET_OK)
    }

    /// POST a JSON payload.
    pub fn post<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Response> {
        self.post_with_headers(path, payload, &HeaderMap::new())
    }

    /// POST a JSON payload with extra headers.
    pub fn post_with_headers<P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let body = Body::Json(serde_json::to_vec(payload)?);
        self.execute(Method::POST, path, body, Some(headers), POST_OK)
    }

    /// POST a `multipart/form-data` body.
    pub fn post_multipart(&self, path: &str, parts: Vec<Part>) -> Result<Response> {
        self.post_multipart_with_headers(path, parts, &HeaderMap::new())
    }

    /// POST a `multipart/form-data` body with extra headers.
    pub fn post_multipart_with_headers(
        &self,
        path: &str,
        parts: Vec<Part>,
        headers: &HeaderMap,
    ) -> Result<Response> {
        self.execute(
            Method::POST,
            path,
            Body::Multipart(parts),
            Some(headers),
            POST_OK,
        )
    }

    /// PATCH a JSON payload.
    pub fn patch<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Response> {
        self.patch_with_headers(path, payload, &HeaderMap::new())
    }

    /// PATCH a JSON payload with extra headers.
    pub fn patch_with_headers<P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let body = Body::Json(serde_json::to_vec(payload)?);
        self.execute(Method::PATCH, path, body, Some(headers), MODIFY_OK)
    }

    /// PUT a JSON payload.
    pub fn put<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Response> {
        self.put_with_headers(path, payload, &HeaderMap::new())
    }

    /// PUT a JSON payload with extra headers.
    pub fn put_with_headers<P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
        headers: &HeaderMap,
    ) -> Result<Response> {
        let body = Body::Json(serde_json::to_vec(payload)?);
        self.execute(Method::PUT, path, body, Some(headers), MODIFY_OK)
    }

    /// DELETE `path`.
    pub fn delete(&self, path: &str) -> Result<Response> {
        self.delete_with_headers(path, &HeaderMap::new())
    }

    /// DELETE `path` with extra headers.
    pub fn delete_with_headers(&self, path: &str, headers: &HeaderMap) -> Result<Response> {
        self.execute(Method::DELETE, path, Body::Empty, Some(headers), MODIFY_OK)
    }

    /// The active session, if the client authenticated with one.
    pub fn session(&self) -> Result<Session> {
        let auth = self.inner.core.auth().ok_or(Error::NotAuthenticated)?;
        match &auth.token {
            Some(token) if !token.is_empty() => Ok(Session {
                id: auth.session_id.clone(),
                uri: auth.session.clone(),
                token: token.clone(),
            }),
            _ => Err(Error::NotAuthenticated),
        }
    }

    /// Create a new client with the same endpoint, transport and credentials but
    /// its own session.
    ///
    /// Fails when this client already holds a session, since the credentials are
    /// then not necessarily known.
    pub fn clone_with_session(&self) -> Result<Client> {
        let auth = self.inner.core.auth().unwrap_or_default();
        if auth.has_session() {
            return Err(Error::InvalidArgument("client already has a session"));
        }
        if auth.username.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        let core = ClientCore::new(self.endpoint())?;
        core.set_auth(AuthToken {
            username: auth.username.clone(),
            password: auth.password.clone(),
            ..AuthToken::default()
        });
        let client = Client {
            inner: Arc::new(Inner {
                core,
                transport: Arc::clone(&self.inner.transport),
                max_concurrency: self.inner.max_concurrency,
            }),
        };
        client.login_if_needed()?;
        Ok(client)
    }

    /// Delete the active session and forget its token.
    ///
    /// Clients without a session (basic auth, or never logged in) have nothing to do.
    pub fn logout(&self) -> Result<()> {
        let Some(auth) = self.inner.core.auth() else {
            return Ok(());
        };
        if !auth.has_session() || auth.session.is_empty() {
            self.inner.core.clear_session();
            return Ok(());
        }
        let result = delete_session(self, &auth.session);
        self.inner.core.clear_session();
        result
    }

    pub(crate) fn login_if_needed(&self) -> Result<()> {
        let Some(auth) = self.inner.core.auth() else {
            return Ok(());
        };
        if auth.has_session() || auth.basic_auth || auth.username.is_empty() {
            return Ok(());
        }
        let password = auth.password.clone().unwrap_or_else(|| Secret::new(""));
        let root = ServiceRoot::get(self)?;
        root.create_session(&auth.username, &password)?;
        Ok(())
    }

    pub(crate) fn store_session(&self, session: &Session) {
        let mut auth = self
            .inner
            .core
            .auth()
            .map(|a| (*a).clone())
            .unwrap_or_default();
        auth.token = Some(session.token.clone());
        auth.session = session.uri.clone();
        auth.session_id = session.id.clone();
        self.inner.core.set_auth(auth);
    }

    pub(crate) fn forget_session(&self, uri: &str) {
        if self
            .inner
            .core
            .auth()
            .is_some_and(|auth| auth.session == uri)
        {
            self.inner.core.clear_session();
        }
    }

    /// GET accepting every status a task monitor may answer with.
    pub(crate) fn get_accepting(&self, path: &str, accepted: &[u16]) -> Result<Response> {
        self.execute(Method::GET, path, Body::Empty, None, accepted)
    }

    fn execute(
        &self,
        method: Method,
        path: &str,
        body: Body,
        headers: Option<&HeaderMap>,
        accepted: &[u16],
    ) -> Result<Response> {
        let request = self.inner.core.compose(method.clone(), path, body, headers)?;
        crate::debug::dump_request(&request);

        let start = Instant::now();
        let result = self
            .inner
            .transport
            .send(request)
            .and_then(|response| check_status(response, accepted));
        let elapsed = start.elapsed();
        match &result {
            Ok(resp) => crate::observe::record_ok(&method, path, elapsed, resp.status()),
            Err(err) => crate::observe::record_err(&method, path, elapsed, err),
        }
        result
    }
}

fn check_status(response: Response, accepted: &[u16]) -> Result<Response> {
    crate::debug::dump_response(response.status(), response.headers());
    if accepted.contains(&response.status()) {
        return Ok(response);
    }

    let status = response.status();
    let retry_after = response
        .header("retry-after")
        .and_then(|value| parse_retry_after(value).ok());
    let body = response.bytes()?;
    Err(ServiceError::from_body(status, &body)
        .with_retry_after(retry_after)
        .into())
}
