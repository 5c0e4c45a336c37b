use crate::config::Endpoints;
use crate::error::ClientError;
use crate::http::HttpContext;
use crate::token::{SessionToken, TokenSource};

/// Token, transport and endpoints for one client.
///
/// Holds no protocol logic. The token is acquired on first use and cached
/// until [`SessionContext::refresh_token`] is called. A context serves one
/// top-level operation at a time; every operation takes `&mut self`.
pub struct SessionContext {
    http: HttpContext,
    endpoints: Endpoints,
    token: Option<SessionToken>,
    source: Box<dyn TokenSource>,
}

impl SessionContext {
    pub fn new(http: HttpContext, endpoints: Endpoints, source: Box<dyn TokenSource>) -> Self {
        Self { http, endpoints, token: None, source }
    }

    pub fn http(&self) -> &HttpContext {
        &self.http
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn ensure_token(&mut self) -> Result<&SessionToken, ClientError> {
        if self.token.is_none() {
            let token = self.source.acquire(&self.http)?;
            log::debug!("session token acquired");
            self.token = Some(token);
        }
        self.token.as_ref().ok_or_else(|| ClientError::token_unavailable("token not cached"))
    }

    /// Drops the cached token and acquires a new one.
    pub fn refresh_token(&mut self) -> Result<&SessionToken, ClientError> {
        log::warn!("refreshing session token");
        self.token = None;
        self.ensure_token()
    }

    /// Posts `envelope` to `endpoint` with the session token and returns the
    /// raw body, prefix included.
    pub fn execute(&mut self, endpoint: &str, envelope: &str) -> Result<Vec<u8>, ClientError> {
        let token = self.ensure_token()?.as_str().to_owned();
        log::debug!("posting {} byte envelope to {endpoint}", envelope.len());
        self.http.post_form(endpoint, &[("at", token.as_str()), ("f.req", envelope)])
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("endpoints", &self.endpoints)
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}
