use std::fmt;

use crate::error::ClientError;
use crate::http::HttpContext;

/// The bearer token sent as the `at` form field. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Result<Self, ClientError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ClientError::token_unavailable("token is empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"<redacted>").finish()
    }
}

/// Supplies a session token. How it is obtained is up to the implementation.
pub trait TokenSource: Send {
    fn acquire(&mut self, http: &HttpContext) -> Result<SessionToken, ClientError>;
}

/// A token the caller already holds.
#[derive(Clone, Debug)]
pub struct StaticToken(SessionToken);

impl StaticToken {
    pub fn new(value: impl Into<String>) -> Result<Self, ClientError> {
        SessionToken::new(value).map(Self)
    }
}

impl TokenSource for StaticToken {
    fn acquire(&mut self, _http: &HttpContext) -> Result<SessionToken, ClientError> {
        Ok(self.0.clone())
    }
}

/// Reads the token embedded in the service's home page, using whatever
/// credentials the HTTP context carries.
#[derive(Clone, Debug)]
pub struct PageTokenSource {
    url: String,
}

impl PageTokenSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl TokenSource for PageTokenSource {
    fn acquire(&mut self, http: &HttpContext) -> Result<SessionToken, ClientError> {
        log::info!("requesting session token from {}", self.url);
        let page = http.get_text(&self.url)?;
        let token = extract_page_token(&page)
            .ok_or_else(|| ClientError::token_unavailable("home page carries no token"))?;
        SessionToken::new(token)
    }
}

const PAGE_TOKEN_KEY: &str = r#""SNlM0e":""#;

/// Finds the `"SNlM0e":"<id>:<digits>"` assignment in the home page.
pub fn extract_page_token(page: &str) -> Option<&str> {
    page.match_indices(PAGE_TOKEN_KEY).find_map(|(start, _)| {
        let rest = &page[start + PAGE_TOKEN_KEY.len()..];
        let token = &rest[..rest.find('"')?];
        is_page_token(token).then_some(token)
    })
}

fn is_page_token(token: &str) -> bool {
    let Some((id, stamp)) = token.split_once(':') else {
        return false;
    };
    !id.is_empty()
        && id.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-')
        && !stamp.is_empty()
        && stamp.bytes().all(|byte| byte.is_ascii_digit())
}
