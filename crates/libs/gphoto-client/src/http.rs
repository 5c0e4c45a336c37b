//! The shared HTTP transport: one `ureq` agent plus the browser-like headers
//! every request carries.

use std::io::Read;

use crate::config::ClientConfig;
use crate::error::ClientError;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[derive(Clone, Debug)]
pub struct HttpContext {
    agent: ureq::Agent,
    user_agent: String,
    referer: String,
    cookie_header: Option<String>,
}

impl HttpContext {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout())
            .timeout_read(config.read_timeout())
            .timeout_write(config.write_timeout())
            .build();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
            referer: format!("{}/", config.endpoints.home.trim_end_matches('/')),
            cookie_header: None,
        }
    }

    /// Attaches an opaque `Cookie` header to every request.
    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        let header = header.into();
        self.cookie_header = (!header.is_empty()).then_some(header);
        self
    }

    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    pub(crate) fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self.agent.request(method, url).set("User-Agent", &self.user_agent);
        match &self.cookie_header {
            Some(cookies) => request.set("Cookie", cookies),
            None => request,
        }
    }

    pub fn get_text(&self, url: &str) -> Result<String, ClientError> {
        let response =
            self.request("GET", url).call().map_err(|err| ClientError::transport(url, err))?;
        let response = ensure_success(url, response)?;
        response.into_string().map_err(|err| ClientError::Transport {
            url: url.to_owned(),
            message: format!("failed to read body: {err}"),
        })
    }

    /// Posts a url-encoded form and returns the raw body.
    pub fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Vec<u8>, ClientError> {
        let response = self
            .request("POST", url)
            .set("Referer", &self.referer)
            .send_form(fields)
            .map_err(|err| ClientError::transport(url, err))?;
        read_body(url, ensure_success(url, response)?)
    }

    /// Posts a JSON document with the browser's form content type.
    pub fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, ClientError> {
        let response = self
            .request("POST", url)
            .set("Content-Type", FORM_CONTENT_TYPE)
            .send_string(&body.to_string())
            .map_err(|err| ClientError::transport(url, err))?;
        let bytes = read_body(url, ensure_success(url, response)?)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

pub(crate) fn ensure_success(url: &str, response: ureq::Response) -> Result<ureq::Response, ClientError> {
    let status = response.status();
    if status > 299 {
        return Err(ClientError::Status {
            url: url.to_owned(),
            status,
            body: response.into_string().unwrap_or_default(),
        });
    }
    Ok(response)
}

pub(crate) fn read_body(url: &str, response: ureq::Response) -> Result<Vec<u8>, ClientError> {
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes).map_err(|err| ClientError::Transport {
        url: url.to_owned(),
        message: format!("failed to read body: {err}"),
    })?;
    Ok(bytes)
}
