//! Upload-session models: the JSON exchanged with the resumable upload
//! endpoint before and after the byte transfer.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::http::HttpContext;

pub const PROTOCOL_VERSION: &str = "0.8";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub protocol_version: &'static str,
    pub create_session_request: CreateSessionRequest,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {
    pub fields: Vec<SessionField>,
}

#[derive(Debug, Serialize)]
pub struct SessionField {
    pub external: ExternalField,
}

#[derive(Debug, Serialize)]
pub struct ExternalField {
    pub name: &'static str,
    pub filename: String,
    pub put: PutRequest,
    pub size: u64,
}

#[derive(Debug, Default, Serialize)]
pub struct PutRequest {}

impl SessionRequest {
    pub fn new(file_name: &str, size: u64) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            create_session_request: CreateSessionRequest {
                fields: vec![SessionField {
                    external: ExternalField {
                        name: "file",
                        filename: file_name.to_owned(),
                        put: PutRequest::default(),
                        size,
                    },
                }],
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionResponse {
    pub session_status: SessionStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStatus {
    pub state: String,
    pub external_field_transfers: Vec<ExternalFieldTransfer>,
    #[serde(rename = "upload_id")]
    pub upload_id: String,
    pub additional_info: AdditionalInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalFieldTransfer {
    pub name: String,
    pub status: String,
    pub put_info: PutInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PutInfo {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdditionalInfo {
    #[serde(rename = "uploader_service.GoogleRupioAdditionalInfo")]
    pub rupio: RupioInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RupioInfo {
    pub completion_info: CompletionInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionInfo {
    pub status: String,
    pub customer_specific_info: CustomerSpecificInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomerSpecificInfo {
    #[serde(rename = "upload_token_base64")]
    pub upload_token: String,
}

/// Where and how much to send for one upload. Consumed by the transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSession {
    pub put_url: String,
    pub size_bytes: u64,
}

/// Completion token proving the bytes arrived; the input to finalize.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadHandle(String);

impl UploadHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn parse_response(url: &str, body: &str) -> Result<SessionResponse, ClientError> {
    serde_json::from_str(body).map_err(|err| ClientError::Transport {
        url: url.to_owned(),
        message: format!("malformed upload session response: {err}"),
    })
}

/// Opens an upload session for `size` bytes named `file_name`.
pub fn create_session(
    http: &HttpContext,
    url: &str,
    file_name: &str,
    size: u64,
) -> Result<UploadSession, ClientError> {
    let request = serde_json::to_value(SessionRequest::new(file_name, size)).map_err(|err| {
        ClientError::Transport { url: url.to_owned(), message: err.to_string() }
    })?;
    let body = http.post_json(url, &request)?;
    session_from_body(url, &body, size)
}

pub fn session_from_body(url: &str, body: &str, size: u64) -> Result<UploadSession, ClientError> {
    let response = parse_response(url, body)?;
    let put_url = response
        .session_status
        .external_field_transfers
        .into_iter()
        .next()
        .map(|transfer| transfer.put_info.url)
        .filter(|put_url| !put_url.is_empty())
        .ok_or_else(|| ClientError::Transport {
            url: url.to_owned(),
            message: "upload session response carries no put URL".to_owned(),
        })?;
    Ok(UploadSession { put_url, size_bytes: size })
}

/// Reads the completion token from the body returned by the byte transfer.
pub fn handle_from_body(url: &str, body: &str) -> Result<UploadHandle, ClientError> {
    let response = parse_response(url, body)?;
    let token = response
        .session_status
        .additional_info
        .rupio
        .completion_info
        .customer_specific_info
        .upload_token;
    if token.is_empty() {
        log::debug!("transfer response without completion token: {body}");
        return Err(ClientError::Transport {
            url: url.to_owned(),
            message: "transfer response carries no upload token".to_owned(),
        });
    }
    Ok(UploadHandle(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_request_matches_wire_shape() {
        let value = serde_json::to_value(SessionRequest::new("cat.jpg", 2048)).unwrap();
        assert_eq!(
            value,
            json!({
                "protocolVersion": "0.8",
                "createSessionRequest": {
                    "fields": [{
                        "external": {"name": "file", "filename": "cat.jpg", "put": {}, "size": 2048}
                    }]
                }
            })
        );
    }

    #[test]
    fn put_url_comes_from_first_transfer() {
        let body = json!({
            "sessionStatus": {
                "state": "OPEN",
                "externalFieldTransfers": [
                    {"name": "file", "status": "IN_PROGRESS", "putInfo": {"url": "https://up/1"}},
                    {"name": "file", "putInfo": {"url": "https://up/2"}}
                ],
                "upload_id": "abc"
            }
        })
        .to_string();
        let session = session_from_body("u", &body, 9).unwrap();
        assert_eq!(session, UploadSession { put_url: "https://up/1".into(), size_bytes: 9 });
    }

    #[test]
    fn missing_put_url_is_an_error() {
        let body = json!({"sessionStatus": {"externalFieldTransfers": []}}).to_string();
        assert!(session_from_body("u", &body, 1).is_err());
    }

    #[test]
    fn completion_token_is_read_from_additional_info() {
        let body = json!({
            "sessionStatus": {
                "state": "FINALIZED",
                "additionalInfo": {
                    "uploader_service.GoogleRupioAdditionalInfo": {
                        "completionInfo": {
                            "status": "SUCCESS",
                            "customerSpecificInfo": {"upload_token_base64": "CAIS+tok=="}
                        }
                    }
                }
            }
        })
        .to_string();
        assert_eq!(handle_from_body("u", &body).unwrap().as_str(), "CAIS+tok==");
    }

    #[test]
    fn empty_completion_token_is_an_error() {
        let body = json!({"sessionStatus": {"state": "FINALIZED"}}).to_string();
        let err = handle_from_body("u", &body).unwrap_err();
        assert!(err.to_string().contains("no upload token"));
    }
}
