#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use serde_json::{json, Value};

pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn form(&self) -> HashMap<String, String> {
        decode_form(&String::from_utf8_lossy(&self.body))
    }
}

pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Serves `expected` connections one at a time, answering each with
/// `handler`, and hands back every request it saw.
pub struct MockServer {
    base: String,
    worker: JoinHandle<Vec<Recorded>>,
}

impl MockServer {
    pub fn start<F>(expected: usize, mut handler: F) -> Self
    where
        F: FnMut(&Recorded, &str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let server_base = base.clone();
        let worker = thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..expected {
                let (mut stream, _) = listener.accept().unwrap();
                let request = read_http_request(&mut stream);
                let reply = handler(&request, &server_base);
                write_http_response(&mut stream, reply.status, &reply.body);
                seen.push(request);
            }
            seen
        });
        Self { base, worker }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn finish(self) -> Vec<Recorded> {
        self.worker.join().unwrap()
    }
}

fn read_http_request(stream: &mut TcpStream) -> Recorded {
    let mut bytes = Vec::new();
    let mut header_end = None;
    let mut content_length = 0usize;

    loop {
        let mut buf = [0u8; 16 * 1024];
        let read = match stream.read(&mut buf) {
            Ok(read) => read,
            Err(_) => 0,
        };
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&buf[..read]);

        if header_end.is_none() {
            if let Some(pos) = find_header_end(&bytes) {
                header_end = Some(pos);
                let headers = String::from_utf8_lossy(&bytes[..pos]);
                content_length = parse_content_length(&headers);
            }
        }

        if let Some(pos) = header_end {
            if bytes.len() >= pos + 4 + content_length {
                break;
            }
        }
    }

    let header_end = header_end.expect("valid http request headers");
    let head = String::from_utf8_lossy(&bytes[..header_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();
    let body_start = (header_end + 4).min(bytes.len());
    let body_end = (body_start + content_length).min(bytes.len());

    Recorded { method, path, headers, body: bytes[body_start..body_end].to_vec() }
}

fn write_http_response(stream: &mut TcpStream, status_code: u16, body: &[u8]) {
    let status_text = match status_code {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {status_code} {status_text}\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    // The client may already have hung up after a failed body.
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn find_header_end(bytes: &[u8]) -> Option<usize> {
    bytes.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|line| {
            let lower = line.to_ascii_lowercase();
            lower
                .strip_prefix("content-length:")
                .and_then(|value| value.trim().parse::<usize>().ok())
        })
        .unwrap_or(0)
}

pub fn decode_form(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'+' => {
                out.push(b' ');
                index += 1;
            }
            b'%' if index + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[index + 1..index + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                index += 3;
            }
            byte => {
                out.push(byte);
                index += 1;
            }
        }
    }
    String::from_utf8(out).unwrap()
}

/// `)]}'` guarded, chunked batch response carrying `inner` for `rpc_id`.
pub fn rpc_body(rpc_id: &str, inner: &Value) -> Vec<u8> {
    let frame = json!([["wrb.fr", rpc_id, inner.to_string(), null, null, null, "generic"], ["di", 42]])
        .to_string();
    format!(")]}}'\n\n{}\n{frame}\n25\n[[\"e\",4,null,null,170]]\n", frame.len()).into_bytes()
}

pub fn session_body(put_url: &str) -> Vec<u8> {
    json!({
        "sessionStatus": {
            "state": "OPEN",
            "externalFieldTransfers": [
                {"name": "file", "status": "IN_PROGRESS", "putInfo": {"url": put_url}}
            ],
            "upload_id": "upload-1"
        }
    })
    .to_string()
    .into_bytes()
}

pub fn completion_body(token: &str) -> Vec<u8> {
    json!({
        "sessionStatus": {
            "state": "FINALIZED",
            "additionalInfo": {
                "uploader_service.GoogleRupioAdditionalInfo": {
                    "completionInfo": {
                        "status": "SUCCESS",
                        "customerSpecificInfo": {"upload_token_base64": token}
                    }
                }
            }
        }
    })
    .to_string()
    .into_bytes()
}
