use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// One entry of a browser cookie export. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct ExportedCookie {
    name: String,
    value: String,
}

/// Reads a cookie export and joins it into a `Cookie` header value.
pub fn load_cookie_header(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read cookie file {}", path.display()))?;
    cookie_header(&contents).with_context(|| format!("invalid cookie file {}", path.display()))
}

pub fn cookie_header(export: &str) -> Result<String> {
    let cookies: Vec<ExportedCookie> =
        serde_json::from_str(export).context("expected a JSON array of cookies")?;
    let pairs: Vec<String> = cookies
        .into_iter()
        .filter(|cookie| !cookie.name.is_empty())
        .map(|cookie| format!("{}={}", cookie.name, cookie.value))
        .collect();
    if pairs.is_empty() {
        return Err(anyhow!("no cookies found"));
    }
    Ok(pairs.join("; "))
}
