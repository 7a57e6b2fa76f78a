//! Loading images from URLs, `data:` URIs and the filesystem.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, PixelBuffer, Result, io};

/// Where an input raster lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    Url(String),
    DataUri(String),
    File(PathBuf),
}

impl ImageLocation {
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageLocation::Url(trimmed.to_string())
        } else if lower.starts_with("data:") {
            ImageLocation::DataUri(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            ImageLocation::File(PathBuf::from(path))
        } else {
            ImageLocation::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageLocation::Url(url) => write!(f, "{}", url),
            ImageLocation::DataUri(uri) => {
                let head: String = uri.chars().take(32).collect();
                write!(f, "{}...", head)
            }
            ImageLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// HTTP options for URL sources.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Sent as `Authorization: Bearer ...` on the first attempt only.
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            bearer_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub fn load_image(location: &ImageLocation, options: &FetchOptions) -> Result<PixelBuffer> {
    match location {
        ImageLocation::Url(url) => {
            let bytes = fetch_with_retry(url, options)?;
            io::decode(&bytes)
        }
        ImageLocation::DataUri(uri) => io::decode_data_uri(uri),
        ImageLocation::File(path) => io::read_file(path),
    }
}

/// Fetches `url`, retrying once with an anonymous client.
fn fetch_with_retry(url: &str, options: &FetchOptions) -> Result<Vec<u8>> {
    match fetch(url, options, true) {
        Ok(bytes) => Ok(bytes),
        Err(first) => {
            tracing::warn!(
                "Image fetch from {} failed ({}), retrying without credentials",
                url,
                first
            );
            fetch(url, options, false).map_err(|reason| Error::Unreachable {
                url: url.to_string(),
                reason,
            })
        }
    }
}

fn fetch(
    url: &str,
    options: &FetchOptions,
    with_credentials: bool,
) -> std::result::Result<Vec<u8>, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| e.to_string())?;

    let mut request = client.get(url);
    if with_credentials {
        if let Some(token) = options.bearer_token.as_deref() {
            request = request.bearer_auth(token);
        }
    }

    let response = request.send().map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP status {}", status));
    }

    let bytes = response.bytes().map_err(|e| e.to_string())?;
    tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rect, Rgba};

    #[test]
    fn parse_recognises_location_kinds() {
        assert_eq!(
            ImageLocation::parse("https://maps.example/plan.png"),
            ImageLocation::Url("https://maps.example/plan.png".to_string())
        );
        assert!(matches!(
            ImageLocation::parse("data:image/png;base64,AAAA"),
            ImageLocation::DataUri(_)
        ));
        assert_eq!(
            ImageLocation::parse("file:///tmp/plan.png"),
            ImageLocation::File(PathBuf::from("/tmp/plan.png"))
        );
        assert_eq!(
            ImageLocation::parse(" plans/site.jpg "),
            ImageLocation::File(PathBuf::from("plans/site.jpg"))
        );
    }

    #[test]
    fn load_from_data_uri() {
        let mut buf = PixelBuffer::new_filled(4, 4, Rgba::WHITE);
        buf.fill_rect(Rect::new(1, 1, 2, 2), Rgba::BLACK);
        let uri = io::png_data_uri(&io::encode_png(&buf).unwrap());

        let loaded = load_image(&ImageLocation::parse(&uri), &FetchOptions::default()).unwrap();
        assert_eq!(loaded, buf);
    }

    #[test]
    fn unreachable_url_names_the_url_and_causes() {
        let options = FetchOptions {
            bearer_token: Some("secret".to_string()),
            timeout: Duration::from_millis(500),
        };
        // Port 9 (discard) on localhost is closed on test machines.
        let url = "http://127.0.0.1:9/plan.png";
        let err = load_image(&ImageLocation::parse(url), &options).unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, Error::Unreachable { .. }));
        assert!(message.contains(url));
        assert!(message.contains("backend"));
        assert!(message.contains("cross-origin"));
    }
}
