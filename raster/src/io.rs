//! PNG/JPEG decoding and encoding, file IO and `data:` URIs.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{Error, PixelBuffer, Result};

/// Supported image file extensions for reading and writing.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Decodes PNG or JPEG bytes into RGBA8, whatever the stored color type.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer> {
    let img = image_lib::load_from_memory(bytes)?;
    Ok(PixelBuffer::from(img.to_rgba8()))
}

pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    buffer
        .to_rgba_image()
        .write_to(&mut out, image_lib::ImageFormat::Png)
        .map_err(|e| Error::Encoding(e.to_string()))?;
    Ok(out.into_inner())
}

fn extension_of(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|os_str| os_str.to_str())
        .ok_or_else(|| Error::InvalidExtension("missing extension".to_string()))?
        .to_ascii_lowercase();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(Error::InvalidExtension(extension))
    }
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    extension_of(path.as_ref())?;
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Writes PNG or JPEG depending on the extension. JPEG drops alpha.
pub fn save_file<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension_of(path)?.as_str() {
        "png" => std::fs::write(path, encode_png(buffer)?)?,
        _ => {
            let rgb = image_lib::DynamicImage::ImageRgba8(buffer.to_rgba_image()).to_rgb8();
            rgb.save_with_format(path, image_lib::ImageFormat::Jpeg)
                .map_err(|e| Error::Encoding(e.to_string()))?;
        }
    }
    Ok(())
}

pub fn png_data_uri(png: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URI_PREFIX, BASE64.encode(png))
}

/// Decodes a base64 `data:image/...;base64,` URI.
pub fn decode_data_uri(uri: &str) -> Result<PixelBuffer> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::DataUri("missing 'data:' scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::DataUri("missing ',' separator".to_string()))?;

    if !header.starts_with("image/") || !header.ends_with(";base64") {
        return Err(Error::DataUri(format!(
            "expected a base64 image payload, got '{}'",
            header
        )));
    }

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| Error::DataUri(e.to_string()))?;
    decode(&bytes)
}
