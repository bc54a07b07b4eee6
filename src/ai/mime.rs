use crate::{Error, Result};
use base64::Engine as _;

pub fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), assuming image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

/// Wrap inline image bytes in a `data:` URL so they travel like a hosted image.
pub fn to_data_url(bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        sniff_image_mime(bytes),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Decode the payload of a base64 `data:` URL. Returns `None` for other URLs.
pub fn decode_data_url(url: &str) -> Option<Result<Vec<u8>>> {
    let rest = url.strip_prefix("data:")?;
    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err(Error::InvalidInput(
            "data URL has no payload".to_string(),
        )));
    };
    if !meta.ends_with(";base64") {
        return Some(Err(Error::InvalidInput(
            "only base64 data URLs are supported".to_string(),
        )));
    }

    Some(
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::InvalidInput(format!("Failed to decode data URL: {}", e))),
    )
}
