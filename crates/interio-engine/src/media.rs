use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;
use interio_contracts::responses::DEFAULT_MIME_TYPE;

use crate::error::ProviderError;

/// Enough base64 to cover the longest magic number `image` checks.
const SNIFF_PREFIX_CHARS: usize = 64;

/// Decodes a base64 attachment exactly; no re-encoding or resizing happens.
pub(crate) fn decode_attachment(field: &'static str, data: &str) -> Result<Vec<u8>, ProviderError> {
    BASE64
        .decode(data.trim().as_bytes())
        .map_err(|source| ProviderError::InvalidAttachment { field, source })
}

/// MIME type and file extension for raw image bytes, PNG when unrecognised.
pub(crate) fn image_kind(bytes: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => ("image/jpeg", "jpg"),
        Ok(ImageFormat::WebP) => ("image/webp", "webp"),
        Ok(ImageFormat::Gif) => ("image/gif", "gif"),
        _ => (DEFAULT_MIME_TYPE, "png"),
    }
}

/// Sniffs the MIME type of a base64 payload from its first few bytes.
pub(crate) fn sniff_base64_mime(data: &str) -> &'static str {
    let trimmed = data.trim();
    let prefix_len = trimmed.len().min(SNIFF_PREFIX_CHARS) / 4 * 4;
    match trimmed.get(..prefix_len).map(|prefix| BASE64.decode(prefix)) {
        Some(Ok(head)) => image_kind(&head).0,
        _ => DEFAULT_MIME_TYPE,
    }
}
