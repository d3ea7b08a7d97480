//! Share-code export/import: the whole document as an opaque text blob.
//!
//! The blob is standard base64 over the document's JSON — reversible and
//! lossless, meant for manual out-of-band transfer (clipboard, message)
//! between devices that are not live-syncing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use throwdown_types::SeasonDocument;

use crate::error::StoreError;

/// Encode a document into an opaque share-code blob.
pub fn encode(document: &SeasonDocument) -> Result<String, StoreError> {
    let json = serde_json::to_string(document)
        .map_err(|e| StoreError::InvalidShareCode(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Decode a share-code blob back into a document.
///
/// Returns [`StoreError::InvalidShareCode`] for anything that is not valid
/// base64-wrapped document JSON; the caller's document is left untouched.
pub fn decode(blob: &str) -> Result<SeasonDocument, StoreError> {
    let bytes = STANDARD
        .decode(blob.trim())
        .map_err(|e| StoreError::InvalidShareCode(format!("not base64: {e}")))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| StoreError::InvalidShareCode(format!("not UTF-8: {e}")))?;
    serde_json::from_str(&json)
        .map_err(|e| StoreError::InvalidShareCode(format!("not a season document: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use throwdown_types::DeviceId;

    #[test]
    fn roundtrip_is_lossless() {
        let doc = SeasonDocument::new_default(DeviceId::generate());
        let blob = encode(&doc);
        assert!(blob.is_ok());
        let back = blob.and_then(|b| decode(&b));
        assert_eq!(back.ok(), Some(doc));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode("definitely not a share code!!!"),
            Err(StoreError::InvalidShareCode(_))
        ));
    }

    #[test]
    fn valid_base64_of_non_document_is_rejected() {
        let blob = STANDARD.encode("{\"players\": 42}");
        assert!(matches!(
            decode(&blob),
            Err(StoreError::InvalidShareCode(_))
        ));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let doc = SeasonDocument::new_default(DeviceId::generate());
        let blob = encode(&doc).unwrap_or_default();
        let padded = format!("  {blob}\n");
        assert_eq!(decode(&padded).ok(), Some(doc));
    }
}
