//! Wire payload decoding
//!
//! The server answers with JSON text. Key and session payloads are flat objects
//! of string → string; anything else is a malformed payload, reported the same
//! way as a transport failure.

use crate::error::BackendError;
use crate::types::ImageInfo;
use car_keys::KeyMap;
use car_session::PropertyMap;
use serde::de::DeserializeOwned;

fn decode_json<T: DeserializeOwned>(text: &str, opening: char, what: &str) -> Result<T, BackendError> {
    let trimmed = text.trim();
    if !trimmed.starts_with(opening) {
        return Err(BackendError::malformed(format!(
            "{what} payload does not start with '{opening}'"
        )));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| BackendError::malformed(format!("{what} payload: {e}")))
}

/// Decode the key mapping of a default table, keeping server order
pub fn decode_key_payload(text: &str) -> Result<KeyMap, BackendError> {
    decode_json(text, '{', "key")
}

/// Decode a loaded session mapping
pub fn decode_session_payload(text: &str) -> Result<PropertyMap, BackendError> {
    decode_json(text, '{', "session")
}

/// Decode an image listing
pub fn decode_images_payload(text: &str) -> Result<Vec<ImageInfo>, BackendError> {
    decode_json(text, '[', "image list")
}

/// Encode session properties as a flat JSON object
pub fn encode_properties(properties: &PropertyMap) -> Result<String, BackendError> {
    serde_json::to_string(properties).map_err(|e| BackendError::malformed(e.to_string()))
}

/// Server message text as displayed to the user
#[must_use]
pub fn decode_message(text: &str) -> String {
    text.trim().to_string()
}
