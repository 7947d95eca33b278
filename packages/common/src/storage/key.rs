use uuid::Uuid;

use super::error::StorageError;

/// Longest accepted file extension, in bytes.
const MAX_EXTENSION_LEN: usize = 8;

/// Longest accepted storage key, in bytes.
const MAX_KEY_LEN: usize = 128;

/// Generate a fresh storage key: a UUID, plus the sanitized extension when
/// one survives sanitization.
///
/// Keys are always store-generated, never client-supplied, so two uploads
/// of the same bytes get distinct keys and independent lifecycles.
pub fn new_key(extension: Option<&str>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match extension.and_then(sanitize_extension) {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}

/// Extract the extension from a client-supplied filename.
pub fn file_extension(filename: &str) -> Option<&str> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// Lowercase the extension and drop it unless it is short plain ASCII
/// alphanumeric text.
fn sanitize_extension(ext: &str) -> Option<String> {
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

/// Validate the syntax of a key before using it as a flat filename.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(
            "key must be 1-128 characters".into(),
        ));
    }
    if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
    {
        return Err(StorageError::InvalidKey(
            "key contains an illegal character".into(),
        ));
    }
    if key.starts_with('.') || key.contains("..") {
        return Err(StorageError::InvalidKey(
            "dot-prefixed keys are not allowed".into(),
        ));
    }
    Ok(())
}
