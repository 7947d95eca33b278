use common::storage::ImageStore;
use tracing::warn;

/// Path marker separating the URL base from the storage key.
pub const IMAGE_PATH: &str = "/images/";

/// Build the public URL for a stored image key.
pub fn build_image_url(base: &str, key: &str) -> String {
    format!("{}{IMAGE_PATH}{key}", base.trim_end_matches('/'))
}

/// Extract the storage key from an image URL: the path segment after the
/// `/images/` marker. Returns `None` for foreign or malformed references.
pub fn image_key(image_url: &str) -> Option<&str> {
    let (_, rest) = image_url.split_once(IMAGE_PATH)?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest)
}

/// Best-effort removal of the stored file behind an image URL.
///
/// Failures (and unrecognizable references) are logged and swallowed: the
/// record mutation this accompanies is never blocked by them.
pub async fn release_image(store: &dyn ImageStore, image_url: &str) {
    let Some(key) = image_key(image_url) else {
        warn!(image_url, "image reference has no extractable storage key");
        return;
    };
    match store.delete(key).await {
        Ok(true) => {}
        Ok(false) => warn!(key, "stale image was already absent"),
        Err(e) => warn!(key, error = %e, "failed to delete stale image"),
    }
}
