//! Image reference resolution — reference string → raw bytes, always.
//!
//! [`resolve_image`] is total over its inputs: whatever the reference looks
//! like (absent, local path, URL, garbage), the caller gets bytes back. The
//! fallback for every failure is the injected default portrait, with a
//! logged diagnostic — a broken photo reference must never cost a cast
//! member their record.
//!
//! Resolution policy, in order:
//! 1. absent reference → default portrait, no I/O
//! 2. `http://` / `https://` → fetch (Google Drive share links are first
//!    rewritten to their direct-download form); any network failure or
//!    non-success status → default portrait
//! 3. otherwise a filesystem path: as given, then relative to the
//!    directory containing the source table; unreadable → default portrait

use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for remote image fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Check if the reference looks like a fetchable URL.
pub fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Rewrite a Google Drive sharing URL to a direct link.
///
/// `https://drive.google.com/file/d/<id>/view?usp=share_link` becomes
/// `https://drive.google.com/uc?export=view&id=<id>`. Returns `None` for
/// anything that is not a Drive sharing URL.
pub fn direct_drive_url(url: &str) -> Option<String> {
    if !url.contains("drive.google.com/file/d/") || !url.contains("/view") {
        return None;
    }
    let rest = url.split_once("/file/d/")?.1;
    let id = rest.split('/').next()?;
    if id.is_empty() {
        return None;
    }
    Some(format!("https://drive.google.com/uc?export=view&id={id}"))
}

/// Resolve an image reference to raw bytes.
///
/// Total function: every failure path resolves to `default` and logs why.
pub fn resolve_image(
    reference: Option<&str>,
    base_dir: &Path,
    default: &[u8],
    timeout: Duration,
) -> Vec<u8> {
    let Some(reference) = reference else {
        return default.to_vec();
    };

    if is_url(reference) {
        return match fetch_url(reference, timeout) {
            Ok(bytes) => bytes,
            Err(reason) => {
                warn!("image fetch failed for {reference}: {reason}; using default portrait");
                default.to_vec()
            }
        };
    }

    let direct = Path::new(reference);
    let candidate = if direct.exists() {
        direct.to_path_buf()
    } else {
        base_dir.join(reference)
    };
    match std::fs::read(&candidate) {
        Ok(bytes) => {
            debug!("resolved local image {}", candidate.display());
            bytes
        }
        Err(err) => {
            warn!(
                "unreadable image {}: {err}; using default portrait",
                candidate.display()
            );
            default.to_vec()
        }
    }
}

fn fetch_url(url: &str, timeout: Duration) -> Result<Vec<u8>, String> {
    let url = direct_drive_url(url).unwrap_or_else(|| url.to_string());
    debug!("fetching image {url}");

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| e.to_string())?;
    let response = client.get(&url).send().map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().map_err(|e| e.to_string())?;
    if bytes.is_empty() {
        return Err("empty response body".to_string());
    }
    Ok(bytes.to_vec())
}
