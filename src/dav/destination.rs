//! MOVE destination resolution
//!
//! The bucket has no hierarchy, so a MOVE may only rename within the
//! collection the request was addressed to. The candidate key is the last
//! segment of the `Destination` header; it is accepted only if swapping it
//! into the request URL reproduces the header exactly.

use tracing::warn;

/// Resolve the target key of a MOVE.
///
/// `request_url` must be the original, un-rewritten request URL (or path) in
/// the same form as the destination header. Returns `None` when the header is
/// absent, empty, names an empty key, or points outside the request's
/// collection.
pub fn resolve_destination(destination: Option<&str>, request_url: &str) -> Option<String> {
    let destination = destination.filter(|d| !d.is_empty())?;

    let key = destination.rsplit('/').next().unwrap_or(destination);
    if key.is_empty() {
        return None;
    }

    let base = match request_url.rfind('/') {
        Some(idx) => &request_url[..idx],
        None => "",
    };
    let expected = format!("{}/{}", base, key);

    if expected != destination {
        warn!(
            expected = %destination,
            actual = %expected,
            "Destination header does not stay within the request's collection"
        );
        return None;
    }

    Some(key.to_string())
}
