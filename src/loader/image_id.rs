//! Image id grammar.
//!
//! An image id has the shape `scheme ":" body`. The scheme is everything
//! before the first colon and is matched verbatim (case-sensitive) against
//! registered loaders. The body is opaque to this crate.
//!
//! An id without a colon, or with nothing before the first colon, has no
//! scheme. Such ids never match a registered loader; only the fallback loader
//! can serve them.

/// Split an image id into `(scheme, body)`.
///
/// Returns `None` for the scheme when the id has no colon or the prefix
/// before the first colon is empty. The body is everything after the first
/// colon, or the whole id when there is no colon.
///
/// # Example
///
/// ```
/// use image_loader::loader::split_image_id;
///
/// assert_eq!(split_image_id("wadouri:http://host/a.dcm"), (Some("wadouri"), "http://host/a.dcm"));
/// assert_eq!(split_image_id("no-scheme"), (None, "no-scheme"));
/// assert_eq!(split_image_id(":body"), (None, "body"));
/// ```
pub fn split_image_id(image_id: &str) -> (Option<&str>, &str) {
    match image_id.split_once(':') {
        Some(("", body)) => (None, body),
        Some((scheme, body)) => (Some(scheme), body),
        None => (None, image_id),
    }
}

/// Extract the routing scheme of an image id, if any.
pub fn scheme_of(image_id: &str) -> Option<&str> {
    split_image_id(image_id).0
}
