//! Deployment stage prefix handling.
//!
//! API gateways that expose a function under a stage (`/dev/users`) pass the
//! stage name in the request context. Routes are declared without it.

use std::borrow::Cow;

/// Removes a leading `/{stage}` segment from `path`.
///
/// The prefix is only removed when it is a whole segment: `/dev/test` becomes
/// `/test` and `/dev` becomes `/`, while `/devinfo` is returned unchanged.
///
/// ```rust
/// use cirrus_router::strip_stage_prefix;
///
/// assert_eq!(strip_stage_prefix("/dev/test", "dev"), "/test");
/// assert_eq!(strip_stage_prefix("/devinfo", "dev"), "/devinfo");
/// ```
#[must_use]
pub fn strip_stage_prefix<'a>(path: &'a str, stage: &str) -> Cow<'a, str> {
    if stage.is_empty() {
        return Cow::Borrowed(path);
    }

    let Some(rest) = path.strip_prefix('/').and_then(|p| p.strip_prefix(stage)) else {
        return Cow::Borrowed(path);
    };

    if rest.is_empty() {
        Cow::Borrowed("/")
    } else if rest.starts_with('/') {
        Cow::Borrowed(rest)
    } else {
        Cow::Borrowed(path)
    }
}
