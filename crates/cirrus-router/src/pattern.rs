//! Compiled path patterns.
//!
//! A pattern is a `/`-separated list of segments. Each segment is one of:
//!
//! - a literal (`users`), compared case-sensitively against the raw path
//! - a named parameter (`:id` or `{id}`), matching exactly one non-empty segment
//! - a catch-all (`*rest`), matching one or more trailing segments
//!
//! Captured values are percent-decoded.

use std::borrow::Cow;

use crate::error::RouteError;
use crate::params::Params;

/// Type of path segment in a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal path segment (e.g. "users", "api")
    Static(String),
    /// Named parameter (e.g. ":id", "{userId}")
    Param(String),
    /// Catch-all wildcard (e.g. "*path"), always last
    Wildcard(String),
}

/// A path pattern compiled into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<SegmentKind>,
}

impl PathPattern {
    /// Compiles a pattern such as `/users/:id` or `/files/*path`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if !pattern.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }

        let body = trim_trailing_slash(pattern);
        let mut segments = Vec::new();
        let raw: Vec<&str> = if body == "/" {
            Vec::new()
        } else {
            body[1..].split('/').collect()
        };

        for (index, segment) in raw.iter().enumerate() {
            let kind = if let Some(name) = segment.strip_prefix(':') {
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = segment.strip_prefix('*') {
                if index + 1 != raw.len() {
                    return Err(invalid("wildcard must be the last segment"));
                }
                let name = if name.is_empty() { "wildcard" } else { name };
                SegmentKind::Wildcard(name.to_string())
            } else {
                SegmentKind::Static((*segment).to_string())
            };

            if let SegmentKind::Param(name) = &kind {
                if name.is_empty() {
                    return Err(invalid("parameter name must not be empty"));
                }
            }
            segments.push(kind);
        }

        Ok(Self {
            source: body.to_string(),
            segments,
        })
    }

    /// The normalized pattern text (trailing slash removed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled segments.
    #[must_use]
    pub fn segments(&self) -> &[SegmentKind] {
        &self.segments
    }

    /// Returns true if both patterns match exactly the same paths.
    ///
    /// Literals must be equal; parameter and wildcard names are ignored, so
    /// `/users/:id` and `/users/{userId}` have the same shape.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (SegmentKind::Static(a), SegmentKind::Static(b)) => a == b,
                    (SegmentKind::Param(_), SegmentKind::Param(_))
                    | (SegmentKind::Wildcard(_), SegmentKind::Wildcard(_)) => true,
                    _ => false,
                })
    }

    /// Matches a request path, returning the captured parameters.
    ///
    /// A single trailing slash on `path` is ignored.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let path = path.strip_prefix('/')?;
        let path = path.strip_suffix('/').unwrap_or(path);
        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };

        let mut params = Params::new();
        let mut parts_iter = parts.iter().enumerate();

        for segment in &self.segments {
            match segment {
                SegmentKind::Static(literal) => {
                    let (_, part) = parts_iter.next()?;
                    if *part != literal.as_str() {
                        return None;
                    }
                }
                SegmentKind::Param(name) => {
                    let (_, part) = parts_iter.next()?;
                    if part.is_empty() {
                        return None;
                    }
                    params.push(name.as_str(), decode(part));
                }
                SegmentKind::Wildcard(name) => {
                    let (start, _) = parts_iter.next()?;
                    let rest = parts[start..].join("/");
                    if rest.is_empty() {
                        return None;
                    }
                    params.push(name.as_str(), decode(&rest));
                    return Some(params);
                }
            }
        }

        if parts_iter.next().is_some() {
            return None;
        }
        Some(params)
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

// Invalid UTF-8 after decoding keeps the raw segment.
fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}
