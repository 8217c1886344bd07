//! Pattern parsing for the routing trie.
//!
//! A pattern is split on `/` with empty parts dropped, so `/user/` and `/user`
//! describe the same route. Each part becomes a [`Segment`]:
//! - `user`      literal, matches only the exact text
//! - `:id`       parameter, matches one path segment and captures it as `id`
//! - `*filepath` catch-all, matches the rest of the path and captures it as `filepath`

use crate::error::RouteError;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    fn parse(part: &str, pattern: &str) -> Result<Self, RouteError> {
        if let Some(name) = part.strip_prefix(':') {
            if name.is_empty() {
                return Err(RouteError::empty_param_name(pattern));
            }
            Ok(Segment::Param(name.to_string()))
        } else if let Some(name) = part.strip_prefix('*') {
            if name.is_empty() {
                return Err(RouteError::empty_param_name(pattern));
            }
            Ok(Segment::CatchAll(name.to_string()))
        } else {
            Ok(Segment::Literal(part.to_string()))
        }
    }

    /// The name a captured value is stored under, `None` for literals.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(name) | Segment::CatchAll(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Param(name) => write!(f, ":{name}"),
            Segment::CatchAll(name) => write!(f, "*{name}"),
        }
    }
}

/// A validated route pattern in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    canonical: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses and validates `pattern`.
    ///
    /// Fails when a catch-all is not the final segment, when a parameter has no name,
    /// or when the same parameter name is declared twice.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let mut segments: Vec<Segment> = Vec::new();

        for part in split_path(pattern) {
            if matches!(segments.last(), Some(Segment::CatchAll(_))) {
                return Err(RouteError::catch_all_not_last(pattern));
            }

            let segment = Segment::parse(part, pattern)?;
            if let Some(name) = segment.param_name()
                && segments.iter().any(|s| s.param_name() == Some(name))
            {
                return Err(RouteError::duplicate_param_name(pattern, name));
            }
            segments.push(segment);
        }

        let canonical = canonical_path(segments.iter());
        Ok(Self { canonical, segments })
    }

    /// The normalised pattern text, always starting with `/`.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Splits a path or pattern on `/`, dropping empty parts.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

/// Percent-decodes a request path or one of its segments. Invalid UTF-8 is replaced.
pub fn percent_decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

fn canonical_path<'a>(segments: impl Iterator<Item = &'a Segment>) -> String {
    let mut canonical = String::from("/");
    for (i, segment) in segments.enumerate() {
        if i > 0 {
            canonical.push('/');
        }
        canonical.push_str(&segment.to_string());
    }
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let pattern = Pattern::parse("/user/:id/*rest").unwrap();
        assert_eq!(
            pattern.segments(),
            &[Segment::Literal("user".into()), Segment::Param("id".into()), Segment::CatchAll("rest".into())]
        );
        assert_eq!(pattern.as_str(), "/user/:id/*rest");
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(Pattern::parse("").unwrap().as_str(), "/");
        assert_eq!(Pattern::parse("/").unwrap().as_str(), "/");
        assert_eq!(Pattern::parse("//a//b/").unwrap().as_str(), "/a/b");
        assert_eq!(Pattern::parse("v1/ping").unwrap().as_str(), "/v1/ping");
    }

    #[test]
    fn test_catch_all_must_be_last() {
        let err = Pattern::parse("/assets/*filepath/x").unwrap_err();
        assert!(matches!(err, RouteError::CatchAllNotLast { .. }));
    }

    #[test]
    fn test_empty_param_name() {
        assert!(matches!(Pattern::parse("/user/:").unwrap_err(), RouteError::EmptyParamName { .. }));
        assert!(matches!(Pattern::parse("/files/*").unwrap_err(), RouteError::EmptyParamName { .. }));
    }

    #[test]
    fn test_duplicate_param_name() {
        let err = Pattern::parse("/:id/x/:id").unwrap_err();
        match err {
            RouteError::DuplicateParamName { name, .. } => assert_eq!(name, "id"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/assets/css//a.css/").collect::<Vec<_>>(), vec!["assets", "css", "a.css"]);
        assert_eq!(split_path("/").count(), 0);
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("hel%6Co"), "hello");
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("plain"), "plain");
        assert_eq!(percent_decode("/static/my%20file.css"), "/static/my file.css");
    }
}
