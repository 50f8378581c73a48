//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns (`/hubs/:id/messages`) into segments
//! - Match a concrete request path against a pattern, binding `:name` params
//! - Prefix-match for scoped entries (middleware and error handlers)
//!
//! # Design Decisions
//! - Segment-wise comparison, case-sensitive
//! - Empty segments are ignored, so `/a//b/` and `/a/b` are the same path
//! - Params bind exactly one non-empty segment, percent-decoded, as text (no coercion)
//! - No wildcards, no multi-segment capture, no regex

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Path parameters bound by a successful match.
pub type Params = HashMap<String, String>;

/// Errors raised while parsing a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern `{0}` has a parameter with an empty name")]
    EmptyParamName(String),

    #[error("pattern `{pattern}` binds `:{name}` more than once")]
    DuplicateParam { pattern: String, name: String },
}

/// One segment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern or scope.
///
/// The empty pattern is the root scope: it prefix-matches every path and
/// exactly matches only `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// The root pattern (`/`).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pattern such as `/:id/messages`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        for raw in split_path(pattern) {
            match raw.strip_prefix(':') {
                Some("") => return Err(PatternError::EmptyParamName(pattern.to_string())),
                Some(name) => {
                    let taken = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                    if taken {
                        return Err(PatternError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Prepend `prefix` to this pattern.
    ///
    /// Fails only if the combined pattern would bind a param name twice.
    pub fn prefixed(&self, prefix: &PathPattern) -> Result<Self, PatternError> {
        let mut segments = prefix.segments.clone();
        for segment in &self.segments {
            if let Segment::Param(name) = segment {
                if prefix.segments.contains(segment) {
                    return Err(PatternError::DuplicateParam {
                        pattern: format!("{prefix}{self}"),
                        name: name.clone(),
                    });
                }
            }
            segments.push(segment.clone());
        }
        Ok(Self { segments })
    }

    /// Exact match: same segment count, literals equal, params bound.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let concrete: Vec<&str> = split_path(path).collect();
        if concrete.len() != self.segments.len() {
            return None;
        }
        self.bind(&concrete)
    }

    /// Prefix match: the pattern covers the leading segments of `path`.
    pub fn matches_prefix(&self, path: &str) -> Option<Params> {
        let concrete: Vec<&str> = split_path(path).collect();
        if concrete.len() < self.segments.len() {
            return None;
        }
        self.bind(&concrete[..self.segments.len()])
    }

    fn bind(&self, concrete: &[&str]) -> Option<Params> {
        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(concrete) {
            match segment {
                Segment::Literal(expected) if expected == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), decode_segment(value));
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => write!(f, "/{text}")?,
                Segment::Param(name) => write!(f, "/:{name}")?,
            }
        }
        Ok(())
    }
}

/// Percent-decode a bound value. Undecodable input is kept as sent.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_binding() {
        let pattern = PathPattern::parse("/:id/messages").unwrap();

        let params = pattern.matches("/42/messages").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        // Wrong segment count
        assert!(pattern.matches("/42").is_none());
        assert!(pattern.matches("/42/messages/7").is_none());
        // Literal mismatch
        assert!(pattern.matches("/42/replies").is_none());
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        let pattern = PathPattern::parse("/hubs").unwrap();
        assert!(pattern.matches("/hubs").is_some());
        assert!(pattern.matches("/HUBS").is_none());
    }

    #[test]
    fn test_empty_segments_ignored() {
        let pattern = PathPattern::parse("/hubs/:id").unwrap();
        assert!(pattern.matches("/hubs/5/").is_some());
        assert!(pattern.matches("//hubs//5").is_some());
        assert!(pattern.matches("/hubs/").is_none());
    }

    #[test]
    fn test_param_values_are_percent_decoded() {
        let pattern = PathPattern::parse("/hubs/:id").unwrap();
        assert_eq!(pattern.matches("/hubs/%35").unwrap()["id"], "5");
        assert_eq!(pattern.matches("/hubs/a%20b").unwrap()["id"], "a b");

        let scope = PathPattern::parse("/t/:tenant").unwrap();
        assert_eq!(scope.matches_prefix("/t/acme%2Dco/x").unwrap()["tenant"], "acme-co");
    }

    #[test]
    fn test_param_values_are_not_coerced() {
        let pattern = PathPattern::parse("/:id").unwrap();
        let params = pattern.matches("/007").unwrap();
        assert_eq!(params["id"], "007");
    }

    #[test]
    fn test_root_pattern() {
        let root = PathPattern::root();
        assert!(root.is_root());
        assert!(root.matches("/").is_some());
        assert!(root.matches("").is_some());
        assert!(root.matches("/hubs").is_none());
        assert!(root.matches_prefix("/hubs/5").is_some());
        assert_eq!(root.to_string(), "/");
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        let scope = PathPattern::parse("/hub").unwrap();
        assert!(scope.matches_prefix("/hub/1").is_some());
        assert!(scope.matches_prefix("/hub").is_some());
        assert!(scope.matches_prefix("/hubs/1").is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            PathPattern::parse("/hubs/:"),
            Err(PatternError::EmptyParamName("/hubs/:".into()))
        );
        assert!(matches!(
            PathPattern::parse("/:id/x/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_prefixed() {
        let prefix = PathPattern::parse("/hubs").unwrap();
        let child = PathPattern::parse("/:id/messages").unwrap();
        let full = child.prefixed(&prefix).unwrap();
        assert_eq!(full.to_string(), "/hubs/:id/messages");

        let clash = PathPattern::parse("/:id").unwrap();
        assert!(clash.prefixed(&clash).is_err());
    }
}
