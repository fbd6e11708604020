use crate::error::{BatonError, Result};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
}

/// A parsed route pattern such as `/users/{id}` or `/files/{*path}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

fn split(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string())
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |message: &str| BatonError::invalid_route(pattern, message);

        if !pattern.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }

        let parts = split(pattern);
        let mut names = HashSet::new();
        let mut segments = Vec::with_capacity(parts.len());

        for (position, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(inner) => {
                    let (name, catch_all) = match inner.strip_prefix('*') {
                        Some(name) => (name, true),
                        None => (inner, false),
                    };
                    if name.is_empty() {
                        return Err(invalid("parameter name must not be empty"));
                    }
                    if name.starts_with('_') {
                        return Err(invalid("parameter names starting with '_' are reserved"));
                    }
                    if !names.insert(name) {
                        return Err(invalid(&format!("duplicate parameter '{}'", name)));
                    }
                    if catch_all && position + 1 != parts.len() {
                        return Err(invalid("catch-all parameter must be the last segment"));
                    }
                    if catch_all {
                        Segment::CatchAll(name.to_string())
                    } else {
                        Segment::Param(name.to_string())
                    }
                }
                None if part.contains('{') || part.contains('}') => {
                    return Err(invalid(&format!("malformed segment '{}'", part)));
                }
                None => Segment::Static(part.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parameter names in pattern order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Match `path`, returning the percent-decoded parameters.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts = split(path);
        let mut params = BTreeMap::new();

        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(name) => {
                    let rest = parts.get(position..).unwrap_or_default();
                    let rest: Vec<String> = rest.iter().map(|part| decode(part)).collect();
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
                Segment::Static(expected) => {
                    if parts.get(position) != Some(&expected.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.get(position).filter(|p| !p.is_empty())?;
                    params.insert(name.clone(), decode(part));
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}
