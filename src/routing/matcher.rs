//! Path template parsing and matching.
//!
//! # Responsibilities
//! - Compile a template string (`/datasets/{dataset}:setDefault`) into segments once
//! - Match a concrete request path segment by segment, capturing variables
//! - Rank templates by specificity so literals beat captures
//! - Produce a shape key (variable names erased) for ambiguity detection
//!
//! # Design Decisions
//! - No regex: a segment is a literal, a `{name}` capture, or a final
//!   `{name}:verb` capture whose literal `:verb` suffix must match exactly
//! - Paths are matched raw; captured values are not percent-decoded
//! - A literal segment may contain `:` (`datasets:search`) and only matches exactly

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Error raised while compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    #[error("template `{template}` has an empty segment")]
    EmptySegment { template: String },

    #[error("template `{template}` has a malformed segment `{segment}`")]
    MalformedSegment { template: String, segment: String },

    #[error("template `{template}` uses a custom verb before the final segment")]
    VerbNotFinal { template: String },

    #[error("template `{template}` captures `{name}` more than once")]
    DuplicateVariable { template: String, name: String },
}

/// One compiled template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this text.
    Literal(String),
    /// `{name}`: captures one non-empty segment.
    Variable(String),
    /// `{name}:verb`: the segment must end with `:verb`; the non-empty prefix is captured.
    VerbSuffix { name: String, verb: String },
}

impl Segment {
    fn rank(&self) -> u8 {
        match self {
            Segment::Literal(_) => 2,
            Segment::VerbSuffix { .. } => 1,
            Segment::Variable(_) => 0,
        }
    }

    /// Capture for this segment, `None` on mismatch, `Some(None)` for a literal hit.
    fn capture<'p>(&self, part: &'p str) -> Option<Option<(&str, &'p str)>> {
        match self {
            Segment::Literal(text) => (text == part).then_some(None),
            Segment::Variable(name) => (!part.is_empty()).then_some(Some((name.as_str(), part))),
            Segment::VerbSuffix { name, verb } => {
                let value = part.strip_suffix(verb.as_str())?.strip_suffix(':')?;
                (!value.is_empty()).then_some(Some((name.as_str(), value)))
            }
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Variable(name) => write!(f, "{{{}}}", name),
            Segment::VerbSuffix { name, verb } => write!(f, "{{{}}}:{}", name, verb),
        }
    }
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template such as `/api/v1/datasets/{dataset}:setDefault`.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| TemplateError::MissingLeadingSlash(template.to_string()))?;

        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut segments = Vec::with_capacity(parts.len());
        let mut names: Vec<String> = Vec::new();
        for (index, part) in parts.iter().enumerate() {
            let segment = parse_segment(template, part)?;
            match &segment {
                Segment::VerbSuffix { .. } if index + 1 != parts.len() => {
                    return Err(TemplateError::VerbNotFinal {
                        template: template.to_string(),
                    });
                }
                Segment::Variable(name) | Segment::VerbSuffix { name, .. } => {
                    if names.contains(name) {
                        return Err(TemplateError::DuplicateVariable {
                            template: template.to_string(),
                            name: name.clone(),
                        });
                    }
                    names.push(name.clone());
                }
                Segment::Literal(_) => {}
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template exactly as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the captured variables, in path order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) | Segment::VerbSuffix { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match pre-split request path segments, returning captured `(name, value)` pairs.
    pub fn match_segments(&self, parts: &[&str]) -> Option<Vec<(String, String)>> {
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            if let Some((name, value)) = segment.capture(part)? {
                captures.push((name.to_string(), value.to_string()));
            }
        }
        Some(captures)
    }

    /// Match a concrete request path.
    pub fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        self.match_segments(&split_path(path)?)
    }

    /// The template with variable names erased, e.g. `/datasets/{}:setDefault`.
    ///
    /// Two templates with the same shape accept exactly the same paths.
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(text) => shape.push_str(text),
                Segment::Variable(_) => shape.push_str("{}"),
                Segment::VerbSuffix { verb, .. } => {
                    shape.push_str("{}:");
                    shape.push_str(verb);
                }
            }
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }

    /// Order by specificity: the first differing segment decides, literal > verb suffix > variable.
    ///
    /// `Ordering::Greater` means `self` is more specific than `other`.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        self.segments
            .iter()
            .zip(&other.segments)
            .map(|(a, b)| a.rank().cmp(&b.rank()))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| self.segments.len().cmp(&other.segments.len()))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a request path into segments. Returns `None` for paths not starting with `/`.
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    Some(rest.split('/').collect())
}

fn parse_segment(template: &str, part: &str) -> Result<Segment, TemplateError> {
    let malformed = || TemplateError::MalformedSegment {
        template: template.to_string(),
        segment: part.to_string(),
    };

    if part.is_empty() {
        return Err(TemplateError::EmptySegment {
            template: template.to_string(),
        });
    }

    let Some(inner) = part.strip_prefix('{') else {
        if part.contains(['{', '}']) {
            return Err(malformed());
        }
        return Ok(Segment::Literal(part.to_string()));
    };

    let (name, tail) = inner.split_once('}').ok_or_else(malformed)?;
    if !is_identifier(name) {
        return Err(malformed());
    }
    if tail.is_empty() {
        return Ok(Segment::Variable(name.to_string()));
    }

    let verb = tail.strip_prefix(':').ok_or_else(malformed)?;
    if !is_identifier(verb) {
        return Err(malformed());
    }
    Ok(Segment::VerbSuffix {
        name: name.to_string(),
        verb: verb.to_string(),
    })
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
