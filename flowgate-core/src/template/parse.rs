use std::sync::LazyLock;

use regex::Regex;

use super::reference::Reference;

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Reference),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(input: &str) -> Result<Self, TemplateError> {
        parse_template(input)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(r) => Some(r),
            Segment::Literal(_) => None,
        })
    }

    /// The reference when the whole template is exactly one placeholder.
    pub fn single_reference(&self) -> Option<&Reference> {
        match self.segments.as_slice() {
            [Segment::Placeholder(r)] => Some(r),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.references().next().is_none()
    }

    /// Leading literal text, if the template starts with one.
    pub fn literal_prefix(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Literal(l)) => Some(l),
            _ => None,
        }
    }
}

pub fn parse_template(input: &str) -> Result<Template, TemplateError> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '$' || !matches!(chars.peek(), Some((_, '{'))) {
            buf.push(ch);
            continue;
        }
        chars.next();

        // No nesting: the first '}' closes the placeholder.
        let mut inner = String::new();
        let mut found = false;
        for (_, n) in chars.by_ref() {
            if n == '}' {
                found = true;
                break;
            }
            inner.push(n);
        }
        if !found {
            return Err(TemplateError::Unclosed { offset });
        }

        let reference = parse_reference(inner.trim(), offset)?;
        if !buf.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut buf)));
        }
        segments.push(Segment::Placeholder(reference));
    }

    if !buf.is_empty() {
        segments.push(Segment::Literal(buf));
    }

    Ok(Template {
        source: input.to_string(),
        segments,
    })
}

fn parse_reference(path: &str, offset: usize) -> Result<Reference, TemplateError> {
    if path.is_empty() {
        return Err(TemplateError::EmptyPlaceholder { offset });
    }
    let mut parts = Vec::new();
    for part in path.split('.') {
        if !SEGMENT_RE.is_match(part) {
            return Err(TemplateError::InvalidSegment {
                offset,
                segment: part.to_string(),
            });
        }
        parts.push(part.to_string());
    }
    let namespace = parts.remove(0);
    Ok(Reference::new(namespace, parts))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed placeholder at offset {offset} (missing '}}')")]
    Unclosed { offset: usize },
    #[error("empty placeholder at offset {offset}")]
    EmptyPlaceholder { offset: usize },
    #[error("invalid segment '{segment}' in placeholder at offset {offset}")]
    InvalidSegment { offset: usize, segment: String },
}
