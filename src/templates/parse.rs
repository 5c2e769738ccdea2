//! Template source parsing.
//!
//! Grammar: literal text with `{{ name }}` (HTML-escaped) and
//! `{{ name | safe }}` (inserted verbatim) placeholders. Names are
//! `[A-Za-z0-9_]+`.

/// A parsed piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Var { name: String, escape: bool },
}

/// Why a template failed to parse. Offsets are byte positions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unclosed '{{{{' at byte {0}")]
    Unclosed(usize),
    #[error("invalid placeholder name {name:?} at byte {at}")]
    BadName { name: String, at: usize },
    #[error("unknown filter {filter:?} at byte {at}")]
    UnknownFilter { filter: String, at: usize },
}

pub fn parse(source: &str) -> Result<Vec<Segment>, ParseError> {
    let mut segments = Vec::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let at = offset + open;
        let after_open = &rest[open + 2..];
        let close = after_open.find("}}").ok_or(ParseError::Unclosed(at))?;
        segments.push(placeholder(&after_open[..close], at)?);

        let consumed = open + 2 + close + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    Ok(segments)
}

fn placeholder(inner: &str, at: usize) -> Result<Segment, ParseError> {
    let (name, filter) = match inner.split_once('|') {
        Some((name, filter)) => (name.trim(), Some(filter.trim())),
        None => (inner.trim(), None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ParseError::BadName { name: name.to_string(), at });
    }

    let escape = match filter {
        None => true,
        Some("safe") => false,
        Some(other) => {
            return Err(ParseError::UnknownFilter { filter: other.to_string(), at });
        }
    };

    Ok(Segment::Var { name: name.to_string(), escape })
}
