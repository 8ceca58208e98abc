//! Field path extraction from JSON events.
//!
//! Predicates reference event fields with JSON-path style expressions such as
//! `event.data.status`, `$.event.data.items[0].sku` or `event.data['user id']`.
//! A [`FieldPath`] is parsed once and then resolved against any number of
//! events, yielding zero or more values.
//!
//! # Supported Syntax
//!
//! - `$` optional root marker
//! - `name` / `.name` object children
//! - `*`, `.*`, `[*]` wildcard over array elements or object values
//! - `[n]` array index, negative indexes count from the end
//! - `['key']`, `["key"]` quoted children for keys with dots or spaces
//!
//! Recursive descent (`..`) and filter expressions are rejected with
//! [`ExprError::PathParse`].

use crate::error::{ExprError, Result};
use serde_json::Value;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Child(String),
    Index(i64),
    Wildcard,
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(ExprError::path_parse(path, "path is empty"));
        }

        let mut chars = trimmed.chars().peekable();
        let mut segments = Vec::new();

        match chars.peek() {
            Some('$') => {
                chars.next();
            }
            Some('.') => return Err(ExprError::path_parse(path, "path cannot start with '.'")),
            Some('[') => {}
            _ => segments.push(parse_child(&mut chars, path)?),
        }

        while let Some(ch) = chars.next() {
            match ch {
                '.' => match chars.peek() {
                    None => return Err(ExprError::path_parse(path, "path cannot end with '.'")),
                    Some('.') => {
                        return Err(ExprError::path_parse(
                            path,
                            "recursive descent is not supported",
                        ))
                    }
                    Some('[') => return Err(ExprError::path_parse(path, "unexpected '[' after '.'")),
                    Some(_) => segments.push(parse_child(&mut chars, path)?),
                },
                '[' => segments.push(parse_bracket(&mut chars, path)?),
                other => {
                    return Err(ExprError::path_parse(
                        path,
                        format!("unexpected character {other:?}"),
                    ))
                }
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolve the path against `value`, returning every matched value.
    pub fn get<'v>(&self, value: &'v Value) -> Vec<&'v Value> {
        let mut current = vec![value];

        for segment in &self.segments {
            let mut next = Vec::new();
            for node in current {
                match (segment, node) {
                    (Segment::Child(key), Value::Object(map)) => {
                        if let Some(child) = map.get(key) {
                            next.push(child);
                        }
                    }
                    (Segment::Index(index), Value::Array(items)) => {
                        let resolved = if *index < 0 {
                            items.len() as i64 + index
                        } else {
                            *index
                        };
                        if let Some(child) = usize::try_from(resolved)
                            .ok()
                            .and_then(|position| items.get(position))
                        {
                            next.push(child);
                        }
                    }
                    (Segment::Wildcard, Value::Array(items)) => next.extend(items.iter()),
                    (Segment::Wildcard, Value::Object(map)) => next.extend(map.values()),
                    _ => {}
                }
            }

            if next.is_empty() {
                return next;
            }
            current = next;
        }

        current
    }

    pub fn first<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.get(value).into_iter().next()
    }

    /// First matched value if it is a string, otherwise the empty string.
    pub fn first_str<'v>(&self, value: &'v Value) -> &'v str {
        self.first(value).and_then(Value::as_str).unwrap_or("")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse `path` and return the string found at it in `event`.
///
/// Missing fields and non-string values resolve to the empty string.
pub fn string_at<'v>(path: &str, event: &'v Value) -> Result<&'v str> {
    Ok(FieldPath::parse(path)?.first_str(event))
}

fn parse_child(chars: &mut Peekable<Chars<'_>>, path: &str) -> Result<Segment> {
    let mut name = String::new();
    while let Some(&ch) = chars.peek() {
        match ch {
            '.' | '[' => break,
            ']' => return Err(ExprError::path_parse(path, "unexpected ']'")),
            _ => {
                name.push(ch);
                chars.next();
            }
        }
    }

    match name.as_str() {
        "" => Err(ExprError::path_parse(path, "empty path segment")),
        "*" => Ok(Segment::Wildcard),
        _ => Ok(Segment::Child(name)),
    }
}

fn parse_bracket(chars: &mut Peekable<Chars<'_>>, path: &str) -> Result<Segment> {
    let segment = match chars.peek().copied() {
        Some('*') => {
            chars.next();
            Segment::Wildcard
        }
        Some(quote @ ('\'' | '"')) => {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next() {
                    None => return Err(ExprError::path_parse(path, "unterminated string")),
                    Some('\\') => match chars.next() {
                        Some(escaped) => key.push(escaped),
                        None => return Err(ExprError::path_parse(path, "unterminated string")),
                    },
                    Some(ch) if ch == quote => break,
                    Some(ch) => key.push(ch),
                }
            }
            Segment::Child(key)
        }
        _ => {
            let mut raw = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == ']' {
                    break;
                }
                raw.push(ch);
                chars.next();
            }
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(ExprError::path_parse(path, "empty brackets"));
            }
            let index = raw
                .parse::<i64>()
                .map_err(|_| ExprError::path_parse(path, format!("invalid index {raw:?}")))?;
            Segment::Index(index)
        }
    };

    match chars.next() {
        Some(']') => Ok(segment),
        _ => Err(ExprError::path_parse(path, "unterminated '['")),
    }
}
