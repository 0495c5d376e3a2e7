//! Compound selector matching for the in-memory DOM.
//!
//! Supported grammar, per comma-separated alternative:
//! `tag`, `#id`, `.class`, `[attr]` and `[attr="value"]`, in any combination
//! without whitespace (`button.primary[data-id]`). `*` matches any tag.
//! Combinators are not supported.

use std::str::FromStr;

use thiserror::Error;

use super::Element;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unsupported selector {0:?}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(el.tag()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| el.classes().any(|c| c == class))
        {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match (el.attr(name), value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
        })
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn matches(&self, el: &Element) -> bool {
        self.alternatives.iter().any(|c| c.matches(el))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let alternatives = s
            .split(',')
            .map(|part| parse_compound(part.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident<'a>(rest: &mut &'a str) -> &'a str {
    let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
    let (ident, tail) = rest.split_at(end);
    *rest = tail;
    ident
}

fn parse_compound(src: &str) -> Result<Compound, SelectorError> {
    if src.is_empty() {
        return Err(SelectorError::Empty);
    }
    let unsupported = || SelectorError::Unsupported(src.to_string());

    let mut compound = Compound::default();
    let mut rest = src;

    if let Some(tail) = rest.strip_prefix('*') {
        rest = tail;
    } else {
        let tag = take_ident(&mut rest);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_string());
        }
    }

    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        match c {
            '#' | '.' => {
                let ident = take_ident(&mut rest);
                if ident.is_empty() {
                    return Err(unsupported());
                }
                if c == '#' {
                    compound.id = Some(ident.to_string());
                } else {
                    compound.classes.push(ident.to_string());
                }
            }
            '[' => {
                let close = rest.find(']').ok_or_else(unsupported)?;
                let body = &rest[..close];
                rest = &rest[close + 1..];
                let attr = match body.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim();
                        let value = value
                            .strip_prefix('"')
                            .and_then(|v| v.strip_suffix('"'))
                            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                            .unwrap_or(value);
                        (name.trim().to_string(), Some(value.to_string()))
                    }
                    None => (body.trim().to_string(), None),
                };
                if attr.0.is_empty() || !attr.0.chars().all(is_ident_char) {
                    return Err(unsupported());
                }
                compound.attrs.push(attr);
            }
            _ => return Err(unsupported()),
        }
    }

    Ok(compound)
}
