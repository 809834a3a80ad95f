//! Selector — the subset of CSS selectors used to query the host tree.
//!
//! Supported grammar: comma-separated alternatives, each a compound of an
//! optional tag name (or `*`) followed by any number of `.class`, `[attr]`
//! and `[attr="value"]` parts. Combinators are not supported; scoping is
//! expressed by querying *within* a node instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// Read access to the element properties a [`Selector`] can test.
pub trait SelectorTarget {
    /// Lower-case tag name.
    fn tag(&self) -> &str;
    /// Whether the element's class list contains `class`.
    fn has_class(&self, class: &str) -> bool;
    /// Attribute value by name.
    fn attribute(&self, name: &str) -> Option<&str>;
}

/// A parsed selector list. Matches when any alternative matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// Parse a selector list.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] when the input is empty or uses syntax
    /// outside the supported subset (combinators, pseudo-classes, …).
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).selector_list()
    }

    /// Selector matching any element carrying `class`.
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self {
            alternatives: vec![Compound {
                classes: vec![class.into()],
                ..Compound::default()
            }],
        }
    }

    /// Selector matching elements with the given tag name.
    #[must_use]
    pub fn tag(tag: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                tag: Some(tag.to_ascii_lowercase()),
                ..Compound::default()
            }],
        }
    }

    /// Selector matching every element (`*`).
    #[must_use]
    pub fn any() -> Self {
        Self {
            alternatives: vec![Compound::default()],
        }
    }

    /// Selector matching elements carrying every class in `classes`.
    #[must_use]
    pub fn all_classes(classes: &[&str]) -> Self {
        Self {
            alternatives: vec![Compound {
                classes: classes.iter().map(|c| (*c).to_string()).collect(),
                ..Compound::default()
            }],
        }
    }

    /// Selector matching elements with attribute `name`, optionally equal to `value`.
    #[must_use]
    pub fn attribute(name: &str, value: Option<&str>) -> Self {
        Self {
            alternatives: vec![Compound {
                attributes: vec![AttributeMatch {
                    name: name.to_string(),
                    value: value.map(str::to_string),
                }],
                ..Compound::default()
            }],
        }
    }

    /// Narrow every alternative to elements also carrying `class`.
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        for compound in &mut self.alternatives {
            compound.classes.push(class.to_string());
        }
        self
    }

    /// Selector matching whatever `self` or `other` matches.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut alternatives = self.alternatives.clone();
        alternatives.extend(other.alternatives.iter().cloned());
        Self { alternatives }
    }

    /// Test an element against this selector.
    #[must_use]
    pub fn matches(&self, target: &impl SelectorTarget) -> bool {
        self.alternatives.iter().any(|c| c.matches(target))
    }
}

impl Compound {
    fn matches(&self, target: &impl SelectorTarget) -> bool {
        if let Some(tag) = &self.tag
            && !target.tag().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        self.classes.iter().all(|class| target.has_class(class))
            && self.attributes.iter().all(|attr| {
                match (target.attribute(&attr.name), &attr.value) {
                    (None, _) => false,
                    (Some(_), None) => true,
                    (Some(actual), Some(expected)) => actual == expected,
                }
            })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, compound) in self.alternatives.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            compound.fmt(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => f.write_str(tag)?,
            None if self.classes.is_empty() && self.attributes.is_empty() => f.write_str("*")?,
            None => {}
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attr in &self.attributes {
            match &attr.value {
                Some(value) => write!(f, "[{}=\"{value}\"]", attr.name)?,
                None => write!(f, "[{}]", attr.name)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Error for the character under the cursor, or `at_end` on end of input.
    fn unexpected(&self, at_end: SelectorError) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                found,
                offset: self.pos,
            },
            None => at_end,
        }
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.bump();
        }
        (self.pos > start).then(|| self.input[start..self.pos].to_string())
    }

    fn selector_list(mut self) -> Result<Selector, SelectorError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.compound()?);
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                }
                Some(_) => return Err(self.unexpected(SelectorError::Empty)),
            }
        }
        Ok(Selector { alternatives })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut has_part = false;

        if self.peek() == Some('*') {
            self.bump();
            has_part = true;
        } else if let Some(tag) = self.ident() {
            compound.tag = Some(tag.to_ascii_lowercase());
            has_part = true;
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    let class = self
                        .ident()
                        .ok_or_else(|| self.unexpected(SelectorError::Empty))?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.bump();
                    let attr = self.attribute()?;
                    compound.attributes.push(attr);
                }
                _ => break,
            }
            has_part = true;
        }

        if has_part {
            Ok(compound)
        } else {
            Err(self.unexpected(SelectorError::Empty))
        }
    }

    fn attribute(&mut self) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name = self
            .ident()
            .ok_or_else(|| self.unexpected(SelectorError::UnterminatedAttribute))?;
        self.skip_whitespace();

        match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttributeMatch { name, value: None });
            }
            Some('=') => {
                self.bump();
            }
            _ => return Err(self.unexpected(SelectorError::UnterminatedAttribute)),
        }

        self.skip_whitespace();
        let value = self.attribute_value()?;
        self.skip_whitespace();

        if self.peek() == Some(']') {
            self.bump();
            Ok(AttributeMatch {
                name,
                value: Some(value),
            })
        } else {
            Err(self.unexpected(SelectorError::UnterminatedAttribute))
        }
    }

    fn attribute_value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == quote => {
                            return Ok(self.input[start..self.pos - c.len_utf8()].to_string());
                        }
                        Some(_) => {}
                        None => return Err(SelectorError::UnterminatedAttribute),
                    }
                }
            }
            _ => self
                .ident()
                .ok_or_else(|| self.unexpected(SelectorError::UnterminatedAttribute)),
        }
    }
}
