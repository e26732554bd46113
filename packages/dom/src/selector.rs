//! # Selectors
//!
//! The subset of CSS selectors the forum page needs for delegated matching:
//!
//! - type, `#id`, `.class`, `*`
//! - `[attr]` and `[attr="value"]`
//! - descendant (` `) and child (`>`) combinators
//! - selector lists (`a, b`)
//!
//! Selectors are tokenized with `logos` and parsed by recursive descent.
//! Matching runs right to left, starting from the candidate node.

use crate::tokenizer::{tokenize, Token};
use crate::{Node, NodeId, Page, SelectorError};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// A parsed selector list
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    groups: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    /// Compound selectors, left to right
    steps: Vec<Compound>,
    /// `combinators[i]` joins `steps[i]` and `steps[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut parser = Parser {
            source: input,
            tokens: tokenize(input)?,
            pos: 0,
        };
        let mut groups = Vec::new();

        loop {
            parser.skip_whitespace();
            groups.push(parser.parse_complex()?);
            parser.skip_whitespace();
            match parser.peek() {
                None => break,
                Some(Token::Comma) => parser.advance(),
                Some(_) => return Err(parser.unexpected()),
            }
        }

        Ok(Self {
            source: input.to_string(),
            groups,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Does `node` match any selector in the list?
    pub fn matches(&self, page: &Page, node: NodeId) -> bool {
        self.groups.iter().any(|group| group.matches(page, node))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl ComplexSelector {
    fn matches(&self, page: &Page, node: NodeId) -> bool {
        match self.steps.len() {
            0 => false,
            len => self.matches_step(page, node, len - 1),
        }
    }

    fn matches_step(&self, page: &Page, node: NodeId, index: usize) -> bool {
        let Some(candidate) = page.get(node) else {
            return false;
        };
        if !self.steps[index].matches(candidate) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => page
                .parent(node)
                .is_some_and(|parent| self.matches_step(page, parent, index - 1)),
            Combinator::Descendant => page
                .ancestors(node)
                .any(|ancestor| self.matches_step(page, ancestor, index - 1)),
        }
    }
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| node.has_class(class)) {
            return false;
        }
        self.attributes.iter().all(|attr| match (&attr.value, node.attribute(&attr.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// Recursive descent over the token stream
struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, span)| span.start)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Returns true when any whitespace was consumed
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek() == Some(Token::Whitespace) {
            self.advance();
        }
        self.pos > start
    }

    fn expected_ident(&self) -> SelectorError {
        SelectorError::ExpectedIdent {
            position: self.position(),
            selector: self.source.to_string(),
        }
    }

    /// Error for the current token, or for the end of input
    fn unexpected(&self) -> SelectorError {
        let position = self.position();
        match self.source[position..].chars().next() {
            Some(ch) => SelectorError::Unexpected {
                ch,
                position,
                selector: self.source.to_string(),
            },
            None => self.expected_ident(),
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut steps = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(Token::Comma) => break,
                Some(Token::RAngle) => {
                    self.advance();
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                    steps.push(self.parse_compound()?);
                }
                Some(_) if had_space => {
                    combinators.push(Combinator::Descendant);
                    steps.push(self.parse_compound()?);
                }
                Some(_) => return Err(self.unexpected()),
            }
        }

        Ok(ComplexSelector { steps, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some(Token::Star) => self.advance(),
            Some(Token::Ident(tag)) => {
                self.advance();
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some(Token::Hash) => {
                    self.advance();
                    compound.id = Some(self.expect_ident()?);
                }
                Some(Token::Dot) => {
                    self.advance();
                    compound.classes.push(self.expect_ident()?);
                }
                Some(Token::LBracket) => {
                    self.advance();
                    compound.attributes.push(self.parse_attribute()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unexpected());
        }

        Ok(compound)
    }

    fn expect_ident(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(Token::Ident(ident)) => {
                self.advance();
                Ok(ident.to_string())
            }
            _ => Err(self.expected_ident()),
        }
    }

    fn parse_attribute(&mut self) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.expect_ident()?;
        self.skip_whitespace();

        let value = match self.peek() {
            Some(Token::RBracket) => None,
            Some(Token::Equals) => {
                self.advance();
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(Token::String(value)) => {
                        self.advance();
                        value.to_string()
                    }
                    _ => self.expect_ident()?,
                };
                self.skip_whitespace();
                Some(value)
            }
            Some(_) => return Err(self.unexpected()),
            None => return Err(SelectorError::UnterminatedString(self.source.to_string())),
        };

        match self.peek() {
            Some(Token::RBracket) => {
                self.advance();
                Ok(AttributeMatch { name, value })
            }
            Some(_) => Err(self.unexpected()),
            None => Err(SelectorError::UnterminatedString(self.source.to_string())),
        }
    }
}
