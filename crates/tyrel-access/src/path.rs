//! Member-path text parsing.
//!
//! Grammar:
//!
//! ```text
//! path    := segment ( '.' segment )*
//! segment := name index* | index+
//! name    := [A-Za-z_][A-Za-z0-9_]*
//! index   := '[' digits ']'
//! ```
//!
//! `Customer.Orders[2].Total` parses to
//! `[Member(Customer), Member(Orders), Index(2), Member(Total)]`.
//! A path may open with an index when the root itself is indexable.

use crate::error::AccessError;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// One token of a parsed path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathToken {
    Member(Arc<str>),
    Index(usize),
}

/// A parsed member path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberPath {
    tokens: SmallVec<[PathToken; 4]>,
}

impl MemberPath {
    pub fn parse(text: &str) -> Result<Self, AccessError> {
        PathParser::new(text).parse()
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Split off a trailing member name (the method of an invoker path).
    pub fn split_last_member(&self) -> Option<(MemberPath, &str)> {
        match self.tokens.last()? {
            PathToken::Member(name) => Some((
                MemberPath {
                    tokens: self.tokens[..self.tokens.len() - 1].iter().cloned().collect(),
                },
                name,
            )),
            PathToken::Index(_) => None,
        }
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                PathToken::Member(name) if i == 0 => f.write_str(name)?,
                PathToken::Member(name) => write!(f, ".{name}")?,
                PathToken::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

struct PathParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, reason: &str) -> AccessError {
        AccessError::InvalidPath {
            path: self.text.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn parse(mut self) -> Result<MemberPath, AccessError> {
        if self.text.is_empty() {
            return Err(self.error("empty path"));
        }
        let mut tokens = SmallVec::new();
        loop {
            self.segment(&mut tokens)?;
            match self.peek() {
                None => break,
                Some(b'.') => self.pos += 1,
                Some(_) => return Err(self.error("expected '.' or '['")),
            }
        }
        Ok(MemberPath { tokens })
    }

    fn segment(&mut self, tokens: &mut SmallVec<[PathToken; 4]>) -> Result<(), AccessError> {
        match self.peek() {
            Some(b'[') => {}
            Some(c) if c == b'_' || c.is_ascii_alphabetic() => {
                let start = self.pos;
                while let Some(c) = self.peek()
                    && (c == b'_' || c.is_ascii_alphanumeric())
                {
                    self.pos += 1;
                }
                tokens.push(PathToken::Member(Arc::from(&self.text[start..self.pos])));
            }
            _ => return Err(self.error("expected a member name")),
        }
        while self.peek() == Some(b'[') {
            self.pos += 1;
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
            if start == self.pos {
                return Err(self.error("expected an index"));
            }
            let index = self.text[start..self.pos]
                .parse::<usize>()
                .map_err(|_| self.error("index out of range"))?;
            if self.peek() != Some(b']') {
                return Err(self.error("expected ']'"));
            }
            self.pos += 1;
            tokens.push(PathToken::Index(index));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/path_tests.rs"]
mod tests;
