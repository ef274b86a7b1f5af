//! Recursive descent parser for selector pattern strings.
//!
//! The grammar is the practical querying subset of CSS selectors:
//!
//! ```text
//! selector-list   := complex ("," complex)*
//! complex         := compound (combinator compound)*
//! combinator      := ws | ws? (">" | "+" | "~") ws?
//! compound        := (tag | "*")? ("#" ident | "." ident | attr | pseudo)*
//! attr            := "[" ident (op string-or-ident)? "]"
//! op              := "=" | "^=" | "$=" | "*=" | "~=" | "|="
//! pseudo          := ":" ("first-child" | "last-child"
//!                        | "nth-child(" nth ")" | "not(" compound ")")
//! nth             := "odd" | "even" | [An+B] | integer
//! ```
//!
//! Parsing is a single left-to-right pass over the bytes with one token of
//! lookahead; each grammar production is a method on the internal `Parser`.

use super::ast::{
    AttrOp, AttrSelector, Combinator, ComplexSelector, CompoundPart, CompoundSelector, NthExpr,
    PseudoClass, SelectorList,
};
use crate::error::PatternError;

/// Parses a pattern string into a [`SelectorList`].
///
/// # Errors
///
/// Returns [`PatternError`] with a byte offset when the input is not a valid
/// pattern (empty input, empty group, unterminated `[`/`(`, unknown
/// pseudo-class, stray combinator, trailing garbage).
pub fn parse(input: &str) -> Result<SelectorList, PatternError> {
    let mut parser = Parser::new(input);
    parser.skip_whitespace();
    if parser.at_end() {
        return Err(parser.error("empty pattern"));
    }

    let mut groups = vec![parser.parse_complex()?];
    loop {
        parser.skip_whitespace();
        if parser.at_end() {
            break;
        }
        if !parser.eat(b',') {
            return Err(parser.error("expected ',' between selector groups"));
        }
        parser.skip_whitespace();
        groups.push(parser.parse_complex()?);
    }

    Ok(SelectorList { groups })
}

/// Internal byte-cursor parser over a pattern string.
struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Cursor helpers
    // -----------------------------------------------------------------------

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> PatternError {
        PatternError {
            message: message.to_string(),
            position: self.pos,
        }
    }

    /// Reads an identifier: ASCII alphanumerics, `-`, `_`, and any
    /// non-ASCII bytes (identifiers are not validated as UTF-8 sequences;
    /// the input is a `&str` so they always are).
    fn parse_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    // -----------------------------------------------------------------------
    // Productions
    // -----------------------------------------------------------------------

    fn parse_complex(&mut self) -> Result<ComplexSelector, PatternError> {
        let first = self.parse_compound()?;
        let mut parts = vec![CompoundPart {
            combinator: Combinator::None,
            compound: first,
        }];

        loop {
            // Whitespace is significant here: it may be a descendant
            // combinator or just padding around an explicit one.
            let had_ws = matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n'));
            self.skip_whitespace();

            let combinator = match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    Combinator::Child
                }
                Some(b'+') => {
                    self.pos += 1;
                    Combinator::NextSibling
                }
                Some(b'~') => {
                    self.pos += 1;
                    Combinator::SubsequentSibling
                }
                Some(b',') | None => break,
                _ if had_ws => Combinator::Descendant,
                _ => break,
            };

            self.skip_whitespace();
            let compound = self.parse_compound()?;
            parts.push(CompoundPart {
                combinator,
                compound,
            });
        }

        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, PatternError> {
        let mut compound = CompoundSelector::default();

        // Optional leading tag name or universal selector
        match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                compound.universal = true;
            }
            Some(b) if b.is_ascii_alphabetic() || b >= 0x80 => {
                compound.tag = Some(self.parse_ident().to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some(b'#') => {
                    self.pos += 1;
                    let id = self.parse_ident();
                    if id.is_empty() {
                        return Err(self.error("expected identifier after '#'"));
                    }
                    compound.id = Some(id);
                }
                Some(b'.') => {
                    self.pos += 1;
                    let class = self.parse_ident();
                    if class.is_empty() {
                        return Err(self.error("expected identifier after '.'"));
                    }
                    compound.classes.push(class);
                }
                Some(b'[') => {
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(b':') => {
                    compound.pseudos.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, PatternError> {
        self.pos += 1; // consume '['
        self.skip_whitespace();

        let name = self.parse_ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error("expected attribute name"));
        }
        self.skip_whitespace();

        if self.eat(b']') {
            return Ok(AttrSelector {
                name,
                op: AttrOp::Exists,
                value: String::new(),
            });
        }

        let op = match self.bump() {
            Some(b'=') => AttrOp::Equals,
            Some(b'^') if self.eat(b'=') => AttrOp::Prefix,
            Some(b'$') if self.eat(b'=') => AttrOp::Suffix,
            Some(b'*') if self.eat(b'=') => AttrOp::Contains,
            Some(b'~') if self.eat(b'=') => AttrOp::Includes,
            Some(b'|') if self.eat(b'=') => AttrOp::DashMatch,
            _ => return Err(self.error("expected attribute operator")),
        };

        self.skip_whitespace();
        let value = self.parse_attr_value()?;
        self.skip_whitespace();

        if !self.eat(b']') {
            return Err(self.error("unterminated attribute selector"));
        }
        Ok(AttrSelector { name, op, value })
    }

    /// Reads an attribute operand: a quoted string or a bare identifier.
    fn parse_attr_value(&mut self) -> Result<String, PatternError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                while let Some(b) = self.peek() {
                    if b == quote {
                        let value =
                            String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                        self.pos += 1;
                        return Ok(value);
                    }
                    self.pos += 1;
                }
                Err(self.error("unterminated string in attribute selector"))
            }
            _ => {
                let value = self.parse_ident();
                if value.is_empty() {
                    return Err(self.error("expected attribute value"));
                }
                Ok(value)
            }
        }
    }

    fn parse_pseudo(&mut self) -> Result<PseudoClass, PatternError> {
        self.pos += 1; // consume ':'
        let name = self.parse_ident().to_ascii_lowercase();

        match name.as_str() {
            "first-child" => Ok(PseudoClass::FirstChild),
            "last-child" => Ok(PseudoClass::LastChild),
            "nth-child" => {
                if !self.eat(b'(') {
                    return Err(self.error("expected '(' after :nth-child"));
                }
                self.skip_whitespace();
                let nth = self.parse_nth()?;
                self.skip_whitespace();
                if !self.eat(b')') {
                    return Err(self.error("unterminated :nth-child()"));
                }
                Ok(PseudoClass::NthChild(nth))
            }
            "not" => {
                if !self.eat(b'(') {
                    return Err(self.error("expected '(' after :not"));
                }
                self.skip_whitespace();
                let inner = self.parse_compound()?;
                self.skip_whitespace();
                if !self.eat(b')') {
                    return Err(self.error("unterminated :not()"));
                }
                Ok(PseudoClass::Not(Box::new(inner)))
            }
            "" => Err(self.error("expected pseudo-class name after ':'")),
            _ => Err(self.error(&format!("unsupported pseudo-class ':{name}'"))),
        }
    }

    /// Parses an `An+B` expression: `odd`, `even`, `5`, `2n`, `2n+1`, `-n+3`.
    fn parse_nth(&mut self) -> Result<NthExpr, PatternError> {
        // Keyword forms
        let saved = self.pos;
        let word = self.parse_ident().to_ascii_lowercase();
        match word.as_str() {
            "odd" => return Ok(NthExpr::ODD),
            "even" => return Ok(NthExpr::EVEN),
            _ => self.pos = saved,
        }

        let mut negative = false;
        if self.eat(b'-') {
            negative = true;
        } else {
            self.eat(b'+');
        }

        let digits = self.parse_digits();
        let has_digits = !digits.is_empty();
        let magnitude: i32 = if has_digits {
            digits.parse().map_err(|_| self.error("number too large"))?
        } else {
            1
        };
        let signed = if negative { -magnitude } else { magnitude };

        if self.eat(b'n') || self.eat(b'N') {
            // An form; look for +B / -B
            self.skip_whitespace();
            let b = match self.peek() {
                Some(sign @ (b'+' | b'-')) => {
                    self.pos += 1;
                    self.skip_whitespace();
                    let digits = self.parse_digits();
                    if digits.is_empty() {
                        return Err(self.error("expected offset after sign in nth expression"));
                    }
                    let offset: i32 =
                        digits.parse().map_err(|_| self.error("number too large"))?;
                    if sign == b'-' { -offset } else { offset }
                }
                _ => 0,
            };
            Ok(NthExpr { a: signed, b })
        } else if has_digits {
            // Bare integer: matches exactly that position
            Ok(NthExpr { a: 0, b: signed })
        } else {
            Err(self.error("expected nth expression"))
        }
    }

    fn parse_digits(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }
}
