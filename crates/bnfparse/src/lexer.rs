//! Lexer for a single grammar line.

use std::borrow::Cow;

use crate::{GrammarErrorKind, StrSpan};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Ident,
    Literal,
    Pipe,
    Define,
}

#[derive(Clone, Copy, Debug)]
pub struct LexToken {
    pub kind: TokenKind,
    pub span: StrSpan,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn span_since(&self, start: u32) -> StrSpan {
        StrSpan {
            start,
            end: self.pos(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos as usize == self.src.len()
    }

    pub fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos as usize).copied()
    }

    pub fn consume_while(&mut self, predicate: impl Fn(u8) -> bool) -> StrSpan {
        let start = self.pos();
        while let Some(c) = self.peek() {
            if predicate(c) {
                self.next();
            } else {
                break;
            }
        }
        self.span_since(start)
    }

    pub fn sequence(&mut self, sequence: &[u8]) -> bool {
        if self.src.as_bytes()[self.pos as usize..].starts_with(sequence) {
            self.pos += sequence.len() as u32;
            true
        } else {
            false
        }
    }

    /// The full character at the cursor, for error reporting.
    fn current_char(&self) -> char {
        self.src[self.pos as usize..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

pub fn is_ident_byte(c: u8) -> bool {
    matches!(c, b'_' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9')
}

/// Splits one grammar line into tokens. Whitespace separates tokens and is dropped.
pub fn lex(l: &mut Lexer) -> Result<Vec<LexToken>, GrammarErrorKind> {
    let mut tokens = Vec::new();
    loop {
        l.consume_while(|c| c.is_ascii_whitespace());
        if l.is_empty() {
            break;
        }

        let pos = l.pos();
        let kind = match l.peek() {
            Some(b'|') => {
                l.next();
                TokenKind::Pipe
            }
            Some(b':') if l.sequence(b":=") => TokenKind::Define,
            Some(quote @ (b'"' | b'\'')) => {
                l.next();
                'done: loop {
                    match l.next() {
                        None => return Err(GrammarErrorKind::UnterminatedLiteral),
                        Some(b'\\') => {
                            l.next();
                        }
                        Some(c) if c == quote => break 'done,
                        _ => {}
                    }
                }
                TokenKind::Literal
            }
            Some(c) if is_ident_byte(c) => {
                l.consume_while(is_ident_byte);
                TokenKind::Ident
            }
            _ => return Err(GrammarErrorKind::UnexpectedCharacter(l.current_char())),
        };

        let span = l.span_since(pos);
        debug_assert!(!span.is_empty());
        tokens.push(LexToken { kind, span });
    }
    Ok(tokens)
}

/// Strips the quotes of a literal token and resolves its escapes.
///
/// Unknown escapes are kept verbatim, backslash included.
pub fn unescape_literal(src: &str) -> Cow<'_, str> {
    debug_assert!(src.len() >= 2);
    let inner = &src[1..src.len() - 1];
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut string = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            string.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => string.push('\\'),
            Some('"') => string.push('"'),
            Some('\'') => string.push('\''),
            Some('n') => string.push('\n'),
            Some('t') => string.push('\t'),
            Some('0') => string.push('\0'),
            Some(other) => {
                string.push('\\');
                string.push(other);
            }
            None => string.push('\\'),
        }
    }
    Cow::Owned(string)
}
