use std::fmt;

/// Source location of a token or node.
///
/// Offsets are measured in characters from the start of the document;
/// lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Character offset from the start of the input
    pub offset: usize,

    /// 1-based line number
    pub line: u32,

    /// 1-based column number
    pub column: u32,
}

impl Position {
    pub fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A source range, from the first character of a construct to one past its last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Span covering a single position.
    pub fn at(position: Position) -> Self {
        Span {
            start: position,
            end: position,
        }
    }

    /// Smallest span covering both operands.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: if self.start.offset <= other.start.offset {
                self.start
            } else {
                other.start
            },
            end: if self.end.offset >= other.end.offset {
                self.end
            } else {
                other.end
            },
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Classification of a lexical token.
///
/// The lexer is shared between the query-document parser and the
/// grammar engine's table-driven parser, so the kinds here are the
/// full terminal alphabet of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    // Delimiters
    /// Left brace opening an object
    LBrace,

    /// Right brace
    RBrace,

    /// Left bracket opening an array
    LBracket,

    /// Right bracket
    RBracket,

    /// Colon between a key and its value
    Colon,

    /// Comma between members or elements
    Comma,

    // Literals
    /// String literal enclosed in double quotes
    ///
    /// # Examples
    /// ```text
    /// "age"
    /// "$greater"
    /// ```
    String,

    /// Integer literal, optionally signed
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -10
    /// ```
    Integer,

    /// Floating-point literal (decimal point and/or exponent present)
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// -1.5e3
    /// ```
    Float,

    /// `true` keyword
    True,

    /// `false` keyword
    False,

    /// `null` keyword
    Null,

    /// Bare identifier
    ///
    /// Not part of strict JSON; accepted by the lexer so unquoted keys
    /// and grammar-engine terminals can share the token alphabet.
    Identifier,

    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::String => "string",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
            TokenKind::Identifier => "identifier",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A classified lexeme with its exact source text and location.
///
/// `raw` is the verbatim source slice, so concatenating the raw values
/// of a token stream reproduces the input modulo whitespace and
/// comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            raw: raw.into(),
            position,
        }
    }

    pub fn eof(position: Position) -> Self {
        Token {
            kind: TokenKind::Eof,
            raw: String::new(),
            position,
        }
    }

    /// Decoded content of a string token: quotes stripped, escapes resolved.
    ///
    /// The lexer has already validated every escape, so decoding cannot fail.
    pub fn string_content(&self) -> String {
        debug_assert_eq!(self.kind, TokenKind::String);
        let inner = &self.raw[1..self.raw.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('b') => out.push('\u{0008}'),
                Some('f') => out.push('\u{000c}'),
                Some('"') => out.push('"'),
                Some('/') => out.push('/'),
                Some('\\') => out.push('\\'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    let code = u32::from_str_radix(&hex, 16).unwrap_or(0xfffd);
                    out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                }
                _ => {}
            }
        }
        out
    }

    /// Span covering the token's raw text.
    pub fn span(&self) -> Span {
        let mut end = self.position;
        end.offset += self.raw.chars().count();
        end.column += self.raw.chars().count() as u32;
        Span {
            start: self.position,
            end,
        }
    }
}
