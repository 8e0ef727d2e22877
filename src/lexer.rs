use crate::ast::tokens::{Token, TokenKind};
use thiserror::Error;

pub use crate::ast::tokens::Position;

/// Errors raised during lexical analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: Position },

    #[error("unterminated string literal starting at {position}")]
    UnterminatedString { position: Position },

    #[error("unterminated block comment starting at {position}")]
    UnterminatedComment { position: Position },

    #[error("malformed number '{raw}' at {position}")]
    MalformedNumber { raw: String, position: Position },

    #[error("invalid escape sequence '\\{ch}' at {position}")]
    InvalidEscape { ch: char, position: Position },
}

/// Lexical mode of the tokenizer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Ident,
    NumStart,
    Int,
    FractionStart,
    Fraction,
    ExponentStart,
    ExponentSign,
    Exponent,
    Str,
    Escape,
    Unicode(u8),
    SlashSeen,
    LineComment,
    BlockComment,
    BlockCommentStar,
    Single(TokenKind),
}

/// What the machine does with the lookahead character. Errors are the
/// fifth action, raised directly from the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Consume the character into the token accumulator
    Read(char),
    /// Consume and discard the character
    Skip,
    /// Flush the accumulator as a token of the given kind
    Emit(TokenKind),
    /// Input exhausted
    End,
}

struct Transition {
    state: State,
    action: Action,
}

fn transition(state: State, action: Action) -> Result<Transition, LexError> {
    Ok(Transition { state, action })
}

/// State-machine tokenizer over a character stream.
///
/// Produces a finite token sequence terminated by [`TokenKind::Eof`];
/// once exhausted it keeps returning `Eof`. Whitespace and `//` / `/* */`
/// comments are skipped and never emitted.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn here(&self) -> Position {
        Position {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Produce the next token, or the error that stops analysis.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let mut state = State::Initial;
        let mut raw = String::new();
        let mut token_start = self.here();
        let mut aux_start = self.here();

        loop {
            let lookahead = self.current_char();
            let next = self.step(state, lookahead, &raw, token_start, aux_start)?;

            match next.action {
                Action::Read(ch) => {
                    if raw.is_empty() {
                        token_start = self.here();
                    }
                    raw.push(ch);
                    self.advance();
                }
                Action::Skip => {
                    if state == State::Initial && next.state == State::SlashSeen {
                        aux_start = self.here();
                    }
                    self.advance();
                }
                Action::Emit(kind) => return Ok(classify(kind, raw, token_start)),
                Action::End => return Ok(Token::eof(self.here())),
            }
            state = next.state;
        }
    }

    /// Drain the input into a complete token sequence, `Eof` included.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// The (state, lookahead) transition table.
    fn step(
        &self,
        state: State,
        lookahead: Option<char>,
        raw: &str,
        token_start: Position,
        aux_start: Position,
    ) -> Result<Transition, LexError> {
        use State::*;

        match state {
            Initial => match lookahead {
                None => transition(Initial, Action::End),
                Some(ch) if ch.is_whitespace() => transition(Initial, Action::Skip),
                Some('{') => transition(Single(TokenKind::LBrace), Action::Read('{')),
                Some('}') => transition(Single(TokenKind::RBrace), Action::Read('}')),
                Some('[') => transition(Single(TokenKind::LBracket), Action::Read('[')),
                Some(']') => transition(Single(TokenKind::RBracket), Action::Read(']')),
                Some(':') => transition(Single(TokenKind::Colon), Action::Read(':')),
                Some(',') => transition(Single(TokenKind::Comma), Action::Read(',')),
                Some('"') => transition(Str, Action::Read('"')),
                Some('-') => transition(NumStart, Action::Read('-')),
                Some(ch) if ch.is_ascii_digit() => transition(Int, Action::Read(ch)),
                Some(ch) if ch.is_alphabetic() || ch == '_' => transition(Ident, Action::Read(ch)),
                Some('/') => transition(SlashSeen, Action::Skip),
                Some(ch) => Err(LexError::UnexpectedCharacter {
                    ch,
                    position: self.here(),
                }),
            },

            Single(kind) => transition(Initial, Action::Emit(kind)),

            Ident => match lookahead {
                Some(ch) if ch.is_alphanumeric() || ch == '_' => {
                    transition(Ident, Action::Read(ch))
                }
                _ => transition(Initial, Action::Emit(TokenKind::Identifier)),
            },

            NumStart => match lookahead {
                Some(ch) if ch.is_ascii_digit() => transition(Int, Action::Read(ch)),
                _ => Err(LexError::MalformedNumber {
                    raw: raw.to_string(),
                    position: token_start,
                }),
            },

            Int => match lookahead {
                Some(ch) if ch.is_ascii_digit() => transition(Int, Action::Read(ch)),
                Some('.') => transition(FractionStart, Action::Read('.')),
                Some(ch @ ('e' | 'E')) => transition(ExponentStart, Action::Read(ch)),
                _ => transition(Initial, Action::Emit(TokenKind::Integer)),
            },

            FractionStart => match lookahead {
                Some(ch) if ch.is_ascii_digit() => transition(Fraction, Action::Read(ch)),
                _ => Err(LexError::MalformedNumber {
                    raw: raw.to_string(),
                    position: token_start,
                }),
            },

            Fraction => match lookahead {
                Some(ch) if ch.is_ascii_digit() => transition(Fraction, Action::Read(ch)),
                Some(ch @ ('e' | 'E')) => transition(ExponentStart, Action::Read(ch)),
                _ => transition(Initial, Action::Emit(TokenKind::Float)),
            },

            ExponentStart => match lookahead {
                Some(ch) if ch.is_ascii_digit() => transition(Exponent, Action::Read(ch)),
                Some(ch @ ('+' | '-')) => transition(ExponentSign, Action::Read(ch)),
                _ => Err(LexError::MalformedNumber {
                    raw: raw.to_string(),
                    position: token_start,
                }),
            },

            ExponentSign => match lookahead {
                Some(ch) if ch.is_ascii_digit() => transition(Exponent, Action::Read(ch)),
                _ => Err(LexError::MalformedNumber {
                    raw: raw.to_string(),
                    position: token_start,
                }),
            },

            Exponent => match lookahead {
                Some(ch) if ch.is_ascii_digit() => transition(Exponent, Action::Read(ch)),
                _ => transition(Initial, Action::Emit(TokenKind::Float)),
            },

            Str => match lookahead {
                None | Some('\n') => Err(LexError::UnterminatedString {
                    position: token_start,
                }),
                Some('"') => transition(Single(TokenKind::String), Action::Read('"')),
                Some('\\') => transition(Escape, Action::Read('\\')),
                Some(ch) => transition(Str, Action::Read(ch)),
            },

            Escape => match lookahead {
                None => Err(LexError::UnterminatedString {
                    position: token_start,
                }),
                Some(ch @ ('"' | '\\' | '/' | 'n' | 't' | 'r' | 'b' | 'f')) => {
                    transition(Str, Action::Read(ch))
                }
                Some('u') => transition(Unicode(0), Action::Read('u')),
                Some(ch) => Err(LexError::InvalidEscape {
                    ch,
                    position: self.here(),
                }),
            },

            Unicode(seen) => match lookahead {
                None => Err(LexError::UnterminatedString {
                    position: token_start,
                }),
                Some(ch) if ch.is_ascii_hexdigit() => {
                    let next = if seen + 1 == 4 { Str } else { Unicode(seen + 1) };
                    transition(next, Action::Read(ch))
                }
                Some(ch) => Err(LexError::InvalidEscape {
                    ch,
                    position: self.here(),
                }),
            },

            SlashSeen => match lookahead {
                Some('/') => transition(LineComment, Action::Skip),
                Some('*') => transition(BlockComment, Action::Skip),
                _ => Err(LexError::UnexpectedCharacter {
                    ch: '/',
                    position: aux_start,
                }),
            },

            LineComment => match lookahead {
                None => transition(Initial, Action::End),
                Some('\n') => transition(Initial, Action::Skip),
                Some(_) => transition(LineComment, Action::Skip),
            },

            BlockComment => match lookahead {
                None => Err(LexError::UnterminatedComment {
                    position: aux_start,
                }),
                Some('*') => transition(BlockCommentStar, Action::Skip),
                Some(_) => transition(BlockComment, Action::Skip),
            },

            BlockCommentStar => match lookahead {
                None => Err(LexError::UnterminatedComment {
                    position: aux_start,
                }),
                Some('/') => transition(Initial, Action::Skip),
                Some('*') => transition(BlockCommentStar, Action::Skip),
                Some(_) => transition(BlockComment, Action::Skip),
            },
        }
    }
}

/// Keyword identifiers become their own kinds; everything else keeps
/// the kind the machine emitted.
fn classify(kind: TokenKind, raw: String, position: Position) -> Token {
    let kind = if kind == TokenKind::Identifier {
        match raw.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier,
        }
    } else {
        kind
    };
    Token::new(kind, raw, position)
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("true false null flag");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::True);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::False);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Null);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_document_shape() {
    let mut lexer = Lexer::new(r#"{"age": {"$greater": 18}}"#);
    let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
        let t = lexer.next_token().unwrap();
        (t.kind != TokenKind::Eof).then_some(t.kind)
    })
    .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::LBrace,
            TokenKind::String,
            TokenKind::Colon,
            TokenKind::LBrace,
            TokenKind::String,
            TokenKind::Colon,
            TokenKind::Integer,
            TokenKind::RBrace,
            TokenKind::RBrace,
        ]
    );
}

#[test]
fn test_positions_track_lines() {
    let mut lexer = Lexer::new("{\n  \"a\": 1\n}");
    let lbrace = lexer.next_token().unwrap();
    assert_eq!((lbrace.position.line, lbrace.position.column), (1, 1));
    let key = lexer.next_token().unwrap();
    assert_eq!((key.position.line, key.position.column), (2, 3));
}
