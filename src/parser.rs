use crate::ast::nodes::{DocNode, DocPair, DocValue};
use crate::ast::tokens::{Position, Span, Token, TokenKind};
use crate::grammar::{Grammar, Symbol};
use thiserror::Error;

/// Errors raised during syntax analysis, by either parse strategy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("expected {expected}, found {found} at {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("no production for '{nonterminal}' with lookahead {found} at {position}")]
    MissingEntry {
        nonterminal: String,
        found: String,
        position: Position,
    },

    #[error("unexpected end of input at {position}")]
    UnexpectedEnd { position: Position },

    #[error("trailing content after document at {position}")]
    TrailingContent { position: Position },
}

fn describe(token: &Token) -> String {
    if token.raw.is_empty() {
        token.kind.to_string()
    } else {
        format!("{} '{}'", token.kind, token.raw)
    }
}

/// Concrete syntax tree: the full derivation including every matched
/// terminal. Consumed by callers wanting the raw shape (validation,
/// tooling); the query pipeline itself uses the direct document parser.
#[derive(Debug, Clone, PartialEq)]
pub enum CstNode {
    Branch {
        symbol: String,
        children: Vec<CstNode>,
    },
    Leaf(Token),
}

impl CstNode {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            CstNode::Branch { symbol, .. } => Some(symbol),
            CstNode::Leaf(_) => None,
        }
    }
}

/// Table-driven LL(1) parser over a built [`Grammar`].
///
/// Maintains a symbol stack seeded with the start symbol above the
/// end-of-input terminal; expansion opens a CST branch per
/// non-terminal and a close marker folds it back into its parent.
pub struct TableParser<'g> {
    grammar: &'g Grammar,
}

enum StackEntry {
    Terminal(TokenKind),
    NonTerminal(String),
    Close,
}

impl<'g> TableParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        TableParser { grammar }
    }

    pub fn parse(&self, tokens: &[Token]) -> Result<CstNode, SyntaxError> {
        let mut stack = vec![
            StackEntry::Terminal(TokenKind::Eof),
            StackEntry::NonTerminal(self.grammar.start().to_string()),
        ];
        let mut branches: Vec<(String, Vec<CstNode>)> =
            vec![(self.grammar.start().to_string(), Vec::new())];
        let mut position = 0usize;
        let end = tokens
            .last()
            .map(|t| t.span().end)
            .unwrap_or(Position::start());

        while let Some(entry) = stack.pop() {
            let lookahead = tokens.get(position);
            match entry {
                StackEntry::Terminal(kind) => {
                    let Some(token) = lookahead else {
                        return Err(SyntaxError::UnexpectedEnd { position: end });
                    };
                    if token.kind == kind {
                        if kind == TokenKind::Eof {
                            break;
                        }
                        if let Some((_, children)) = branches.last_mut() {
                            children.push(CstNode::Leaf(token.clone()));
                        }
                        position += 1;
                    } else if kind == TokenKind::Eof {
                        return Err(SyntaxError::TrailingContent {
                            position: token.position,
                        });
                    } else if token.kind == TokenKind::Eof {
                        return Err(SyntaxError::UnexpectedEnd {
                            position: token.position,
                        });
                    } else {
                        return Err(SyntaxError::UnexpectedToken {
                            expected: kind.to_string(),
                            found: describe(token),
                            position: token.position,
                        });
                    }
                }
                StackEntry::NonTerminal(name) => {
                    let Some(token) = lookahead else {
                        return Err(SyntaxError::UnexpectedEnd { position: end });
                    };
                    let Some(production) = self.grammar.entry(&name, token.kind) else {
                        if token.kind == TokenKind::Eof {
                            return Err(SyntaxError::UnexpectedEnd {
                                position: token.position,
                            });
                        }
                        return Err(SyntaxError::MissingEntry {
                            nonterminal: name,
                            found: describe(token),
                            position: token.position,
                        });
                    };
                    branches.push((name, Vec::new()));
                    stack.push(StackEntry::Close);
                    for symbol in production.body.iter().rev() {
                        match symbol {
                            Symbol::Terminal(kind) => stack.push(StackEntry::Terminal(*kind)),
                            Symbol::NonTerminal(head) => {
                                stack.push(StackEntry::NonTerminal(head.clone()));
                            }
                            Symbol::Macro(_) => {
                                unreachable!("built grammars are macro-free");
                            }
                        }
                    }
                }
                StackEntry::Close => {
                    if let Some((symbol, children)) = branches.pop()
                        && let Some((_, parent)) = branches.last_mut()
                    {
                        parent.push(CstNode::Branch { symbol, children });
                    }
                }
            }
        }

        let (symbol, children) = branches.swap_remove(0);
        Ok(children
            .into_iter()
            .next()
            .unwrap_or(CstNode::Branch {
                symbol,
                children: Vec::new(),
            }))
    }
}

/// Direct JSON-object derivation: the production parse path for query
/// documents, whose top-level shape is always JSON.
///
/// Bypasses the grammar engine; each key/value pair becomes a keyed
/// expression node and values recurse into literal/object/array
/// sub-parsers. Heterogeneous arrays are syntactically legal here and
/// type-checked later.
pub struct DocumentParser {
    tokens: Vec<Token>,
    position: usize,
}

impl DocumentParser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let position = tokens.last().map(|t| t.span().end).unwrap_or(Position::start());
            tokens.push(Token::eof(position));
        }
        DocumentParser {
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        let token = self.current().clone();
        if token.kind == kind {
            self.advance();
            Ok(token)
        } else if token.kind == TokenKind::Eof {
            Err(SyntaxError::UnexpectedEnd {
                position: token.position,
            })
        } else {
            Err(SyntaxError::UnexpectedToken {
                expected: kind.to_string(),
                found: describe(&token),
                position: token.position,
            })
        }
    }

    /// Parse a complete document; anything after the first value is an
    /// error.
    pub fn parse(&mut self) -> Result<DocNode, SyntaxError> {
        let value = self.parse_value()?;
        if !self.check(TokenKind::Eof) {
            return Err(SyntaxError::TrailingContent {
                position: self.current().position,
            });
        }
        Ok(value)
    }

    fn parse_value(&mut self) -> Result<DocNode, SyntaxError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::String => {
                self.advance();
                Ok(DocNode::new(
                    token.span(),
                    DocValue::String(token.string_content()),
                ))
            }
            TokenKind::Integer => {
                self.advance();
                Ok(DocNode::new(
                    token.span(),
                    DocValue::Integer {
                        raw: token.raw.clone(),
                    },
                ))
            }
            TokenKind::Float => {
                self.advance();
                Ok(DocNode::new(
                    token.span(),
                    DocValue::Float {
                        raw: token.raw.clone(),
                    },
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(DocNode::new(token.span(), DocValue::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(DocNode::new(token.span(), DocValue::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(DocNode::new(token.span(), DocValue::Null))
            }
            TokenKind::Eof => Err(SyntaxError::UnexpectedEnd {
                position: token.position,
            }),
            _ => Err(SyntaxError::UnexpectedToken {
                expected: "value".to_string(),
                found: describe(&token),
                position: token.position,
            }),
        }
    }

    /// An empty object is an empty pair list, not an error.
    fn parse_object(&mut self) -> Result<DocNode, SyntaxError> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut pairs = Vec::new();

        while !self.check(TokenKind::RBrace) {
            let key_token = self.current().clone();
            let key = match key_token.kind {
                TokenKind::String => key_token.string_content(),
                TokenKind::Identifier => key_token.raw.clone(),
                TokenKind::Eof => {
                    return Err(SyntaxError::UnexpectedEnd {
                        position: key_token.position,
                    });
                }
                _ => {
                    return Err(SyntaxError::UnexpectedToken {
                        expected: "object key".to_string(),
                        found: describe(&key_token),
                        position: key_token.position,
                    });
                }
            };
            self.advance();

            self.expect(TokenKind::Colon)?;
            let value = self.parse_value()?;
            pairs.push(DocPair {
                key,
                key_span: key_token.span(),
                value,
            });

            if !self.check(TokenKind::RBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }

        let close = self.expect(TokenKind::RBrace)?;
        Ok(DocNode::new(
            Span::new(open.position, close.span().end),
            DocValue::Object(pairs),
        ))
    }

    fn parse_array(&mut self) -> Result<DocNode, SyntaxError> {
        let open = self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();

        while !self.check(TokenKind::RBracket) {
            if self.check(TokenKind::Eof) {
                return Err(SyntaxError::UnexpectedEnd {
                    position: self.current().position,
                });
            }
            elements.push(self.parse_value()?);

            if !self.check(TokenKind::RBracket) {
                self.expect(TokenKind::Comma)?;
            }
        }

        let close = self.expect(TokenKind::RBracket)?;
        Ok(DocNode::new(
            Span::new(open.position, close.span().end),
            DocValue::Array(elements),
        ))
    }
}
