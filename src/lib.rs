pub mod ast;
pub mod builder;
pub mod compile;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod provider;
pub mod semantic;
pub mod translate;
pub mod types;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Operator, Page, QueryExpr, QueryNode, Token, TokenKind};
pub use builder::AstBuilder;
pub use compile::{CompileError, CompiledQuery, Compiler};
pub use grammar::{Grammar, GrammarError, Production, Symbol};
pub use lexer::{LexError, Lexer, Position};
pub use parser::{CstNode, DocumentParser, SyntaxError, TableParser};
pub use provider::{EvalError, MemoryProvider, QueryProvider, SequenceOpKind};
pub use semantic::{Analysis, Analyzer, SemanticError};
pub use translate::{Artifact, TargetExpr, TranslateError, Translator};
pub use types::{RecordSchema, SchemaRegistry, Ty};
pub use value::Value;
