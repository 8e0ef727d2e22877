//! The compilation pipeline driver.
//!
//! Wires the stages together (lexing, document parsing, AST building,
//! semantic analysis, translation), short-circuiting on the first
//! error and wrapping it with the failing stage. Compilation is
//! synchronous and CPU-bound; a compiled query is immutable and safe
//! to share across threads.

use thiserror::Error;
use tracing::debug;

use crate::ast::nodes::Page;
use crate::builder::AstBuilder;
use crate::lexer::{LexError, Lexer};
use crate::parser::{DocumentParser, SyntaxError};
use crate::provider::{MemoryProvider, QueryProvider};
use crate::semantic::{Analyzer, SemanticError};
use crate::translate::{Artifact, TranslateError, Translator};
use crate::types::Ty;

/// A compiler error, tagged with the pipeline stage that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("lexical analysis failed: {0}")]
    Lex(#[from] LexError),

    #[error("syntax analysis failed: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("semantic analysis failed: {0}")]
    Semantic(#[from] SemanticError),

    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),
}

/// The compiled form of a query document: the expression artifact plus
/// the decoded limit/offset pair for pagination-bearing documents.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub artifact: Artifact,
    pub page: Page,
}

/// Compiles query documents against declared root element types.
///
/// Holds the injected provider; everything else is per-compilation
/// state, so one compiler can serve concurrent callers.
pub struct Compiler {
    provider: Box<dyn QueryProvider + Send + Sync>,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

impl Compiler {
    /// A compiler targeting the in-memory execution engine.
    pub fn new() -> Self {
        Compiler {
            provider: Box::new(MemoryProvider::new()),
        }
    }

    /// A compiler targeting a caller-supplied provider.
    pub fn with_provider(provider: Box<dyn QueryProvider + Send + Sync>) -> Self {
        Compiler { provider }
    }

    /// Compile a document against a single root element type.
    pub fn compile(&self, source: &str, root: &Ty) -> Result<CompiledQuery, CompileError> {
        self.compile_multi(source, std::slice::from_ref(root))
    }

    /// Compile a document against several root element types; the
    /// document's outermost lambda must declare one parameter per
    /// type.
    pub fn compile_multi(&self, source: &str, roots: &[Ty]) -> Result<CompiledQuery, CompileError> {
        let tokens = Lexer::new(source).tokenize()?;
        debug!(tokens = tokens.len(), "lexical analysis complete");

        let document = DocumentParser::new(tokens).parse()?;
        debug!("syntax analysis complete");

        let ast = AstBuilder::new().build(&document, roots.len())?;
        debug!(page = ?ast.page, "ast construction complete");

        let analysis = Analyzer::new().analyze(&ast, roots)?;
        debug!("semantic analysis complete");

        let artifact = Translator::new(&analysis, self.provider.as_ref()).translate(&ast)?;
        debug!("translation complete");

        Ok(CompiledQuery {
            artifact,
            page: ast.page,
        })
    }
}
