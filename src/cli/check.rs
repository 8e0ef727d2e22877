//! Compile queries and execute them against JSON input

use super::CliError;
use crate::compile::{CompileError, Compiler};
use crate::lexer::Lexer;
use crate::parser::DocumentParser;
use crate::provider::MemoryProvider;
use crate::types::{SchemaRegistry, Ty};
use crate::value::Value;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query document to compile
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't compile or execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query executed successfully with JSON output
    Success(serde_json::Value),
}

/// Execute a sift check operation.
///
/// The root element type is inferred from the first input record, so
/// no separate schema file is needed to run ad-hoc queries.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.syntax_only {
        let tokens = Lexer::new(&options.query)
            .tokenize()
            .map_err(CompileError::from)?;
        DocumentParser::new(tokens)
            .parse()
            .map_err(CompileError::from)?;
        return Ok(CheckResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json: serde_json::Value = serde_json::from_str(json_str)?;

    let (sample, records): (&serde_json::Value, Vec<Value>) = match &json {
        serde_json::Value::Array(items) => {
            let Some(first) = items.first() else {
                return Ok(CheckResult::Success(serde_json::Value::Array(Vec::new())));
            };
            (first, items.iter().map(Value::from).collect())
        }
        serde_json::Value::Object(_) => (&json, vec![Value::from(&json)]),
        _ => return Err(CliError::InvalidInput),
    };

    let mut registry = SchemaRegistry::new();
    let schema = registry
        .infer("Record", sample)
        .ok_or(CliError::InvalidInput)?;
    let root = Ty::record(schema);

    let compiled = Compiler::new().compile(&options.query, &root)?;
    let result = MemoryProvider::new().run(&compiled, &records)?;

    Ok(CheckResult::Success(serde_json::Value::from(&result)))
}
