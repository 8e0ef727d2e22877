//! Expression-tree code generation.
//!
//! Lowers the annotated AST into the target expression tree the
//! execution engine evaluates. The lowering is structure-preserving
//! and type-directed: each operator category maps to exactly one
//! codegen routine, and collection operators request their concrete
//! operation descriptor from the injected [`QueryProvider`],
//! parameterized by the element type the operation works over. No node
//! shape is introduced that the annotated AST doesn't already have.

use std::collections::HashMap;
use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ast::nodes::{Literal, NodeId, QueryAst, QueryExpr, QueryNode};
use crate::ast::operators::{Operator, OperatorCategory};
use crate::ast::tokens::Span;
use crate::builder::ROOT_SOURCE;
use crate::provider::{QueryProvider, SequenceOp, SequenceOpKind};
use crate::semantic::{Analysis, Annotation};
use crate::types::Ty;
use crate::value::Value;

/// Errors raised while lowering the annotated AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("no target operation {kind:?} for element type {element}")]
    UnsupportedOperation {
        kind: SequenceOpKind,
        element: String,
    },

    #[error("pattern operand of {op} must be a constant string at {span}")]
    NonConstantPattern { op: Operator, span: Span },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("literal '{raw}' is out of runtime range at {span}")]
    LiteralOutOfRange { raw: String, span: Span },

    #[error("node {0} has no semantic annotation")]
    Unannotated(NodeId),

    #[error("unresolved parameter '{name}' during translation")]
    UnresolvedParameter { name: String },
}

/// Binary operations carried by the target tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

/// The compiled expression tree.
///
/// Patterns for `$like`/`$regex` are compiled here, once, so the
/// executor never re-parses them and invalid patterns fail at
/// translation time.
#[derive(Debug, Clone)]
pub enum TargetExpr {
    Constant(Value),
    Parameter(String),
    Property {
        target: Box<TargetExpr>,
        name: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TargetExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<TargetExpr>,
        right: Box<TargetExpr>,
    },
    Match {
        target: Box<TargetExpr>,
        pattern: Regex,
    },
    Lambda {
        params: Vec<String>,
        body: Box<TargetExpr>,
    },
    Apply {
        op: SequenceOp,
        source: Box<TargetExpr>,
        argument: Option<Box<TargetExpr>>,
    },
    Construct {
        fields: Vec<(String, TargetExpr)>,
    },
}

/// The compiled artifact a query document lowers to.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// A lambda over the root element type(s): the common
    /// predicate-only document.
    Predicate(TargetExpr),

    /// A chain of collection operations over the root sequence
    /// parameter.
    Pipeline(TargetExpr),

    /// A scalar-valued expression over the root sequence parameter.
    Aggregate(TargetExpr),
}

impl Artifact {
    pub fn expr(&self) -> &TargetExpr {
        match self {
            Artifact::Predicate(expr) | Artifact::Pipeline(expr) | Artifact::Aggregate(expr) => {
                expr
            }
        }
    }
}

/// Translation context: declared parameter expressions threaded
/// through nested scopes. The root source sits at the top; every
/// collection-lambda scope adds its synthesized element parameter.
struct TranslationScopes {
    scopes: Vec<HashMap<String, TargetExpr>>,
}

impl TranslationScopes {
    fn new() -> Self {
        let mut root = HashMap::new();
        root.insert(
            ROOT_SOURCE.to_string(),
            TargetExpr::Parameter(ROOT_SOURCE.to_string()),
        );
        TranslationScopes { scopes: vec![root] }
    }

    fn push(&mut self, params: &[String]) {
        let mut scope = HashMap::new();
        for param in params {
            scope.insert(param.clone(), TargetExpr::Parameter(param.clone()));
        }
        self.scopes.push(scope);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn lookup(&self, name: &str) -> Option<&TargetExpr> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

/// The code generator.
pub struct Translator<'a> {
    analysis: &'a Analysis,
    provider: &'a dyn QueryProvider,
    scopes: TranslationScopes,
}

impl<'a> Translator<'a> {
    pub fn new(analysis: &'a Analysis, provider: &'a dyn QueryProvider) -> Self {
        Translator {
            analysis,
            provider,
            scopes: TranslationScopes::new(),
        }
    }

    /// Lower the whole document expression into its artifact.
    pub fn translate(&mut self, ast: &QueryAst) -> Result<Artifact, TranslateError> {
        let expr = self.translate_node(&ast.root)?;
        Ok(match &ast.root.expr {
            QueryExpr::Lambda { .. } => Artifact::Predicate(expr),
            QueryExpr::Operation { op, .. } if is_aggregate_shaped(*op) => {
                Artifact::Aggregate(expr)
            }
            _ => Artifact::Pipeline(expr),
        })
    }

    fn annotation(&self, id: NodeId) -> Result<&Annotation, TranslateError> {
        self.analysis
            .annotation(id)
            .ok_or(TranslateError::Unannotated(id))
    }

    fn translate_node(&mut self, node: &QueryNode) -> Result<TargetExpr, TranslateError> {
        match &node.expr {
            QueryExpr::Literal(literal) => {
                Ok(TargetExpr::Constant(self.literal_value(literal, node)?))
            }

            QueryExpr::Reference(name) => {
                self.scopes
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| TranslateError::UnresolvedParameter { name: name.clone() })
            }

            QueryExpr::MemberAccess { target, name } => {
                // Resolve the exact-cased field name off the target's
                // record schema; analysis guarantees a unique match.
                let canonical = match self.annotation(target.id)?.ty.unwrap_optional() {
                    Ty::Record(schema) => match schema.field(name) {
                        crate::types::MemberMatch::Unique(field) => field.name.clone(),
                        _ => name.clone(),
                    },
                    _ => name.clone(),
                };
                let target = self.translate_node(target)?;
                Ok(TargetExpr::Property {
                    target: Box::new(target),
                    name: canonical,
                })
            }

            QueryExpr::Lambda { params, body } => {
                self.scopes.push(params);
                let body = self.translate_node(body);
                self.scopes.pop();
                Ok(TargetExpr::Lambda {
                    params: params.clone(),
                    body: Box::new(body?),
                })
            }

            QueryExpr::Operation { op, operands } => self.translate_operation(node, *op, operands),

            QueryExpr::Construct { fields } => {
                let mut translated = Vec::new();
                for (name, value) in fields {
                    translated.push((name.clone(), self.translate_node(value)?));
                }
                Ok(TargetExpr::Construct { fields: translated })
            }
        }
    }

    fn translate_operation(
        &mut self,
        node: &QueryNode,
        op: Operator,
        operands: &[QueryNode],
    ) -> Result<TargetExpr, TranslateError> {
        match op.category() {
            OperatorCategory::Arithmetic | OperatorCategory::Relational => {
                let [left, right] = operands else {
                    return Err(TranslateError::Unannotated(node.id));
                };
                let left = self.translate_node(left)?;
                let right = self.translate_node(right)?;
                Ok(TargetExpr::Binary {
                    op: binary_op(op),
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }

            OperatorCategory::StringRelational => {
                let [target, pattern] = operands else {
                    return Err(TranslateError::Unannotated(node.id));
                };
                let target = self.translate_node(target)?;
                let pattern_expr = self.translate_node(pattern)?;
                let TargetExpr::Constant(Value::String(raw)) = pattern_expr else {
                    return Err(TranslateError::NonConstantPattern {
                        op,
                        span: pattern.span,
                    });
                };
                let source = match op {
                    Operator::Like => like_to_regex(&raw),
                    _ => raw.clone(),
                };
                let compiled =
                    Regex::new(&source).map_err(|e| TranslateError::InvalidPattern {
                        pattern: raw,
                        reason: e.to_string(),
                    })?;
                Ok(TargetExpr::Match {
                    target: Box::new(target),
                    pattern: compiled,
                })
            }

            OperatorCategory::Logical => match op {
                Operator::Not => {
                    let [operand] = operands else {
                        return Err(TranslateError::Unannotated(node.id));
                    };
                    let operand = self.translate_node(operand)?;
                    Ok(TargetExpr::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    })
                }
                _ => {
                    let folded = match op {
                        Operator::And => BinaryOp::And,
                        _ => BinaryOp::Or,
                    };
                    let mut translated = Vec::new();
                    for operand in operands {
                        translated.push(self.translate_node(operand)?);
                    }
                    let mut iter = translated.into_iter();
                    let Some(mut acc) = iter.next() else {
                        return Ok(TargetExpr::Constant(Value::Bool(folded == BinaryOp::And)));
                    };
                    for next in iter {
                        acc = TargetExpr::Binary {
                            op: folded,
                            left: Box::new(acc),
                            right: Box::new(next),
                        };
                    }
                    Ok(acc)
                }
            },

            OperatorCategory::Semantic => {
                // `$aggregate` wraps transparently; `$new` lowers to
                // Construct during building.
                let [inner] = operands else {
                    return Err(TranslateError::Unannotated(node.id));
                };
                self.translate_node(inner)
            }

            OperatorCategory::CollectionManipulation | OperatorCategory::CollectionAggregation => {
                self.translate_sequence(node, op, operands)
            }
        }
    }

    fn translate_sequence(
        &mut self,
        node: &QueryNode,
        op: Operator,
        operands: &[QueryNode],
    ) -> Result<TargetExpr, TranslateError> {
        let Some(source_node) = operands.first() else {
            return Err(TranslateError::Unannotated(node.id));
        };
        let kind = sequence_kind(op).ok_or(TranslateError::Unannotated(node.id))?;

        let source_ty = self.annotation(source_node.id)?.ty.clone();
        let element =
            self.provider
                .element_type(&source_ty)
                .ok_or_else(|| TranslateError::UnsupportedOperation {
                    kind,
                    element: source_ty.to_string(),
                })?;

        // Value-producing aggregations are parameterized by the type
        // they reduce over: the selector's result when one is present.
        let argument_node = operands.get(1);
        let parameter_ty = match kind {
            SequenceOpKind::Sum
            | SequenceOpKind::Average
            | SequenceOpKind::Min
            | SequenceOpKind::Max
            | SequenceOpKind::OrderBy
            | SequenceOpKind::OrderByDescending => argument_node
                .map(|arg| self.annotation(arg.id).map(|a| a.ty.clone()))
                .transpose()?
                .unwrap_or_else(|| element.clone()),
            _ => element,
        };

        let descriptor = self.provider.sequence_op(kind, &parameter_ty)?;

        let source = self.translate_node(source_node)?;
        let argument = argument_node
            .map(|arg| self.translate_node(arg))
            .transpose()?
            .map(Box::new);

        Ok(TargetExpr::Apply {
            op: descriptor,
            source: Box::new(source),
            argument,
        })
    }

    /// Literal lowering follows the annotated width: integer kinds
    /// check the runtime range, decimal kinds parse the raw digits
    /// losslessly.
    fn literal_value(
        &self,
        literal: &Literal,
        node: &QueryNode,
    ) -> Result<Value, TranslateError> {
        Ok(match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Integer { raw } => {
                let wide: i128 =
                    raw.parse()
                        .map_err(|_| TranslateError::LiteralOutOfRange {
                            raw: raw.clone(),
                            span: node.span,
                        })?;
                let narrow =
                    i64::try_from(wide).map_err(|_| TranslateError::LiteralOutOfRange {
                        raw: raw.clone(),
                        span: node.span,
                    })?;
                Value::Integer(narrow)
            }
            Literal::Float { raw } => {
                let ty = self.annotation(node.id)?.ty.clone();
                if ty == Ty::Decimal {
                    let parsed = Decimal::from_str(raw)
                        .or_else(|_| Decimal::from_scientific(raw))
                        .map_err(|_| TranslateError::LiteralOutOfRange {
                            raw: raw.clone(),
                            span: node.span,
                        })?;
                    Value::Decimal(parsed)
                } else {
                    let parsed: f64 =
                        raw.parse()
                            .map_err(|_| TranslateError::LiteralOutOfRange {
                                raw: raw.clone(),
                                span: node.span,
                            })?;
                    Value::Float(parsed)
                }
            }
        })
    }
}

fn binary_op(op: Operator) -> BinaryOp {
    match op {
        Operator::Add => BinaryOp::Add,
        Operator::Subtract => BinaryOp::Subtract,
        Operator::Multiply => BinaryOp::Multiply,
        Operator::Divide => BinaryOp::Divide,
        Operator::Modulo => BinaryOp::Modulo,
        Operator::Equals => BinaryOp::Equals,
        Operator::NotEquals => BinaryOp::NotEquals,
        Operator::Less => BinaryOp::Less,
        Operator::LessOrEqual => BinaryOp::LessOrEqual,
        Operator::Greater => BinaryOp::Greater,
        Operator::GreaterOrEqual => BinaryOp::GreaterOrEqual,
        _ => unreachable!("only arithmetic/relational operators lower to binary nodes"),
    }
}

fn sequence_kind(op: Operator) -> Option<SequenceOpKind> {
    Some(match op {
        Operator::Filter => SequenceOpKind::Filter,
        Operator::Select => SequenceOpKind::Select,
        Operator::SelectMany => SequenceOpKind::SelectMany,
        Operator::OrderBy => SequenceOpKind::OrderBy,
        Operator::OrderByDescending => SequenceOpKind::OrderByDescending,
        Operator::Limit => SequenceOpKind::Take,
        Operator::Skip => SequenceOpKind::Skip,
        Operator::Count => SequenceOpKind::Count,
        Operator::Contains => SequenceOpKind::Contains,
        Operator::Index => SequenceOpKind::ElementAt,
        Operator::Any => SequenceOpKind::Any,
        Operator::All => SequenceOpKind::All,
        Operator::Min => SequenceOpKind::Min,
        Operator::Max => SequenceOpKind::Max,
        Operator::Sum => SequenceOpKind::Sum,
        Operator::Average => SequenceOpKind::Average,
        _ => return None,
    })
}

fn is_aggregate_shaped(op: Operator) -> bool {
    op == Operator::Aggregate || op.category() == OperatorCategory::CollectionAggregation
}

/// Lower a `$like` pattern to an anchored, case-insensitive regex:
/// `%` matches any run, `_` any single character, everything else
/// literally.
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_anchor_and_escape() {
        assert_eq!(like_to_regex("b%"), "(?i)^b.*$");
        assert_eq!(like_to_regex("a_c"), "(?i)^a.c$");
        assert_eq!(like_to_regex("1.5"), "(?i)^1\\.5$");
    }

    #[test]
    fn binary_mapping_is_total_for_relational_ops() {
        assert_eq!(binary_op(Operator::Greater), BinaryOp::Greater);
        assert_eq!(binary_op(Operator::Equals), BinaryOp::Equals);
        assert_eq!(binary_op(Operator::Modulo), BinaryOp::Modulo);
    }
}
