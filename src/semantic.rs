//! Scope-aware semantic analysis.
//!
//! Two pre-passes run before the general walk, because lambda
//! parameter types are not locally knowable from the document syntax:
//! first the supplied root element types are bound to the outermost
//! lambda's parameters (or to the root source symbol for pipeline
//! documents), then every collection operator's lambda gets its sole
//! parameter typed from the element type of its source operand.
//!
//! General analysis is bottom-up and memoized by node identity: the
//! annotation for a node is computed once, cached, and returned
//! unchanged on every later visit. Scopes chain outward; entering a
//! lambda body pushes its scope and siblings always analyze against
//! the scope they were reached from, so entry and exit stay paired by
//! construction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::nodes::{Literal, NodeId, QueryAst, QueryExpr, QueryNode};
use crate::ast::operators::{Operator, OperatorCategory};
use crate::ast::tokens::Span;
use crate::builder::ROOT_SOURCE;
use crate::types::{
    classify_fraction, classify_integer, numeric_join, FieldDef, MemberMatch, RecordSchema, Ty,
};
use thiserror::Error;

/// Errors raised during AST construction and semantic analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("query document must be an object, found {found} at {span}")]
    InvalidDocument { found: String, span: Span },

    #[error("unknown operator '{key}' at {span}")]
    UnknownOperator { key: String, span: Span },

    #[error("{context}: expected {expected}, found {found} at {span}")]
    InvalidOperand {
        context: String,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("operator {op} does not take {found} operand(s) at {span}")]
    OperatorArity {
        op: Operator,
        found: usize,
        span: Span,
    },

    #[error("unresolved reference '{name}' at {span}")]
    UnresolvedReference { name: String, span: Span },

    #[error("ambiguous member '{name}' on {ty} at {span}")]
    AmbiguousMember { name: String, ty: String, span: Span },

    #[error("member access on non-record type {ty} at {span}")]
    NotARecord { ty: String, span: Span },

    #[error("type mismatch: {op} cannot combine {left} and {right} at {span}")]
    TypeMismatch {
        op: Operator,
        left: String,
        right: String,
        span: Span,
    },

    #[error("operand of {op} must be {expected}, found {found} at {span}")]
    OperandType {
        op: Operator,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("source of {op} is not queryable: {ty} at {span}")]
    NotQueryable { op: Operator, ty: String, span: Span },

    #[error("lambda must declare exactly one parameter, found {found} at {span}")]
    LambdaArity { found: usize, span: Span },

    #[error("query declares {params} root parameter(s) but {supplied} root type(s) were supplied")]
    RootArityMismatch { params: usize, supplied: usize },

    #[error("malformed literal '{raw}' at {span}")]
    MalformedLiteral { raw: String, span: Span },

    #[error("parameter '{name}' has no resolved type at {span}")]
    UnboundParameter { name: String, span: Span },
}

/// Resolved-type annotation attached to a node, cached by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub ty: Ty,
    pub is_queryable: bool,
    pub element: Option<Ty>,
}

impl Annotation {
    pub fn of(ty: Ty) -> Self {
        Annotation {
            is_queryable: ty.is_queryable(),
            element: ty.element().cloned(),
            ty,
        }
    }
}

/// The completed analysis: every node's annotation, keyed by identity.
/// Handed to the translator; owns no reference back to the AST.
#[derive(Debug, Default)]
pub struct Analysis {
    annotations: HashMap<NodeId, Annotation>,
}

impl Analysis {
    pub fn annotation(&self, id: NodeId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    pub fn ty(&self, id: NodeId) -> Option<&Ty> {
        self.annotations.get(&id).map(|a| &a.ty)
    }
}

/// One lexical scope: declared symbols and the scope it nests in.
#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Option<Ty>>,
    parent: Option<usize>,
}

/// Scope-chained symbol table. Lookup walks outward until found or the
/// chain is exhausted.
#[derive(Debug)]
struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    fn push_scope(&mut self, parent: usize) -> usize {
        self.scopes.push(Scope {
            symbols: HashMap::new(),
            parent: Some(parent),
        });
        self.scopes.len() - 1
    }

    fn declare(&mut self, scope: usize, name: &str, ty: Option<Ty>) {
        self.scopes[scope].symbols.insert(name.to_string(), ty);
    }

    fn lookup(&self, mut scope: usize, name: &str) -> Option<&Option<Ty>> {
        loop {
            let current = &self.scopes[scope];
            if let Some(entry) = current.symbols.get(name) {
                return Some(entry);
            }
            scope = current.parent?;
        }
    }
}

/// The semantic analyzer: per-compilation state, shared with nothing.
pub struct Analyzer {
    table: SymbolTable,
    cache: HashMap<NodeId, Annotation>,
    lambda_scopes: HashMap<NodeId, usize>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            table: SymbolTable::new(),
            cache: HashMap::new(),
            lambda_scopes: HashMap::new(),
        }
    }

    /// Run both pre-passes, then the general bottom-up walk.
    pub fn analyze(mut self, ast: &QueryAst, roots: &[Ty]) -> Result<Analysis, SemanticError> {
        self.bind_roots(&ast.root, roots)?;
        self.fix_lambda_types(&ast.root, 0)?;
        self.analyze_node(&ast.root, 0)?;
        Ok(Analysis {
            annotations: self.cache,
        })
    }

    /// Pre-pass 1: bind the declared root element type(s).
    ///
    /// A predicate document's artifact is itself the outermost lambda,
    /// so its parameters take the root types directly; a pipeline
    /// document instead declares the root source symbol as a sequence
    /// of the single root type.
    fn bind_roots(&mut self, root: &QueryNode, roots: &[Ty]) -> Result<(), SemanticError> {
        match &root.expr {
            QueryExpr::Lambda { params, .. } => {
                if params.len() != roots.len() {
                    return Err(SemanticError::RootArityMismatch {
                        params: params.len(),
                        supplied: roots.len(),
                    });
                }
                let scope = self.table.push_scope(0);
                for (param, ty) in params.iter().zip(roots) {
                    self.table.declare(scope, param, Some(ty.clone()));
                }
                self.lambda_scopes.insert(root.id, scope);
            }
            _ => {
                let [ty] = roots else {
                    return Err(SemanticError::RootArityMismatch {
                        params: 1,
                        supplied: roots.len(),
                    });
                };
                self.table
                    .declare(0, ROOT_SOURCE, Some(Ty::sequence(ty.clone())));
            }
        }
        Ok(())
    }

    /// Pre-pass 2: type every collection-lambda parameter from the
    /// element type of its operator's source operand.
    ///
    /// Sources are analyzed on demand (and cached), so chained
    /// operators resolve outside-in without a separate ordering pass.
    fn fix_lambda_types(&mut self, node: &QueryNode, scope: usize) -> Result<(), SemanticError> {
        match &node.expr {
            QueryExpr::Operation { op, operands }
                if is_collection_operator(*op)
                    && operands.len() == 2
                    && matches!(operands[1].expr, QueryExpr::Lambda { .. }) =>
            {
                self.fix_lambda_types(&operands[0], scope)?;

                let source = self.analyze_node(&operands[0], scope)?;
                let Some(element) = source.ty.element().cloned() else {
                    return Err(SemanticError::NotQueryable {
                        op: *op,
                        ty: source.ty.to_string(),
                        span: operands[0].span,
                    });
                };

                let QueryExpr::Lambda { params, body } = &operands[1].expr else {
                    unreachable!("guarded by the match arm");
                };
                if params.len() != 1 {
                    return Err(SemanticError::LambdaArity {
                        found: params.len(),
                        span: operands[1].span,
                    });
                }

                let lambda_scope = self.lambda_scope(operands[1].id, scope);
                self.table.declare(lambda_scope, &params[0], Some(element));
                self.fix_lambda_types(body, lambda_scope)?;
            }
            QueryExpr::Operation { operands, .. } => {
                for operand in operands {
                    self.fix_lambda_types(operand, scope)?;
                }
            }
            QueryExpr::Lambda { body, .. } => {
                let lambda_scope = self.lambda_scope(node.id, scope);
                self.fix_lambda_types(body, lambda_scope)?;
            }
            QueryExpr::MemberAccess { target, .. } => self.fix_lambda_types(target, scope)?,
            QueryExpr::Construct { fields } => {
                for (_, value) in fields {
                    self.fix_lambda_types(value, scope)?;
                }
            }
            QueryExpr::Literal(_) | QueryExpr::Reference(_) => {}
        }
        Ok(())
    }

    /// The scope owned by a lambda node, created on first use.
    fn lambda_scope(&mut self, id: NodeId, parent: usize) -> usize {
        if let Some(&scope) = self.lambda_scopes.get(&id) {
            return scope;
        }
        let scope = self.table.push_scope(parent);
        self.lambda_scopes.insert(id, scope);
        scope
    }

    /// General analysis, memoized by node identity. Repeated visits of
    /// a node return the cached annotation without recomputation.
    fn analyze_node(&mut self, node: &QueryNode, scope: usize) -> Result<Annotation, SemanticError> {
        if let Some(cached) = self.cache.get(&node.id) {
            return Ok(cached.clone());
        }

        let annotation = match &node.expr {
            QueryExpr::Literal(literal) => Annotation::of(self.literal_ty(literal, node.span)?),

            QueryExpr::Reference(name) => match self.table.lookup(scope, name) {
                Some(Some(ty)) => Annotation::of(ty.clone()),
                Some(None) => {
                    return Err(SemanticError::UnboundParameter {
                        name: name.clone(),
                        span: node.span,
                    });
                }
                None => {
                    return Err(SemanticError::UnresolvedReference {
                        name: name.clone(),
                        span: node.span,
                    });
                }
            },

            QueryExpr::MemberAccess { target, name } => {
                let target_annotation = self.analyze_node(target, scope)?;
                let target_ty = target_annotation.ty.unwrap_optional();
                let Ty::Record(schema) = target_ty else {
                    return Err(SemanticError::NotARecord {
                        ty: target_ty.to_string(),
                        span: node.span,
                    });
                };
                match schema.field(name) {
                    MemberMatch::Unique(field) => Annotation::of(field.ty.clone()),
                    MemberMatch::Missing => {
                        return Err(SemanticError::UnresolvedReference {
                            name: name.clone(),
                            span: node.span,
                        });
                    }
                    MemberMatch::Ambiguous => {
                        return Err(SemanticError::AmbiguousMember {
                            name: name.clone(),
                            ty: target_ty.to_string(),
                            span: node.span,
                        });
                    }
                }
            }

            QueryExpr::Lambda { body, .. } => {
                let lambda_scope = self.lambda_scope(node.id, scope);
                // A lambda's annotation is its body's: the return type.
                self.analyze_node(body, lambda_scope)?
            }

            QueryExpr::Operation { op, operands } => {
                self.analyze_operation(node, *op, operands, scope)?
            }

            QueryExpr::Construct { fields } => {
                let mut defs = Vec::new();
                for (name, value) in fields {
                    let field_annotation = self.analyze_node(value, scope)?;
                    defs.push(FieldDef {
                        name: name.clone(),
                        ty: field_annotation.ty,
                    });
                }
                Annotation::of(Ty::record(Arc::new(RecordSchema::new("(projection)", defs))))
            }
        };

        self.cache.insert(node.id, annotation.clone());
        Ok(annotation)
    }

    fn literal_ty(&self, literal: &Literal, span: Span) -> Result<Ty, SemanticError> {
        Ok(match literal {
            Literal::Null => Ty::Null,
            Literal::Bool(_) => Ty::Bool,
            Literal::String(_) => Ty::Str,
            Literal::Integer { raw } => {
                raw.parse::<i128>()
                    .map_err(|_| SemanticError::MalformedLiteral {
                        raw: raw.clone(),
                        span,
                    })?;
                classify_integer(raw)
            }
            Literal::Float { raw } => {
                raw.parse::<f64>()
                    .map_err(|_| SemanticError::MalformedLiteral {
                        raw: raw.clone(),
                        span,
                    })?;
                classify_fraction(raw)
            }
        })
    }

    fn analyze_operation(
        &mut self,
        node: &QueryNode,
        op: Operator,
        operands: &[QueryNode],
        scope: usize,
    ) -> Result<Annotation, SemanticError> {
        match op.category() {
            OperatorCategory::Arithmetic => {
                let [left, right] = operands else {
                    return Err(self.arity(op, operands, node.span));
                };
                let lt = self.analyze_node(left, scope)?.ty;
                let rt = self.analyze_node(right, scope)?.ty;
                numeric_join(lt.unwrap_optional(), rt.unwrap_optional())
                    .map(Annotation::of)
                    .ok_or_else(|| SemanticError::TypeMismatch {
                        op,
                        left: lt.to_string(),
                        right: rt.to_string(),
                        span: node.span,
                    })
            }

            OperatorCategory::Relational => {
                let [left, right] = operands else {
                    return Err(self.arity(op, operands, node.span));
                };
                let lt = self.analyze_node(left, scope)?.ty;
                let rt = self.analyze_node(right, scope)?.ty;
                let (lu, ru) = (lt.unwrap_optional(), rt.unwrap_optional());
                let compatible = lu == ru
                    || (lu.is_numeric() && ru.is_numeric())
                    || *lu == Ty::Null
                    || *ru == Ty::Null;
                if compatible {
                    Ok(Annotation::of(Ty::Bool))
                } else {
                    Err(SemanticError::TypeMismatch {
                        op,
                        left: lt.to_string(),
                        right: rt.to_string(),
                        span: node.span,
                    })
                }
            }

            OperatorCategory::StringRelational => {
                let [left, right] = operands else {
                    return Err(self.arity(op, operands, node.span));
                };
                for operand in [left, right] {
                    let ty = self.analyze_node(operand, scope)?.ty;
                    if *ty.unwrap_optional() != Ty::Str {
                        return Err(SemanticError::OperandType {
                            op,
                            expected: "string".to_string(),
                            found: ty.to_string(),
                            span: operand.span,
                        });
                    }
                }
                Ok(Annotation::of(Ty::Bool))
            }

            OperatorCategory::Logical => {
                for operand in operands {
                    let ty = self.analyze_node(operand, scope)?.ty;
                    if *ty.unwrap_optional() != Ty::Bool {
                        return Err(SemanticError::OperandType {
                            op,
                            expected: "bool".to_string(),
                            found: ty.to_string(),
                            span: operand.span,
                        });
                    }
                }
                Ok(Annotation::of(Ty::Bool))
            }

            OperatorCategory::Semantic => {
                // $aggregate is a transparent wrapper; $new lowers to
                // Construct during building and never reaches here in
                // operation form.
                let [inner] = operands else {
                    return Err(self.arity(op, operands, node.span));
                };
                self.analyze_node(inner, scope)
            }

            OperatorCategory::CollectionManipulation => {
                self.analyze_manipulation(node, op, operands, scope)
            }

            OperatorCategory::CollectionAggregation => {
                self.analyze_aggregation(node, op, operands, scope)
            }
        }
    }

    fn analyze_manipulation(
        &mut self,
        node: &QueryNode,
        op: Operator,
        operands: &[QueryNode],
        scope: usize,
    ) -> Result<Annotation, SemanticError> {
        let Some(source) = operands.first() else {
            return Err(self.arity(op, operands, node.span));
        };
        let source_annotation = self.analyze_node(source, scope)?;
        if !source_annotation.is_queryable {
            return Err(SemanticError::NotQueryable {
                op,
                ty: source_annotation.ty.to_string(),
                span: source.span,
            });
        }
        let [_, argument] = operands else {
            return Err(self.arity(op, operands, node.span));
        };
        let argument_annotation = self.analyze_node(argument, scope)?;

        match op {
            Operator::Filter => {
                if *argument_annotation.ty.unwrap_optional() != Ty::Bool {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "a boolean predicate".to_string(),
                        found: argument_annotation.ty.to_string(),
                        span: argument.span,
                    });
                }
                Ok(source_annotation)
            }
            Operator::OrderBy | Operator::OrderByDescending => {
                if !argument_annotation.ty.is_comparable() {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "a comparable sort key".to_string(),
                        found: argument_annotation.ty.to_string(),
                        span: argument.span,
                    });
                }
                Ok(source_annotation)
            }
            Operator::Limit | Operator::Skip => {
                if !argument_annotation.ty.unwrap_optional().is_integral() {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "an integer".to_string(),
                        found: argument_annotation.ty.to_string(),
                        span: argument.span,
                    });
                }
                Ok(source_annotation)
            }
            Operator::Select => Ok(Annotation::of(Ty::sequence(argument_annotation.ty))),
            Operator::SelectMany => {
                if !argument_annotation.ty.is_queryable() {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "a sequence-valued selector".to_string(),
                        found: argument_annotation.ty.to_string(),
                        span: argument.span,
                    });
                }
                Ok(Annotation::of(argument_annotation.ty))
            }
            _ => Err(self.arity(op, operands, node.span)),
        }
    }

    fn analyze_aggregation(
        &mut self,
        node: &QueryNode,
        op: Operator,
        operands: &[QueryNode],
        scope: usize,
    ) -> Result<Annotation, SemanticError> {
        let Some(source) = operands.first() else {
            return Err(self.arity(op, operands, node.span));
        };
        let source_annotation = self.analyze_node(source, scope)?;
        let Some(element) = source_annotation.element.clone() else {
            return Err(SemanticError::NotQueryable {
                op,
                ty: source_annotation.ty.to_string(),
                span: source.span,
            });
        };
        let argument = operands.get(1);
        let argument_annotation = argument
            .map(|arg| self.analyze_node(arg, scope))
            .transpose()?;

        match op {
            Operator::Count | Operator::Any | Operator::All => {
                if let (Some(arg), Some(annotation)) = (argument, &argument_annotation)
                    && *annotation.ty.unwrap_optional() != Ty::Bool
                {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "a boolean predicate".to_string(),
                        found: annotation.ty.to_string(),
                        span: arg.span,
                    });
                }
                Ok(Annotation::of(if op == Operator::Count {
                    Ty::Int32
                } else {
                    Ty::Bool
                }))
            }

            Operator::Contains => {
                let Some(annotation) = argument_annotation else {
                    return Err(self.arity(op, operands, node.span));
                };
                let vu = annotation.ty.unwrap_optional();
                let eu = element.unwrap_optional();
                let compatible =
                    vu == eu || (vu.is_numeric() && eu.is_numeric()) || *vu == Ty::Null;
                if !compatible {
                    return Err(SemanticError::TypeMismatch {
                        op,
                        left: element.to_string(),
                        right: annotation.ty.to_string(),
                        span: node.span,
                    });
                }
                Ok(Annotation::of(Ty::Bool))
            }

            Operator::Index => {
                let Some(annotation) = argument_annotation else {
                    return Err(self.arity(op, operands, node.span));
                };
                if !annotation.ty.unwrap_optional().is_integral() {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "an integer index".to_string(),
                        found: annotation.ty.to_string(),
                        span: node.span,
                    });
                }
                Ok(Annotation::of(element))
            }

            Operator::Min | Operator::Max => {
                let value_ty = argument_annotation
                    .map(|a| a.ty)
                    .unwrap_or_else(|| element.clone());
                if !value_ty.is_comparable() {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "comparable values".to_string(),
                        found: value_ty.to_string(),
                        span: node.span,
                    });
                }
                Ok(Annotation::of(value_ty))
            }

            Operator::Sum => {
                let value_ty = argument_annotation
                    .map(|a| a.ty)
                    .unwrap_or_else(|| element.clone());
                if !value_ty.unwrap_optional().is_numeric() {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "numeric values".to_string(),
                        found: value_ty.to_string(),
                        span: node.span,
                    });
                }
                Ok(Annotation::of(value_ty.unwrap_optional().clone()))
            }

            Operator::Average => {
                let value_ty = argument_annotation
                    .map(|a| a.ty)
                    .unwrap_or_else(|| element.clone());
                if !value_ty.unwrap_optional().is_numeric() {
                    return Err(SemanticError::OperandType {
                        op,
                        expected: "numeric values".to_string(),
                        found: value_ty.to_string(),
                        span: node.span,
                    });
                }
                Ok(Annotation::of(
                    if *value_ty.unwrap_optional() == Ty::Decimal {
                        Ty::Decimal
                    } else {
                        Ty::Float64
                    },
                ))
            }

            _ => Err(self.arity(op, operands, node.span)),
        }
    }

    fn arity(&self, op: Operator, operands: &[QueryNode], span: Span) -> SemanticError {
        SemanticError::OperatorArity {
            op,
            found: operands.len(),
            span,
        }
    }
}

/// Collection operators: the ones whose second operand may be a
/// lambda needing the argument-type pre-pass.
fn is_collection_operator(op: Operator) -> bool {
    matches!(
        op.category(),
        OperatorCategory::CollectionManipulation | OperatorCategory::CollectionAggregation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AstBuilder;
    use crate::lexer::Lexer;
    use crate::parser::DocumentParser;
    use crate::types::RecordSchema;

    fn person() -> Ty {
        Ty::record(Arc::new(RecordSchema::of(
            "Person",
            vec![
                ("age", Ty::Int32),
                ("name", Ty::Str),
                ("tags", Ty::sequence(Ty::Str)),
            ],
        )))
    }

    fn analyze(source: &str) -> Result<(QueryAst, Analysis), SemanticError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let doc = DocumentParser::new(tokens).parse().unwrap();
        let ast = AstBuilder::new().build(&doc, 1)?;
        let analysis = Analyzer::new().analyze(&ast, &[person()])?;
        Ok((ast, analysis))
    }

    #[test]
    fn predicate_resolves_to_bool() {
        let (ast, analysis) = analyze(r#"{"age": {"$greater": 18}}"#).unwrap();
        assert_eq!(analysis.ty(ast.root.id), Some(&Ty::Bool));
    }

    #[test]
    fn unknown_field_is_unresolved_reference() {
        let err = analyze(r#"{"height": {"$greater": 18}}"#).unwrap_err();
        assert!(matches!(
            err,
            SemanticError::UnresolvedReference { name, .. } if name == "height"
        ));
    }

    #[test]
    fn lambda_parameter_infers_element_type() {
        // The `$any` lambda sees `items` elements without any type
        // annotation in the document.
        let order = Ty::record(Arc::new(RecordSchema::of(
            "Order",
            vec![(
                "items",
                Ty::sequence(Ty::record(Arc::new(RecordSchema::of(
                    "Item",
                    vec![("price", Ty::Int32)],
                )))),
            )],
        )));
        let tokens = Lexer::new(r#"{"items": {"$any": {"price": {"$greater": 100}}}}"#)
            .tokenize()
            .unwrap();
        let doc = DocumentParser::new(tokens).parse().unwrap();
        let ast = AstBuilder::new().build(&doc, 1).unwrap();
        let analysis = Analyzer::new().analyze(&ast, &[order]).unwrap();
        assert_eq!(analysis.ty(ast.root.id), Some(&Ty::Bool));
    }

    #[test]
    fn empty_any_needs_no_lambda() {
        let (ast, analysis) = analyze(r#"{"tags": {"$any": {}}}"#).unwrap();
        assert_eq!(analysis.ty(ast.root.id), Some(&Ty::Bool));
    }

    #[test]
    fn relational_mismatch_is_rejected() {
        let err = analyze(r#"{"age": {"$greater": "old"}}"#).unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn logical_operands_must_be_boolean() {
        // $like over an integer member is an operand-type error.
        let err = analyze(r#"{"age": {"$like": "b%"}}"#).unwrap_err();
        assert!(matches!(err, SemanticError::OperandType { .. }));
    }

    #[test]
    fn analysis_is_idempotent_per_node() {
        let tokens = Lexer::new(r#"{"age": {"$greater": 18}}"#)
            .tokenize()
            .unwrap();
        let doc = DocumentParser::new(tokens).parse().unwrap();
        let ast = AstBuilder::new().build(&doc, 1).unwrap();

        let mut analyzer = Analyzer::new();
        analyzer.bind_roots(&ast.root, &[person()]).unwrap();
        analyzer.fix_lambda_types(&ast.root, 0).unwrap();
        let first = analyzer.analyze_node(&ast.root, 0).unwrap();
        let second = analyzer.analyze_node(&ast.root, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn root_arity_mismatch_fails_hard() {
        let tokens = Lexer::new(r#"{"age": 18}"#).tokenize().unwrap();
        let doc = DocumentParser::new(tokens).parse().unwrap();
        let ast = AstBuilder::new().build(&doc, 1).unwrap();
        let err = Analyzer::new()
            .analyze(&ast, &[person(), person()])
            .unwrap_err();
        assert!(matches!(err, SemanticError::RootArityMismatch { .. }));
    }
}
