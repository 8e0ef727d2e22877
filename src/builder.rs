//! AST construction.
//!
//! Rewrites the raw document tree into typed operator nodes against
//! the closed operator table. The implicit-and sugar lives here: a
//! bare key is field shorthand (`{"age": 18}` means
//! `{"age": {"$equals": 18}}`), sibling keys conjoin, and the rewrite
//! runs exactly once, on input syntax, so it can never re-trigger on
//! its own output. Operator arity is checked during construction, not
//! deferred to later stages.

use crate::ast::nodes::{DocNode, DocPair, DocValue, Literal, NodeId, Page, QueryAst, QueryExpr, QueryNode};
use crate::ast::operators::{Operator, OperatorCategory};
use crate::ast::tokens::Span;
use crate::semantic::SemanticError;

/// Symbol the pipeline chain hangs off: the root queryable collection.
pub const ROOT_SOURCE: &str = "source";

/// Whether a top-level key starts the pipeline chain rather than the
/// implicit filter predicate.
fn is_pipeline_operator(op: Operator) -> bool {
    matches!(
        op.category(),
        OperatorCategory::CollectionManipulation | OperatorCategory::CollectionAggregation
    ) || op == Operator::Aggregate
}

/// Builds the typed AST from a parsed document.
///
/// Owns the node-id counter, so every node of one compilation gets a
/// unique identity, and the parameter-name counter, so nested lambdas
/// never shadow each other.
#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: NodeId,
    next_param: usize,
}

impl AstBuilder {
    pub fn new() -> Self {
        AstBuilder::default()
    }

    fn node(&mut self, span: Span, expr: QueryExpr) -> QueryNode {
        let id = self.next_id;
        self.next_id += 1;
        QueryNode { id, span, expr }
    }

    /// Operator application with its arity checked on the spot.
    fn operation(
        &mut self,
        span: Span,
        op: Operator,
        operands: Vec<QueryNode>,
    ) -> Result<QueryNode, SemanticError> {
        if !op.arity().accepts(operands.len()) {
            return Err(SemanticError::OperatorArity {
                op,
                found: operands.len(),
                span,
            });
        }
        Ok(self.node(span, QueryExpr::Operation { op, operands }))
    }

    fn fresh_param(&mut self) -> String {
        let index = self.next_param;
        self.next_param += 1;
        if index == 0 {
            "it".to_string()
        } else {
            format!("it{}", index)
        }
    }

    /// Lower a document into a single expression tree plus decoded
    /// pagination.
    ///
    /// `root_params` is the number of root element types the caller
    /// will bind; the semantic analyzer verifies the match.
    pub fn build(&mut self, doc: &DocNode, root_params: usize) -> Result<QueryAst, SemanticError> {
        let DocValue::Object(pairs) = &doc.value else {
            return Err(SemanticError::InvalidDocument {
                found: doc.value.shape().to_string(),
                span: doc.span,
            });
        };

        let mut page = Page::default();
        let mut predicate_pairs: Vec<&DocPair> = Vec::new();
        let mut pipeline_pairs: Vec<(Operator, &DocPair)> = Vec::new();

        for pair in pairs {
            match Operator::from_key(&pair.key) {
                Some(op) if is_pipeline_operator(op) => {
                    if matches!(op, Operator::Limit | Operator::Skip) {
                        self.decode_page(op, pair, &mut page)?;
                    }
                    pipeline_pairs.push((op, pair));
                }
                Some(_) | None => predicate_pairs.push(pair),
            }
        }

        // $limit/$skip alone don't force a pipeline artifact; they are
        // fully decoded into the page.
        let has_chain = pipeline_pairs
            .iter()
            .any(|(op, _)| !matches!(op, Operator::Limit | Operator::Skip));

        if !has_chain {
            // Predicate-only document: the artifact is a lambda over
            // the root element type(s).
            let params: Vec<String> = (0..root_params.max(1))
                .map(|_| self.fresh_param())
                .collect();
            let body = self.build_predicate_pairs(&predicate_pairs, doc.span, &params[0])?;
            let root = self.node(
                doc.span,
                QueryExpr::Lambda {
                    params,
                    body: Box::new(body),
                },
            );
            return Ok(QueryAst { root, page });
        }

        // Pipeline document: chain operations over the root source,
        // implicit filter first, then operators in document order.
        let mut source = self.node(doc.span, QueryExpr::Reference(ROOT_SOURCE.to_string()));
        if !predicate_pairs.is_empty() {
            let param = self.fresh_param();
            let body = self.build_predicate_pairs(&predicate_pairs, doc.span, &param)?;
            let lambda = self.node(
                body.span,
                QueryExpr::Lambda {
                    params: vec![param],
                    body: Box::new(body),
                },
            );
            source = self.operation(doc.span, Operator::Filter, vec![source, lambda])?;
        }

        for (op, pair) in pipeline_pairs {
            source = self.apply_pipeline_operator(op, pair, source)?;
        }

        Ok(QueryAst { root: source, page })
    }

    fn decode_page(
        &mut self,
        op: Operator,
        pair: &DocPair,
        page: &mut Page,
    ) -> Result<(), SemanticError> {
        let DocValue::Integer { raw } = &pair.value.value else {
            return Err(SemanticError::InvalidOperand {
                context: op.key().to_string(),
                expected: "a non-negative integer".to_string(),
                found: pair.value.value.shape().to_string(),
                span: pair.value.span,
            });
        };
        let value: u64 = raw.parse().map_err(|_| SemanticError::InvalidOperand {
            context: op.key().to_string(),
            expected: "a non-negative integer".to_string(),
            found: format!("'{}'", raw),
            span: pair.value.span,
        })?;
        match op {
            Operator::Limit => page.limit = Some(value),
            Operator::Skip => page.offset = Some(value),
            _ => {}
        }
        Ok(())
    }

    fn apply_pipeline_operator(
        &mut self,
        op: Operator,
        pair: &DocPair,
        source: QueryNode,
    ) -> Result<QueryNode, SemanticError> {
        let rhs = &pair.value;
        let span = source.span.merge(rhs.span);
        match op {
            Operator::Filter => {
                let DocValue::Object(pairs) = &rhs.value else {
                    return Err(self.expected(op, "a predicate object", rhs));
                };
                let param = self.fresh_param();
                let refs: Vec<&DocPair> = pairs.iter().collect();
                let body = self.build_predicate_pairs(&refs, rhs.span, &param)?;
                let lambda = self.lambda(param, body);
                self.operation(span, op, vec![source, lambda])
            }
            Operator::Select | Operator::SelectMany | Operator::OrderBy
            | Operator::OrderByDescending => {
                let lambda = self.build_selector_lambda(rhs, op)?;
                self.operation(span, op, vec![source, lambda])
            }
            Operator::Limit | Operator::Skip => {
                // Already decoded into the page; the chain op form is
                // emitted so pipeline artifacts carry it themselves.
                let literal = self.literal(rhs)?;
                self.operation(span, op, vec![source, literal])
            }
            Operator::Aggregate => {
                let DocValue::Object(pairs) = &rhs.value else {
                    return Err(self.expected(op, "an aggregation object", rhs));
                };
                let [inner_pair] = pairs.as_slice() else {
                    return Err(self.expected(op, "exactly one aggregation operator", rhs));
                };
                let inner_op = match Operator::from_key(&inner_pair.key) {
                    Some(inner_op)
                        if inner_op.category() == OperatorCategory::CollectionAggregation =>
                    {
                        inner_op
                    }
                    _ => {
                        return Err(SemanticError::UnknownOperator {
                            key: inner_pair.key.clone(),
                            span: inner_pair.key_span,
                        });
                    }
                };
                let applied =
                    self.build_source_aggregation(inner_op, &inner_pair.value, source)?;
                self.operation(span, op, vec![applied])
            }
            _ => self.build_source_aggregation(op, rhs, source),
        }
    }

    /// Aggregation over a queryable source expression (the root chain
    /// or a member).
    fn build_source_aggregation(
        &mut self,
        op: Operator,
        rhs: &DocNode,
        source: QueryNode,
    ) -> Result<QueryNode, SemanticError> {
        let span = source.span.merge(rhs.span);
        match op {
            Operator::Count | Operator::Any | Operator::All => match &rhs.value {
                DocValue::Object(pairs) if pairs.is_empty() => {
                    self.operation(span, op, vec![source])
                }
                DocValue::Object(pairs) => {
                    let param = self.fresh_param();
                    let refs: Vec<&DocPair> = pairs.iter().collect();
                    let body = self.build_predicate_pairs(&refs, rhs.span, &param)?;
                    let lambda = self.lambda(param, body);
                    self.operation(span, op, vec![source, lambda])
                }
                _ => Err(self.expected(op, "a predicate object", rhs)),
            },
            Operator::Min | Operator::Max | Operator::Sum | Operator::Average => {
                match &rhs.value {
                    DocValue::Object(pairs) if pairs.is_empty() => {
                        self.operation(span, op, vec![source])
                    }
                    DocValue::String(_) | DocValue::Object(_) => {
                        let lambda = self.build_selector_lambda(rhs, op)?;
                        self.operation(span, op, vec![source, lambda])
                    }
                    _ => Err(self.expected(op, "a selector or empty object", rhs)),
                }
            }
            Operator::Contains => {
                let value = self.build_value_expr(rhs)?;
                self.operation(span, op, vec![source, value])
            }
            Operator::Index => match &rhs.value {
                DocValue::Integer { .. } => {
                    let literal = self.literal(rhs)?;
                    self.operation(span, op, vec![source, literal])
                }
                _ => Err(self.expected(op, "an integer index", rhs)),
            },
            _ => Err(self.expected(op, "an aggregation operator", rhs)),
        }
    }

    fn build_predicate_pairs(
        &mut self,
        pairs: &[&DocPair],
        span: Span,
        param: &str,
    ) -> Result<QueryNode, SemanticError> {
        let mut terms = Vec::new();
        for pair in pairs {
            terms.push(self.build_predicate_pair(pair, param)?);
        }
        Ok(self.conjoin(terms, span))
    }

    /// Fold sibling constraints into a single conjunction; an empty
    /// pair list is the always-true predicate, not an error.
    fn conjoin(&mut self, mut terms: Vec<QueryNode>, span: Span) -> QueryNode {
        match terms.len() {
            0 => self.node(span, QueryExpr::Literal(Literal::Bool(true))),
            1 => terms.remove(0),
            _ => self.node(
                span,
                QueryExpr::Operation {
                    op: Operator::And,
                    operands: terms,
                },
            ),
        }
    }

    fn build_predicate_pair(
        &mut self,
        pair: &DocPair,
        param: &str,
    ) -> Result<QueryNode, SemanticError> {
        match Operator::from_key(&pair.key) {
            Some(op @ (Operator::And | Operator::Or)) => {
                let operands = self.build_predicate_operands(op, &pair.value, param)?;
                let span = pair.key_span.merge(pair.value.span);
                Ok(self.conjoin_with(op, operands, span))
            }
            Some(Operator::Not) => {
                let DocValue::Object(inner) = &pair.value.value else {
                    return Err(self.expected(Operator::Not, "a predicate object", &pair.value));
                };
                let refs: Vec<&DocPair> = inner.iter().collect();
                let body = self.build_predicate_pairs(&refs, pair.value.span, param)?;
                self.operation(
                    pair.key_span.merge(pair.value.span),
                    Operator::Not,
                    vec![body],
                )
            }
            Some(op) => Err(SemanticError::InvalidOperand {
                context: op.key().to_string(),
                expected: "a field context".to_string(),
                found: "top-level predicate position".to_string(),
                span: pair.key_span,
            }),
            None if Operator::is_operator_key(&pair.key) => Err(SemanticError::UnknownOperator {
                key: pair.key.clone(),
                span: pair.key_span,
            }),
            None => {
                let target = self.node(pair.key_span, QueryExpr::Reference(param.to_string()));
                let member = self.node(
                    pair.key_span,
                    QueryExpr::MemberAccess {
                        target: Box::new(target),
                        name: pair.key.clone(),
                    },
                );
                self.build_member_constraints(member, &pair.value, param)
            }
        }
    }

    /// `$and`/`$or` take an array of predicate objects; a single
    /// object is accepted as a one-branch spelling.
    fn build_predicate_operands(
        &mut self,
        op: Operator,
        rhs: &DocNode,
        param: &str,
    ) -> Result<Vec<QueryNode>, SemanticError> {
        match &rhs.value {
            DocValue::Array(items) => {
                let mut operands = Vec::new();
                for item in items {
                    let DocValue::Object(pairs) = &item.value else {
                        return Err(self.expected(op, "predicate objects", item));
                    };
                    let refs: Vec<&DocPair> = pairs.iter().collect();
                    operands.push(self.build_predicate_pairs(&refs, item.span, param)?);
                }
                Ok(operands)
            }
            DocValue::Object(pairs) => {
                let refs: Vec<&DocPair> = pairs.iter().collect();
                Ok(vec![self.build_predicate_pairs(&refs, rhs.span, param)?])
            }
            _ => Err(self.expected(op, "an array of predicate objects", rhs)),
        }
    }

    /// Wrap operands in the logical operator unless a single branch
    /// collapsed already.
    fn conjoin_with(&mut self, op: Operator, mut operands: Vec<QueryNode>, span: Span) -> QueryNode {
        match operands.len() {
            0 => self.node(span, QueryExpr::Literal(Literal::Bool(true))),
            1 => operands.remove(0),
            _ => self.node(span, QueryExpr::Operation { op, operands }),
        }
    }

    /// Constraints applied to one member: literal shorthand, operator
    /// objects, or nested field descent.
    fn build_member_constraints(
        &mut self,
        member: QueryNode,
        rhs: &DocNode,
        param: &str,
    ) -> Result<QueryNode, SemanticError> {
        match &rhs.value {
            DocValue::Object(pairs) => {
                let mut terms = Vec::new();
                for pair in pairs {
                    match Operator::from_key(&pair.key) {
                        Some(op) => {
                            terms.push(self.build_member_operator(member.clone(), op, pair, param)?);
                        }
                        None if Operator::is_operator_key(&pair.key) => {
                            return Err(SemanticError::UnknownOperator {
                                key: pair.key.clone(),
                                span: pair.key_span,
                            });
                        }
                        None => {
                            let nested = self.node(
                                pair.key_span,
                                QueryExpr::MemberAccess {
                                    target: Box::new(member.clone()),
                                    name: pair.key.clone(),
                                },
                            );
                            terms.push(self.build_member_constraints(nested, &pair.value, param)?);
                        }
                    }
                }
                Ok(self.conjoin(terms, rhs.span))
            }
            DocValue::Array(_) => Err(SemanticError::InvalidOperand {
                context: "field shorthand".to_string(),
                expected: "a literal or constraint object".to_string(),
                found: "array".to_string(),
                span: rhs.span,
            }),
            _ => {
                // Bare literal: the equality shorthand.
                let literal = self.literal(rhs)?;
                let span = member.span.merge(rhs.span);
                self.operation(span, Operator::Equals, vec![member, literal])
            }
        }
    }

    fn build_member_operator(
        &mut self,
        member: QueryNode,
        op: Operator,
        pair: &DocPair,
        param: &str,
    ) -> Result<QueryNode, SemanticError> {
        let rhs = &pair.value;
        let span = member.span.merge(rhs.span);
        match op.category() {
            OperatorCategory::Relational | OperatorCategory::StringRelational => {
                let value = self.build_value_expr(rhs)?;
                self.operation(span, op, vec![member, value])
            }
            OperatorCategory::Logical => match op {
                Operator::Not => {
                    let DocValue::Object(_) = &rhs.value else {
                        return Err(self.expected(op, "a constraint object", rhs));
                    };
                    let inner = self.build_member_constraints(member, rhs, param)?;
                    self.operation(span, op, vec![inner])
                }
                _ => {
                    let operands = match &rhs.value {
                        DocValue::Array(items) => {
                            let mut built = Vec::new();
                            for item in items {
                                built.push(self.build_member_constraints(
                                    member.clone(),
                                    item,
                                    param,
                                )?);
                            }
                            built
                        }
                        DocValue::Object(_) => {
                            vec![self.build_member_constraints(member, rhs, param)?]
                        }
                        _ => return Err(self.expected(op, "constraint objects", rhs)),
                    };
                    Ok(self.conjoin_with(op, operands, span))
                }
            },
            OperatorCategory::CollectionAggregation => {
                self.build_member_aggregation(member, op, rhs, span)
            }
            OperatorCategory::Arithmetic => Err(SemanticError::InvalidOperand {
                context: op.key().to_string(),
                expected: "a value position".to_string(),
                found: "constraint position".to_string(),
                span: pair.key_span,
            }),
            OperatorCategory::Semantic | OperatorCategory::CollectionManipulation => {
                Err(SemanticError::InvalidOperand {
                    context: op.key().to_string(),
                    expected: "the document top level".to_string(),
                    found: "field constraint position".to_string(),
                    span: pair.key_span,
                })
            }
        }
    }

    /// Aggregations used as field constraints. Boolean aggregates
    /// (`$any`/`$all`) stand alone; value aggregates must be compared
    /// against something to become a predicate.
    fn build_member_aggregation(
        &mut self,
        member: QueryNode,
        op: Operator,
        rhs: &DocNode,
        span: Span,
    ) -> Result<QueryNode, SemanticError> {
        match op {
            Operator::Any | Operator::All => match &rhs.value {
                DocValue::Object(pairs) if pairs.is_empty() => {
                    self.operation(span, op, vec![member])
                }
                DocValue::Object(pairs) => {
                    let param = self.fresh_param();
                    let refs: Vec<&DocPair> = pairs.iter().collect();
                    let body = self.build_predicate_pairs(&refs, rhs.span, &param)?;
                    let lambda = self.lambda(param, body);
                    self.operation(span, op, vec![member, lambda])
                }
                _ => Err(self.expected(op, "a predicate object", rhs)),
            },
            Operator::Contains => {
                let value = self.build_value_expr(rhs)?;
                self.operation(span, op, vec![member, value])
            }
            Operator::Count
            | Operator::Min
            | Operator::Max
            | Operator::Sum
            | Operator::Average => {
                let DocValue::Object(pairs) = &rhs.value else {
                    return Err(self.expected(op, "a comparison object", rhs));
                };
                if pairs.is_empty() {
                    return Err(self.expected(op, "at least one comparison", rhs));
                }
                let aggregate = self.operation(member.span, op, vec![member])?;
                let mut terms = Vec::new();
                for pair in pairs {
                    let relational = match Operator::from_key(&pair.key) {
                        Some(rel) if rel.category() == OperatorCategory::Relational => rel,
                        Some(other) => {
                            return Err(SemanticError::InvalidOperand {
                                context: other.key().to_string(),
                                expected: "a relational operator".to_string(),
                                found: format!("{:?}", other.category()),
                                span: pair.key_span,
                            });
                        }
                        None => {
                            return Err(SemanticError::UnknownOperator {
                                key: pair.key.clone(),
                                span: pair.key_span,
                            });
                        }
                    };
                    let value = self.build_value_expr(&pair.value)?;
                    let term_span = pair.key_span.merge(pair.value.span);
                    terms.push(self.operation(
                        term_span,
                        relational,
                        vec![aggregate.clone(), value],
                    )?);
                }
                Ok(self.conjoin(terms, rhs.span))
            }
            Operator::Index => Err(SemanticError::InvalidOperand {
                context: op.key().to_string(),
                expected: "a value position".to_string(),
                found: "constraint position".to_string(),
                span: rhs.span,
            }),
            _ => Err(self.expected(op, "an aggregation", rhs)),
        }
    }

    /// Value-position expressions: literals and arithmetic over them.
    /// Strings are string literals here, never member references.
    fn build_value_expr(&mut self, doc: &DocNode) -> Result<QueryNode, SemanticError> {
        match &doc.value {
            DocValue::Object(pairs) => {
                let [pair] = pairs.as_slice() else {
                    return Err(SemanticError::InvalidOperand {
                        context: "value expression".to_string(),
                        expected: "a literal or a single arithmetic operator".to_string(),
                        found: "object".to_string(),
                        span: doc.span,
                    });
                };
                let op = match Operator::from_key(&pair.key) {
                    Some(op) if op.category() == OperatorCategory::Arithmetic => op,
                    _ => {
                        return Err(SemanticError::InvalidOperand {
                            context: "value expression".to_string(),
                            expected: "an arithmetic operator".to_string(),
                            found: format!("'{}'", pair.key),
                            span: pair.key_span,
                        });
                    }
                };
                let operands = self.build_binary_operands(op, &pair.value, Self::build_value_expr)?;
                self.operation(pair.key_span.merge(pair.value.span), op, operands)
            }
            DocValue::Array(_) => Err(SemanticError::InvalidOperand {
                context: "value expression".to_string(),
                expected: "a literal".to_string(),
                found: "array".to_string(),
                span: doc.span,
            }),
            _ => self.literal(doc),
        }
    }

    /// Selector lambdas for `$select`/`$orderby`/aggregate selectors:
    /// a fresh element parameter, strings naming members off it.
    fn build_selector_lambda(
        &mut self,
        rhs: &DocNode,
        op: Operator,
    ) -> Result<QueryNode, SemanticError> {
        let param = self.fresh_param();
        let body = self.build_selector_expr(rhs, &param, op)?;
        Ok(self.lambda(param, body))
    }

    fn build_selector_expr(
        &mut self,
        doc: &DocNode,
        param: &str,
        op: Operator,
    ) -> Result<QueryNode, SemanticError> {
        match &doc.value {
            DocValue::String(name) => {
                let target = self.node(doc.span, QueryExpr::Reference(param.to_string()));
                Ok(self.node(
                    doc.span,
                    QueryExpr::MemberAccess {
                        target: Box::new(target),
                        name: name.clone(),
                    },
                ))
            }
            DocValue::Object(pairs) => {
                // `{"$new": {...}}` and its bare-object shorthand
                // build structural projections; a single arithmetic
                // operator builds a computed selector.
                if let [pair] = pairs.as_slice()
                    && let Some(inner) = Operator::from_key(&pair.key)
                {
                    return match inner.category() {
                        OperatorCategory::Arithmetic => {
                            let operands = self.build_binary_operands(
                                inner,
                                &pair.value,
                                |builder, node| builder.build_selector_expr(node, param, op),
                            )?;
                            self.operation(pair.key_span.merge(pair.value.span), inner, operands)
                        }
                        OperatorCategory::Semantic if inner == Operator::New => {
                            self.build_construct(&pair.value, param)
                        }
                        _ => Err(self.expected(op, "a member name, $new, or arithmetic", doc)),
                    };
                }
                self.build_construct(doc, param)
            }
            DocValue::Integer { .. } | DocValue::Float { .. } | DocValue::Bool(_)
            | DocValue::Null => self.literal(doc),
            DocValue::Array(_) => Err(self.expected(op, "a member name or projection", doc)),
        }
    }

    fn build_construct(&mut self, doc: &DocNode, param: &str) -> Result<QueryNode, SemanticError> {
        let DocValue::Object(pairs) = &doc.value else {
            return Err(self.expected(Operator::New, "a projection object", doc));
        };
        let mut fields = Vec::new();
        for pair in pairs {
            if Operator::is_operator_key(&pair.key) {
                return Err(SemanticError::InvalidOperand {
                    context: Operator::New.key().to_string(),
                    expected: "field names".to_string(),
                    found: format!("'{}'", pair.key),
                    span: pair.key_span,
                });
            }
            let value = self.build_selector_expr(&pair.value, param, Operator::New)?;
            fields.push((pair.key.clone(), value));
        }
        Ok(self.node(doc.span, QueryExpr::Construct { fields }))
    }

    /// Binary operand lists: `{"$add": [a, b]}`.
    fn build_binary_operands(
        &mut self,
        op: Operator,
        rhs: &DocNode,
        mut build: impl FnMut(&mut Self, &DocNode) -> Result<QueryNode, SemanticError>,
    ) -> Result<Vec<QueryNode>, SemanticError> {
        let DocValue::Array(items) = &rhs.value else {
            return Err(self.expected(op, "an array of two operands", rhs));
        };
        if items.len() != 2 {
            return Err(SemanticError::OperatorArity {
                op,
                found: items.len(),
                span: rhs.span,
            });
        }
        let mut operands = Vec::new();
        for item in items {
            operands.push(build(self, item)?);
        }
        Ok(operands)
    }

    fn lambda(&mut self, param: String, body: QueryNode) -> QueryNode {
        let span = body.span;
        self.node(
            span,
            QueryExpr::Lambda {
                params: vec![param],
                body: Box::new(body),
            },
        )
    }

    fn literal(&mut self, doc: &DocNode) -> Result<QueryNode, SemanticError> {
        let literal = match &doc.value {
            DocValue::String(s) => Literal::String(s.clone()),
            DocValue::Integer { raw } => Literal::Integer { raw: raw.clone() },
            DocValue::Float { raw } => Literal::Float { raw: raw.clone() },
            DocValue::Bool(b) => Literal::Bool(*b),
            DocValue::Null => Literal::Null,
            other => {
                return Err(SemanticError::InvalidOperand {
                    context: "literal".to_string(),
                    expected: "a scalar value".to_string(),
                    found: other.shape().to_string(),
                    span: doc.span,
                });
            }
        };
        Ok(self.node(doc.span, QueryExpr::Literal(literal)))
    }

    fn expected(&self, op: Operator, expected: &str, found: &DocNode) -> SemanticError {
        SemanticError::InvalidOperand {
            context: op.key().to_string(),
            expected: expected.to_string(),
            found: found.value.shape().to_string(),
            span: found.span,
        }
    }
}
