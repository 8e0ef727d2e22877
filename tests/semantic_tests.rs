// tests/semantic_tests.rs

use std::sync::Arc;

use sift_lang::compile::{CompileError, Compiler};
use sift_lang::semantic::SemanticError;
use sift_lang::types::{RecordSchema, Ty};

fn person() -> Ty {
    Ty::record(Arc::new(RecordSchema::of(
        "Person",
        vec![
            ("age", Ty::Int32),
            ("name", Ty::Str),
            ("score", Ty::Float64),
            ("nickname", Ty::optional(Ty::Str)),
            ("tags", Ty::sequence(Ty::Str)),
        ],
    )))
}

fn order() -> Ty {
    let item = Ty::record(Arc::new(RecordSchema::of(
        "Item",
        vec![("price", Ty::Int32), ("label", Ty::Str)],
    )));
    Ty::record(Arc::new(RecordSchema::of(
        "Order",
        vec![("total", Ty::Int32), ("items", Ty::sequence(item))],
    )))
}

fn compile(source: &str, root: &Ty) -> Result<sift_lang::CompiledQuery, CompileError> {
    Compiler::new().compile(source, root)
}

fn semantic_err(source: &str, root: &Ty) -> SemanticError {
    match compile(source, root) {
        Err(CompileError::Semantic(err)) => err,
        other => panic!("expected semantic error, got {:?}", other.err()),
    }
}

// ============================================================================
// Reference Resolution
// ============================================================================

#[test]
fn test_unknown_field_is_unresolved_reference() {
    let err = semantic_err(r#"{"height": {"$greater": 18}}"#, &person());
    let SemanticError::UnresolvedReference { name, span } = err else {
        panic!("expected unresolved reference, got {}", err);
    };
    assert_eq!(name, "height");
    assert_eq!(span.start.line, 1);
    assert_eq!(span.start.column, 2);
}

#[test]
fn test_member_lookup_is_case_insensitive() {
    assert!(compile(r#"{"AGE": {"$greater": 18}}"#, &person()).is_ok());
    assert!(compile(r#"{"Name": "b"}"#, &person()).is_ok());
}

#[test]
fn test_ambiguous_member_is_rejected() {
    let clashing = Ty::record(Arc::new(RecordSchema::of(
        "Odd",
        vec![("value", Ty::Int32), ("Value", Ty::Str)],
    )));
    let err = semantic_err(r#"{"VALUE": 1}"#, &clashing);
    assert!(matches!(err, SemanticError::AmbiguousMember { name, .. } if name == "VALUE"));
}

#[test]
fn test_nested_member_descent() {
    let nested = Ty::record(Arc::new(RecordSchema::of(
        "User",
        vec![(
            "address",
            Ty::record(Arc::new(RecordSchema::of(
                "Address",
                vec![("city", Ty::Str)],
            ))),
        )],
    )));
    assert!(compile(r#"{"address": {"city": "here"}}"#, &nested).is_ok());

    let err = semantic_err(r#"{"address": {"street": "x"}}"#, &nested);
    assert!(matches!(err, SemanticError::UnresolvedReference { name, .. } if name == "street"));
}

// ============================================================================
// Operand Type Checks
// ============================================================================

#[test]
fn test_relational_operands_must_match() {
    let err = semantic_err(r#"{"age": {"$greater": "old"}}"#, &person());
    assert!(matches!(err, SemanticError::TypeMismatch { .. }));
}

#[test]
fn test_relational_numeric_widths_are_compatible() {
    // int32 member against a float literal: numeric family matches.
    assert!(compile(r#"{"age": {"$less": 21.5}}"#, &person()).is_ok());
    // float64 member against an integer literal.
    assert!(compile(r#"{"score": {"$greater": 1}}"#, &person()).is_ok());
}

#[test]
fn test_nullable_members_unwrap_for_comparison() {
    assert!(compile(r#"{"nickname": "ace"}"#, &person()).is_ok());
    assert!(compile(r#"{"nickname": null}"#, &person()).is_ok());
}

#[test]
fn test_string_relational_requires_strings() {
    let err = semantic_err(r#"{"age": {"$like": "1%"}}"#, &person());
    assert!(matches!(err, SemanticError::OperandType { .. }));

    assert!(compile(r#"{"name": {"$like": "b%"}}"#, &person()).is_ok());
    assert!(compile(r#"{"name": {"$regex": "^b"}}"#, &person()).is_ok());
}

#[test]
fn test_collection_source_must_be_queryable() {
    let err = semantic_err(r#"{"age": {"$any": {}}}"#, &person());
    assert!(matches!(err, SemanticError::NotQueryable { .. }));
}

// ============================================================================
// Lambda Typing
// ============================================================================

#[test]
fn test_lambda_element_type_is_inferred() {
    // `$any`'s lambda parameter is typed as Item without any
    // annotation in the document; its fields resolve.
    assert!(compile(r#"{"items": {"$any": {"price": {"$greater": 100}}}}"#, &order()).is_ok());

    // Wrong field inside the lambda is still caught.
    let err = semantic_err(r#"{"items": {"$any": {"cost": 1}}}"#, &order());
    assert!(matches!(err, SemanticError::UnresolvedReference { name, .. } if name == "cost"));
}

#[test]
fn test_root_arity_mismatch() {
    let err = Compiler::new()
        .compile_multi(r#"{"age": 18}"#, &[person(), person()])
        .unwrap_err();
    assert!(matches!(
        err,
        CompileError::Semantic(SemanticError::RootArityMismatch {
            params: 1,
            supplied: 2
        })
    ));
}

// ============================================================================
// Operators and Literals
// ============================================================================

#[test]
fn test_unknown_operator() {
    let err = semantic_err(r#"{"age": {"$bogus": 1}}"#, &person());
    assert!(matches!(err, SemanticError::UnknownOperator { key, .. } if key == "$bogus"));
}

#[test]
fn test_operator_keys_are_case_insensitive() {
    assert!(compile(r#"{"age": {"$GREATER": 18}}"#, &person()).is_ok());
    assert!(compile(r#"{"$AND": [{"age": 18}]}"#, &person()).is_ok());
}

#[test]
fn test_aggregate_constraints_compare_numbers() {
    assert!(compile(r#"{"items": {"$count": {"$greater": 1}}}"#, &order()).is_ok());
    assert!(compile(r#"{"tags": {"$count": {"$equals": 2}}}"#, &person()).is_ok());

    let err = semantic_err(r#"{"items": {"$count": {"$greater": "two"}}}"#, &order());
    assert!(matches!(err, SemanticError::TypeMismatch { .. }));
}

#[test]
fn test_logical_operands_are_predicates() {
    assert!(compile(
        r#"{"$or": [{"age": {"$less": 13}}, {"age": {"$greater": 64}}]}"#,
        &person()
    )
    .is_ok());
    assert!(compile(r#"{"$not": {"name": "b"}}"#, &person()).is_ok());

    // $and wants predicate objects, not bare numbers.
    let err = semantic_err(r#"{"$and": [1, 2]}"#, &person());
    assert!(matches!(err, SemanticError::InvalidOperand { .. }));
}

#[test]
fn test_oversized_integer_literal_is_malformed() {
    // 40 digits exceed even the wide literal range.
    let wide = "9".repeat(40);
    let err = semantic_err(&format!(r#"{{"age": {{"$greater": {}}}}}"#, wide), &person());
    assert!(matches!(err, SemanticError::MalformedLiteral { .. }));
}
