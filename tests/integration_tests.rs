// tests/integration_tests.rs
//
// End-to-end: compile query documents against a record schema and run
// them over in-memory records.

use std::collections::HashMap;
use std::sync::Arc;

use sift_lang::compile::{CompileError, Compiler};
use sift_lang::provider::MemoryProvider;
use sift_lang::semantic::SemanticError;
use sift_lang::translate::Artifact;
use sift_lang::types::{RecordSchema, Ty};
use sift_lang::value::Value;

fn person_ty() -> Ty {
    Ty::record(Arc::new(RecordSchema::of(
        "Person",
        vec![
            ("age", Ty::Int32),
            ("name", Ty::Str),
            ("tags", Ty::sequence(Ty::Str)),
        ],
    )))
}

fn person(age: i64, name: &str, tags: &[&str]) -> Value {
    Value::Object(HashMap::from([
        ("age".to_string(), Value::Integer(age)),
        ("name".to_string(), Value::String(name.to_string())),
        (
            "tags".to_string(),
            Value::Array(tags.iter().map(|t| Value::String(t.to_string())).collect()),
        ),
    ]))
}

fn people() -> Vec<Value> {
    vec![
        person(17, "a", &[]),
        person(20, "b", &["admin", "staff"]),
        person(35, "c", &["staff"]),
    ]
}

fn run(query: &str) -> Value {
    let compiled = Compiler::new()
        .compile(query, &person_ty())
        .unwrap_or_else(|e| panic!("compile failed for {}: {}", query, e));
    MemoryProvider::new()
        .run(&compiled, &people())
        .unwrap_or_else(|e| panic!("run failed for {}: {}", query, e))
}

fn names(result: &Value) -> Vec<String> {
    let Value::Array(items) = result else {
        panic!("expected array result, got {:?}", result);
    };
    items
        .iter()
        .map(|item| match item {
            Value::Object(map) => match map.get("name") {
                Some(Value::String(s)) => s.clone(),
                other => panic!("bad name: {:?}", other),
            },
            Value::String(s) => s.clone(),
            other => panic!("bad record: {:?}", other),
        })
        .collect()
}

// ============================================================================
// Predicates
// ============================================================================

#[test]
fn test_simple_comparison_predicate() {
    // {"age": {"$greater": 18}} ≡ x => x.age > 18
    let result = run(r#"{"age": {"$greater": 18}}"#);
    assert_eq!(names(&result), vec!["b", "c"]);
}

#[test]
fn test_conjunction_of_predicates() {
    let result = run(r#"{"$and": [{"age": {"$greater": 18}}, {"name": {"$like": "b%"}}]}"#);
    assert_eq!(names(&result), vec!["b"]);
}

#[test]
fn test_implicit_and_of_sibling_keys() {
    let result = run(r#"{"age": {"$greater": 18}, "name": {"$like": "b%"}}"#);
    assert_eq!(names(&result), vec!["b"]);
}

#[test]
fn test_equality_shorthand() {
    let result = run(r#"{"name": "c"}"#);
    assert_eq!(names(&result), vec!["c"]);
}

#[test]
fn test_disjunction_and_negation() {
    let result = run(r#"{"$or": [{"name": "a"}, {"name": "c"}]}"#);
    assert_eq!(names(&result), vec!["a", "c"]);

    let result = run(r#"{"$not": {"name": "a"}}"#);
    assert_eq!(names(&result), vec!["b", "c"]);
}

#[test]
fn test_range_constraints_on_one_member() {
    let result = run(r#"{"age": {"$greaterorequal": 18, "$less": 30}}"#);
    assert_eq!(names(&result), vec!["b"]);
}

#[test]
fn test_regex_predicate() {
    let result = run(r#"{"name": {"$regex": "^[ab]$"}}"#);
    assert_eq!(names(&result), vec!["a", "b"]);
}

#[test]
fn test_empty_document_keeps_everything() {
    let result = run("{}");
    assert_eq!(names(&result), vec!["a", "b", "c"]);
}

// ============================================================================
// Collection operators over members
// ============================================================================

#[test]
fn test_any_infers_element_type_without_annotation() {
    // Non-empty check: lambda-free $any.
    let result = run(r#"{"tags": {"$any": {}}}"#);
    assert_eq!(names(&result), vec!["b", "c"]);
}

#[test]
fn test_contains_on_member_sequence() {
    let result = run(r#"{"tags": {"$contains": "admin"}}"#);
    assert_eq!(names(&result), vec!["b"]);
}

#[test]
fn test_count_constraint_on_member_sequence() {
    let result = run(r#"{"tags": {"$count": {"$greater": 1}}}"#);
    assert_eq!(names(&result), vec!["b"]);
}

#[test]
fn test_lambda_predicate_over_record_elements() {
    let item = Ty::record(Arc::new(RecordSchema::of(
        "Item",
        vec![("price", Ty::Int32)],
    )));
    let order_ty = Ty::record(Arc::new(RecordSchema::of(
        "Order",
        vec![("id", Ty::Int32), ("items", Ty::sequence(item))],
    )));

    let orders = vec![
        Value::Object(HashMap::from([
            ("id".to_string(), Value::Integer(1)),
            (
                "items".to_string(),
                Value::Array(vec![Value::Object(HashMap::from([(
                    "price".to_string(),
                    Value::Integer(5),
                )]))]),
            ),
        ])),
        Value::Object(HashMap::from([
            ("id".to_string(), Value::Integer(2)),
            (
                "items".to_string(),
                Value::Array(vec![Value::Object(HashMap::from([(
                    "price".to_string(),
                    Value::Integer(500),
                )]))]),
            ),
        ])),
    ];

    let compiled = Compiler::new()
        .compile(r#"{"items": {"$any": {"price": {"$greater": 100}}}}"#, &order_ty)
        .unwrap();
    let result = MemoryProvider::new().run(&compiled, &orders).unwrap();
    let Value::Array(kept) = result else {
        panic!("expected array");
    };
    assert_eq!(kept.len(), 1);
    assert!(matches!(
        kept[0],
        Value::Object(ref map) if map.get("id") == Some(&Value::Integer(2))
    ));
}

// ============================================================================
// Pipelines: projection, ordering, paging
// ============================================================================

#[test]
fn test_select_member_projection() {
    let result = run(r#"{"age": {"$greater": 18}, "$select": "name"}"#);
    assert_eq!(
        result,
        Value::Array(vec![
            Value::String("b".to_string()),
            Value::String("c".to_string())
        ])
    );
}

#[test]
fn test_select_new_projection() {
    let result = run(r#"{"$select": {"$new": {"who": "name", "years": "age"}}}"#);
    let Value::Array(items) = result else {
        panic!("expected array");
    };
    assert_eq!(items.len(), 3);
    let Value::Object(first) = &items[0] else {
        panic!("expected object");
    };
    assert_eq!(first.get("who"), Some(&Value::String("a".to_string())));
    assert_eq!(first.get("years"), Some(&Value::Integer(17)));
}

#[test]
fn test_selectmany_flattens() {
    let result = run(r#"{"$selectmany": "tags"}"#);
    assert_eq!(
        result,
        Value::Array(vec![
            Value::String("admin".to_string()),
            Value::String("staff".to_string()),
            Value::String("staff".to_string()),
        ])
    );
}

#[test]
fn test_orderby_sorts() {
    let result = run(r#"{"$orderby": "name", "$select": "age"}"#);
    assert_eq!(
        result,
        Value::Array(vec![
            Value::Integer(17),
            Value::Integer(20),
            Value::Integer(35)
        ])
    );

    let result = run(r#"{"$orderbydescending": "age", "$select": "name"}"#);
    assert_eq!(
        result,
        Value::Array(vec![
            Value::String("c".to_string()),
            Value::String("b".to_string()),
            Value::String("a".to_string())
        ])
    );
}

#[test]
fn test_page_is_decoded_and_applied() {
    let compiled = Compiler::new()
        .compile(r#"{"$limit": 1, "$skip": 1}"#, &person_ty())
        .unwrap();
    assert_eq!(compiled.page.limit, Some(1));
    assert_eq!(compiled.page.offset, Some(1));
    assert!(matches!(compiled.artifact, Artifact::Predicate(_)));

    let result = MemoryProvider::new().run(&compiled, &people()).unwrap();
    assert_eq!(names(&result), vec!["b"]);
}

#[test]
fn test_page_inside_pipeline() {
    let result = run(r#"{"$orderbydescending": "age", "$select": "name", "$limit": 2}"#);
    assert_eq!(
        result,
        Value::Array(vec![
            Value::String("c".to_string()),
            Value::String("b".to_string())
        ])
    );
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_top_level_aggregates() {
    assert_eq!(run(r#"{"$count": {}}"#), Value::Integer(3));
    assert_eq!(
        run(r#"{"$count": {"age": {"$greater": 18}}}"#),
        Value::Integer(2)
    );
    assert_eq!(run(r#"{"$sum": "age"}"#), Value::Integer(72));
    assert_eq!(run(r#"{"$min": "age"}"#), Value::Integer(17));
    assert_eq!(run(r#"{"$max": "name"}"#), Value::String("c".to_string()));
    assert_eq!(run(r#"{"$average": "age"}"#), Value::Float(24.0));
}

#[test]
fn test_aggregate_wrapper() {
    let compiled = Compiler::new()
        .compile(r#"{"$aggregate": {"$sum": "age"}}"#, &person_ty())
        .unwrap();
    assert!(matches!(compiled.artifact, Artifact::Aggregate(_)));
    let result = MemoryProvider::new().run(&compiled, &people()).unwrap();
    assert_eq!(result, Value::Integer(72));
}

#[test]
fn test_filtered_aggregate() {
    assert_eq!(
        run(r#"{"age": {"$greater": 18}, "$count": {}}"#),
        Value::Integer(2)
    );
}

// ============================================================================
// Artifact shapes and error taxonomy
// ============================================================================

#[test]
fn test_predicate_artifact_for_predicate_documents() {
    let compiled = Compiler::new()
        .compile(r#"{"age": {"$greater": 18}}"#, &person_ty())
        .unwrap();
    assert!(matches!(compiled.artifact, Artifact::Predicate(_)));

    let compiled = Compiler::new()
        .compile(r#"{"$select": "name"}"#, &person_ty())
        .unwrap();
    assert!(matches!(compiled.artifact, Artifact::Pipeline(_)));
}

#[test]
fn test_unknown_field_error_names_field_and_position() {
    let err = Compiler::new()
        .compile(r#"{"height": 10}"#, &person_ty())
        .unwrap_err();
    let CompileError::Semantic(SemanticError::UnresolvedReference { name, span }) = err else {
        panic!("expected unresolved reference, got {:?}", err);
    };
    assert_eq!(name, "height");
    assert_eq!(span.start.column, 2);
}

#[test]
fn test_stage_tagged_errors() {
    let compiler = Compiler::new();
    let root = person_ty();

    assert!(matches!(
        compiler.compile(r#"{"age": 1e}"#, &root),
        Err(CompileError::Lex(_))
    ));
    assert!(matches!(
        compiler.compile(r#"{"age" 1}"#, &root),
        Err(CompileError::Syntax(_))
    ));
    assert!(matches!(
        compiler.compile(r#"{"age": "x"}"#, &root),
        Err(CompileError::Semantic(_))
    ));
    assert!(matches!(
        compiler.compile(r#"{"name": {"$regex": "["}}"#, &root),
        Err(CompileError::Translate(_))
    ));
}

#[test]
fn test_compiled_queries_are_shareable() {
    let compiled = Compiler::new()
        .compile(r#"{"age": {"$greater": 18}}"#, &person_ty())
        .unwrap();
    let shared = Arc::new(compiled);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let query = shared.clone();
            std::thread::spawn(move || {
                let result = MemoryProvider::new().run(&query, &people()).unwrap();
                names(&result)
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["b", "c"]);
    }
}

// ============================================================================
// CLI
// ============================================================================

#[cfg(feature = "cli")]
mod cli {
    use sift_lang::cli::{execute_check, CheckOptions, CheckResult};

    #[test]
    fn test_check_compiles_and_runs() {
        let options = CheckOptions {
            query: r#"{"age": {"$greater": 18}}"#.to_string(),
            input: Some(r#"[{"age": 17, "name": "a"}, {"age": 20, "name": "b"}]"#.to_string()),
            pretty: false,
            syntax_only: false,
        };
        let CheckResult::Success(output) = execute_check(&options).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(output, serde_json::json!([{"age": 20, "name": "b"}]));
    }

    #[test]
    fn test_check_syntax_only() {
        let options = CheckOptions {
            query: r#"{"age": {"$greater": 18}}"#.to_string(),
            input: None,
            pretty: false,
            syntax_only: true,
        };
        assert!(matches!(
            execute_check(&options).unwrap(),
            CheckResult::SyntaxValid
        ));
    }

    #[test]
    fn test_check_rejects_scalar_input() {
        let options = CheckOptions {
            query: "{}".to_string(),
            input: Some("42".to_string()),
            pretty: false,
            syntax_only: false,
        };
        assert!(execute_check(&options).is_err());
    }
}
