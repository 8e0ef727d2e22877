// tests/grammar_tests.rs

use sift_lang::ast::TokenKind;
use sift_lang::grammar::{json_grammar, Grammar, GrammarError, Production, RuleSet, Symbol};
use sift_lang::lexer::Lexer;
use sift_lang::parser::{CstNode, SyntaxError, TableParser};

fn parse_json(source: &str) -> Result<CstNode, SyntaxError> {
    let tokens = Lexer::new(source).tokenize().unwrap();
    TableParser::new(json_grammar()).parse(&tokens)
}

// ============================================================================
// FIRST / FOLLOW
// ============================================================================

#[test]
fn test_first_sets_of_json_grammar() {
    let rules = json_grammar().rules();

    let object_first = rules.first_set("object").unwrap();
    assert!(object_first.contains(&TokenKind::LBrace));
    assert_eq!(object_first.len(), 1);

    let value_first = rules.first_set("value").unwrap();
    for kind in [
        TokenKind::LBrace,
        TokenKind::LBracket,
        TokenKind::String,
        TokenKind::Integer,
        TokenKind::Float,
        TokenKind::True,
        TokenKind::False,
        TokenKind::Null,
    ] {
        assert!(value_first.contains(&kind), "missing {:?}", kind);
    }
}

#[test]
fn test_follow_sets_of_json_grammar() {
    let rules = json_grammar().rules();

    let document_follow = rules.follow_set("document").unwrap();
    assert!(document_follow.contains(&TokenKind::Eof));

    // A value can be followed by a comma (arrays/objects), a closing
    // bracket or brace, or end of input.
    let value_follow = rules.follow_set("value").unwrap();
    assert!(value_follow.contains(&TokenKind::Comma));
    assert!(value_follow.contains(&TokenKind::RBracket));
    assert!(value_follow.contains(&TokenKind::RBrace));
    assert!(value_follow.contains(&TokenKind::Eof));
}

#[test]
fn test_fixed_point_terminates_on_nullable_chains() {
    // a -> b c ; b -> ε ; c -> ε : everything nullable.
    let rules = vec![
        Production::new("a", vec![Symbol::nt("b"), Symbol::nt("c")]),
        Production::new("b", vec![]),
        Production::new("c", vec![]),
    ];
    let set = RuleSet::new(rules, "a").unwrap();
    assert!(set.is_nullable("a"));
    assert!(set.is_nullable("b"));
    assert!(set.first_set("a").unwrap().is_empty());
}

// ============================================================================
// Recursion and Determinism
// ============================================================================

#[test]
fn test_right_recursion_is_not_left_recursion() {
    // list -> INTEGER list | ε  (right recursive, LL(1)-friendly)
    let rules = vec![
        Production::new(
            "list",
            vec![Symbol::t(TokenKind::Integer), Symbol::nt("list")],
        ),
        Production::new("list", vec![]),
    ];
    let set = RuleSet::new(rules.clone(), "list").unwrap();
    assert!(!set.is_left_recursive("list"));
    assert!(set.is_right_recursive("list"));
    assert!(Grammar::build(rules, "list").is_ok());
}

#[test]
fn test_left_recursion_fails_table_construction() {
    let rules = vec![
        Production::new(
            "expr",
            vec![Symbol::nt("expr"), Symbol::t(TokenKind::Comma)],
        ),
        Production::new("expr", vec![Symbol::t(TokenKind::Integer)]),
    ];
    let err = Grammar::build(rules, "expr").unwrap_err();
    assert!(matches!(err, GrammarError::LeftRecursive(head) if head == "expr"));
}

#[test]
fn test_nullable_prefix_left_recursion() {
    // a -> b a ; b -> ε : left recursion through a nullable prefix.
    let rules = vec![
        Production::new("a", vec![Symbol::nt("b"), Symbol::nt("a")]),
        Production::new("a", vec![Symbol::t(TokenKind::Integer)]),
        Production::new("b", vec![]),
    ];
    let set = RuleSet::new(rules, "a").unwrap();
    assert!(set.is_left_recursive("a"));
}

#[test]
fn test_nondeterministic_heads_detected() {
    let rules = vec![
        Production::new("s", vec![Symbol::t(TokenKind::Integer)]),
        Production::new(
            "s",
            vec![Symbol::t(TokenKind::Integer), Symbol::t(TokenKind::Integer)],
        ),
    ];
    let set = RuleSet::new(rules.clone(), "s").unwrap();
    assert!(set.is_nondeterministic("s"));
    assert!(matches!(
        Grammar::build(rules, "s"),
        Err(GrammarError::Ambiguous { .. })
    ));
}

#[test]
fn test_unknown_symbol_rejected() {
    let rules = vec![Production::new("s", vec![Symbol::nt("ghost")])];
    assert!(matches!(
        RuleSet::new(rules, "s"),
        Err(GrammarError::UnknownSymbol(name)) if name == "ghost"
    ));
}

// ============================================================================
// Macro Expansion
// ============================================================================

#[test]
fn test_macros_expand_away() {
    // s -> '[' INTEGER (',' INTEGER)* ']' | '[' ']'  via macros
    let rules = vec![Production::new(
        "s",
        vec![
            Symbol::t(TokenKind::LBracket),
            Symbol::opt(vec![
                Symbol::t(TokenKind::Integer),
                Symbol::rep(vec![Symbol::group(vec![
                    Symbol::t(TokenKind::Comma),
                    Symbol::t(TokenKind::Integer),
                ])]),
            ]),
            Symbol::t(TokenKind::RBracket),
        ],
    )];
    let grammar = Grammar::build(rules, "s").unwrap();

    // No macro survives into the derived productions.
    for production in grammar.rules().productions() {
        for symbol in &production.body {
            assert!(!matches!(symbol, Symbol::Macro(_)));
        }
    }

    let parser = TableParser::new(&grammar);
    for source in ["[]", "[1]", "[1, 2, 3]"] {
        let tokens = Lexer::new(source).tokenize().unwrap();
        assert!(parser.parse(&tokens).is_ok(), "failed for {}", source);
    }
    let tokens = Lexer::new("[1 2]").tokenize().unwrap();
    assert!(parser.parse(&tokens).is_err());
}

// ============================================================================
// Table-driven Parsing
// ============================================================================

#[test]
fn test_table_parse_document() {
    let cst = parse_json(r#"{"age": {"$greater": 18}}"#).unwrap();
    let CstNode::Branch { symbol, children } = &cst else {
        panic!("expected branch root");
    };
    assert_eq!(symbol, "document");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].symbol(), Some("value"));
}

#[test]
fn test_table_parse_covers_all_value_kinds() {
    for source in [
        "{}",
        "[]",
        r#""text""#,
        "42",
        "3.14",
        "true",
        "false",
        "null",
        r#"{"a": [1, {"b": null}], "c": false}"#,
    ] {
        assert!(parse_json(source).is_ok(), "failed for {}", source);
    }
}

#[test]
fn test_table_parse_reports_mismatch() {
    let err = parse_json(r#"{"a" 1}"#).unwrap_err();
    assert!(matches!(err, SyntaxError::UnexpectedToken { .. }));
}

#[test]
fn test_table_parse_reports_missing_entry() {
    // ':' can never start a value.
    let err = parse_json(r#"{"a": :}"#).unwrap_err();
    assert!(matches!(err, SyntaxError::MissingEntry { .. }));
}

#[test]
fn test_table_parse_reports_premature_end() {
    let err = parse_json(r#"{"a": "#).unwrap_err();
    assert!(matches!(err, SyntaxError::UnexpectedEnd { .. }));
}

#[test]
fn test_table_parse_reports_trailing_content() {
    let err = parse_json("{} {}").unwrap_err();
    assert!(matches!(err, SyntaxError::TrailingContent { .. }));
}

#[test]
fn test_cst_keeps_all_terminals() {
    let cst = parse_json("[1, 2]").unwrap();

    fn leaves(node: &CstNode, out: &mut Vec<String>) {
        match node {
            CstNode::Leaf(token) => out.push(token.raw.clone()),
            CstNode::Branch { children, .. } => {
                for child in children {
                    leaves(child, out);
                }
            }
        }
    }

    let mut raw = Vec::new();
    leaves(&cst, &mut raw);
    assert_eq!(raw, vec!["[", "1", ",", "2", "]"]);
}
