// tests/lexer_tests.rs

use sift_lang::ast::TokenKind;
use sift_lang::lexer::{LexError, Lexer};

// ============================================================================
// Single Character Tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        (":", TokenKind::Colon),
        (",", TokenKind::Comma),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(token.raw, input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}

// ============================================================================
// Keywords
// ============================================================================

#[test]
fn test_keywords() {
    let test_cases = vec![
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("null", TokenKind::Null),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}

#[test]
fn test_keywords_vs_identifiers() {
    let mut lexer = Lexer::new("truethy nullable falsey");
    for _ in 0..3 {
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    }
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_literals() {
    let mut lexer = Lexer::new(r#""age" "$greater" "with space""#);
    let first = lexer.next_token().unwrap();
    assert_eq!(first.kind, TokenKind::String);
    assert_eq!(first.raw, r#""age""#);
    assert_eq!(first.string_content(), "age");

    let second = lexer.next_token().unwrap();
    assert_eq!(second.string_content(), "$greater");

    let third = lexer.next_token().unwrap();
    assert_eq!(third.string_content(), "with space");
}

#[test]
fn test_string_escapes() {
    let mut lexer = Lexer::new(r#""a\"b" "line\nbreak" "tab\there" "back\\slash""#);
    assert_eq!(lexer.next_token().unwrap().string_content(), "a\"b");
    assert_eq!(lexer.next_token().unwrap().string_content(), "line\nbreak");
    assert_eq!(lexer.next_token().unwrap().string_content(), "tab\there");
    assert_eq!(lexer.next_token().unwrap().string_content(), "back\\slash");
}

#[test]
fn test_unicode_escape() {
    let mut lexer = Lexer::new(r#""snow\u2603man""#);
    assert_eq!(lexer.next_token().unwrap().string_content(), "snow\u{2603}man");
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new(r#""never closed"#);
    let result = lexer.next_token();
    assert!(matches!(result, Err(LexError::UnterminatedString { .. })));
}

#[test]
fn test_string_with_raw_newline_is_unterminated() {
    let mut lexer = Lexer::new("\"broken\nstring\"");
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::UnterminatedString { .. })
    ));
}

#[test]
fn test_invalid_escape() {
    let mut lexer = Lexer::new(r#""bad\qescape""#);
    let result = lexer.next_token();
    assert!(matches!(result, Err(LexError::InvalidEscape { ch: 'q', .. })));
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_integers() {
    let mut lexer = Lexer::new("0 42 -10 123456789012345678901");
    for expected in ["0", "42", "-10", "123456789012345678901"] {
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Integer);
        assert_eq!(token.raw, expected);
    }
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_floats() {
    let mut lexer = Lexer::new("3.14 -1.5 1.5e3 2E-4 1.0e+2");
    for expected in ["3.14", "-1.5", "1.5e3", "2E-4", "1.0e+2"] {
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Float, "Failed for {}", expected);
        assert_eq!(token.raw, expected);
    }
}

#[test]
fn test_malformed_numbers() {
    for input in ["1.", "-", "1e", "1.5e+", "2."] {
        let mut lexer = Lexer::new(input);
        assert!(
            matches!(lexer.next_token(), Err(LexError::MalformedNumber { .. })),
            "Expected malformed number for input: {}",
            input
        );
    }
}

// ============================================================================
// Comments and Whitespace
// ============================================================================

#[test]
fn test_line_comments_are_skipped() {
    let mut lexer = Lexer::new("1 // trailing comment\n2");
    assert_eq!(lexer.next_token().unwrap().raw, "1");
    assert_eq!(lexer.next_token().unwrap().raw, "2");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_block_comments_are_skipped() {
    let mut lexer = Lexer::new("1 /* a\n * multi-line\n * comment */ 2");
    assert_eq!(lexer.next_token().unwrap().raw, "1");
    assert_eq!(lexer.next_token().unwrap().raw, "2");
}

#[test]
fn test_unterminated_block_comment() {
    let mut lexer = Lexer::new("1 /* never closed");
    lexer.next_token().unwrap();
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::UnterminatedComment { .. })
    ));
}

#[test]
fn test_lone_slash_is_unexpected() {
    let mut lexer = Lexer::new("1 / 2");
    lexer.next_token().unwrap();
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::UnexpectedCharacter { ch: '/', .. })
    ));
}

#[test]
fn test_unexpected_character() {
    let mut lexer = Lexer::new("{ @ }");
    lexer.next_token().unwrap();
    let result = lexer.next_token();
    let Err(LexError::UnexpectedCharacter { ch, position }) = result else {
        panic!("expected unexpected-character error, got {:?}", result);
    };
    assert_eq!(ch, '@');
    assert_eq!(position.line, 1);
    assert_eq!(position.column, 3);
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_positions() {
    let mut lexer = Lexer::new("{\n  \"age\": 18\n}");

    let lbrace = lexer.next_token().unwrap();
    assert_eq!((lbrace.position.line, lbrace.position.column), (1, 1));
    assert_eq!(lbrace.position.offset, 0);

    let key = lexer.next_token().unwrap();
    assert_eq!((key.position.line, key.position.column), (2, 3));

    let colon = lexer.next_token().unwrap();
    assert_eq!(colon.kind, TokenKind::Colon);

    let number = lexer.next_token().unwrap();
    assert_eq!((number.position.line, number.position.column), (2, 10));

    let rbrace = lexer.next_token().unwrap();
    assert_eq!((rbrace.position.line, rbrace.position.column), (3, 1));
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn test_raw_round_trip_modulo_whitespace() {
    let source = r#"{"age": {"$greater": 18}, /* note */ "tags": ["a", "b"], "ok": true}"#;
    let tokens = Lexer::new(source).tokenize().unwrap();

    let rebuilt: String = tokens.iter().map(|t| t.raw.as_str()).collect();
    let stripped: String = {
        // drop whitespace and the comment from the original
        let without_comment = source.replace("/* note */", "");
        without_comment.chars().filter(|c| !c.is_whitespace()).collect()
    };
    assert_eq!(rebuilt, stripped);
}

#[test]
fn test_tokenize_is_finite_and_eof_terminated() {
    let tokens = Lexer::new("{}").tokenize().unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);

    // Exhausted lexers keep reporting end of input.
    let mut lexer = Lexer::new("");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}
