use super::*;
use crate::error::LexError;

#[test]
fn lexer_should_tokenize_a_declaration() {
    let tokens = tokenize("void Foo(int x);").unwrap();
    let kinds = tokens.iter().map(|tok| tok.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Thing,
            TokenKind::Thing,
            TokenKind::LParen,
            TokenKind::Thing,
            TokenKind::Thing,
            TokenKind::RParen,
            TokenKind::Semicolon,
        ]
    );
    assert_eq!(tokens[0].text, "void");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[0].column, 1);
    assert_eq!(tokens[1].column, 6);
}

#[test]
fn lexer_should_split_const_and_constexpr() {
    let tokens = tokenize("const constexpr int").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Const);
    assert_eq!(tokens[1].kind, TokenKind::Constexpr);
    assert_eq!(tokens[2].kind, TokenKind::Thing);
}

#[test]
fn lexer_should_recognise_directives() {
    let tokens = tokenize("#pragma once\n#ifdef FOO\n#endif").unwrap();
    let kinds = tokens.iter().map(|tok| tok.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            TokenKind::PpPragma,
            TokenKind::Thing,
            TokenKind::PpIfdef,
            TokenKind::Thing,
            TokenKind::PpEndif,
        ]
    );
}

#[test]
fn lexer_should_capture_include_targets_verbatim() {
    let tokens = tokenize("#include <stdio.h>").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::PpInclude);
    assert_eq!(tokens[1].kind, TokenKind::Str);
    assert_eq!(tokens[1].text, "<stdio.h>");
}

#[test]
fn lexer_should_insert_blank_line_tokens() {
    let tokens = tokenize("int a;\n\n\nint b;").unwrap();
    let blank = tokens
        .iter()
        .find(|tok| tok.kind == TokenKind::BlankLines)
        .expect("expected a blank-lines token");
    assert_eq!(blank.text.matches('\n').count(), 2);
}

#[test]
fn lexer_should_keep_comments_as_tokens() {
    let tokens = tokenize("int a; // trailing\n/* block */").unwrap();
    assert!(tokens
        .iter()
        .any(|tok| tok.kind == TokenKind::LineComment && tok.text == "// trailing"));
    assert!(tokens
        .iter()
        .any(|tok| tok.kind == TokenKind::BlockComment && tok.text == "/* block */"));
}

#[test]
fn lexer_should_handle_multi_character_puncts() {
    let tokens = tokenize("a :: b ... += <<").unwrap();
    let puncts = tokens
        .iter()
        .filter(|tok| tok.kind == TokenKind::Punct)
        .map(|tok| tok.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(puncts, vec!["::", "...", "+=", "<<"]);
}

#[test]
fn lexer_should_not_advance_lines_over_continuations() {
    let tokens = tokenize("#define FOO 1 + \\\n    2\nint after;").unwrap();
    // Both macro content tokens stay on the directive's logical line
    let two = tokens.iter().find(|tok| tok.text == "2").unwrap();
    assert_eq!(two.line, 1);
    let after = tokens.iter().find(|tok| tok.text == "after").unwrap();
    assert_eq!(after.line, 2);
}

#[test]
fn lexer_should_reject_unknown_directives() {
    let err = tokenize("#frobnicate").unwrap_err();
    assert!(matches!(err, LexError::UnknownDirective { .. }));
}

#[test]
fn lexer_should_reject_unterminated_strings() {
    let err = tokenize("const char* s = \"oops\nint x;").unwrap_err();
    assert!(matches!(err, LexError::UnterminatedString { line: 1 }));
}

#[test]
fn stream_should_rewind_to_checkpoints() {
    let tokens = tokenize("int a ;").unwrap();
    let mut stream = TokenStream::new(tokens);
    let checkpoint = stream.checkpoint();
    assert_eq!(stream.get().unwrap().text, "int");
    assert_eq!(stream.get().unwrap().text, "a");
    stream.rewind(checkpoint);
    assert_eq!(stream.get().unwrap().text, "int");
    stream.rewind_one();
    assert_eq!(stream.get().unwrap().text, "int");
}

#[test]
fn stream_should_filter_by_kind() {
    let tokens = tokenize("int ;").unwrap();
    let mut stream = TokenStream::new(tokens);
    assert!(stream.get_of_kind(&[TokenKind::Semicolon]).is_none());
    assert!(stream.peek_of_kind(&[TokenKind::Thing]).is_some());
    assert!(stream.get_of_kind(&[TokenKind::Thing]).is_some());
    assert!(stream.get_of_kind(&[TokenKind::Semicolon]).is_some());
    assert!(stream.is_exhausted());
}

#[test]
fn types_should_print_canonically() {
    let parse_type = |text: &str| {
        let tokens = tokenize(text).unwrap();
        let mut stream = TokenStream::new(tokens);
        TypeExpr::parse(&mut stream).unwrap()
    };
    assert_eq!(parse_type("const char*").to_c_string(), "const char*");
    assert_eq!(parse_type("unsigned int").to_c_string(), "unsigned int");
    assert_eq!(
        parse_type("ImVector<ImWchar>").to_c_string(),
        "ImVector<ImWchar>"
    );
    assert_eq!(parse_type("ImFont* const*").to_c_string(), "ImFont* const*");

    let mut reference = parse_type("float&");
    assert!(reference.is_reference());
    reference.reference_to_pointer();
    assert_eq!(reference.to_c_string(), "float*");
    assert!(reference.is_pointer());
}
