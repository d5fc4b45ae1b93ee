//! The typed tokens the lexer produces and the parser consumes.

/// The kinds of token the lexer can produce.
///
/// Identifier-like words are all [`TokenKind::Thing`]s, with the exception of
/// `const` and `constexpr`, which the parser needs to distinguish cheaply in
/// several places. Preprocessor directives get one kind each so conditional
/// parsing can dispatch on the kind alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier or keyword-like word.
    Thing,
    /// A numeric literal (integer, float, or hex form, with any suffix).
    Number,
    /// A string literal, including its quotes.
    Str,
    /// A character literal, including its quotes.
    CharLit,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Const,
    Constexpr,
    /// A `//`-style comment running to the end of the line.
    LineComment,
    /// A `/* */`-style comment, possibly spanning lines.
    BlockComment,
    /// Operator punctuation (`*`, `&`, `~`, `::`, `...`, `==`, etc.).
    Punct,
    /// One or more blank source lines. Synthesized between tokens so the
    /// parser can represent vertical spacing in the DOM.
    BlankLines,
    PpInclude,
    PpDefine,
    PpUndef,
    PpIf,
    PpIfdef,
    PpIfndef,
    PpElif,
    PpElse,
    PpEndif,
    PpPragma,
    PpError,
}

/// A single token, carrying its literal text and source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based logical line (line continuations do not advance this).
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl Token {
    /// Creates a token with no meaningful source position. Used when modifiers
    /// synthesize token runs (e.g. the `extern "C"` wrapper).
    pub fn synthetic(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            line: 0,
            column: 0,
        }
    }
}

/// Collapses a token run back into a single line of source text.
///
/// This is a best-effort inverse of the lexer: tokens are joined with single
/// spaces, except around punctuation where C convention omits them. It is used
/// for define bodies, conditional expressions, default argument values, and
/// enum value expressions, none of which need exact whitespace preservation.
pub fn collapse_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for tok in tokens {
        if let Some(prev) = prev {
            let no_space_before = matches!(
                tok.kind,
                TokenKind::Comma | TokenKind::Semicolon | TokenKind::RParen | TokenKind::RBracket
            ) || tok.text == "::"
                // A `(` directly after a word is a call or macro invocation
                || (tok.kind == TokenKind::LParen && prev.kind == TokenKind::Thing);
            let no_space_after = matches!(prev.kind, TokenKind::LParen | TokenKind::LBracket)
                || prev.text == "::"
                || prev.text == "~"
                || prev.text == "!";
            if !no_space_before && !no_space_after {
                out.push(' ');
            }
        }
        out.push_str(&tok.text);
        prev = Some(tok);
    }
    out
}
