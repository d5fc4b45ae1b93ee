//! The hand-written scanner that turns header source text into a token
//! vector. The stream it produces is finite and forward-only; all rewinding
//! happens in [`crate::stream::TokenStream`], not here.

use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Multi-character punctuation, longest first so that `...` wins over `.` and
/// `::` over `:`.
const MULTI_PUNCTS: &[&str] = &[
    "...", "<<=", ">>=", "::", "->", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "++", "--",
];

const SINGLE_PUNCTS: &str = "*&~!+-/%^|<>=.?#@";

/// Tokenizes the given source text.
///
/// Line continuations (`\` at end of line) are treated as plain whitespace and
/// do *not* advance the logical line number, so a continued `#define` body
/// still reads as a single line to the parser. Runs of blank source lines are
/// surfaced as [`TokenKind::BlankLines`] tokens between their neighbours.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let chars = source.chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut column: u32 = 1;
    let mut i = 0;

    // Advances over one character, maintaining the position counters
    macro_rules! bump {
        () => {{
            if chars[i] == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
            i += 1;
        }};
    }

    while i < chars.len() {
        let c = chars[i];

        // Line continuation: swallow the backslash and the newline without
        // advancing the logical line counter
        if c == '\\' && matches!(chars.get(i + 1), Some('\n')) {
            i += 2;
            column = 1;
            continue;
        }
        if c.is_whitespace() {
            bump!();
            continue;
        }

        let start_line = line;
        let start_column = column;

        if c == '/' && matches!(chars.get(i + 1), Some('/')) {
            // Line comment, runs to the end of the line
            let mut text = String::new();
            while i < chars.len() && chars[i] != '\n' {
                text.push(chars[i]);
                bump!();
            }
            tokens.push(Token {
                kind: TokenKind::LineComment,
                text,
                line: start_line,
                column: start_column,
            });
        } else if c == '/' && matches!(chars.get(i + 1), Some('*')) {
            let mut text = String::from("/*");
            bump!();
            bump!();
            let mut closed = false;
            while i < chars.len() {
                if chars[i] == '*' && matches!(chars.get(i + 1), Some('/')) {
                    text.push_str("*/");
                    bump!();
                    bump!();
                    closed = true;
                    break;
                }
                text.push(chars[i]);
                bump!();
            }
            if !closed {
                return Err(LexError::UnterminatedBlockComment { line: start_line });
            }
            tokens.push(Token {
                kind: TokenKind::BlockComment,
                text,
                line: start_line,
                column: start_column,
            });
        } else if c == '#' {
            // Preprocessor directive: `#` followed by the directive word
            bump!();
            // Whitespace between `#` and the word is legal
            while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
                bump!();
            }
            let mut word = String::new();
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                word.push(chars[i]);
                bump!();
            }
            let kind = match word.as_str() {
                "include" => TokenKind::PpInclude,
                "define" => TokenKind::PpDefine,
                "undef" => TokenKind::PpUndef,
                "if" => TokenKind::PpIf,
                "ifdef" => TokenKind::PpIfdef,
                "ifndef" => TokenKind::PpIfndef,
                "elif" => TokenKind::PpElif,
                "else" => TokenKind::PpElse,
                "endif" => TokenKind::PpEndif,
                "pragma" => TokenKind::PpPragma,
                "error" => TokenKind::PpError,
                _ => {
                    return Err(LexError::UnknownDirective {
                        directive: word,
                        line: start_line,
                    })
                }
            };
            tokens.push(Token {
                kind,
                text: format!("#{word}"),
                line: start_line,
                column: start_column,
            });
            if kind == TokenKind::PpInclude {
                // The include target (`<foo.h>` or `"foo.h"`) is captured as
                // one literal token, since it is never inspected structurally
                while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
                    bump!();
                }
                let mut target = String::new();
                while i < chars.len() && chars[i] != '\n' {
                    target.push(chars[i]);
                    bump!();
                }
                tokens.push(Token {
                    kind: TokenKind::Str,
                    text: target.trim_end().to_string(),
                    line: start_line,
                    column: start_column,
                });
            }
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut text = String::new();
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                text.push(chars[i]);
                bump!();
            }
            let kind = match text.as_str() {
                "const" => TokenKind::Const,
                "constexpr" => TokenKind::Constexpr,
                _ => TokenKind::Thing,
            };
            tokens.push(Token {
                kind,
                text,
                line: start_line,
                column: start_column,
            });
        } else if c.is_ascii_digit() {
            let mut text = String::new();
            while i < chars.len() {
                let d = chars[i];
                if d.is_ascii_alphanumeric() || d == '.' {
                    text.push(d);
                    bump!();
                    // Exponent signs belong to the literal (`1e-5`, `0x1p+3`);
                    // `e`/`E` only counts outside hex literals
                    let is_hex = text.len() > 1 && text[..2].eq_ignore_ascii_case("0x");
                    let exponent = match text.chars().last() {
                        Some('e' | 'E') => !is_hex,
                        Some('p' | 'P') => is_hex,
                        _ => false,
                    };
                    if exponent && matches!(chars.get(i), Some('+' | '-')) {
                        text.push(chars[i]);
                        bump!();
                    }
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text,
                line: start_line,
                column: start_column,
            });
        } else if c == '"' || c == '\'' {
            let quote = c;
            let mut text = String::new();
            text.push(quote);
            bump!();
            let mut closed = false;
            while i < chars.len() && chars[i] != '\n' {
                let d = chars[i];
                text.push(d);
                if d == '\\' {
                    bump!();
                    if i < chars.len() {
                        text.push(chars[i]);
                        bump!();
                    }
                    continue;
                }
                bump!();
                if d == quote {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(LexError::UnterminatedString { line: start_line });
            }
            tokens.push(Token {
                kind: if quote == '"' {
                    TokenKind::Str
                } else {
                    TokenKind::CharLit
                },
                text,
                line: start_line,
                column: start_column,
            });
        } else {
            let simple = match c {
                '(' => Some(TokenKind::LParen),
                ')' => Some(TokenKind::RParen),
                '{' => Some(TokenKind::LBrace),
                '}' => Some(TokenKind::RBrace),
                '[' => Some(TokenKind::LBracket),
                ']' => Some(TokenKind::RBracket),
                ',' => Some(TokenKind::Comma),
                ';' => Some(TokenKind::Semicolon),
                _ => None,
            };
            if let Some(kind) = simple {
                tokens.push(Token {
                    kind,
                    text: c.to_string(),
                    line: start_line,
                    column: start_column,
                });
                bump!();
            } else if let Some(mp) = MULTI_PUNCTS
                .iter()
                .find(|mp| source_matches_at(&chars, i, mp))
            {
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: (*mp).to_string(),
                    line: start_line,
                    column: start_column,
                });
                for _ in 0..mp.chars().count() {
                    bump!();
                }
            } else if c == ':' {
                tokens.push(Token {
                    kind: TokenKind::Colon,
                    text: ":".to_string(),
                    line: start_line,
                    column: start_column,
                });
                bump!();
            } else if SINGLE_PUNCTS.contains(c) {
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    text: c.to_string(),
                    line: start_line,
                    column: start_column,
                });
                bump!();
            } else {
                return Err(LexError::UnexpectedCharacter {
                    c,
                    line: start_line,
                    column: start_column,
                });
            }
        }
    }

    Ok(insert_blank_lines(tokens))
}

fn source_matches_at(chars: &[char], at: usize, needle: &str) -> bool {
    needle
        .chars()
        .enumerate()
        .all(|(j, nc)| chars.get(at + j) == Some(&nc))
}

/// Inserts a [`TokenKind::BlankLines`] token wherever a gap of more than one
/// line separates two tokens (accounting for block comments spanning lines).
fn insert_blank_lines(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut prev_end_line = 0u32;
    for tok in tokens {
        if tok.line > prev_end_line + 1 {
            let count = tok.line - prev_end_line - 1;
            out.push(Token {
                kind: TokenKind::BlankLines,
                text: "\n".repeat(count as usize),
                line: prev_end_line + 1,
                column: 1,
            });
        }
        prev_end_line = tok.line + tok.text.matches('\n').count() as u32;
        out.push(tok);
    }
    out
}
