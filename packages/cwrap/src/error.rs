use thiserror::Error;

/// Errors that can occur while tokenizing a source header.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("unexpected character '{c}' at {line}:{column}")]
    UnexpectedCharacter { c: char, line: u32, column: u32 },
    #[error("unterminated string literal starting on line {line}")]
    UnterminatedString { line: u32 },
    #[error("unterminated block comment starting on line {line}")]
    UnterminatedBlockComment { line: u32 },
    #[error("unknown preprocessor directive '#{directive}' on line {line}")]
    UnknownDirective { directive: String, line: u32 },
}

/// Errors that can occur while parsing a token stream into a DOM.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    LexError(#[from] LexError),

    #[error("no known declaration form matches the input at {line}:{column} (near '{near}')")]
    UnrecognisedConstruct { line: u32, column: u32, near: String },
    #[error("the input ended in the middle of {context}")]
    UnexpectedEof { context: &'static str },
    #[error("expected {expected} at {line}:{column}, found '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        line: u32,
        column: u32,
    },
    #[error("a conditional block opened on line {line} was never closed with #endif")]
    UnterminatedConditional { line: u32 },
    #[error("failed to parse manual helper signature: {signature}")]
    InvalidHelperSignature { signature: String },
}

/// Errors that can occur across a whole conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl From<LexError> for ConvertError {
    fn from(err: LexError) -> Self {
        Self::Parse(err.into())
    }
}

/// Errors that can occur while applying modifiers to a DOM.
///
/// All of these are fatal to a conversion run: the output is a binding
/// contract, so loud failure is always preferred over silent mis-translation.
#[derive(Debug, Error)]
pub enum TransformError {
    // This indicates a bug in a modifier rather than bad input
    #[error("DOM hierarchy violation: {detail}")]
    HierarchyViolation { detail: String },
    #[error(
        "unresolved function name collision after disambiguation:\n{}",
        signatures.join("\n")
    )]
    UnresolvedOverloadCollision { signatures: Vec<String> },
    #[error("no function matching '{qualified_name}' was found")]
    NoSuchFunction { qualified_name: String },
    #[error(transparent)]
    HelperParseFailed(#[from] ParseError),
}
