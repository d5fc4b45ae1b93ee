//! A checkpointable view over the lexer's token vector.
//!
//! Every parse routine is required to take a checkpoint on entry and rewind to
//! it before returning "no match", so a failed speculative parse consumes
//! nothing. Success consumes exactly the matched tokens.

use crate::token::{Token, TokenKind};

/// An opaque position in a [`TokenStream`], returned by
/// [`TokenStream::checkpoint`] and accepted by [`TokenStream::rewind`].
#[derive(Clone, Copy, Debug)]
pub struct Checkpoint(usize);

/// A forward-only token cursor with checkpoint/rewind.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Non-consuming lookahead. Returns `None` if the stream is exhausted.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Non-consuming lookahead at an offset past the cursor.
    pub fn peek_ahead(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    /// Non-consuming lookahead that only matches if the next token's kind is
    /// one of `kinds`.
    pub fn peek_of_kind(&self, kinds: &[TokenKind]) -> Option<&Token> {
        self.peek().filter(|tok| kinds.contains(&tok.kind))
    }

    /// Consuming read. Returns `None` if the stream is exhausted.
    pub fn get(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(tok)
    }

    /// Consuming read that only matches (and only consumes) if the next
    /// token's kind is one of `kinds`.
    pub fn get_of_kind(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if self.peek_of_kind(kinds).is_some() {
            self.get()
        } else {
            None
        }
    }

    /// Consuming read of a [`TokenKind::Punct`] with exactly the given text.
    pub fn get_punct(&mut self, text: &str) -> Option<Token> {
        if self
            .peek()
            .is_some_and(|tok| tok.kind == TokenKind::Punct && tok.text == text)
        {
            self.get()
        } else {
            None
        }
    }

    /// Non-consuming version of [`Self::get_punct`].
    pub fn peek_punct(&self, text: &str) -> Option<&Token> {
        self.peek()
            .filter(|tok| tok.kind == TokenKind::Punct && tok.text == text)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Puts the single most recently consumed token back.
    pub fn rewind_one(&mut self) {
        debug_assert!(self.pos > 0, "rewind_one at the start of the stream");
        self.pos = self.pos.saturating_sub(1);
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// The line of the most recently consumed token. Used to detect the end of
    /// line-scoped constructs (directives).
    pub fn last_line(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].line
        }
    }

    /// Consumes and returns every remaining token on the given logical line.
    pub fn get_rest_of_line(&mut self, line: u32) -> Vec<Token> {
        let mut taken = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.line != line {
                break;
            }
            taken.push(self.get().unwrap());
        }
        taken
    }
}
