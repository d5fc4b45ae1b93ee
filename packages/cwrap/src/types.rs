//! The stringly-typed representation of C/C++ types.
//!
//! This deliberately avoids committing to a full C++ type model: a type is a
//! qualifier set, a primary name, optional template arguments, pointer/
//! reference decoration, and array bounds, and its canonical form is the
//! printed string. Two types are considered equal iff their printed forms are
//! equal.

use crate::stream::TokenStream;
use crate::token::{collapse_tokens, TokenKind};

/// One level of pointer decoration. `T* const` carries `is_const` here, as
/// opposed to `const T*`, which sets the constness of the pointee.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pointer {
    pub is_const: bool,
}

/// A parsed type expression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeExpr {
    /// Pointee/value constness (`const char*`, `const int`).
    pub is_const: bool,
    pub is_volatile: bool,
    /// The primary type name. Multi-word builtin forms are kept as a single
    /// name (`unsigned int`, `long long`).
    pub name: String,
    /// Template arguments, recursively. Empty for non-template types; an
    /// explicit empty list (`Foo<>`) is recorded via `has_template_args`.
    pub template_args: Vec<TypeExpr>,
    pub has_template_args: bool,
    /// Pointer decoration, innermost first (`int**` has two entries).
    pub pointers: Vec<Pointer>,
    pub is_reference: bool,
    /// Array bounds, e.g. `[2]` or `[]`. These print after the declarator
    /// name, not after the type name.
    pub array_bounds: Vec<Option<String>>,
    /// When set, printing emits exactly this string and ignores all structure.
    /// Used by the template-flattening type fudges, which are string-level
    /// workarounds for substitutions that would otherwise print incorrectly.
    pub raw: Option<String>,
}

/// Builtin words that can combine into a multi-word primary type name.
const COMBINABLE: &[&str] = &["unsigned", "signed", "long", "short", "int", "char", "double"];

impl TypeExpr {
    /// A plain named type with no qualifiers or decoration.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A type that prints as exactly `text`, with no inspectable structure.
    pub fn raw(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: text.clone(),
            raw: Some(text),
            ..Self::default()
        }
    }

    /// Speculatively parses a type expression, rewinding the stream and
    /// returning `None` if the tokens do not form one.
    pub fn parse(stream: &mut TokenStream) -> Option<Self> {
        let checkpoint = stream.checkpoint();
        let mut ty = TypeExpr::default();

        // Leading qualifiers, in any order
        loop {
            if stream.get_of_kind(&[TokenKind::Const]).is_some() {
                ty.is_const = true;
            } else if stream
                .peek_of_kind(&[TokenKind::Thing])
                .is_some_and(|tok| tok.text == "volatile")
            {
                stream.get();
                ty.is_volatile = true;
            } else {
                break;
            }
        }

        // Primary name, possibly multi-word for builtin combinations
        let first = match stream.get_of_kind(&[TokenKind::Thing]) {
            Some(tok) => tok,
            None => {
                stream.rewind(checkpoint);
                return None;
            }
        };
        let mut name = first.text.clone();
        if COMBINABLE.contains(&first.text.as_str()) {
            while let Some(next) = stream.peek_of_kind(&[TokenKind::Thing]) {
                if COMBINABLE.contains(&next.text.as_str()) {
                    let next = stream.get().unwrap();
                    name.push(' ');
                    name.push_str(&next.text);
                } else {
                    break;
                }
            }
        }
        ty.name = name;

        // Template arguments
        if stream.get_punct("<").is_some() {
            ty.has_template_args = true;
            if stream.get_punct(">").is_none() {
                loop {
                    let arg = match TypeExpr::parse(stream) {
                        Some(arg) => arg,
                        None => {
                            stream.rewind(checkpoint);
                            return None;
                        }
                    };
                    ty.template_args.push(arg);
                    if stream.get_of_kind(&[TokenKind::Comma]).is_some() {
                        continue;
                    }
                    if stream.get_punct(">").is_some() {
                        break;
                    }
                    stream.rewind(checkpoint);
                    return None;
                }
            }
        }

        // Pointer and reference decoration; a trailing `const` binds to the
        // nearest pointer level
        loop {
            if stream.get_punct("*").is_some() {
                ty.pointers.push(Pointer { is_const: false });
            } else if stream.get_of_kind(&[TokenKind::Const]).is_some() {
                match ty.pointers.last_mut() {
                    Some(ptr) => ptr.is_const = true,
                    // `char const* s` style: const before any pointer
                    // qualifies the pointee
                    None => ty.is_const = true,
                }
            } else if stream.get_punct("&").is_some() {
                ty.is_reference = true;
                break;
            } else {
                break;
            }
        }

        Some(ty)
    }

    /// The primary type name, stripped of all qualifiers and decoration.
    pub fn primary_type_name(&self) -> &str {
        &self.name
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn is_reference(&self) -> bool {
        self.is_reference
    }

    pub fn is_pointer(&self) -> bool {
        !self.pointers.is_empty()
    }

    pub fn is_array(&self) -> bool {
        !self.array_bounds.is_empty()
    }

    /// Rewrites a reference into a single extra level of pointer. A no-op for
    /// non-reference types.
    pub fn reference_to_pointer(&mut self) {
        if self.is_reference {
            self.is_reference = false;
            self.pointers.push(Pointer { is_const: false });
        }
    }

    /// Prints the canonical form of this type. Deterministic and stable: this
    /// string is the identity of the type for every comparison the pipeline
    /// performs.
    pub fn to_c_string(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let mut out = String::new();
        if self.is_const {
            out.push_str("const ");
        }
        if self.is_volatile {
            out.push_str("volatile ");
        }
        out.push_str(&self.name);
        if self.has_template_args {
            out.push('<');
            let args = self
                .template_args
                .iter()
                .map(|arg| arg.to_c_string())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&args);
            out.push('>');
        }
        for ptr in &self.pointers {
            out.push('*');
            if ptr.is_const {
                out.push_str(" const");
            }
        }
        if self.is_reference {
            out.push('&');
        }
        out
    }

    /// Prints the array suffix (`[2]`, `[]`), which belongs after the
    /// declarator name rather than the type.
    pub fn array_suffix(&self) -> String {
        let mut out = String::new();
        for bound in &self.array_bounds {
            out.push('[');
            if let Some(bound) = bound {
                out.push_str(bound);
            }
            out.push(']');
        }
        out
    }
}

/// Parses a bracketed array-bound suffix after a declarator name, appending
/// the bounds to `ty`. Returns `false` (without rewinding its partial
/// progress) only on malformed input, which callers treat as a parse miss.
pub(crate) fn parse_array_bounds(stream: &mut TokenStream, ty: &mut TypeExpr) -> bool {
    while stream.get_of_kind(&[TokenKind::LBracket]).is_some() {
        let mut bound_tokens = Vec::new();
        loop {
            match stream.get() {
                Some(tok) if tok.kind == TokenKind::RBracket => break,
                Some(tok) => bound_tokens.push(tok),
                None => return false,
            }
        }
        if bound_tokens.is_empty() {
            ty.array_bounds.push(None);
        } else {
            ty.array_bounds.push(Some(collapse_tokens(&bound_tokens)));
        }
    }
    true
}
