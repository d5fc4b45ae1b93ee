//! A converter from C++ headers written in the Dear ImGui dialect (classes,
//! namespaces, templates, overloads, default arguments, references,
//! conditional-compilation blocks, macro-annotated APIs) into a pure-C
//! surface: a flattened C header, a C++ implementation file thunking each C
//! entry point back to the original API, and a JSON metadata document for
//! downstream binding generators.
//!
//! The core of the crate is the typed, mutable DOM over C++ declarations
//! ([`Dom`] and the [`Element`] hierarchy) and the ordered tree-rewriting
//! pipeline that transforms it ([`pipeline::Pipeline`] over the catalog in
//! [`modifiers`]): overload disambiguation, template instantiation
//! flattening, namespace flattening, default-argument expansion,
//! conditional-compilation folding, forward-declaration synthesis, and
//! C-ification of references. The lexer, parser, and the three emitters
//! ([`write`] for the C header, [`thunks`], and [`metadata`]) sit at the
//! edges of that pipeline.
//!
//! NOTE: this is *not* a general C++ parser; only the disciplined subset the
//! ImGui headers use is recognised, and declaration bodies are discarded
//! early. The pipeline is single-threaded and synchronous end-to-end, and
//! every error is fatal to the run: the output is a binding contract, so
//! loud failure always beats silent mis-translation.

/// Errors to do with lexing, parsing, and transforming headers.
pub mod error;

mod element;
mod lexer;
pub mod metadata;
pub mod modifiers;
mod parser;
pub mod pipeline;
mod stream;
pub mod thunks;
mod token;
mod types;
mod write;

// Using this structure for ease of storing utility functions
#[cfg(test)]
pub mod tests;

pub use element::*;
pub use lexer::tokenize;
pub use parser::{parse_header_file, ParseContext};
pub use stream::{Checkpoint, TokenStream};
pub use token::{collapse_tokens, Token, TokenKind};
pub use types::{Pointer, TypeExpr};
pub use write::{write_to_c, write_to_string, WriteContext};

use error::ConvertError;
use indexmap::IndexMap;
use pipeline::Pipeline;

/// The rendered artifacts of one conversion run.
#[derive(Debug)]
pub struct Conversion {
    /// The pure-C header text.
    pub header: String,
    /// The C++ thunk implementations (without the hand-written file header,
    /// which the caller prepends from its template).
    pub implementation: String,
    /// The JSON metadata document.
    pub metadata_json: String,
}

/// Parses `source` as a header, runs the given pipeline over the DOM, and
/// renders all three artifacts. `filename` is the logical name of the
/// primary output header, recorded on the DOM root.
///
/// `custom_varargs_list_suffixes` names the functions whose `va_list`
/// variant does not simply append `V` (e.g. `appendf` pairs with `appendfv`).
pub fn convert_header_source(
    source: &str,
    filename: &str,
    pipeline: &Pipeline,
    custom_varargs_list_suffixes: &IndexMap<String, String>,
) -> Result<Conversion, ConvertError> {
    let dom = parse_dom(source, filename)?;
    convert_dom(dom, pipeline, custom_varargs_list_suffixes)
}

/// Parses `source` into a validated DOM rooted at a [`HeaderFileSet`],
/// without running any modifiers.
pub fn parse_dom(source: &str, filename: &str) -> Result<Dom, ConvertError> {
    let tokens = tokenize(source).map_err(error::ParseError::from)?;
    let mut stream = TokenStream::new(tokens);
    let mut dom = Dom::new(filename);
    let file = parse_header_file(&mut dom, &mut stream)?;
    let root = dom.root();
    dom.add_child(root, file);
    dom.validate_hierarchy()?;
    Ok(dom)
}

/// Runs the pipeline over an already-parsed DOM and renders the artifacts.
pub fn convert_dom(
    mut dom: Dom,
    pipeline: &Pipeline,
    custom_varargs_list_suffixes: &IndexMap<String, String>,
) -> Result<Conversion, ConvertError> {
    dom.save_unmodified_clone();
    pipeline.run(&mut dom)?;
    dom.validate_hierarchy()?;

    let header = write_to_string(&dom, &WriteContext::for_c());
    let implementation = thunks::generate(&dom, custom_varargs_list_suffixes);
    let metadata_json = metadata::to_json_string(&metadata::generate(&dom));
    Ok(Conversion {
        header,
        implementation,
        metadata_json,
    })
}
