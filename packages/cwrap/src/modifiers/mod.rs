//! The tree-rewriting passes that turn the parsed C++ DOM into a
//! C-compatible one.
//!
//! Each modifier is a single entry point taking the DOM and its parameters,
//! performing targeted mutations that leave every invariant satisfied before
//! returning. Modifiers read the tree through pre-order snapshots collected
//! up front (`Dom::descendants` and friends), so mutations made while
//! iterating never invalidate the worklist. Order matters: the pipeline in
//! [`crate::pipeline`] is the contract for how these compose.

mod augment;
mod cleanup;
mod flatten;
mod names;
mod signatures;

pub use augment::*;
pub use cleanup::*;
pub use flatten::*;
pub use names::*;
pub use signatures::*;

/// Type names that are C builtins (or ubiquitous C standard types) and
/// therefore never need forward declarations or suffix guessing.
pub(crate) fn is_builtin_type(name: &str) -> bool {
    matches!(
        name,
        "void"
            | "bool"
            | "char"
            | "signed char"
            | "unsigned char"
            | "short"
            | "unsigned short"
            | "int"
            | "unsigned"
            | "unsigned int"
            | "long"
            | "unsigned long"
            | "long long"
            | "unsigned long long"
            | "float"
            | "double"
            | "long double"
            | "size_t"
            | "ptrdiff_t"
            | "va_list"
            | "wchar_t"
    )
}

/// Reduces a human-readable type-ish name to a valid C identifier fragment:
/// runs of non-alphanumeric characters collapse to a single underscore, and a
/// leading digit gets an underscore prepended.
pub(crate) fn sanitise_name_for_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
