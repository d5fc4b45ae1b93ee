mod disambiguation;
mod lexing;
mod modifiers;
mod parsing;
mod pipeline;

pub use super::*;

/// Parses a source fragment into a validated DOM rooted at a header file
/// set.
pub fn parse(source: &str) -> Dom {
    let dom = crate::parse_dom(source, "test.h").unwrap();
    dom
}

/// Renders the DOM in C++ mode (the closest to a parse round-trip).
pub fn write_cpp(dom: &Dom) -> String {
    crate::write_to_string(dom, &WriteContext::default())
}

/// Renders the DOM in C mode.
pub fn write_c(dom: &Dom) -> String {
    crate::write_to_string(dom, &WriteContext::for_c())
}

/// The names of every function in the tree, in pre-order.
pub fn function_names(dom: &Dom) -> Vec<String> {
    dom.all_functions()
        .into_iter()
        .map(|id| match dom.element(id) {
            Element::Function(function) => function.name.clone(),
            _ => unreachable!(),
        })
        .collect()
}

/// Finds the single function with the given name, panicking if it is absent
/// or ambiguous.
pub fn find_function(dom: &Dom, name: &str) -> NodeId {
    let matches = dom
        .all_functions()
        .into_iter()
        .filter(|&id| match dom.element(id) {
            Element::Function(function) => function.name == name,
            _ => false,
        })
        .collect::<Vec<_>>();
    assert_eq!(matches.len(), 1, "expected exactly one function '{name}'");
    matches[0]
}
