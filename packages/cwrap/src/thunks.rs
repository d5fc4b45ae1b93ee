//! The C++ thunk emitter: one implementation per C entry point, calling back
//! into the original C++ API.
//!
//! The pre-flattening provenance recorded on each function (`original_class`
//! and the fully-qualified original name) determines the call shape: member
//! functions go through the injected `self` parameter, by-value constructors
//! return a constructed value, and namespace/loose functions call their
//! original qualified name. Arguments converted from references are
//! dereferenced, and implicitly-defaulted arguments are materialized from
//! their recorded default expressions.

use crate::element::{Dom, Element, Function};
use crate::token::collapse_tokens;
use crate::write::{function_signature, WriteContext};
use indexmap::IndexMap;

/// Generates the implementation bodies for every function in the converted
/// tree. Manual helpers are skipped; their implementations live in the
/// hand-written template header the CLI prepends.
pub fn generate(dom: &Dom, custom_varargs_list_suffixes: &IndexMap<String, String>) -> String {
    let ctx = WriteContext::for_c();
    let mut out = String::new();
    for id in dom.all_functions() {
        let Element::Function(function) = dom.element(id) else {
            continue;
        };
        if function.is_manual_helper {
            continue;
        }
        out.push('\n');
        out.push_str(&function_signature(dom, id, function, &ctx));
        out.push('\n');
        out.push_str("{\n");
        write_body(dom, function, custom_varargs_list_suffixes, &mut out);
        out.push_str("}\n");
    }
    out
}

fn write_body(
    dom: &Dom,
    function: &Function,
    custom_varargs_list_suffixes: &IndexMap<String, String>,
    out: &mut String,
) {
    let indent = "    ";
    let original_name = function
        .original_name
        .clone()
        .unwrap_or_else(|| function.name.clone());
    let leaf = original_name
        .rsplit("::")
        .next()
        .unwrap_or(&original_name)
        .to_string();

    let has_self = function.original_class.is_some()
        && !function.is_by_value_constructor
        && function
            .arguments
            .first()
            .is_some_and(|arg| arg.name.as_deref() == Some("self"));

    // The argument expressions for the C++ call, in order
    let mut call_args = Vec::new();
    let mut varargs = false;
    for (index, arg) in function.arguments.iter().enumerate() {
        if has_self && index == 0 {
            continue;
        }
        if arg.is_varargs {
            varargs = true;
            continue;
        }
        let name = match &arg.name {
            Some(name) => name.clone(),
            None => continue,
        };
        let expr = if arg.is_implicit_default {
            // Materialize the omitted default
            arg.default_value_tokens
                .as_deref()
                .map(collapse_tokens)
                .unwrap_or(name)
        } else if arg.was_reference {
            format!("*{name}")
        } else {
            name
        };
        call_args.push(expr);
    }

    let target = if function.is_destructor {
        let class_name = class_name_of(dom, function).unwrap_or_default();
        format!("self->~{class_name}")
    } else if function.is_by_value_constructor {
        class_name_of(dom, function).unwrap_or_else(|| leaf.clone())
    } else if has_self {
        format!("self->{leaf}")
    } else {
        original_name.clone()
    };

    let returns_value = function
        .return_type
        .as_ref()
        .is_some_and(|ty| ty.to_c_string() != "void")
        && !function.is_destructor;

    if varargs {
        // Forward the variable arguments through the `va_list` variant of the
        // original function
        let list_suffix = custom_varargs_list_suffixes
            .get(&leaf)
            .cloned()
            .unwrap_or_else(|| "V".to_string());
        let last_named = function
            .arguments
            .iter()
            .rev()
            .find(|arg| !arg.is_varargs && !arg.is_implicit_default)
            .and_then(|arg| arg.name.clone())
            .unwrap_or_default();
        let call = format!("{target}{list_suffix}({}, args)", call_args.join(", "));
        out.push_str(&format!("{indent}va_list args;\n"));
        out.push_str(&format!("{indent}va_start(args, {last_named});\n"));
        if returns_value {
            let return_type = function.return_type.as_ref().unwrap().to_c_string();
            out.push_str(&format!("{indent}{return_type} result = {call};\n"));
            out.push_str(&format!("{indent}va_end(args);\n"));
            out.push_str(&format!("{indent}return result;\n"));
        } else {
            out.push_str(&format!("{indent}{call};\n"));
            out.push_str(&format!("{indent}va_end(args);\n"));
        }
        return;
    }

    let call = if function.is_by_value_constructor {
        format!("{target}({})", call_args.join(", "))
    } else if function.is_destructor {
        format!("{target}()")
    } else {
        format!("{target}({})", call_args.join(", "))
    };
    if returns_value {
        out.push_str(&format!("{indent}return {call};\n"));
    } else {
        out.push_str(&format!("{indent}{call};\n"));
    }
}

/// The name of the class a flattened member function originally belonged to.
fn class_name_of(dom: &Dom, function: &Function) -> Option<String> {
    let class_id = function.original_class?;
    match &dom.try_node(class_id)?.element {
        Element::Class(class) => Some(class.name.clone()),
        _ => None,
    }
}
