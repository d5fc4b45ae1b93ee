//! Name synthesis passes: prefixing, define renaming, default-argument
//! overload expansion, and overload disambiguation.

use super::sanitise_name_for_identifier;
use crate::element::{Dom, Element, NodeId};
use crate::error::TransformError;
use crate::write::{function_signature, WriteContext};
use indexmap::IndexMap;

/// Prepends `prefix` to the name of every function at file or conditional
/// scope (not inside a namespace or class).
pub fn add_prefix_to_loose_functions(dom: &mut Dom, prefix: &str) {
    for id in dom.all_functions() {
        let mut in_scope = false;
        let mut current = dom.parent(id);
        while let Some(cur) = current {
            if matches!(dom.element(cur), Element::Class(_) | Element::Namespace(_)) {
                in_scope = true;
                break;
            }
            current = dom.parent(cur);
        }
        if !in_scope {
            if let Element::Function(function) = dom.element_mut(id) {
                function.name.insert_str(0, prefix);
            }
        }
    }
}

/// Sets the API-annotation flag on every remaining function, so the C header
/// declares them all under the C API define.
pub fn make_all_functions_use_imgui_api(dom: &mut Dom) {
    for id in dom.all_functions() {
        if let Element::Function(function) = dom.element_mut(id) {
            function.is_imgui_api = true;
        }
    }
}

/// Renames `#define` macros per `map` and rewrites every reference to them
/// in other defines, conditional expressions, and type names.
pub fn rename_defines(dom: &mut Dom, map: &IndexMap<String, String>) {
    for id in dom.descendants(dom.root()) {
        match dom.element_mut(id) {
            Element::Define(define) => {
                if let Some(new_name) = map.get(&define.name) {
                    define.name = new_name.clone();
                }
                for tok in &mut define.content_tokens {
                    if let Some(new_name) = map.get(&tok.text) {
                        tok.text = new_name.clone();
                    }
                }
            }
            Element::Conditional(cond) => {
                for tok in &mut cond.condition_tokens {
                    if let Some(new_name) = map.get(&tok.text) {
                        tok.text = new_name.clone();
                    }
                }
            }
            _ => {}
        }
    }
    dom.for_each_type_mut(|ty| {
        if let Some(new_name) = map.get(&ty.name) {
            ty.name = new_name.clone();
        }
    });
}

/// For every function with k defaulted arguments, emits k additional
/// overloads that progressively omit trailing defaulted arguments (marking
/// them implicit so the thunks can still materialize the default values).
/// The overloads share the original's name and are flagged as generated, and
/// are emitted before disambiguation so it sees them as ordinary overloads.
pub fn generate_default_argument_functions(dom: &mut Dom) {
    for id in dom.all_functions() {
        let Element::Function(function) = dom.element(id) else {
            continue;
        };
        if function.is_manual_helper {
            continue;
        }
        let defaulted = function
            .arguments
            .iter()
            .filter(|arg| arg.default_value_tokens.is_some())
            .count();
        if defaulted == 0 {
            continue;
        }
        let mut anchor = id;
        for omit in 1..=defaulted {
            let clone = dom.clone_subtree(id);
            let node = dom.node_mut(clone);
            node.preceding_comments.clear();
            node.attached_comment = None;
            if let Element::Function(generated) = &mut node.element {
                generated.is_default_argument_helper = true;
                let mut remaining = omit;
                for arg in generated.arguments.iter_mut().rev() {
                    if remaining == 0 {
                        break;
                    }
                    if arg.default_value_tokens.is_some() {
                        arg.is_implicit_default = true;
                        remaining -= 1;
                    }
                }
            }
            dom.insert_after(anchor, clone);
            anchor = clone;
        }
    }
}

/// Rewrites overloaded function names to pairwise-distinct identifiers usable
/// from C.
///
/// Functions are grouped by current name; within each group of two or more,
/// the common-prefix arity is computed over the printed argument types, the
/// shortest-arity function keeps its name (ties broken by input order), and
/// every other function gains a suffix synthesized from its non-common
/// arguments: a remap-table hit is used verbatim, otherwise the primary type
/// name is capitalized (with `Ptr` appended for pointer types) and sanitized
/// to an identifier. If exactly two functions still collide and their return
/// types differ only in constness, the const one gains `_Const`. Any
/// remaining collision aborts the run, except for names in `ignore_list`,
/// which are documented false positives that vary across preprocessor
/// configurations.
pub fn disambiguate_functions(
    dom: &mut Dom,
    name_suffix_remaps: &IndexMap<String, String>,
    functions_to_ignore: &[&str],
) -> Result<(), TransformError> {
    let mut functions_by_name: IndexMap<String, Vec<NodeId>> = IndexMap::new();
    for id in dom.all_functions() {
        if let Element::Function(function) = dom.element(id) {
            functions_by_name
                .entry(function.name.clone())
                .or_default()
                .push(id);
        }
    }

    for (_, group) in functions_by_name {
        if group.len() < 2 {
            continue;
        }

        // The printed types of each function's explicit arguments, and
        // whether each argument is varargs (never suffixed)
        let signatures = group
            .iter()
            .map(|&id| match dom.element(id) {
                Element::Function(function) => function
                    .explicit_arguments()
                    .map(|arg| (arg.arg_type.to_c_string(), arg.is_varargs))
                    .collect::<Vec<_>>(),
                _ => unreachable!(),
            })
            .collect::<Vec<_>>();

        // Count the arguments that are identical across all overloads
        let mut num_common_args = 0;
        'common: while num_common_args < signatures[0].len() {
            for signature in &signatures {
                if num_common_args >= signature.len()
                    || signature[num_common_args].0 != signatures[0][num_common_args].0
                {
                    break 'common;
                }
            }
            num_common_args += 1;
        }

        // The function with the fewest arguments keeps its name
        let lowest = group
            .iter()
            .enumerate()
            .min_by_key(|(index, _)| signatures[*index].len())
            .map(|(index, _)| index)
            .unwrap_or(0);

        for (index, &id) in group.iter().enumerate() {
            if index == lowest {
                continue;
            }
            let Element::Function(function) = dom.element(id) else {
                continue;
            };
            let mut suffix = String::new();
            for (printed, is_varargs) in signatures[index].iter().skip(num_common_args) {
                if *is_varargs {
                    continue;
                }
                let suffix_name = match name_suffix_remaps.get(printed) {
                    Some(remapped) => remapped.clone(),
                    None => {
                        let arg = function
                            .explicit_arguments()
                            .find(|arg| arg.arg_type.to_c_string() == *printed);
                        let mut name = arg
                            .map(|arg| arg.arg_type.primary_type_name().to_string())
                            .unwrap_or_else(|| printed.clone());
                        if let Some(first) = name.get(0..1) {
                            let capitalised = first.to_ascii_uppercase();
                            name.replace_range(0..1, &capitalised);
                        }
                        if printed.ends_with('*') {
                            name.push_str("Ptr");
                        }
                        name
                    }
                };
                suffix.push_str(&sanitise_name_for_identifier(&suffix_name));
            }
            if let Element::Function(function) = dom.element_mut(id) {
                function.name.push_str(&suffix);
            }
        }

        // If exactly two functions still clash and their return types differ
        // only in constness, `_Const` breaks the tie
        if group.len() == 2 {
            let names = group
                .iter()
                .map(|&id| match dom.element(id) {
                    Element::Function(function) => function.name.clone(),
                    _ => unreachable!(),
                })
                .collect::<Vec<_>>();
            if names[0] == names[1] {
                let consts = group
                    .iter()
                    .map(|&id| match dom.element(id) {
                        Element::Function(function) => function
                            .return_type
                            .as_ref()
                            .is_some_and(|return_type| return_type.is_const()),
                        _ => unreachable!(),
                    })
                    .collect::<Vec<_>>();
                if consts[0] != consts[1] {
                    let const_one = if consts[0] { group[0] } else { group[1] };
                    if let Element::Function(function) = dom.element_mut(const_one) {
                        function.name.push_str("_Const");
                    }
                }
            }
        }

        // Verify the collisions within this group are resolved. (Cross-group
        // collisions are not checked here; they are rare and caught at
        // emission time.)
        let mut new_names: IndexMap<String, NodeId> = IndexMap::new();
        for &id in &group {
            let Element::Function(function) = dom.element(id) else {
                continue;
            };
            if new_names.contains_key(&function.name)
                && !functions_to_ignore.contains(&function.name.as_str())
            {
                let ctx = WriteContext::default();
                let signatures = group
                    .iter()
                    .map(|&id| match dom.element(id) {
                        Element::Function(function) => {
                            function_signature(dom, id, function, &ctx)
                        }
                        _ => unreachable!(),
                    })
                    .collect::<Vec<_>>();
                return Err(TransformError::UnresolvedOverloadCollision { signatures });
            }
            new_names.insert(function.name.clone(), id);
        }
    }

    Ok(())
}
