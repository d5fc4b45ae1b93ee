//! Flattening passes: folding conditionals, hoisting namespaces, nested
//! classes, and member functions to the top level, and expanding template
//! instantiations into concrete structs. These are order-sensitive; the
//! pipeline runs them in a fixed sequence.

use crate::element::{Accessibility, ConditionalKind, Dom, Element, FunctionArgument, NodeId};
use crate::token::TokenKind;
use crate::types::{Pointer, TypeExpr};
use indexmap::{IndexMap, IndexSet};

/// Statically evaluates every conditional that tests `symbol`, assuming the
/// symbol is defined (or not) per `defined`: the surviving branch's children
/// are lifted into the parent at the conditional's position and the
/// conditional itself is dropped.
///
/// Only single-symbol tests are folded (`#ifdef S`, `#ifndef S`,
/// `#if defined(S)`, `#if !defined(S)`); compound conditions are left alone.
pub fn flatten_conditionals(dom: &mut Dom, symbol: &str, defined: bool) {
    loop {
        let target = dom.descendants(dom.root()).into_iter().find_map(|id| {
            let Element::Conditional(cond) = dom.element(id) else {
                return None;
            };
            let mut tokens = cond
                .condition_tokens
                .iter()
                .filter(|tok| {
                    !matches!(tok.kind, TokenKind::LineComment | TokenKind::BlockComment)
                })
                .map(|tok| tok.text.as_str());
            let truth = match cond.kind {
                ConditionalKind::Ifdef => {
                    (tokens.next() == Some(symbol) && tokens.next().is_none()).then_some(defined)
                }
                ConditionalKind::Ifndef => {
                    (tokens.next() == Some(symbol) && tokens.next().is_none()).then_some(!defined)
                }
                ConditionalKind::If => {
                    let collected = tokens.collect::<Vec<_>>();
                    match collected.as_slice() {
                        ["defined", "(", s, ")"] if *s == symbol => Some(defined),
                        ["!", "defined", "(", s, ")"] if *s == symbol => Some(!defined),
                        _ => None,
                    }
                }
            };
            truth.map(|truth| (id, truth))
        });
        let Some((id, truth)) = target else { break };

        let mut lists = dom.take_child_lists(id);
        let else_children = lists.pop().unwrap_or_default();
        let then_children = lists.pop().unwrap_or_default();
        let survivors = if truth { then_children } else { else_children };
        for child in survivors {
            dom.insert_before(id, child);
        }
        dom.detach(id);
    }
}

/// Flattens every namespace whose name is a key of `map`: its children move
/// to the namespace's parent and named declarations get `map[name]` prefixed.
/// Nested namespaces flatten outside-in, each applying its own prefix.
pub fn flatten_namespaces(dom: &mut Dom, map: &IndexMap<String, String>) {
    loop {
        let target = dom.descendants(dom.root()).into_iter().find(|&id| {
            matches!(dom.element(id), Element::Namespace(ns) if map.contains_key(&ns.name))
        });
        let Some(id) = target else { break };

        let prefix = match dom.element(id) {
            Element::Namespace(ns) => map[&ns.name].clone(),
            _ => unreachable!(),
        };
        let children = dom.take_child_lists(id).pop().unwrap_or_default();
        for &child in &children {
            prefix_names(dom, child, &prefix);
        }
        for child in children {
            dom.insert_before(id, child);
        }
        dom.detach(id);
    }
}

/// Prefixes the names of the declaration at `id`, recursing into conditionals
/// (whose guarded declarations belong to the same scope) but not into nested
/// namespaces, which flatten with their own prefix.
fn prefix_names(dom: &mut Dom, id: NodeId, prefix: &str) {
    if matches!(dom.element(id), Element::Conditional(_)) {
        let children = dom
            .element(id)
            .child_lists()
            .into_iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>();
        for child in children {
            prefix_names(dom, child, prefix);
        }
        return;
    }
    match dom.element_mut(id) {
        Element::Function(function) => function.name.insert_str(0, prefix),
        Element::Class(class) => class.name.insert_str(0, prefix),
        Element::Enum(decl) => decl.name.insert_str(0, prefix),
        Element::Typedef(td) => td.name.insert_str(0, prefix),
        _ => {}
    }
}

/// Hoists classes declared inside other classes to the enclosing scope,
/// renaming them `Outer_Inner` and rewriting every type reference to the
/// nested name accordingly.
pub fn flatten_nested_classes(dom: &mut Dom) {
    loop {
        let target = dom.descendants(dom.root()).into_iter().find(|&id| {
            matches!(dom.element(id), Element::Class(_)) && dom.parent_class(id).is_some()
        });
        let Some(id) = target else { break };

        let outer = dom.parent_class(id).unwrap();
        let outer_name = match dom.element(outer) {
            Element::Class(class) => class.name.clone(),
            _ => unreachable!(),
        };
        let old_name = match dom.element(id) {
            Element::Class(class) => class.name.clone(),
            _ => unreachable!(),
        };
        let new_name = format!("{outer_name}_{old_name}");
        if let Element::Class(class) = dom.element_mut(id) {
            class.name = new_name.clone();
        }
        dom.for_each_type_mut(|ty| {
            if ty.name == old_name {
                ty.name = new_name.clone();
            }
        });
        dom.detach(id);
        dom.insert_before(outer, id);
    }
}

/// Lifts every member function to the enclosing scope as `Class_Name`. For
/// non-static members a leading `self` parameter of pointer-to-class type is
/// injected (const-qualified for const member functions); constructors of
/// by-value classes instead return the class by value. Non-public members of
/// `class`-kind declarations are dropped, since C callers could never
/// legally reach them.
pub fn flatten_class_functions(dom: &mut Dom) {
    for class_id in dom.all_classes() {
        let (class_name, is_by_value, is_forward) = match dom.element(class_id) {
            Element::Class(class) => (
                class.name.clone(),
                class.is_by_value,
                class.is_forward_declaration,
            ),
            _ => continue,
        };
        if is_forward || class_name.is_empty() {
            continue;
        }
        let members = dom.element(class_id).child_lists()[0]
            .iter()
            .copied()
            .filter(|&child| matches!(dom.element(child), Element::Function(_)))
            .collect::<Vec<_>>();
        let mut anchor = class_id;
        for member in members {
            let Element::Function(function) = dom.element(member) else {
                continue;
            };
            if matches!(
                function.accessibility,
                Some(Accessibility::Protected) | Some(Accessibility::Private)
            ) {
                dom.detach(member);
                continue;
            }

            dom.detach(member);
            let Element::Function(function) = dom.element_mut(member) else {
                unreachable!()
            };
            function.original_class = Some(class_id);

            let leaf = function.name.trim_start_matches('~').to_string();
            if function.is_destructor {
                function.name = format!("{class_name}_Destroy");
                function.return_type = Some(TypeExpr::named("void"));
            } else {
                function.name = format!("{class_name}_{leaf}");
            }

            if function.is_constructor && is_by_value {
                function.is_by_value_constructor = true;
                function.return_type = Some(TypeExpr::named(class_name.clone()));
            } else if !function.is_static && !function.is_constructor {
                let self_type = TypeExpr {
                    is_const: function.is_const,
                    name: class_name.clone(),
                    pointers: vec![Pointer { is_const: false }],
                    ..TypeExpr::default()
                };
                function.arguments.insert(
                    0,
                    FunctionArgument {
                        name: Some("self".to_string()),
                        arg_type: self_type,
                        ..FunctionArgument::default()
                    },
                );
            }
            // These have done their job selecting the self type and would
            // only produce invalid C if left set
            function.is_const = false;
            function.is_static = false;

            dom.insert_after(anchor, member);
            anchor = member;
        }
    }
}

/// Replaces every template instantiation referenced in the tree with a
/// concrete, uniquely-named struct carrying the type substitutions, then
/// removes the template declarations themselves.
///
/// `custom_type_fudges` maps a printed type form to the form to use in the
/// resulting C signature; it exists because some substitutions (notably
/// pointer arguments into pointer-typed parameters) would otherwise print a
/// type that parses differently than intended (`const ImFont**` vs
/// `ImFont* const*`).
pub fn flatten_templates(dom: &mut Dom, custom_type_fudges: &IndexMap<String, String>) {
    // Template classes by name
    let mut templates: IndexMap<String, NodeId> = IndexMap::new();
    for id in dom.all_classes() {
        if let Element::Class(class) = dom.element(id) {
            if !class.template_params.is_empty() && !class.is_forward_declaration {
                templates.insert(class.name.clone(), id);
            }
        }
    }
    if templates.is_empty() {
        return;
    }

    // Every distinct instantiation, keyed by concrete name, in order of
    // first appearance
    let mut instantiations: IndexMap<String, (NodeId, Vec<TypeExpr>)> = IndexMap::new();
    let template_names = templates.keys().cloned().collect::<IndexSet<_>>();
    dom.for_each_type_mut(|ty| {
        if ty.has_template_args && template_names.contains(&ty.name) {
            let concrete = concrete_template_name(&ty.name, &ty.template_args);
            instantiations
                .entry(concrete.clone())
                .or_insert_with(|| (templates[&ty.name], ty.template_args.clone()));
            // Rewrite the reference to the flattened name, keeping any outer
            // pointer/reference decoration
            ty.name = concrete;
            ty.template_args.clear();
            ty.has_template_args = false;
        }
    });

    // Synthesize one concrete class per instantiation, placed where the
    // template was declared so every later reference sees it
    for (concrete_name, (template_id, args)) in &instantiations {
        let params = match dom.element(*template_id) {
            Element::Class(class) => class.template_params.clone(),
            _ => continue,
        };
        let clone = dom.clone_subtree(*template_id);
        if let Element::Class(class) = dom.element_mut(clone) {
            class.name = concrete_name.clone();
            class.template_params.clear();
        }
        substitute_template_params(dom, clone, &params, args, custom_type_fudges);
        dom.insert_before(*template_id, clone);
    }

    for (_, template_id) in templates {
        dom.detach(template_id);
    }
}

/// Builds the unique C name for a template instantiation
/// (`ImVector<ImFont*>` becomes `ImVector_ImFontPtr`).
fn concrete_template_name(template: &str, args: &[TypeExpr]) -> String {
    if args.is_empty() {
        return template.to_string();
    }
    let suffix = args
        .iter()
        .map(|arg| arg.to_c_string().replace('*', "Ptr").replace(' ', "_"))
        .collect::<Vec<_>>()
        .join("_");
    format!("{template}_{suffix}")
}

/// Substitutes template parameter names with their concrete argument types
/// throughout a cloned template body, applying the string-level type fudges
/// where the natural substitution would print incorrectly.
fn substitute_template_params(
    dom: &mut Dom,
    root: NodeId,
    params: &[String],
    args: &[TypeExpr],
    custom_type_fudges: &IndexMap<String, String>,
) {
    let in_subtree: IndexSet<NodeId> = {
        let mut set = IndexSet::from([root]);
        set.extend(dom.descendants(root));
        set
    };
    // for_each_type_mut walks from the tree root, so restrict to the clone
    let mut ids = in_subtree.into_iter().collect::<Vec<_>>();
    ids.sort_by_key(|id| id.0);
    for id in ids {
        let substitute = |ty: &mut TypeExpr| {
            let Some(index) = params.iter().position(|param| *param == ty.name) else {
                return;
            };
            let Some(arg) = args.get(index) else { return };
            let mut merged = arg.clone();
            merged.is_const |= ty.is_const;
            merged.is_volatile |= ty.is_volatile;
            merged.pointers.extend(ty.pointers.iter().cloned());
            merged.is_reference |= ty.is_reference;
            merged.array_bounds.extend(ty.array_bounds.iter().cloned());
            if let Some(fudged) = custom_type_fudges.get(&merged.to_c_string()) {
                merged = TypeExpr::raw(fudged.clone());
            }
            *ty = merged;
        };
        match dom.element_mut(id) {
            Element::Function(function) => {
                if let Some(return_type) = &mut function.return_type {
                    substitute(return_type);
                }
                for arg in &mut function.arguments {
                    substitute(&mut arg.arg_type);
                }
            }
            Element::Field(field) => substitute(&mut field.field_type),
            Element::Typedef(td) => substitute(&mut td.underlying),
            _ => {}
        }
    }
}
