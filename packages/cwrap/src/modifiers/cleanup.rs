//! Structural cleanup passes: discarding bodies, attaching comments, and
//! removing declarations the C API cannot or should not carry.

use crate::element::{Comment, Dom, Element, Include, NodeId};

/// Discards every function body and constructor initialiser list. Bodies are
/// never translated; the C header carries declarations only and the thunk
/// layer supplies the implementations.
pub fn remove_function_bodies(dom: &mut Dom) {
    for id in dom.all_functions() {
        if let Element::Function(function) = dom.element_mut(id) {
            function.body = None;
            function.initialiser_list_tokens = None;
        }
    }
}

/// Moves freestanding comments onto the declarations they describe: a
/// comment on the same line as the preceding declaration becomes its attached
/// comment, and comments on the lines immediately above a declaration (with
/// no blank-line separation) become its preceding comments.
pub fn attach_preceding_comments(dom: &mut Dom) {
    let mut containers = dom.descendants(dom.root());
    containers.push(dom.root());
    for container in containers {
        let list_count = dom.element(container).child_lists().len();
        for list_index in 0..list_count {
            attach_in_list(dom, container, list_index);
        }
    }
}

fn attach_in_list(dom: &mut Dom, container: NodeId, list_index: usize) {
    let children = dom.element(container).child_lists()[list_index].clone();
    // Comments waiting for a declaration to follow them
    let mut pending: Vec<NodeId> = Vec::new();
    let mut kept: Vec<NodeId> = Vec::new();
    let mut last_kept_decl: Option<NodeId> = None;

    for child in children {
        match dom.element(child) {
            Element::Comment(_) => {
                let comment = match dom.element(child) {
                    Element::Comment(comment) => comment.clone(),
                    _ => unreachable!(),
                };
                // Same-line trailing comment for the previous declaration
                if let Some(prev) = last_kept_decl {
                    if dom.node(prev).line == comment.line
                        && dom.node(prev).attached_comment.is_none()
                    {
                        dom.node_mut(prev).attached_comment = Some(comment);
                        continue;
                    }
                }
                pending.push(child);
            }
            Element::BlankLines(_) => {
                // Blank lines sever pending comments from whatever follows
                kept.append(&mut pending);
                kept.push(child);
                last_kept_decl = None;
            }
            Element::Function(_)
            | Element::Field(_)
            | Element::Class(_)
            | Element::Enum(_)
            | Element::EnumElement(_)
            | Element::Typedef(_)
            | Element::Define(_) => {
                let comments = pending
                    .drain(..)
                    .map(|comment_id| match dom.element(comment_id) {
                        Element::Comment(comment) => comment.clone(),
                        _ => unreachable!(),
                    })
                    .collect::<Vec<Comment>>();
                dom.node_mut(child).preceding_comments.extend(comments);
                kept.push(child);
                last_kept_decl = Some(child);
            }
            _ => {
                kept.append(&mut pending);
                kept.push(child);
                last_kept_decl = None;
            }
        }
    }
    kept.append(&mut pending);

    // Anything no longer in the list was absorbed into a declaration; clear
    // its parent link so it counts as detached
    let original = std::mem::replace(
        dom.node_mut(container).element.child_lists_mut()[list_index],
        kept.clone(),
    );
    for child in original {
        if !kept.contains(&child) {
            dom.node_mut(child).parent = None;
        }
    }
}

/// Deletes the listed struct/class/union declarations (forward declarations
/// included) and all their descendants.
pub fn remove_structs(dom: &mut Dom, names: &[&str]) {
    for id in dom.all_classes() {
        if let Element::Class(class) = dom.element(id) {
            if names.contains(&class.name.as_str()) {
                dom.detach(id);
            }
        }
    }
}

/// Deletes functions by fully-qualified C++ name (e.g. `ImGui::Value`).
pub fn remove_functions(dom: &mut Dom, qualified_names: &[&str]) {
    for id in dom.all_functions() {
        let fqn = dom.fully_qualified_name(id, false, true);
        if qualified_names.contains(&fqn.as_str()) {
            dom.detach(id);
        }
    }
}

/// Deletes every operator overload; C has no spelling for them.
pub fn remove_operators(dom: &mut Dom) {
    for id in dom.all_functions() {
        if let Element::Function(function) = dom.element(id) {
            if function.is_operator {
                dom.detach(id);
            }
        }
    }
}

/// Deletes constructors and destructors of classes not marked by-value: they
/// cannot be exposed to C without a `new`/`delete` analogue.
pub fn remove_heap_constructors_and_destructors(dom: &mut Dom) {
    for id in dom.all_functions() {
        let Element::Function(function) = dom.element(id) else {
            continue;
        };
        if !function.is_constructor && !function.is_destructor {
            continue;
        }
        let by_value = dom
            .parent_class(id)
            .is_some_and(|class_id| match dom.element(class_id) {
                Element::Class(class) => class.is_by_value,
                _ => false,
            });
        if !by_value {
            dom.detach(id);
        }
    }
}

/// Strips all member functions from the listed classes.
pub fn remove_all_functions_from_classes(dom: &mut Dom, names: &[&str]) {
    for id in dom.all_functions() {
        let in_listed_class = dom
            .parent_class(id)
            .is_some_and(|class_id| match dom.element(class_id) {
                Element::Class(class) => names.contains(&class.name.as_str()),
                _ => false,
            });
        if in_listed_class {
            dom.detach(id);
        }
    }
}

/// Deletes static data members; they have no C equivalent in a struct layout.
pub fn remove_static_fields(dom: &mut Dom) {
    for id in dom.descendants(dom.root()) {
        if let Element::Field(field) = dom.element(id) {
            if field.is_static {
                dom.detach(id);
            }
        }
    }
}

/// Deletes typedefs declared inside classes.
pub fn remove_nested_typedefs(dom: &mut Dom) {
    for id in dom.descendants(dom.root()) {
        if matches!(dom.element(id), Element::Typedef(_)) && dom.parent_class(id).is_some() {
            dom.detach(id);
        }
    }
}

/// Removes every `#pragma once`. Off by default in the standard pipeline on
/// the assumption that modern compilers all support it.
pub fn remove_pragma_once(dom: &mut Dom) {
    for id in dom.descendants(dom.root()) {
        if matches!(dom.element(id), Element::PragmaOnce) {
            dom.detach(id);
        }
    }
}

/// Removes includes whose literal text matches one of `targets`.
pub fn remove_includes(dom: &mut Dom, targets: &[&str]) {
    for id in dom.descendants(dom.root()) {
        if let Element::Include(include) = dom.element(id) {
            if targets.contains(&include.text.as_str()) {
                dom.detach(id);
            }
        }
    }
}

/// Adds includes at the top of every header file, after any `#pragma once`.
pub fn add_includes(dom: &mut Dom, targets: &[&str]) {
    let files = match dom.element(dom.root()) {
        Element::HeaderFileSet(set) => set.files.clone(),
        _ => return,
    };
    for file in files {
        let children = dom.element(file).child_lists()[0].clone();
        let anchor = children
            .iter()
            .take_while(|&&child| matches!(dom.element(child), Element::PragmaOnce))
            .last()
            .copied();
        let mut previous = anchor;
        for target in targets {
            let include = dom.alloc_element(
                Element::Include(Include {
                    text: (*target).to_string(),
                }),
                0,
            );
            match previous {
                Some(prev) => dom.insert_after(prev, include),
                None => {
                    // No pragma to anchor on: insert at the very top
                    match children.first() {
                        Some(&first) => dom.insert_before(first, include),
                        None => dom.add_child(file, include),
                    }
                }
            }
            previous = Some(include);
        }
    }
}

/// Prunes conditionals whose branches are empty (or contain nothing but
/// blank lines) after the earlier passes ran.
pub fn remove_empty_conditionals(dom: &mut Dom) {
    loop {
        let mut changed = false;
        for id in dom.descendants(dom.root()) {
            if let Element::Conditional(cond) = dom.element(id) {
                let empty = cond
                    .then_children
                    .iter()
                    .chain(&cond.else_children)
                    .all(|&child| matches!(dom.element(child), Element::BlankLines(_)));
                if empty {
                    dom.detach(id);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Collapses consecutive blank-line nodes into one, summing their counts.
pub fn merge_blank_lines(dom: &mut Dom) {
    let mut containers = dom.descendants(dom.root());
    containers.push(dom.root());
    for container in containers {
        let list_count = dom.element(container).child_lists().len();
        for list_index in 0..list_count {
            let children = dom.element(container).child_lists()[list_index].clone();
            let mut absorber: Option<NodeId> = None;
            for child in children {
                match dom.element(child) {
                    Element::BlankLines(count) => {
                        let count = *count;
                        match absorber {
                            Some(first) => {
                                if let Element::BlankLines(total) = dom.element_mut(first) {
                                    *total += count;
                                }
                                dom.detach(child);
                            }
                            None => absorber = Some(child),
                        }
                    }
                    _ => absorber = None,
                }
            }
        }
    }
}

/// Removes every blank-line node from the tree.
pub fn remove_blank_lines(dom: &mut Dom) {
    for id in dom.descendants(dom.root()) {
        if matches!(dom.element(id), Element::BlankLines(_)) {
            dom.detach(id);
        }
    }
}
