//! Signature transforms: reference C-ification and the marker passes that
//! downstream passes and the metadata emitter consume.

use crate::element::{Dom, Element};

/// Rewrites every `T&` argument or return type into `T*`. Converted arguments
/// are flagged so the thunk layer knows to dereference when calling back into
/// the C++ API.
pub fn convert_references_to_pointers(dom: &mut Dom) {
    for id in dom.all_functions() {
        let Element::Function(function) = dom.element_mut(id) else {
            continue;
        };
        if let Some(return_type) = &mut function.return_type {
            return_type.reference_to_pointer();
        }
        for arg in &mut function.arguments {
            if arg.arg_type.is_reference() {
                arg.arg_type.reference_to_pointer();
                arg.was_reference = true;
            }
        }
    }
}

/// Marks the listed struct declarations as by-value: their instances are
/// passed and returned by value in the generated C API, and their
/// constructors survive as value-returning functions.
pub fn mark_by_value_structs(dom: &mut Dom, by_value_structs: &[&str]) {
    for id in dom.all_classes() {
        if let Element::Class(class) = dom.element_mut(id) {
            if by_value_structs.contains(&class.name.as_str()) {
                class.is_by_value = true;
            }
        }
    }
}

/// Flags fields whose comments carry an `[Internal]` marker, so the metadata
/// emitter can filter them out of the public surface.
pub fn mark_internal_members(dom: &mut Dom) {
    for id in dom.descendants(dom.root()) {
        if !matches!(dom.element(id), Element::Field(_)) {
            continue;
        }
        let node = dom.node(id);
        let marked = node
            .preceding_comments
            .iter()
            .chain(node.attached_comment.as_ref())
            .any(|comment| comment.text.contains("[Internal]"));
        if marked {
            if let Element::Field(field) = dom.element_mut(id) {
                field.is_internal = true;
            }
        }
    }
}
