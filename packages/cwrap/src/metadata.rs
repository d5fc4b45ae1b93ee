//! The metadata emitter: a JSON description of the converted surface for
//! downstream binding generators.
//!
//! This consumes both the modified tree and the unmodified snapshot taken
//! before the pipeline ran, so each function can carry its pre-modification
//! C++ signature alongside the flattened C one.

use crate::element::{Dom, Element};
use crate::token::collapse_tokens;
use crate::write::{function_signature, WriteContext};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub defines: Vec<DefineMetadata>,
    pub enums: Vec<EnumMetadata>,
    pub typedefs: Vec<TypedefMetadata>,
    pub structs: Vec<StructMetadata>,
    pub functions: Vec<FunctionMetadata>,
}

#[derive(Debug, Serialize)]
pub struct DefineMetadata {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct EnumMetadata {
    pub name: String,
    pub storage_type: Option<String>,
    pub elements: Vec<EnumElementMetadata>,
}

#[derive(Debug, Serialize)]
pub struct EnumElementMetadata {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TypedefMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub underlying_type: String,
}

#[derive(Debug, Serialize)]
pub struct StructMetadata {
    pub name: String,
    pub kind: String,
    pub by_value: bool,
    pub forward_declaration: bool,
    pub fields: Vec<FieldMetadata>,
}

#[derive(Debug, Serialize)]
pub struct FieldMetadata {
    pub names: Vec<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    pub array_bounds: Option<String>,
    pub width: Option<u32>,
    pub is_internal: bool,
}

#[derive(Debug, Serialize)]
pub struct FunctionMetadata {
    pub name: String,
    /// The fully-qualified C++ name this function had before modification,
    /// absent for injected helpers.
    pub original_fully_qualified_name: Option<String>,
    /// The original C++ declaration, printed from the unmodified snapshot.
    pub original_signature: Option<String>,
    pub return_type: Option<String>,
    pub arguments: Vec<ArgumentMetadata>,
    pub is_default_argument_helper: bool,
    pub is_manual_helper: bool,
    pub is_unformatted_helper: bool,
    pub is_imstr_helper: bool,
}

#[derive(Debug, Serialize)]
pub struct ArgumentMetadata {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub argument_type: String,
    pub default_value: Option<String>,
    pub is_varargs: bool,
    pub is_implicit_default: bool,
}

/// Builds the metadata document from the converted tree.
pub fn generate(dom: &Dom) -> Metadata {
    let mut metadata = Metadata {
        defines: Vec::new(),
        enums: Vec::new(),
        typedefs: Vec::new(),
        structs: Vec::new(),
        functions: Vec::new(),
    };
    let cpp = WriteContext::default();

    for id in dom.descendants(dom.root()) {
        match dom.element(id) {
            Element::Define(define) => {
                if define.exclude_from_metadata || define.is_undef {
                    continue;
                }
                metadata.defines.push(DefineMetadata {
                    name: define.name.clone(),
                    content: collapse_tokens(&define.content_tokens),
                });
            }
            Element::Enum(decl) => {
                let elements = decl
                    .elements
                    .iter()
                    .filter_map(|&child| match dom.element(child) {
                        Element::EnumElement(elem) => Some(EnumElementMetadata {
                            name: elem.name.clone(),
                            value: elem.value_tokens.as_deref().map(collapse_tokens),
                        }),
                        _ => None,
                    })
                    .collect();
                metadata.enums.push(EnumMetadata {
                    name: decl.name.clone(),
                    storage_type: decl.storage_type.as_ref().map(|ty| ty.to_c_string()),
                    elements,
                });
            }
            Element::Typedef(td) => {
                metadata.typedefs.push(TypedefMetadata {
                    name: td.name.clone(),
                    underlying_type: td.underlying.to_c_string(),
                });
            }
            Element::Class(class) => {
                let fields = class
                    .children
                    .iter()
                    .filter_map(|&child| match dom.element(child) {
                        Element::Field(field) => Some(FieldMetadata {
                            names: field.names.clone(),
                            field_type: field.field_type.to_c_string(),
                            array_bounds: if field.field_type.is_array() {
                                Some(field.field_type.array_suffix())
                            } else {
                                None
                            },
                            width: field.bitfield_width,
                            is_internal: field.is_internal,
                        }),
                        _ => None,
                    })
                    .collect();
                metadata.structs.push(StructMetadata {
                    name: class.name.clone(),
                    kind: class.kind.keyword().to_string(),
                    by_value: class.is_by_value,
                    forward_declaration: class.is_forward_declaration,
                    fields,
                });
            }
            Element::Function(function) => {
                let original_signature = dom.unmodified().and_then(|snapshot| {
                    let node = snapshot.try_node(id)?;
                    match &node.element {
                        Element::Function(original) => {
                            Some(function_signature(snapshot, id, original, &cpp))
                        }
                        _ => None,
                    }
                });
                let arguments = function
                    .arguments
                    .iter()
                    .map(|arg| ArgumentMetadata {
                        name: arg.name.clone(),
                        argument_type: arg.arg_type.to_c_string(),
                        default_value: arg.default_value_tokens.as_deref().map(collapse_tokens),
                        is_varargs: arg.is_varargs,
                        is_implicit_default: arg.is_implicit_default,
                    })
                    .collect();
                metadata.functions.push(FunctionMetadata {
                    name: function.name.clone(),
                    original_fully_qualified_name: function.original_name.clone(),
                    original_signature,
                    return_type: function.return_type.as_ref().map(|ty| ty.to_c_string()),
                    arguments,
                    is_default_argument_helper: function.is_default_argument_helper,
                    is_manual_helper: function.is_manual_helper,
                    is_unformatted_helper: function.is_unformatted_helper,
                    is_imstr_helper: function.is_imstr_helper,
                });
            }
            _ => {}
        }
    }

    metadata
}

/// Serializes the metadata document to pretty-printed JSON.
pub fn to_json_string(metadata: &Metadata) -> String {
    // Serialization of these plain data types cannot fail
    serde_json::to_string_pretty(metadata).expect("metadata serialization failed")
}
