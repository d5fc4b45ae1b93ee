//! The orchestrator: an ordered list of modifier invocations, exposed as
//! data.
//!
//! The order of passes is part of the conversion contract; reordering them
//! changes the output. [`Pipeline::imgui`] reproduces the standard sequence
//! for the Dear ImGui headers, but callers can build their own [`Pipeline`]
//! from [`Pass`] values.

use crate::element::Dom;
use crate::error::TransformError;
use crate::modifiers;
use indexmap::IndexMap;

/// One modifier invocation, with its parameters.
#[derive(Clone, Debug)]
pub enum Pass {
    AddIncludes(Vec<String>),
    RemoveIncludes(Vec<String>),
    AttachPrecedingComments,
    RemoveFunctionBodies,
    RemoveStructs(Vec<String>),
    RemoveAllFunctionsFromClasses(Vec<String>),
    RemoveFunctions(Vec<String>),
    AddPrefixToLooseFunctions(String),
    AddManualHelperFunctions(Vec<String>),
    AddFunctionComment {
        qualified_name: String,
        comment: String,
    },
    RemoveOperators,
    MarkByValueStructs(Vec<String>),
    RemoveHeapConstructorsAndDestructors,
    ConvertReferencesToPointers,
    FlattenConditionals {
        symbol: String,
        defined: bool,
    },
    FlattenNamespaces(IndexMap<String, String>),
    FlattenNestedClasses,
    FlattenTemplates(IndexMap<String, String>),
    MarkInternalMembers,
    FlattenClassFunctions,
    RemoveNestedTypedefs,
    RemoveStaticFields,
    GenerateDefaultArgumentFunctions,
    DisambiguateFunctions {
        name_suffix_remaps: IndexMap<String, String>,
        functions_to_ignore: Vec<String>,
    },
    MakeAllFunctionsUseImguiApi,
    RenameDefines(IndexMap<String, String>),
    ForwardDeclareStructs,
    WrapWithExternC,
    RemovePragmaOnce,
    RemoveEmptyConditionals,
    MergeBlankLines,
    RemoveBlankLines,
    AlignComments,
    ExcludeDefinesFromMetadata(Vec<String>),
}

impl Pass {
    /// Applies this pass to the tree.
    pub fn apply(&self, dom: &mut Dom) -> Result<(), TransformError> {
        match self {
            Self::AddIncludes(targets) => {
                modifiers::add_includes(dom, &as_strs(targets));
            }
            Self::RemoveIncludes(targets) => {
                modifiers::remove_includes(dom, &as_strs(targets));
            }
            Self::AttachPrecedingComments => modifiers::attach_preceding_comments(dom),
            Self::RemoveFunctionBodies => modifiers::remove_function_bodies(dom),
            Self::RemoveStructs(names) => modifiers::remove_structs(dom, &as_strs(names)),
            Self::RemoveAllFunctionsFromClasses(names) => {
                modifiers::remove_all_functions_from_classes(dom, &as_strs(names));
            }
            Self::RemoveFunctions(names) => modifiers::remove_functions(dom, &as_strs(names)),
            Self::AddPrefixToLooseFunctions(prefix) => {
                modifiers::add_prefix_to_loose_functions(dom, prefix);
            }
            Self::AddManualHelperFunctions(signatures) => {
                modifiers::add_manual_helper_functions(dom, &as_strs(signatures))?;
            }
            Self::AddFunctionComment {
                qualified_name,
                comment,
            } => modifiers::add_function_comment(dom, qualified_name, comment)?,
            Self::RemoveOperators => modifiers::remove_operators(dom),
            Self::MarkByValueStructs(names) => {
                modifiers::mark_by_value_structs(dom, &as_strs(names));
            }
            Self::RemoveHeapConstructorsAndDestructors => {
                modifiers::remove_heap_constructors_and_destructors(dom);
            }
            Self::ConvertReferencesToPointers => modifiers::convert_references_to_pointers(dom),
            Self::FlattenConditionals { symbol, defined } => {
                modifiers::flatten_conditionals(dom, symbol, *defined);
            }
            Self::FlattenNamespaces(map) => modifiers::flatten_namespaces(dom, map),
            Self::FlattenNestedClasses => modifiers::flatten_nested_classes(dom),
            Self::FlattenTemplates(fudges) => modifiers::flatten_templates(dom, fudges),
            Self::MarkInternalMembers => modifiers::mark_internal_members(dom),
            Self::FlattenClassFunctions => modifiers::flatten_class_functions(dom),
            Self::RemoveNestedTypedefs => modifiers::remove_nested_typedefs(dom),
            Self::RemoveStaticFields => modifiers::remove_static_fields(dom),
            Self::GenerateDefaultArgumentFunctions => {
                modifiers::generate_default_argument_functions(dom);
            }
            Self::DisambiguateFunctions {
                name_suffix_remaps,
                functions_to_ignore,
            } => {
                modifiers::disambiguate_functions(
                    dom,
                    name_suffix_remaps,
                    &as_strs(functions_to_ignore),
                )?;
            }
            Self::MakeAllFunctionsUseImguiApi => modifiers::make_all_functions_use_imgui_api(dom),
            Self::RenameDefines(map) => modifiers::rename_defines(dom, map),
            Self::ForwardDeclareStructs => modifiers::forward_declare_structs(dom),
            Self::WrapWithExternC => modifiers::wrap_with_extern_c(dom),
            Self::RemovePragmaOnce => modifiers::remove_pragma_once(dom),
            Self::RemoveEmptyConditionals => modifiers::remove_empty_conditionals(dom),
            Self::MergeBlankLines => modifiers::merge_blank_lines(dom),
            Self::RemoveBlankLines => modifiers::remove_blank_lines(dom),
            Self::AlignComments => modifiers::align_comments(dom),
            Self::ExcludeDefinesFromMetadata(names) => {
                modifiers::exclude_defines_from_metadata(dom, &as_strs(names));
            }
        }
        Ok(())
    }
}

fn as_strs(strings: &[String]) -> Vec<&str> {
    strings.iter().map(String::as_str).collect()
}

/// An ordered sequence of passes.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    pub passes: Vec<Pass>,
}

impl Pipeline {
    /// Runs every pass in order, re-validating the hierarchy after each one
    /// so a pass that breaks an invariant is caught immediately rather than
    /// at emission time.
    pub fn run(&self, dom: &mut Dom) -> Result<(), TransformError> {
        for pass in &self.passes {
            pass.apply(dom)?;
            dom.validate_hierarchy()?;
        }
        Ok(())
    }

    /// The standard pipeline for converting the Dear ImGui headers.
    pub fn imgui() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let passes = vec![
            // stdbool.h gets bool defined in C; the C++-only includes go away
            Pass::AddIncludes(strings(&["<stdbool.h>"])),
            Pass::RemoveIncludes(strings(&[
                "<float.h>",
                "<stdarg.h>",
                "<stddef.h>",
                "<string.h>",
            ])),
            Pass::AttachPrecedingComments,
            Pass::RemoveFunctionBodies,
            // ImGuiOnceUponAFrame needs custom fiddling to be usable from C,
            // ImNewWrapper is a helper for C++ `new` (and C dislikes empty
            // structs), and the rest are templated internals
            Pass::RemoveStructs(strings(&[
                "ImGuiOnceUponAFrame",
                "ImNewDummy",
                "ImNewWrapper",
                "ImBitArray",
                "ImBitVector",
                "ImSpan",
                "ImSpanAllocator",
                "ImPool",
                "ImChunkStream",
            ])),
            // ImVector member functions aren't useful through a C API
            Pass::RemoveAllFunctionsFromClasses(strings(&["ImVector"])),
            // Value() is a dumb helper over Text() and would need custom
            // names; the *T functions are templated internals
            Pass::RemoveFunctions(strings(&["ImGui::Value"])),
            Pass::RemoveFunctions(strings(&[
                "ImGui::ScaleRatioFromValueT",
                "ImGui::ScaleValueFromRatioT",
                "ImGui::DragBehaviorT",
                "ImGui::SliderBehaviorT",
                "ImGui::RoundScalarWithFormatT",
                "ImGui::CheckboxFlagsT",
            ])),
            Pass::AddPrefixToLooseFunctions("c".to_string()),
            Pass::AddManualHelperFunctions(strings(&[
                "void ImVector_Construct(void* vector); // Construct a zero-size ImVector<> (of any type). This is primarily useful when calling ImFontGlyphRangesBuilder_BuildRanges()",
                "void ImVector_Destruct(void* vector); // Destruct an ImVector<> (of any type). Important: Frees the vector memory but does not call destructors on contained objects (if they have them)",
            ])),
            Pass::AddFunctionComment {
                qualified_name: "ImFontGlyphRangesBuilder::BuildRanges".to_string(),
                comment: "(ImVector_Construct()/ImVector_Destruct() can be used to safely construct out_ranges)".to_string(),
            },
            Pass::RemoveOperators,
            // By-value marking has to come first so the constructors of the
            // by-value types survive the heap constructor removal
            Pass::MarkByValueStructs(strings(&["ImVec2", "ImVec4", "ImColor"])),
            Pass::RemoveHeapConstructorsAndDestructors,
            Pass::ConvertReferencesToPointers,
            // Assume the vector class-extension hooks are never defined, as
            // they are likely to just cause problems for C users
            Pass::FlattenConditionals {
                symbol: "IM_VEC2_CLASS_EXTRA".to_string(),
                defined: false,
            },
            Pass::FlattenConditionals {
                symbol: "IM_VEC4_CLASS_EXTRA".to_string(),
                defined: false,
            },
            Pass::FlattenNamespaces(IndexMap::from([(
                "ImGui".to_string(),
                "ImGui_".to_string(),
            )])),
            Pass::FlattenNestedClasses,
            // The custom type fudge works around how pointer template
            // parameters expand
            Pass::FlattenTemplates(IndexMap::from([(
                "const ImFont**".to_string(),
                "ImFont* const*".to_string(),
            )])),
            Pass::MarkInternalMembers,
            Pass::FlattenClassFunctions,
            Pass::RemoveNestedTypedefs,
            Pass::RemoveStaticFields,
            Pass::GenerateDefaultArgumentFunctions,
            Pass::DisambiguateFunctions {
                name_suffix_remaps: IndexMap::from([
                    ("const char*".to_string(), "Str".to_string()),
                    ("char*".to_string(), "Str".to_string()),
                    ("unsigned int".to_string(), "Uint".to_string()),
                    ("ImGuiID".to_string(), "ID".to_string()),
                ]),
                // These look like they have name clashes but actually don't,
                // thanks to preprocessor conditionals
                functions_to_ignore: strings(&[
                    "cImFileOpen",
                    "cImFileClose",
                    "cImFileGetSize",
                    "cImFileRead",
                    "cImFileWrite",
                ]),
            },
            Pass::MakeAllFunctionsUseImguiApi,
            Pass::RenameDefines(IndexMap::from([(
                "IMGUI_API".to_string(),
                "CIMGUI_API".to_string(),
            )])),
            Pass::ForwardDeclareStructs,
            Pass::WrapWithExternC,
            // #pragma once is left intact on the assumption that modern
            // compilers all support it; add RemovePragmaOnce here to get a
            // traditional include guard instead
            Pass::RemoveEmptyConditionals,
            Pass::MergeBlankLines,
            Pass::RemoveBlankLines,
            Pass::AlignComments,
            // These defines aren't really useful in the metadata
            Pass::ExcludeDefinesFromMetadata(strings(&[
                "IMGUI_IMPL_API",
                "IM_COL32_WHITE",
                "IM_COL32_BLACK",
                "IM_COL32_BLACK_TRANS",
                "ImDrawCallback_ResetRenderState",
            ])),
        ];
        Self { passes }
    }
}
