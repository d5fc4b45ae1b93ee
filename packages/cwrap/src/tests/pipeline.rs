use super::*;
use crate::metadata;
use crate::pipeline::{Pass, Pipeline};
use crate::thunks;
use indexmap::IndexMap;

/// A miniature header exercising most of the dialect: conditions, typedefs,
/// by-value structs with constructors, templates, member functions, a
/// namespace with overloads, defaults, and varargs.
const MINI_IMGUI: &str = r#"#pragma once

#include <float.h>
#include <string.h>

#ifndef IMGUI_API
#define IMGUI_API
#endif

typedef unsigned int ImGuiID;
typedef unsigned short ImWchar;

struct ImVec2
{
    float x, y;
    ImVec2() { x = y = 0.0f; }
    ImVec2(float _x, float _y) { x = _x; y = _y; }
};

template<typename T>
struct ImVector
{
    int Size;
    int Capacity;
    T* Data;
};

struct ImFontGlyphRangesBuilder
{
    ImVector<ImWchar> UsedChars;
    IMGUI_API void BuildRanges(ImVector<ImWchar>* out_ranges);
};

namespace ImGui
{
    IMGUI_API bool Button(const char* label, const ImVec2& size = ImVec2(0, 0));
    IMGUI_API void Text(const char* fmt, ...) IM_FMTARGS(1);
    IMGUI_API ImGuiID GetID(const char* str_id);
    IMGUI_API ImGuiID GetID(int int_id);
}
"#;

fn convert_mini() -> Conversion {
    let suffixes = IndexMap::from([("appendf".to_string(), "v".to_string())]);
    crate::convert_header_source(MINI_IMGUI, "mini.h", &Pipeline::imgui(), &suffixes).unwrap()
}

#[test]
fn the_standard_pipeline_should_produce_a_flat_c_header() {
    let conversion = convert_mini();
    let header = &conversion.header;

    // Prelude hygiene: stdbool in, C++-only includes out, pragma kept
    assert!(header.contains("#pragma once"));
    assert!(header.contains("#include <stdbool.h>"));
    assert!(!header.contains("<float.h>"));
    assert!(!header.contains("<string.h>"));

    // The API define was renamed throughout
    assert!(header.contains("#ifndef CIMGUI_API"));
    assert!(header.contains("#define CIMGUI_API"));

    // Namespace flattening and overload disambiguation
    assert!(header.contains("CIMGUI_API ImGuiID ImGui_GetID(const char* str_id);"));
    assert!(header.contains("CIMGUI_API ImGuiID ImGui_GetIDInt(int int_id);"));

    // Default-argument expansion: the short overload keeps the plain name
    // and the full signature gains a type suffix
    assert!(header.contains("CIMGUI_API bool ImGui_Button(const char* label);"));
    assert!(header.contains(
        "CIMGUI_API bool ImGui_ButtonImVec2Ptr(const char* label, const ImVec2* size);"
    ));

    // Varargs and format annotations survive
    assert!(header.contains("CIMGUI_API void ImGui_Text(const char* fmt, ...) IM_FMTARGS(1);"));

    // Template flattening produced a concrete struct and rewrote references
    assert!(header.contains("struct ImVector_ImWchar"));
    assert!(header.contains("ImWchar* Data;"));
    assert!(header.contains("ImVector_ImWchar UsedChars;"));
    assert!(!header.contains("template"));
    assert!(!header.contains("ImVector<ImWchar>"));

    // Member function flattening with injected self
    assert!(header.contains(
        "CIMGUI_API void ImFontGlyphRangesBuilder_BuildRanges(ImFontGlyphRangesBuilder* self, \
         ImVector_ImWchar* out_ranges);"
    ));

    // By-value constructors return the value type
    assert!(header.contains("CIMGUI_API ImVec2 ImVec2_ImVec2(void);"));
    assert!(header.contains("CIMGUI_API ImVec2 ImVec2_ImVec2FloatFloat(float _x, float _y);"));

    // The body is wrapped for C++ consumers
    assert!(header.contains("#ifdef __cplusplus"));
    assert!(header.contains("extern \"C\" {"));

    // The manual ImVector helpers were injected
    assert!(header.contains("CIMGUI_API void ImVector_Construct(void* vector);"));
    assert!(header.contains("CIMGUI_API void ImVector_Destruct(void* vector);"));

    // No bodies survive
    assert!(!header.contains("x = y"));
}

#[test]
fn the_thunks_should_call_back_into_the_original_api() {
    let conversion = convert_mini();
    let implementation = &conversion.implementation;

    // Namespace functions call their original qualified names
    assert!(implementation.contains("return ImGui::GetID(str_id);"));
    assert!(implementation.contains("return ImGui::GetID(int_id);"));

    // Converted references are dereferenced at the call site
    assert!(implementation.contains("return ImGui::Button(label, *size);"));

    // Implicitly-defaulted arguments are materialized
    assert!(implementation.contains("return ImGui::Button(label, ImVec2(0, 0));"));

    // Varargs forward through the va_list variant
    assert!(implementation.contains("va_start(args, fmt);"));
    assert!(implementation.contains("ImGui::TextV(fmt, args);"));

    // Member functions go through self
    assert!(implementation.contains("self->BuildRanges(out_ranges);"));

    // By-value constructors return a constructed value
    assert!(implementation.contains("return ImVec2();"));
    assert!(implementation.contains("return ImVec2(_x, _y);"));

    // Manual helpers are implemented by the template, not generated
    assert!(!implementation.contains("ImVector_Construct(void* vector)\n{"));
}

#[test]
fn the_metadata_should_describe_the_converted_surface() {
    let conversion = convert_mini();
    let parsed: serde_json::Value = serde_json::from_str(&conversion.metadata_json).unwrap();

    let functions = parsed["functions"].as_array().unwrap();
    let button = functions
        .iter()
        .find(|f| f["name"] == "ImGui_ButtonImVec2Ptr")
        .unwrap();
    assert_eq!(button["original_fully_qualified_name"], "ImGui::Button");
    assert_eq!(button["return_type"], "bool");
    assert_eq!(button["arguments"][1]["type"], "const ImVec2*");
    assert_eq!(button["arguments"][1]["default_value"], "ImVec2(0, 0)");

    let generated = functions
        .iter()
        .find(|f| f["name"] == "ImGui_Button")
        .unwrap();
    assert_eq!(generated["is_default_argument_helper"], true);
    assert_eq!(generated["arguments"][1]["is_implicit_default"], true);

    let helper = functions
        .iter()
        .find(|f| f["name"] == "ImVector_Construct")
        .unwrap();
    assert_eq!(helper["is_manual_helper"], true);

    let structs = parsed["structs"].as_array().unwrap();
    let vec2 = structs.iter().find(|s| s["name"] == "ImVec2").unwrap();
    assert_eq!(vec2["by_value"], true);
    assert_eq!(vec2["fields"][0]["names"][0], "x");

    let typedefs = parsed["typedefs"].as_array().unwrap();
    assert!(typedefs.iter().any(|t| t["name"] == "ImGuiID"));
}

#[test]
fn the_saved_snapshot_should_survive_the_pipeline_unmodified() {
    let mut dom = parse(MINI_IMGUI);
    let pristine = write_cpp(&parse(MINI_IMGUI));
    dom.save_unmodified_clone();
    Pipeline::imgui().run(&mut dom).unwrap();
    dom.validate_hierarchy().unwrap();

    let snapshot = dom.unmodified().expect("snapshot must exist");
    snapshot.validate_hierarchy().unwrap();
    assert_eq!(write_cpp(snapshot), pristine);
}

#[test]
fn custom_pipelines_should_compose_from_passes() {
    let mut dom = parse(
        r#"namespace ImGui
{
    bool InputText(const char* label, String& buf);
}
"#,
    );
    let pipeline = Pipeline {
        passes: vec![
            Pass::ConvertReferencesToPointers,
            Pass::FlattenNamespaces(IndexMap::from([(
                "ImGui".to_string(),
                "ImGui_".to_string(),
            )])),
        ],
    };
    pipeline.run(&mut dom).unwrap();
    assert_eq!(
        write_cpp(&dom).trim_end(),
        "bool ImGui_InputText(const char* label, String* buf);"
    );
}

#[test]
fn metadata_should_skip_excluded_defines() {
    let mut dom = parse("#define IM_COL32_WHITE 0xFFFFFFFF\n#define KEPT 1\n");
    dom.save_unmodified_clone();
    let pipeline = Pipeline {
        passes: vec![Pass::ExcludeDefinesFromMetadata(vec![
            "IM_COL32_WHITE".to_string(),
        ])],
    };
    pipeline.run(&mut dom).unwrap();
    let document = metadata::generate(&dom);
    let names = document
        .defines
        .iter()
        .map(|define| define.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["KEPT"]);
}

#[test]
fn thunks_should_use_custom_varargs_suffixes() {
    let mut dom = parse(
        r#"struct ImGuiTextBuffer
{
    void appendf(const char* fmt, ...) IM_FMTARGS(2);
};
"#,
    );
    dom.save_unmodified_clone();
    let pipeline = Pipeline {
        passes: vec![Pass::FlattenClassFunctions],
    };
    pipeline.run(&mut dom).unwrap();
    let suffixes = IndexMap::from([("appendf".to_string(), "v".to_string())]);
    let implementation = thunks::generate(&dom, &suffixes);
    assert!(implementation.contains("self->appendfv(fmt, args);"));
}
