use super::*;
use crate::modifiers;
use indexmap::IndexMap;

#[test]
fn remove_function_bodies_should_discard_bodies_and_initialisers() {
    let mut dom = parse(
        r#"struct ImColor
{
    float Value;
    ImColor(float v) : Value(v) { }
};
"#,
    );
    modifiers::remove_function_bodies(&mut dom);
    dom.validate_hierarchy().unwrap();
    let id = find_function(&dom, "ImColor");
    let Element::Function(function) = dom.element(id) else {
        unreachable!()
    };
    assert!(function.body.is_none());
    assert!(function.initialiser_list_tokens.is_none());
}

#[test]
fn attach_preceding_comments_should_absorb_adjacent_comments() {
    let mut dom = parse(
        r#"// First line
// Second line
void Documented(int x);

// Orphaned by the blank line below

void Bare(int y);
"#,
    );
    modifiers::attach_preceding_comments(&mut dom);
    dom.validate_hierarchy().unwrap();

    let documented = find_function(&dom, "Documented");
    let comments = &dom.node(documented).preceding_comments;
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].text, "// First line");
    assert_eq!(comments[1].text, "// Second line");

    let bare = find_function(&dom, "Bare");
    assert!(dom.node(bare).preceding_comments.is_empty());
}

#[test]
fn remove_structs_should_delete_declarations_and_descendants() {
    let mut dom = parse(
        r#"struct ImNewWrapper
{
    void* Ptr;
    void Helper();
};

struct Kept
{
    int x;
};
"#,
    );
    modifiers::remove_structs(&mut dom, &["ImNewWrapper"]);
    dom.validate_hierarchy().unwrap();
    assert!(function_names(&dom).is_empty());
    let names = dom
        .all_classes()
        .into_iter()
        .map(|id| match dom.element(id) {
            Element::Class(class) => class.name.clone(),
            _ => unreachable!(),
        })
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Kept"]);
}

#[test]
fn remove_functions_should_match_qualified_names() {
    let mut dom = parse(
        r#"namespace ImGui
{
    void Value(const char* prefix, bool b);
    void Kept(int x);
}
"#,
    );
    modifiers::remove_functions(&mut dom, &["ImGui::Value"]);
    dom.validate_hierarchy().unwrap();
    assert_eq!(function_names(&dom), vec!["Kept"]);
}

#[test]
fn remove_heap_constructors_should_spare_by_value_types() {
    let mut dom = parse(
        r#"struct ImVec2
{
    ImVec2();
};

struct ImGuiTextBuffer
{
    ImGuiTextBuffer();
    ~ImGuiTextBuffer();
    void clear();
};
"#,
    );
    modifiers::mark_by_value_structs(&mut dom, &["ImVec2"]);
    modifiers::remove_heap_constructors_and_destructors(&mut dom);
    dom.validate_hierarchy().unwrap();
    assert_eq!(function_names(&dom), vec!["ImVec2", "clear"]);
}

#[test]
fn convert_references_should_rewrite_every_reference_exactly_once() {
    let mut dom = parse("bool InputText(const char* label, String& buf, int& flags);");
    modifiers::convert_references_to_pointers(&mut dom);
    dom.validate_hierarchy().unwrap();

    let id = find_function(&dom, "InputText");
    let Element::Function(function) = dom.element(id) else {
        unreachable!()
    };
    // The non-reference argument count is preserved, and each reference is
    // now exactly one level of pointer
    assert_eq!(function.arguments.len(), 3);
    assert!(!function.arguments[0].was_reference);
    assert_eq!(function.arguments[0].arg_type.to_c_string(), "const char*");
    assert!(function.arguments[1].was_reference);
    assert_eq!(function.arguments[1].arg_type.to_c_string(), "String*");
    assert!(function.arguments[2].was_reference);
    assert_eq!(function.arguments[2].arg_type.to_c_string(), "int*");
}

#[test]
fn flatten_conditionals_should_lift_the_surviving_branch() {
    let mut dom = parse(
        r#"#ifdef IM_VEC2_CLASS_EXTRA
void FromExtra(int x);
#else
void FromElse(int x);
#endif
"#,
    );
    modifiers::flatten_conditionals(&mut dom, "IM_VEC2_CLASS_EXTRA", false);
    dom.validate_hierarchy().unwrap();
    assert_eq!(function_names(&dom), vec!["FromElse"]);
    assert!(!dom
        .descendants(dom.root())
        .into_iter()
        .any(|id| matches!(dom.element(id), Element::Conditional(_))));
}

#[test]
fn flatten_namespaces_should_be_idempotent_over_the_same_map() {
    let mut dom = parse(
        r#"namespace ImGui
{
    void Button(const char* label);
}
"#,
    );
    let map = IndexMap::from([("ImGui".to_string(), "ImGui_".to_string())]);
    modifiers::flatten_namespaces(&mut dom, &map);
    dom.validate_hierarchy().unwrap();
    assert_eq!(function_names(&dom), vec!["ImGui_Button"]);

    let before = write_cpp(&dom);
    modifiers::flatten_namespaces(&mut dom, &map);
    dom.validate_hierarchy().unwrap();
    assert_eq!(write_cpp(&dom), before);
}

#[test]
fn flatten_nested_classes_should_hoist_and_rename() {
    let mut dom = parse(
        r#"struct Outer
{
    struct Inner
    {
        int x;
    };
    Inner item;
};
"#,
    );
    modifiers::flatten_nested_classes(&mut dom);
    dom.validate_hierarchy().unwrap();

    let names = dom
        .all_classes()
        .into_iter()
        .map(|id| match dom.element(id) {
            Element::Class(class) => class.name.clone(),
            _ => unreachable!(),
        })
        .collect::<Vec<_>>();
    // The hoisted class lands before its old parent
    assert_eq!(names, vec!["Outer_Inner", "Outer"]);

    let field = dom
        .descendants(dom.root())
        .into_iter()
        .find(|&id| matches!(dom.element(id), Element::Field(f) if f.names == ["item"]))
        .unwrap();
    let Element::Field(field) = dom.element(field) else {
        unreachable!()
    };
    assert_eq!(field.field_type.to_c_string(), "Outer_Inner");
}

#[test]
fn flatten_class_functions_should_inject_self() {
    let mut dom = parse(
        r#"struct ImGuiTextBuffer
{
    int size() const;
    void append(const char* str);
    static void StaticThing(int x);
};
"#,
    );
    modifiers::flatten_class_functions(&mut dom);
    dom.validate_hierarchy().unwrap();

    let size = find_function(&dom, "ImGuiTextBuffer_size");
    let Element::Function(size) = dom.element(size) else {
        unreachable!()
    };
    assert_eq!(
        size.arguments[0].arg_type.to_c_string(),
        "const ImGuiTextBuffer*"
    );
    assert_eq!(size.arguments[0].name.as_deref(), Some("self"));
    assert!(!size.is_const);

    let append = find_function(&dom, "ImGuiTextBuffer_append");
    let Element::Function(append) = dom.element(append) else {
        unreachable!()
    };
    assert_eq!(append.arguments[0].arg_type.to_c_string(), "ImGuiTextBuffer*");
    assert_eq!(append.arguments.len(), 2);

    // Static members get the prefix but no self
    let stat = find_function(&dom, "ImGuiTextBuffer_StaticThing");
    let Element::Function(stat) = dom.element(stat) else {
        unreachable!()
    };
    assert_eq!(stat.arguments.len(), 1);
    assert_ne!(stat.arguments[0].name.as_deref(), Some("self"));
}

#[test]
fn flatten_class_functions_should_make_by_value_constructors() {
    let mut dom = parse(
        r#"struct ImVec2
{
    float x, y;
    ImVec2(float _x, float _y);
};
"#,
    );
    modifiers::mark_by_value_structs(&mut dom, &["ImVec2"]);
    modifiers::flatten_class_functions(&mut dom);
    dom.validate_hierarchy().unwrap();

    let ctor = find_function(&dom, "ImVec2_ImVec2");
    let Element::Function(ctor) = dom.element(ctor) else {
        unreachable!()
    };
    assert!(ctor.is_by_value_constructor);
    assert_eq!(ctor.return_type.as_ref().unwrap().to_c_string(), "ImVec2");
    assert_eq!(ctor.arguments.len(), 2);
}

#[test]
fn flatten_templates_should_synthesize_concrete_structs() {
    let mut dom = parse(
        r#"template<typename T>
struct ImVector
{
    int Size;
    T* Data;
};

struct Holder
{
    ImVector<ImWchar> Chars;
    ImVector<const ImFont*> Fonts;
};
"#,
    );
    let fudges = IndexMap::from([(
        "const ImFont**".to_string(),
        "ImFont* const*".to_string(),
    )]);
    modifiers::flatten_templates(&mut dom, &fudges);
    dom.validate_hierarchy().unwrap();

    let names = dom
        .all_classes()
        .into_iter()
        .map(|id| match dom.element(id) {
            Element::Class(class) => class.name.clone(),
            _ => unreachable!(),
        })
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec!["ImVector_ImWchar", "ImVector_const_ImFontPtr", "Holder"]
    );

    // The instantiated data pointer takes the fudged printed form
    let fudged = dom
        .descendants(dom.root())
        .into_iter()
        .filter_map(|id| match dom.element(id) {
            Element::Field(field) if field.names == ["Data"] => {
                Some(field.field_type.to_c_string())
            }
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(fudged, vec!["ImWchar*", "ImFont* const*"]);

    // References were rewritten to the concrete names
    let holder_fields = dom
        .descendants(dom.root())
        .into_iter()
        .filter_map(|id| match dom.element(id) {
            Element::Field(field) if field.names != ["Data"] && field.names != ["Size"] => {
                Some(field.field_type.to_c_string())
            }
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(holder_fields, vec!["ImVector_ImWchar", "ImVector_const_ImFontPtr"]);
}

#[test]
fn generate_default_argument_functions_should_emit_decreasing_overloads() {
    let mut dom = parse("void Draw(int a, int b = 1, int c = 2);");
    modifiers::generate_default_argument_functions(&mut dom);
    dom.validate_hierarchy().unwrap();

    let names = function_names(&dom);
    assert_eq!(names, vec!["Draw", "Draw", "Draw"]);

    let explicit_counts = dom
        .all_functions()
        .into_iter()
        .map(|id| match dom.element(id) {
            Element::Function(function) => function.explicit_arguments().count(),
            _ => unreachable!(),
        })
        .collect::<Vec<_>>();
    // The original keeps all three arguments; each generated overload drops
    // one more trailing default
    assert_eq!(explicit_counts, vec![3, 2, 1]);

    let helpers = dom
        .all_functions()
        .into_iter()
        .filter(|&id| match dom.element(id) {
            Element::Function(function) => function.is_default_argument_helper,
            _ => false,
        })
        .count();
    assert_eq!(helpers, 2);
}

#[test]
fn mark_internal_members_should_use_marker_comments() {
    let mut dom = parse(
        r#"struct ImGuiIO
{
    bool WantCaptureMouse;
    int Frame; // [Internal] do not touch
};
"#,
    );
    modifiers::mark_internal_members(&mut dom);
    let fields = dom
        .descendants(dom.root())
        .into_iter()
        .filter_map(|id| match dom.element(id) {
            Element::Field(field) => Some((field.names.clone(), field.is_internal)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(
        fields,
        vec![
            (vec!["WantCaptureMouse".to_string()], false),
            (vec!["Frame".to_string()], true),
        ]
    );
}

#[test]
fn forward_declare_structs_should_cover_undeclared_references() {
    let mut dom = parse(
        r#"void Register(ImGuiContext* ctx);

struct DeclaredLater
{
    int x;
};

void Use(DeclaredLater* thing);
"#,
    );
    modifiers::forward_declare_structs(&mut dom);
    dom.validate_hierarchy().unwrap();

    let forwards = dom
        .all_classes()
        .into_iter()
        .filter_map(|id| match dom.element(id) {
            Element::Class(class) if class.is_forward_declaration => Some(class.name.clone()),
            _ => None,
        })
        .collect::<Vec<_>>();
    // ImGuiContext is never declared; DeclaredLater is referenced only after
    // its declaration and needs nothing
    assert_eq!(forwards, vec!["ImGuiContext"]);

    let header = write_c(&dom);
    assert!(header.starts_with("typedef struct ImGuiContext ImGuiContext;"));
}

#[test]
fn wrap_with_extern_c_should_guard_the_body() {
    let mut dom = parse("void Foo(int x);\n");
    modifiers::wrap_with_extern_c(&mut dom);
    dom.validate_hierarchy().unwrap();
    let header = write_c(&dom);
    let opening = header.find("extern \"C\" {").unwrap();
    let declaration = header.find("void Foo(int x);").unwrap();
    let closing = header.rfind("}").unwrap();
    assert!(opening < declaration && declaration < closing);
    assert!(header.contains("#ifdef __cplusplus"));
}

#[test]
fn rename_defines_should_rewrite_references() {
    let mut dom = parse(
        r#"#ifndef IMGUI_API
#define IMGUI_API
#endif
"#,
    );
    let map = IndexMap::from([("IMGUI_API".to_string(), "CIMGUI_API".to_string())]);
    modifiers::rename_defines(&mut dom, &map);
    let header = write_cpp(&dom);
    assert!(header.contains("#ifndef CIMGUI_API"));
    assert!(header.contains("#define CIMGUI_API"));
    assert!(!header.contains("#define IMGUI_API"));
}

#[test]
fn blank_line_passes_should_merge_then_remove() {
    let mut dom = parse("int a;\n\nstatic int gone;\n\nint b;\n");
    // Deleting the middle declaration leaves two adjacent blank-line nodes
    modifiers::remove_static_fields(&mut dom);
    modifiers::merge_blank_lines(&mut dom);
    dom.validate_hierarchy().unwrap();
    let blanks = dom
        .descendants(dom.root())
        .into_iter()
        .filter_map(|id| match dom.element(id) {
            Element::BlankLines(count) => Some(*count),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(blanks, vec![2]);

    modifiers::remove_blank_lines(&mut dom);
    dom.validate_hierarchy().unwrap();
    assert_eq!(write_cpp(&dom), "int a;\nint b;\n");
}

#[test]
fn remove_empty_conditionals_should_prune_recursively() {
    let mut dom = parse(
        r#"#ifdef FOO
#ifdef BAR
#endif
#endif
int keep;
"#,
    );
    // Empty the inner conditional's surroundings first, then both collapse
    modifiers::remove_empty_conditionals(&mut dom);
    dom.validate_hierarchy().unwrap();
    assert!(!dom
        .descendants(dom.root())
        .into_iter()
        .any(|id| matches!(dom.element(id), Element::Conditional(_))));
    assert!(write_cpp(&dom).contains("int keep;"));
}
