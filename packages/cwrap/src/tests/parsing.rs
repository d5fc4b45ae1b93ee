use super::*;

#[test]
fn parser_should_round_trip_simple_headers() {
    let text = r#"#pragma once

typedef unsigned int ImGuiID;

struct ImVec2
{
    float x, y;
};

enum MyFlags
{
    MyFlags_None = 0,
    MyFlags_First = 1 << 0,
    MyFlags_All
};

IMGUI_API bool Begin(const char* name, bool* p_open = NULL);
"#;
    let dom = parse(text);
    // The easiest way of testing the parse is to ensure everything gets
    // rewritten correctly
    assert_eq!(write_cpp(&dom), text);
}

#[test]
fn parser_should_parse_function_flags() {
    let dom = parse("static inline constexpr int Foo(void* ptr) const;");
    let id = find_function(&dom, "Foo");
    let Element::Function(function) = dom.element(id) else {
        unreachable!()
    };
    assert!(function.is_static);
    assert!(function.is_inline);
    assert!(function.is_constexpr);
    assert!(function.is_const);
    assert_eq!(function.return_type.as_ref().unwrap().to_c_string(), "int");
    assert_eq!(function.arguments.len(), 1);
    assert_eq!(function.arguments[0].arg_type.to_c_string(), "void*");
}

#[test]
fn parser_should_recognise_constructors_and_destructors() {
    let dom = parse(
        r#"struct ImGuiTextFilter
{
    ImGuiTextFilter(const char* default_filter);
    ~ImGuiTextFilter();
};
"#,
    );
    let ctor = find_function(&dom, "ImGuiTextFilter");
    let Element::Function(ctor) = dom.element(ctor) else {
        unreachable!()
    };
    assert!(ctor.is_constructor);
    assert!(ctor.return_type.is_none());

    let dtor = find_function(&dom, "~ImGuiTextFilter");
    let Element::Function(dtor) = dom.element(dtor) else {
        unreachable!()
    };
    assert!(dtor.is_destructor);
    assert!(dtor.return_type.is_none());
}

#[test]
fn parser_should_assemble_operator_names() {
    let dom = parse(
        r#"struct ImVec2
{
    float operator[](int idx);
    ImVec2 operator *=(float rhs);
};
"#,
    );
    let names = function_names(&dom);
    assert!(names.contains(&"operator []".to_string()));
    assert!(names.contains(&"operator *=".to_string()));
    for id in dom.all_functions() {
        let Element::Function(function) = dom.element(id) else {
            unreachable!()
        };
        assert!(function.is_operator);
    }
}

#[test]
fn parser_should_capture_default_arguments_and_varargs() {
    let dom = parse("void Text(const char* fmt, ...) IM_FMTARGS(1);");
    let id = find_function(&dom, "Text");
    let Element::Function(function) = dom.element(id) else {
        unreachable!()
    };
    assert_eq!(function.im_fmtargs, Some(1));
    assert!(function.arguments[1].is_varargs);

    let dom = parse("bool Button(const char* label, const ImVec2& size = ImVec2(0, 0));");
    let id = find_function(&dom, "Button");
    let Element::Function(function) = dom.element(id) else {
        unreachable!()
    };
    let default = function.arguments[1].default_value_tokens.as_ref().unwrap();
    assert_eq!(collapse_tokens(default), "ImVec2(0, 0)");
}

#[test]
fn parser_should_nest_conditional_children() {
    let dom = parse(
        r#"#ifdef IMGUI_INTERNAL
void Secret(int x);
#else
void Public(int x);
#endif
"#,
    );
    let conditional = dom
        .descendants(dom.root())
        .into_iter()
        .find(|&id| matches!(dom.element(id), Element::Conditional(_)))
        .unwrap();
    let Element::Conditional(cond) = dom.element(conditional) else {
        unreachable!()
    };
    assert_eq!(cond.then_children.len(), 1);
    assert_eq!(cond.else_children.len(), 1);
    // The declarations belong to the conditional, not the file
    let secret = find_function(&dom, "Secret");
    assert_eq!(dom.parent(secret), Some(conditional));
}

#[test]
fn parser_should_parse_function_pointer_typedefs() {
    let dom = parse("typedef void (*ImDrawCallback)(const ImDrawList* parent_list);\n");
    let typedef = dom
        .descendants(dom.root())
        .into_iter()
        .find(|&id| matches!(dom.element(id), Element::Typedef(_)))
        .unwrap();
    let Element::Typedef(td) = dom.element(typedef) else {
        unreachable!()
    };
    assert_eq!(td.name, "ImDrawCallback");
    assert!(td.underlying.raw.is_some());
}

#[test]
fn parser_should_track_member_accessibility() {
    let dom = parse(
        r#"class ImDrawListSplitter
{
public:
    void Split(int count);
private:
    void Secret();
};
"#,
    );
    let split = find_function(&dom, "Split");
    let Element::Function(split) = dom.element(split) else {
        unreachable!()
    };
    assert_eq!(split.accessibility, Some(Accessibility::Public));
    let secret = find_function(&dom, "Secret");
    let Element::Function(secret) = dom.element(secret) else {
        unreachable!()
    };
    assert_eq!(secret.accessibility, Some(Accessibility::Private));
}

#[test]
fn parser_should_fail_loudly_on_unrecognised_constructs() {
    let err = crate::parse_dom("void Foo(int x); @@garbage@@", "test.h").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("1:"), "unexpected message: {message}");
}

#[test]
fn parser_should_attach_same_line_comments() {
    let dom = parse("typedef int ImS32; // 32-bit signed integer\n");
    let typedef = dom
        .descendants(dom.root())
        .into_iter()
        .find(|&id| matches!(dom.element(id), Element::Typedef(_)))
        .unwrap();
    let comment = dom.node(typedef).attached_comment.as_ref().unwrap();
    assert_eq!(comment.text, "// 32-bit signed integer");
}

#[test]
fn cloned_subtrees_should_print_identically() {
    let text = r#"struct ImVec2
{
    float x, y;
    ImVec2(float _x, float _y);
};

void Foo(const ImVec2& v);
"#;
    let mut dom = parse(text);
    let root = dom.root();
    let clone = dom.clone_subtree(root);
    let mut original = String::new();
    let mut cloned = String::new();
    crate::write_to_c(&dom, root, &mut original, 0, &WriteContext::default());
    crate::write_to_c(&dom, clone, &mut cloned, 0, &WriteContext::default());
    assert_eq!(original, cloned);
    dom.validate_hierarchy().unwrap();
}
