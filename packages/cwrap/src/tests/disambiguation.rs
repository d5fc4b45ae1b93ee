use super::*;
use crate::error::TransformError;
use crate::modifiers;
use indexmap::IndexMap;

#[test]
fn disambiguation_should_suffix_by_argument_type() {
    let mut dom = parse(
        r#"void Foo(int x);
void Foo(float x);
"#,
    );
    modifiers::add_prefix_to_loose_functions(&mut dom, "c");
    modifiers::disambiguate_functions(&mut dom, &IndexMap::new(), &[]).unwrap();
    dom.validate_hierarchy().unwrap();
    // The shortest-arity function keeps its name, with source order breaking
    // the tie
    assert_eq!(function_names(&dom), vec!["cFoo", "cFooFloat"]);
}

#[test]
fn disambiguation_should_prefer_suffix_remaps() {
    let mut dom = parse(
        r#"void Bar(int n);
void Bar(const char* s);
"#,
    );
    modifiers::add_prefix_to_loose_functions(&mut dom, "c");
    let remaps = IndexMap::from([("const char*".to_string(), "Str".to_string())]);
    modifiers::disambiguate_functions(&mut dom, &remaps, &[]).unwrap();
    assert_eq!(function_names(&dom), vec!["cBar", "cBarStr"]);
}

#[test]
fn disambiguation_should_append_ptr_for_pointer_types() {
    let mut dom = parse(
        r#"void Push(ImFont* font);
void Push(int);
void Push(ImVec2 v, bool b);
"#,
    );
    modifiers::disambiguate_functions(&mut dom, &IndexMap::new(), &[]).unwrap();
    let names = function_names(&dom);
    // Arity ties break toward the first declaration, which keeps its name
    assert_eq!(names, vec!["Push", "PushInt", "PushImVec2Bool"]);
}

#[test]
fn disambiguation_should_break_const_return_ties() {
    let mut dom = parse(
        r#"Item* Find(int idx);
const Item* Find(int idx) const;
"#,
    );
    modifiers::add_prefix_to_loose_functions(&mut dom, "c");
    modifiers::disambiguate_functions(&mut dom, &IndexMap::new(), &[]).unwrap();
    assert_eq!(function_names(&dom), vec!["cFind", "cFind_Const"]);
}

#[test]
fn disambiguation_should_only_suffix_past_the_common_prefix() {
    let mut dom = parse(
        r#"void SetWindowPos(ImVec2 pos);
void SetWindowPos(ImVec2 pos, int cond);
"#,
    );
    modifiers::disambiguate_functions(&mut dom, &IndexMap::new(), &[]).unwrap();
    // The shared leading ImVec2 argument contributes nothing to the suffix
    assert_eq!(function_names(&dom), vec!["SetWindowPos", "SetWindowPosInt"]);
}

#[test]
fn disambiguation_should_skip_varargs_in_suffixes() {
    let mut dom = parse(
        r#"void Log(const char* fmt);
void Log(const char* fmt, int level, ...);
"#,
    );
    modifiers::disambiguate_functions(&mut dom, &IndexMap::new(), &[]).unwrap();
    assert_eq!(function_names(&dom), vec!["Log", "LogInt"]);
}

#[test]
fn disambiguation_should_abort_on_unresolved_collisions() {
    let mut dom = parse(
        r#"void Clash(int a);
void Clash(int b);
"#,
    );
    let err = modifiers::disambiguate_functions(&mut dom, &IndexMap::new(), &[]).unwrap_err();
    match err {
        TransformError::UnresolvedOverloadCollision { signatures } => {
            assert_eq!(signatures.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn disambiguation_should_honour_the_ignore_list() {
    // Identical signatures guarded by opposite preprocessor conditionals
    // look like a clash but never coexist
    let mut dom = parse(
        r#"#ifdef IMGUI_DISABLE_FILE_FUNCTIONS
bool cImFileOpen(const char* filename);
#else
bool cImFileOpen(const char* filename);
#endif
"#,
    );
    modifiers::disambiguate_functions(&mut dom, &IndexMap::new(), &["cImFileOpen"]).unwrap();
    assert_eq!(function_names(&dom), vec!["cImFileOpen", "cImFileOpen"]);
}

#[test]
fn disambiguation_should_yield_pairwise_distinct_names() {
    let mut dom = parse(
        r#"void Value(const char* prefix, bool b);
void Value(const char* prefix, int v);
void Value(const char* prefix, unsigned int v);
void Value(const char* prefix, float v);
"#,
    );
    let remaps = IndexMap::from([("unsigned int".to_string(), "Uint".to_string())]);
    modifiers::disambiguate_functions(&mut dom, &remaps, &[]).unwrap();
    let mut names = function_names(&dom);
    assert_eq!(names.len(), 4);
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 4, "names must be pairwise distinct");
}
