//! Emission of the DOM back into C (or C++) source text.
//!
//! Each element variant has an emission hook here; the header emitter drives
//! them with `for_c` set, while the thunk emitter reuses the function
//! signature printing with `for_implementation` set.

use crate::element::{
    Define, Dom, Element, EnumElement, Field, Function, FunctionArgument, NodeId, Typedef,
};
use crate::token::collapse_tokens;

/// Output-mode flags consulted during emission.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteContext {
    /// Produce C89+stdbool output (flattened names, `(void)` argument lists,
    /// `CIMGUI_API`, no default values).
    pub for_c: bool,
    /// Produce declarations for the implementation file (fully-qualified
    /// names, no `static`/`inline` prefixes).
    pub for_implementation: bool,
}

impl WriteContext {
    pub fn for_c() -> Self {
        Self {
            for_c: true,
            for_implementation: false,
        }
    }
}

const INDENT: &str = "    ";

fn push_line(out: &mut String, indent: usize, text: &str) {
    if text.is_empty() {
        out.push('\n');
        return;
    }
    for _ in 0..indent {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

/// Renders the whole tree to a string with the given context.
pub fn write_to_string(dom: &Dom, ctx: &WriteContext) -> String {
    let mut out = String::new();
    write_to_c(dom, dom.root(), &mut out, 0, ctx);
    out
}

/// Writes the element at `id` (and its subtree) as C code.
pub fn write_to_c(dom: &Dom, id: NodeId, out: &mut String, indent: usize, ctx: &WriteContext) {
    let node = dom.node(id);
    for comment in &node.preceding_comments {
        push_line(out, indent, &comment.text);
    }
    match &node.element {
        Element::HeaderFileSet(set) => {
            for &file in &set.files {
                write_to_c(dom, file, out, indent, ctx);
            }
        }
        Element::HeaderFile(file) => {
            for &child in &file.children {
                write_to_c(dom, child, out, indent, ctx);
            }
        }
        Element::Namespace(ns) => {
            push_line(out, indent, &format!("namespace {}", ns.name));
            push_line(out, indent, "{");
            for &child in &ns.children {
                write_to_c(dom, child, out, indent + 1, ctx);
            }
            push_line(out, indent, "}");
        }
        Element::Class(class) => {
            if class.is_forward_declaration {
                let line = if ctx.for_c {
                    format!("typedef {0} {1} {1};", class.kind.keyword(), class.name)
                } else {
                    format!("{} {};", class.kind.keyword(), class.name)
                };
                push_line(out, indent, &attach(dom, id, line));
            } else {
                let mut decl = String::new();
                if !class.template_params.is_empty() && !ctx.for_c {
                    decl.push_str(&format!("template<typename {}> ", class.template_params.join(", typename ")));
                }
                decl.push_str(class.kind.keyword());
                if !class.name.is_empty() {
                    decl.push(' ');
                    decl.push_str(&class.name);
                }
                if !class.base_classes.is_empty() && !ctx.for_c {
                    decl.push_str(" : ");
                    decl.push_str(&class.base_classes.join(", "));
                }
                push_line(out, indent, &attach(dom, id, decl));
                push_line(out, indent, "{");
                for &child in &class.children {
                    write_to_c(dom, child, out, indent + 1, ctx);
                }
                push_line(out, indent, "};");
            }
        }
        Element::Function(function) => {
            write_function(dom, id, function, out, indent, ctx);
        }
        Element::Typedef(td) => {
            push_line(out, indent, &attach(dom, id, typedef_line(td)));
        }
        Element::Enum(decl) => {
            if ctx.for_c {
                push_line(out, indent, &attach(dom, id, "typedef enum".to_string()));
            } else {
                let mut line = format!("enum {}", decl.name);
                if let Some(storage) = &decl.storage_type {
                    line.push_str(" : ");
                    line.push_str(&storage.to_c_string());
                }
                push_line(out, indent, &attach(dom, id, line));
            }
            push_line(out, indent, "{");
            let last_element = decl
                .elements
                .iter()
                .rev()
                .find(|&&child| matches!(dom.element(child), Element::EnumElement(_)))
                .copied();
            for &child in &decl.elements {
                if let Element::EnumElement(elem) = dom.element(child) {
                    // C89 disallows a trailing comma after the final element
                    let line = enum_element_line(elem, last_element != Some(child));
                    for comment in &dom.node(child).preceding_comments {
                        push_line(out, indent + 1, &comment.text);
                    }
                    push_line(out, indent + 1, &attach(dom, child, line));
                } else {
                    write_to_c(dom, child, out, indent + 1, ctx);
                }
            }
            if ctx.for_c {
                push_line(out, indent, &format!("}} {};", decl.name));
            } else {
                push_line(out, indent, "};");
            }
        }
        Element::EnumElement(elem) => {
            // Reached only for elements inside conditionals, where comma
            // placement cannot see the enum's end
            push_line(out, indent, &attach(dom, id, enum_element_line(elem, true)));
        }
        Element::Field(field) => {
            push_line(out, indent, &attach(dom, id, field_line(field)));
        }
        Element::Define(define) => {
            push_line(out, indent, &attach(dom, id, define_line(define)));
        }
        Element::Conditional(cond) => {
            push_line(
                out,
                indent,
                &format!(
                    "{} {}",
                    cond.kind.directive(),
                    collapse_tokens(&cond.condition_tokens)
                ),
            );
            for &child in &cond.then_children {
                write_to_c(dom, child, out, indent, ctx);
            }
            if cond.has_else || !cond.else_children.is_empty() {
                push_line(out, indent, "#else");
                for &child in &cond.else_children {
                    write_to_c(dom, child, out, indent, ctx);
                }
            }
            push_line(out, indent, "#endif");
        }
        Element::Include(include) => {
            push_line(out, indent, &format!("#include {}", include.text));
        }
        Element::PragmaOnce => {
            push_line(out, indent, "#pragma once");
        }
        Element::Comment(comment) => {
            push_line(out, indent, &comment.text);
        }
        Element::BlankLines(count) => {
            for _ in 0..*count {
                out.push('\n');
            }
        }
        Element::CodeBlock(block) => {
            let line = collapse_tokens(&block.tokens);
            push_line(out, indent, &attach(dom, id, line));
        }
    }
}

fn typedef_line(td: &Typedef) -> String {
    let printed = td.underlying.to_c_string();
    // Function-pointer typedefs carry their name inside the raw form
    if td.underlying.raw.is_some() && printed.contains('(') {
        format!("typedef {printed};")
    } else {
        format!("typedef {} {};", printed, td.name)
    }
}

fn field_line(field: &Field) -> String {
    let mut line = String::new();
    if field.is_static {
        line.push_str("static ");
    }
    line.push_str(&field.field_type.to_c_string());
    line.push(' ');
    line.push_str(&field.names.join(", "));
    line.push_str(&field.field_type.array_suffix());
    if let Some(width) = field.bitfield_width {
        line.push_str(&format!(" : {width}"));
    }
    line.push(';');
    line
}

fn define_line(define: &Define) -> String {
    if define.is_undef {
        return format!("#undef {}", define.name);
    }
    let mut line = format!("#define {}", define.name);
    if let Some(args) = &define.args {
        line.push_str(args);
    }
    if !define.content_tokens.is_empty() {
        line.push(' ');
        line.push_str(&collapse_tokens(&define.content_tokens));
    }
    line
}

fn enum_element_line(elem: &EnumElement, with_comma: bool) -> String {
    let mut line = elem.name.clone();
    if let Some(value) = &elem.value_tokens {
        line.push_str(" = ");
        line.push_str(&collapse_tokens(value));
    }
    if with_comma {
        line.push(',');
    }
    line
}

/// The single-line rendering of a declaration, without its attached comment,
/// for elements that emit as one line. Used by the comment-alignment pass to
/// compute column widths; returns `None` for multi-line elements.
pub(crate) fn declaration_line(dom: &Dom, id: NodeId, ctx: &WriteContext) -> Option<String> {
    match dom.element(id) {
        Element::Function(function) if function.body.is_none() => {
            Some(format!("{};", function_signature(dom, id, function, ctx)))
        }
        Element::Field(field) => Some(field_line(field)),
        Element::Typedef(td) => Some(typedef_line(td)),
        Element::Define(define) => Some(define_line(define)),
        Element::EnumElement(elem) => Some(enum_element_line(elem, true)),
        Element::Include(include) => Some(format!("#include {}", include.text)),
        Element::Class(class) if class.is_forward_declaration => {
            if ctx.for_c {
                Some(format!(
                    "typedef {0} {1} {1};",
                    class.kind.keyword(),
                    class.name
                ))
            } else {
                Some(format!("{} {};", class.kind.keyword(), class.name))
            }
        }
        _ => None,
    }
}

/// Appends the node's attached comment (padded to its alignment column) to a
/// rendered declaration line.
fn attach(dom: &Dom, id: NodeId, mut line: String) -> String {
    if let Some(comment) = &dom.node(id).attached_comment {
        if comment.alignment > line.len() {
            line.push_str(&" ".repeat(comment.alignment - line.len()));
            line.push_str(&comment.text);
        } else {
            line.push(' ');
            line.push_str(&comment.text);
        }
    }
    line
}

/// Prints the prefix keywords and return type of a function declaration.
pub fn function_prefixes_and_return_type(function: &Function, ctx: &WriteContext) -> String {
    let mut decl = String::new();
    if function.is_imgui_api {
        // The C header carries its own API define
        if ctx.for_c {
            decl.push_str("CIMGUI_API ");
        } else {
            decl.push_str("IMGUI_API ");
        }
    }
    if function.is_static && !ctx.for_implementation {
        decl.push_str("static ");
    }
    if function.is_inline && !ctx.for_implementation {
        if ctx.for_c {
            decl.push_str("static inline ");
        } else {
            decl.push_str("inline ");
        }
    }
    if let Some(return_type) = &function.return_type {
        decl.push_str(&return_type.to_c_string());
        decl.push(' ');
    }
    decl
}

/// Prints a single argument as it appears in a declaration.
pub fn argument_to_string(arg: &FunctionArgument, ctx: &WriteContext) -> String {
    if arg.is_varargs {
        return "...".to_string();
    }
    let mut out = arg.arg_type.to_c_string();
    if let Some(name) = &arg.name {
        out.push(' ');
        out.push_str(name);
    }
    out.push_str(&arg.arg_type.array_suffix());
    if !ctx.for_c {
        if let Some(default) = &arg.default_value_tokens {
            out.push_str(" = ");
            out.push_str(&collapse_tokens(default));
        }
    }
    out
}

/// Prints the full signature of a function (no trailing semicolon), exactly
/// as the header and implementation emitters need it.
pub fn function_signature(dom: &Dom, id: NodeId, function: &Function, ctx: &WriteContext) -> String {
    let mut decl = function_prefixes_and_return_type(function, ctx);
    if ctx.for_implementation {
        decl.push_str(&dom.fully_qualified_name(id, false, false));
    } else {
        decl.push_str(&function.name);
    }
    decl.push('(');
    let args = function
        .explicit_arguments()
        .map(|arg| argument_to_string(arg, ctx))
        .collect::<Vec<_>>()
        .join(", ");
    if args.is_empty() && ctx.for_c {
        // Explicit void for C
        decl.push_str("void");
    } else {
        decl.push_str(&args);
    }
    decl.push(')');
    if function.is_const {
        decl.push_str(" const");
    }
    if function.is_constexpr {
        decl.push_str(" constexpr");
    }
    if !ctx.for_implementation {
        if let Some(n) = function.im_fmtargs {
            decl.push_str(&format!(" IM_FMTARGS({n})"));
        }
        if let Some(n) = function.im_fmtlist {
            decl.push_str(&format!(" IM_FMTLIST({n})"));
        }
    }
    decl
}

fn write_function(
    dom: &Dom,
    id: NodeId,
    function: &Function,
    out: &mut String,
    indent: usize,
    ctx: &WriteContext,
) {
    let decl = function_signature(dom, id, function, ctx);
    if ctx.for_implementation {
        push_line(out, indent, &decl);
        return;
    }
    if let Some(body) = &function.body {
        push_line(out, indent, &attach(dom, id, decl));
        if let Some(initialiser) = &function.initialiser_list_tokens {
            push_line(out, indent, &collapse_tokens(initialiser));
        }
        push_line(out, indent, &collapse_tokens(body));
    } else {
        push_line(out, indent, &attach(dom, id, format!("{decl};")));
    }
}
