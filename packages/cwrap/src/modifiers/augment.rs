//! Augmentation passes: injecting helper declarations, forward declarations,
//! the `extern "C"` wrapper, and comment alignment.

use super::is_builtin_type;
use crate::element::{
    Class, ClassKind, CodeBlock, Comment, Dom, Element, NodeId,
};
use crate::error::{ParseError, TransformError};
use crate::lexer::tokenize;
use crate::parser::parse_standalone_function;
use crate::stream::TokenStream;
use crate::token::{Token, TokenKind};
use crate::write::{declaration_line, WriteContext};
use indexmap::IndexSet;

/// Parses each signature as a standalone declaration and appends it to the
/// last header file, flagged as a manual helper. Trailing comments in the
/// signature text become the helper's attached comment.
pub fn add_manual_helper_functions(
    dom: &mut Dom,
    signatures: &[&str],
) -> Result<(), TransformError> {
    let file = match dom.element(dom.root()) {
        Element::HeaderFileSet(set) => set.files.last().copied(),
        _ => None,
    };
    let Some(file) = file else { return Ok(()) };

    for signature in signatures {
        let tokens = tokenize(signature).map_err(ParseError::from)?;
        let mut stream = TokenStream::new(tokens);
        let id = parse_standalone_function(dom, &mut stream).ok_or_else(|| {
            TransformError::HelperParseFailed(ParseError::InvalidHelperSignature {
                signature: (*signature).to_string(),
            })
        })?;
        if let Element::Function(function) = dom.element_mut(id) {
            function.is_manual_helper = true;
        }
        dom.add_child(file, id);
    }
    Ok(())
}

/// Appends `text` to the attached comment of the function whose
/// fully-qualified C++ name matches `qualified_name`.
pub fn add_function_comment(
    dom: &mut Dom,
    qualified_name: &str,
    text: &str,
) -> Result<(), TransformError> {
    for id in dom.all_functions() {
        if dom.fully_qualified_name(id, false, true) != qualified_name {
            continue;
        }
        let node = dom.node_mut(id);
        match &mut node.attached_comment {
            Some(comment) => {
                comment.text.push(' ');
                comment.text.push_str(text);
            }
            None => {
                node.attached_comment = Some(Comment::line_comment(format!("// {text}"), 0));
            }
        }
        return Ok(());
    }
    Err(TransformError::NoSuchFunction {
        qualified_name: qualified_name.to_string(),
    })
}

/// For every struct referenced by type but not declared lexically before its
/// first use, prepends a forward declaration near the top of the header
/// (after the leading pragma/include block). In C mode these forward
/// declarations also provide the `typedef struct X X;` aliases that make the
/// bare names in the flattened signatures legal.
pub fn forward_declare_structs(dom: &mut Dom) {
    let files = match dom.element(dom.root()) {
        Element::HeaderFileSet(set) => set.files.clone(),
        _ => return,
    };
    for file in files {
        // Names that count as "declared" once seen, in tree order
        let mut declared: IndexSet<String> = IndexSet::new();
        // Referenced-before-declaration names, in order of first reference
        let mut needed: IndexSet<String> = IndexSet::new();

        let mut ids = vec![file];
        ids.extend(dom.descendants(file));
        for id in ids {
            match dom.element(id) {
                Element::Class(class) => {
                    declared.insert(class.name.clone());
                }
                Element::Enum(decl) => {
                    declared.insert(decl.name.clone());
                }
                Element::Typedef(td) => {
                    reference_names(dom, id, &declared, &mut needed);
                    declared.insert(td.name.clone());
                }
                Element::Function(_) | Element::Field(_) => {
                    reference_names(dom, id, &declared, &mut needed);
                }
                _ => {}
            }
        }

        if needed.is_empty() {
            continue;
        }

        // Skip past the leading prelude (pragma, includes, comments, blank
        // lines, defines) so the forward declarations land before the first
        // real declaration
        let children = dom.element(file).child_lists()[0].clone();
        let first_decl = children.iter().copied().find(|&child| {
            !matches!(
                dom.element(child),
                Element::PragmaOnce
                    | Element::Include(_)
                    | Element::Comment(_)
                    | Element::BlankLines(_)
                    | Element::Define(_)
            )
        });
        for name in needed {
            let decl = dom.alloc_element(
                Element::Class(Class {
                    kind: ClassKind::Struct,
                    name,
                    is_forward_declaration: true,
                    ..Class::default()
                }),
                0,
            );
            match first_decl {
                Some(anchor) => dom.insert_before(anchor, decl),
                None => dom.add_child(file, decl),
            }
        }
    }
}

/// Collects the primary type names referenced by the declaration at `id`
/// that have not yet been declared.
fn reference_names(
    dom: &Dom,
    id: NodeId,
    declared: &IndexSet<String>,
    needed: &mut IndexSet<String>,
) {
    let mut collect = |ty: &crate::types::TypeExpr| {
        collect_type_names(ty, declared, needed);
    };
    match dom.element(id) {
        Element::Function(function) => {
            if let Some(return_type) = &function.return_type {
                collect(return_type);
            }
            for arg in &function.arguments {
                collect(&arg.arg_type);
            }
        }
        Element::Field(field) => collect(&field.field_type),
        Element::Typedef(td) => collect(&td.underlying),
        _ => {}
    }
}

fn collect_type_names(
    ty: &crate::types::TypeExpr,
    declared: &IndexSet<String>,
    needed: &mut IndexSet<String>,
) {
    if ty.raw.is_none()
        && !ty.name.is_empty()
        && !is_builtin_type(&ty.name)
        && !declared.contains(&ty.name)
    {
        needed.insert(ty.name.clone());
    }
    for arg in &ty.template_args {
        collect_type_names(arg, declared, needed);
    }
}

/// Wraps each header file's body in an `extern "C"` guard that only takes
/// effect for C++ consumers.
pub fn wrap_with_extern_c(dom: &mut Dom) {
    let files = match dom.element(dom.root()) {
        Element::HeaderFileSet(set) => set.files.clone(),
        _ => return,
    };
    for file in files {
        let children = dom.element(file).child_lists()[0].clone();
        // The wrapper opens after the leading pragma/include prelude
        let first_decl = children.iter().copied().find(|&child| {
            !matches!(
                dom.element(child),
                Element::PragmaOnce
                    | Element::Include(_)
                    | Element::Comment(_)
                    | Element::BlankLines(_)
            )
        });

        let opener = guarded_verbatim(
            dom,
            vec![
                Token::synthetic(TokenKind::Thing, "extern"),
                Token::synthetic(TokenKind::Str, "\"C\""),
                Token::synthetic(TokenKind::LBrace, "{"),
            ],
            None,
        );
        let closer = guarded_verbatim(
            dom,
            vec![Token::synthetic(TokenKind::RBrace, "}")],
            Some("// End of extern \"C\" block"),
        );
        match first_decl {
            Some(anchor) => dom.insert_before(anchor, opener),
            None => dom.add_child(file, opener),
        }
        dom.add_child(file, closer);
    }
}

/// Builds an `#ifdef __cplusplus` conditional containing a single verbatim
/// line.
fn guarded_verbatim(dom: &mut Dom, tokens: Vec<Token>, comment: Option<&str>) -> NodeId {
    let block = dom.alloc_element(Element::CodeBlock(CodeBlock { tokens }), 0);
    if let Some(text) = comment {
        dom.node_mut(block).attached_comment = Some(Comment::line_comment(text, 0));
    }
    let conditional = dom.alloc_element(
        Element::Conditional(crate::element::Conditional {
            kind: crate::element::ConditionalKind::Ifdef,
            condition_tokens: vec![Token::synthetic(TokenKind::Thing, "__cplusplus")],
            ..crate::element::Conditional::default()
        }),
        0,
    );
    dom.add_child(conditional, block);
    conditional
}

/// Computes per-region alignment columns for attached comments: within each
/// run of consecutive single-line declarations that carry attached comments,
/// every comment is padded out to one column past the longest declaration.
/// Runs are broken by blank lines and by declarations without comments.
pub fn align_comments(dom: &mut Dom) {
    let ctx = WriteContext::for_c();
    let mut containers = dom.descendants(dom.root());
    containers.push(dom.root());
    for container in containers {
        let list_count = dom.element(container).child_lists().len();
        for list_index in 0..list_count {
            let children = dom.element(container).child_lists()[list_index].clone();
            let mut run: Vec<(NodeId, usize)> = Vec::new();
            for child in children {
                let commented = dom.node(child).attached_comment.is_some();
                let line_len = declaration_line(dom, child, &ctx).map(|line| line.len());
                match (commented, line_len) {
                    (true, Some(len)) => run.push((child, len)),
                    _ => {
                        apply_alignment(dom, &run);
                        run.clear();
                    }
                }
            }
            apply_alignment(dom, &run);
        }
    }
}

fn apply_alignment(dom: &mut Dom, run: &[(NodeId, usize)]) {
    if run.len() < 2 {
        return;
    }
    let column = run.iter().map(|(_, len)| *len).max().unwrap_or(0) + 1;
    for (id, _) in run {
        if let Some(comment) = &mut dom.node_mut(*id).attached_comment {
            comment.alignment = column;
        }
    }
}

/// Marks the listed defines so the metadata emitter omits them.
pub fn exclude_defines_from_metadata(dom: &mut Dom, names: &[&str]) {
    for id in dom.descendants(dom.root()) {
        if let Element::Define(define) = dom.element_mut(id) {
            if names.contains(&define.name.as_str()) {
                define.exclude_from_metadata = true;
            }
        }
    }
}
