//! The DOM over C++ declarations: an arena of typed nodes with parent
//! back-references.
//!
//! Children are owned by their parent's child lists as [`NodeId`]s into the
//! arena, and every non-root node records its parent, giving the
//! parent-walking operations (fully-qualified names, scope lookups) without
//! ownership cycles. Nodes are never physically freed: detaching a node
//! removes it from its parent's lists and clears its parent link, leaving the
//! slot in place so outstanding shallow references (notably
//! [`Function::original_class`]) stay valid for the life of the tree.

use crate::error::TransformError;
use crate::token::Token;
use crate::types::TypeExpr;

/// An index into the DOM arena. Copyable and stable for the life of the
/// [`Dom`]; the unmodified snapshot shares the same ids, so an id taken
/// before modification addresses the matching node in both trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// A comment, either freestanding in the tree or attached to a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comment {
    /// The comment text, including its `//` or `/* */` delimiters.
    pub text: String,
    pub is_block: bool,
    /// The source line the comment started on (0 for synthesized comments).
    pub line: u32,
    /// The column this comment should be aligned to when written after a
    /// declaration. 0 means unaligned. Set by the comment-alignment pass.
    pub alignment: usize,
}

impl Comment {
    pub fn line_comment(text: impl Into<String>, line: u32) -> Self {
        Self {
            text: text.into(),
            is_block: false,
            line,
            alignment: 0,
        }
    }
}

/// A single node: the shared slots every element has, plus the
/// variant-specific payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    /// The source line the element started on (0 for synthesized nodes).
    pub line: u32,
    /// Comments from the lines immediately above this declaration, moved here
    /// by the comment-attachment pass.
    pub preceding_comments: Vec<Comment>,
    /// A comment on the same source line, following the declaration.
    pub attached_comment: Option<Comment>,
    pub element: Element,
}

impl Node {
    pub fn new(element: Element, line: u32) -> Self {
        Self {
            parent: None,
            line,
            preceding_comments: Vec::new(),
            attached_comment: None,
            element,
        }
    }
}

/// The element variants of the DOM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// The root: owns one or more header files and carries the logical output
    /// filename.
    HeaderFileSet(HeaderFileSet),
    HeaderFile(HeaderFile),
    Namespace(Namespace),
    Class(Class),
    Function(Function),
    Typedef(Typedef),
    Enum(EnumDecl),
    EnumElement(EnumElement),
    Field(Field),
    Define(Define),
    Conditional(Conditional),
    Include(Include),
    PragmaOnce,
    Comment(Comment),
    BlankLines(u32),
    /// An opaque token run representing a body. Retained only until the
    /// body-removal pass runs; also used for verbatim text such as the
    /// `extern "C"` wrapper lines.
    CodeBlock(CodeBlock),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderFileSet {
    pub filename: String,
    pub files: Vec<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderFile {
    pub children: Vec<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub children: Vec<NodeId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    #[default]
    Struct,
    Union,
}

impl ClassKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Union => "union",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Class {
    pub kind: ClassKind,
    pub name: String,
    pub base_classes: Vec<String>,
    /// Template parameter names, for `template<typename T> struct ...`
    /// declarations. Emptied when the template is flattened away.
    pub template_params: Vec<String>,
    pub is_forward_declaration: bool,
    /// Set by the by-value marking pass: instances of this type are passed
    /// and returned by value in the generated C API.
    pub is_by_value: bool,
    pub children: Vec<NodeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accessibility {
    Public,
    Protected,
    Private,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    /// Absent for constructors and destructors.
    pub return_type: Option<TypeExpr>,
    pub arguments: Vec<FunctionArgument>,
    /// Raw tokens of a constructor initialiser list, if one exists.
    pub initialiser_list_tokens: Option<Vec<Token>>,
    /// The body token run, if the declaration had one.
    pub body: Option<Vec<Token>>,
    pub is_const: bool,
    pub is_constexpr: bool,
    pub is_static: bool,
    pub is_inline: bool,
    pub is_operator: bool,
    pub is_constructor: bool,
    /// Set during class-function flattening for constructors of by-value
    /// types, which return the constructed value instead of taking `self`.
    pub is_by_value_constructor: bool,
    pub is_destructor: bool,
    pub is_imgui_api: bool,
    /// `IM_FMTARGS(n)` annotation: the 1-based index of the format string
    /// argument.
    pub im_fmtargs: Option<u32>,
    /// `IM_FMTLIST(n)` annotation, for the `va_list` variants.
    pub im_fmtlist: Option<u32>,
    /// The accessibility of this function if it was declared in a class.
    pub accessibility: Option<Accessibility>,
    /// The class this function belonged to before flattening. A shallow
    /// reference: cloning a function copies the id, never the class.
    pub original_class: Option<NodeId>,
    /// The fully-qualified C++ name this function had before any modifier
    /// ran, recorded when the unmodified snapshot is taken. The thunk emitter
    /// uses this to call back into the C++ API.
    pub original_name: Option<String>,
    /// Set on overloads generated by the default-argument expansion pass.
    pub is_default_argument_helper: bool,
    /// Set on hand-written helper declarations injected into the DOM.
    pub is_manual_helper: bool,
    pub is_unformatted_helper: bool,
    pub is_imstr_helper: bool,
    pub has_imstr_helper: bool,
}

impl Function {
    /// The arguments that actually appear in the C declaration (implicitly
    /// defaulted ones are omitted from generated overloads).
    pub fn explicit_arguments(&self) -> impl Iterator<Item = &FunctionArgument> {
        self.arguments.iter().filter(|arg| !arg.is_implicit_default)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunctionArgument {
    /// Absent for unnamed parameters.
    pub name: Option<String>,
    pub arg_type: TypeExpr,
    /// The default value expression, as raw tokens.
    pub default_value_tokens: Option<Vec<Token>>,
    pub is_varargs: bool,
    /// Set when a defaulted argument is omitted from a generated overload:
    /// the argument is kept (so the thunk can materialize the default) but
    /// not printed.
    pub is_implicit_default: bool,
    /// Set when the reference-to-pointer pass rewrote this argument, so the
    /// thunk knows to dereference when calling the C++ API.
    pub was_reference: bool,
}

impl FunctionArgument {
    pub fn is_array(&self) -> bool {
        self.arg_type.is_array()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Typedef {
    pub name: String,
    pub underlying: TypeExpr,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    /// The explicit storage type, for `enum Foo : int` declarations.
    pub storage_type: Option<TypeExpr>,
    pub elements: Vec<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumElement {
    pub name: String,
    /// The explicit value expression, as raw tokens, if one was given.
    pub value_tokens: Option<Vec<Token>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Field {
    /// Declarator names; a single declaration can introduce several
    /// (`float x, y;`).
    pub names: Vec<String>,
    pub field_type: TypeExpr,
    pub is_static: bool,
    /// Derived from `[Internal]` marker comments; internal fields are kept in
    /// the C struct layout but flagged for metadata filtering.
    pub is_internal: bool,
    pub bitfield_width: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    /// The raw parameter list text for function-like macros (`(x, y)`).
    pub args: Option<String>,
    pub content_tokens: Vec<Token>,
    pub is_undef: bool,
    /// Set by the metadata-exclusion pass; the metadata emitter omits these.
    pub exclude_from_metadata: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConditionalKind {
    #[default]
    If,
    Ifdef,
    Ifndef,
}

impl ConditionalKind {
    pub fn directive(self) -> &'static str {
        match self {
            Self::If => "#if",
            Self::Ifdef => "#ifdef",
            Self::Ifndef => "#ifndef",
        }
    }
}

/// A preprocessor conditional, parsed as a nested scope: declarations inside
/// the block are children of the conditional, not of the surrounding
/// container, preserving guard context for the passes that need it. `#elif`
/// chains are represented as a nested conditional in the else branch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conditional {
    pub kind: ConditionalKind,
    pub condition_tokens: Vec<Token>,
    pub then_children: Vec<NodeId>,
    pub else_children: Vec<NodeId>,
    /// Distinguishes an explicit empty `#else` from no `#else` at all.
    pub has_else: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Include {
    /// The literal include target, quoted or bracketed (`<stdbool.h>`).
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeBlock {
    pub tokens: Vec<Token>,
}

impl Element {
    /// A short human-readable name for the variant, used in error reporting.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::HeaderFileSet(_) => "header file set",
            Self::HeaderFile(_) => "header file",
            Self::Namespace(_) => "namespace",
            Self::Class(_) => "class/struct/union",
            Self::Function(_) => "function declaration",
            Self::Typedef(_) => "typedef",
            Self::Enum(_) => "enum declaration",
            Self::EnumElement(_) => "enum element",
            Self::Field(_) => "field declaration",
            Self::Define(_) => "define",
            Self::Conditional(_) => "preprocessor conditional",
            Self::Include(_) => "include",
            Self::PragmaOnce => "pragma once",
            Self::Comment(_) => "comment",
            Self::BlankLines(_) => "blank lines",
            Self::CodeBlock(_) => "code block",
        }
    }

    /// Read-only access to this element's child lists. Most variants have one
    /// structural list; conditionals have two.
    pub fn child_lists(&self) -> Vec<&Vec<NodeId>> {
        match self {
            Self::HeaderFileSet(set) => vec![&set.files],
            Self::HeaderFile(file) => vec![&file.children],
            Self::Namespace(ns) => vec![&ns.children],
            Self::Class(class) => vec![&class.children],
            Self::Enum(decl) => vec![&decl.elements],
            Self::Conditional(cond) => vec![&cond.then_children, &cond.else_children],
            _ => Vec::new(),
        }
    }

    /// Mutable access to this element's child lists, for the structural
    /// operations on [`Dom`].
    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<NodeId>> {
        match self {
            Self::HeaderFileSet(set) => vec![&mut set.files],
            Self::HeaderFile(file) => vec![&mut file.children],
            Self::Namespace(ns) => vec![&mut ns.children],
            Self::Class(class) => vec![&mut class.children],
            Self::Enum(decl) => vec![&mut decl.elements],
            Self::Conditional(cond) => vec![&mut cond.then_children, &mut cond.else_children],
            _ => Vec::new(),
        }
    }

    /// Whether `child` is a permitted child variant of this element. Checked
    /// by hierarchy validation.
    fn permits_child(&self, child: &Element) -> bool {
        match self {
            Self::HeaderFileSet(_) => matches!(child, Element::HeaderFile(_)),
            Self::HeaderFile(_) | Self::Namespace(_) => !matches!(
                child,
                Element::HeaderFileSet(_) | Element::HeaderFile(_) | Element::EnumElement(_)
            ),
            Self::Class(_) => matches!(
                child,
                Element::Class(_)
                    | Element::Function(_)
                    | Element::Field(_)
                    | Element::Typedef(_)
                    | Element::Enum(_)
                    | Element::Conditional(_)
                    | Element::Comment(_)
                    | Element::BlankLines(_)
                    | Element::Define(_)
            ),
            Self::Enum(_) => matches!(
                child,
                Element::EnumElement(_)
                    | Element::Comment(_)
                    | Element::BlankLines(_)
                    | Element::Conditional(_)
            ),
            Self::Conditional(_) => {
                !matches!(child, Element::HeaderFileSet(_) | Element::HeaderFile(_))
            }
            _ => false,
        }
    }
}

/// The DOM arena. Owns every node, tracks the root, and (after
/// [`Dom::save_unmodified_clone`]) carries the pre-modification snapshot for
/// the metadata and thunk emitters.
#[derive(Clone, Debug, PartialEq)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    unmodified: Option<Box<Dom>>,
}

impl Dom {
    /// Creates a DOM containing only a root [`HeaderFileSet`] with the given
    /// logical filename.
    pub fn new(filename: impl Into<String>) -> Self {
        let root_node = Node::new(
            Element::HeaderFileSet(HeaderFileSet {
                filename: filename.into(),
                files: Vec::new(),
            }),
            0,
        );
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
            unmodified: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Fallible node lookup, for resolving ids against the unmodified
    /// snapshot (nodes created after the snapshot have no counterpart there).
    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.node(id).element
    }

    pub fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.node_mut(id).element
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Allocates a detached node and returns its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Convenience for [`Self::alloc`] on a bare element.
    pub fn alloc_element(&mut self, element: Element, line: u32) -> NodeId {
        self.alloc(Node::new(element, line))
    }

    /// Appends `child` to `parent`'s primary child list (the then-branch for
    /// conditionals), maintaining the parent link.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent)
            .element
            .child_lists_mut()
            .into_iter()
            .next()
            .expect("attempted to add a child to a childless element variant")
            .push(child);
    }

    /// Appends `child` to a conditional's else-branch list.
    pub fn add_else_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        match &mut self.node_mut(parent).element {
            Element::Conditional(cond) => cond.else_children.push(child),
            other => panic!(
                "attempted to add an else-child to a {}",
                other.variant_name()
            ),
        }
    }

    /// Detaches `id` from its parent, leaving it (and its subtree) allocated
    /// but outside the tree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            for list in self.node_mut(parent).element.child_lists_mut() {
                list.retain(|child| *child != id);
            }
        }
        self.node_mut(id).parent = None;
    }

    /// Inserts `new` as a sibling immediately before `anchor`.
    pub fn insert_before(&mut self, anchor: NodeId, new: NodeId) {
        self.insert_relative(anchor, new, 0);
    }

    /// Inserts `new` as a sibling immediately after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, new: NodeId) {
        self.insert_relative(anchor, new, 1);
    }

    fn insert_relative(&mut self, anchor: NodeId, new: NodeId, offset: usize) {
        let parent = self
            .node(anchor)
            .parent
            .expect("attempted to insert relative to a detached node");
        self.node_mut(new).parent = Some(parent);
        for list in self.node_mut(parent).element.child_lists_mut() {
            if let Some(pos) = list.iter().position(|child| *child == anchor) {
                list.insert(pos + offset, new);
                return;
            }
        }
        panic!("anchor node not found in any child list of its parent");
    }

    /// Replaces `old` with `new` in `old`'s position, detaching `old`.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.detach(old);
    }

    /// The index of `id` within its parent's child lists, as
    /// (list index, position).
    pub fn position_in_parent(&self, id: NodeId) -> Option<(usize, usize)> {
        let parent = self.node(id).parent?;
        for (li, list) in self.node(parent).element.child_lists().iter().enumerate() {
            if let Some(pos) = list.iter().position(|child| *child == id) {
                return Some((li, pos));
            }
        }
        None
    }

    /// All descendants of `from` (excluding `from` itself) in depth-first
    /// pre-order, collected before any mutation so modifiers can iterate a
    /// stable snapshot of the tree.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(from, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for list in self.element(id).child_lists() {
            for &child in list {
                out.push(child);
                self.collect_descendants(child, out);
            }
        }
    }

    /// All function declarations in the tree, in pre-order.
    pub fn all_functions(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| matches!(self.element(*id), Element::Function(_)))
            .collect()
    }

    /// All class/struct/union declarations in the tree, in pre-order.
    pub fn all_classes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| matches!(self.element(*id), Element::Class(_)))
            .collect()
    }

    /// Walks up the parent chain to find the nearest enclosing class, if any.
    pub fn parent_class(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(cur) = current {
            if matches!(self.element(cur), Element::Class(_)) {
                return Some(cur);
            }
            current = self.parent(cur);
        }
        None
    }

    /// Walks up the parent chain to find the header file containing `id`.
    pub fn containing_file(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(cur) = current {
            if matches!(self.element(cur), Element::HeaderFile(_)) {
                return Some(cur);
            }
            current = self.parent(cur);
        }
        None
    }

    /// Computes the fully-qualified name of the element at `id`, walking
    /// parents and collecting `::`-separated namespace and class scopes.
    ///
    /// Non-static member functions return their leaf name unless
    /// `fqn_even_for_members` is set, because the class scope is supplied by
    /// the instance at the call site.
    pub fn fully_qualified_name(
        &self,
        id: NodeId,
        include_leading_colons: bool,
        fqn_even_for_members: bool,
    ) -> String {
        let leaf = match self.element(id) {
            Element::Function(function) => {
                if self.parent_class(id).is_some() && !function.is_static && !fqn_even_for_members {
                    return function.name.clone();
                }
                function.name.clone()
            }
            Element::Class(class) => class.name.clone(),
            Element::Namespace(ns) => ns.name.clone(),
            Element::Typedef(td) => td.name.clone(),
            Element::Enum(decl) => decl.name.clone(),
            Element::EnumElement(elem) => elem.name.clone(),
            Element::Define(define) => define.name.clone(),
            Element::Field(field) => field.names.join(", "),
            _ => String::new(),
        };
        self.qualify(self.parent(id), leaf, include_leading_colons)
    }

    fn qualify(&self, from: Option<NodeId>, leaf: String, include_leading_colons: bool) -> String {
        let mut scopes = Vec::new();
        let mut current = from;
        while let Some(cur) = current {
            match self.element(cur) {
                Element::Namespace(ns) => scopes.push(ns.name.clone()),
                Element::Class(class) => scopes.push(class.name.clone()),
                _ => {}
            }
            current = self.parent(cur);
        }
        scopes.reverse();
        let mut out = String::new();
        if include_leading_colons && !scopes.is_empty() {
            out.push_str("::");
        }
        for scope in scopes {
            out.push_str(&scope);
            out.push_str("::");
        }
        out.push_str(&leaf);
        out
    }

    /// Deep-clones the subtree rooted at `id`, returning the detached clone's
    /// root. [`Function::original_class`] is copied as a shallow id, never
    /// followed.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut node = self.node(id).clone();
        node.parent = None;
        let mut lists_children = Vec::new();
        for list in node.element.child_lists() {
            lists_children.push(list.clone());
        }
        let new_id = self.alloc(node);
        for (li, children) in lists_children.into_iter().enumerate() {
            let mut new_children = Vec::with_capacity(children.len());
            for child in children {
                let new_child = self.clone_subtree(child);
                self.node_mut(new_child).parent = Some(new_id);
                new_children.push(new_child);
            }
            *self.node_mut(new_id).element.child_lists_mut()[li] = new_children;
        }
        new_id
    }

    /// Records each function's fully-qualified C++ name and stores a deep
    /// clone of the whole tree, so the emitters can reference
    /// pre-modification names and signatures. Must be called after parsing
    /// and before the first modifier runs.
    pub fn save_unmodified_clone(&mut self) {
        for id in self.all_functions() {
            let fqn = self.fully_qualified_name(id, false, true);
            if let Element::Function(function) = self.element_mut(id) {
                function.original_name = Some(fqn);
            }
        }
        let mut snapshot = self.clone();
        snapshot.unmodified = None;
        self.unmodified = Some(Box::new(snapshot));
    }

    /// The snapshot stored by [`Self::save_unmodified_clone`], if taken.
    pub fn unmodified(&self) -> Option<&Dom> {
        self.unmodified.as_deref()
    }

    /// Walks the tree from the root, checking the structural invariants:
    /// every child's parent link points at the node listing it, no node is
    /// reachable twice (single parentage, no cycles), and every child is a
    /// permitted variant for its parent. A failure indicates a modifier bug.
    pub fn validate_hierarchy(&self) -> Result<(), TransformError> {
        let mut seen = vec![false; self.nodes.len()];
        seen[self.root.0 as usize] = true;
        self.validate_node(self.root, &mut seen)
    }

    fn validate_node(&self, id: NodeId, seen: &mut [bool]) -> Result<(), TransformError> {
        let element = self.element(id);
        for list in element.child_lists() {
            for &child in list {
                if seen[child.0 as usize] {
                    return Err(TransformError::HierarchyViolation {
                        detail: format!(
                            "{} is reachable through more than one child list",
                            self.describe(child)
                        ),
                    });
                }
                seen[child.0 as usize] = true;
                if self.node(child).parent != Some(id) {
                    return Err(TransformError::HierarchyViolation {
                        detail: format!(
                            "{} is listed as a child of {} but its parent link disagrees",
                            self.describe(child),
                            self.describe(id)
                        ),
                    });
                }
                if !element.permits_child(&self.node(child).element) {
                    return Err(TransformError::HierarchyViolation {
                        detail: format!(
                            "a {} may not contain a {}",
                            element.variant_name(),
                            self.node(child).element.variant_name()
                        ),
                    });
                }
                self.validate_node(child, seen)?;
            }
        }
        Ok(())
    }

    /// Empties and returns all of `id`'s child lists (then- and else-branches
    /// for conditionals). The children keep their parent links until
    /// re-inserted elsewhere; callers must re-home or abandon every returned
    /// id before the next validation.
    pub fn take_child_lists(&mut self, id: NodeId) -> Vec<Vec<NodeId>> {
        self.node_mut(id)
            .element
            .child_lists_mut()
            .into_iter()
            .map(std::mem::take)
            .collect()
    }

    /// Applies `f` to every type expression reachable in the tree: function
    /// return types and argument types, field types, typedef targets, and
    /// enum storage types, recursing through template arguments.
    pub fn for_each_type_mut(&mut self, mut f: impl FnMut(&mut TypeExpr)) {
        let mut ids = self.descendants(self.root);
        ids.push(self.root);
        for id in ids {
            match &mut self.node_mut(id).element {
                Element::Function(function) => {
                    if let Some(return_type) = &mut function.return_type {
                        visit_type_mut(return_type, &mut f);
                    }
                    for arg in &mut function.arguments {
                        visit_type_mut(&mut arg.arg_type, &mut f);
                    }
                }
                Element::Field(field) => visit_type_mut(&mut field.field_type, &mut f),
                Element::Typedef(td) => visit_type_mut(&mut td.underlying, &mut f),
                Element::Enum(decl) => {
                    if let Some(storage) = &mut decl.storage_type {
                        visit_type_mut(storage, &mut f);
                    }
                }
                _ => {}
            }
        }
    }

    fn describe(&self, id: NodeId) -> String {
        let name = self.fully_qualified_name(id, false, true);
        if name.is_empty() {
            self.element(id).variant_name().to_string()
        } else {
            format!("{} '{}'", self.element(id).variant_name(), name)
        }
    }
}

/// Applies `f` to a type expression and, recursively, to its template
/// arguments. `f` runs on the outer type first, so it may rewrite or clear
/// the argument list before recursion reaches it.
fn visit_type_mut(ty: &mut TypeExpr, f: &mut impl FnMut(&mut TypeExpr)) {
    f(ty);
    for arg in &mut ty.template_args {
        visit_type_mut(arg, f);
    }
}
