//! The recursive-descent parser that turns the token stream into a DOM.
//!
//! Every construct has a speculative `parse_*` entry that checkpoints the
//! stream, attempts to recognize the construct, and rewinds and returns
//! `None` on any failure. Container parsers try the variants in a fixed
//! priority order; only when no variant matches (and the stream is not
//! exhausted) does parsing fail hard, with the source position of the
//! offending token.

use crate::element::{
    Accessibility, Class, ClassKind, CodeBlock, Comment, Conditional, ConditionalKind, Define, Dom,
    EnumDecl, EnumElement, Element, Field, Function, FunctionArgument, HeaderFile, Include,
    Namespace, NodeId, Typedef,
};
use crate::error::ParseError;
use crate::stream::TokenStream;
use crate::token::{collapse_tokens, Token, TokenKind};
use crate::types::{parse_array_bounds, TypeExpr};

/// Lexical state threaded through the parse. Currently this only carries the
/// accessibility in force for class members (`public:`/`protected:`/
/// `private:` labels).
#[derive(Debug, Default)]
pub struct ParseContext {
    pub accessibility: Option<Accessibility>,
}

/// Parses an entire header file from the stream, consuming it to exhaustion.
pub fn parse_header_file(dom: &mut Dom, stream: &mut TokenStream) -> Result<NodeId, ParseError> {
    let mut ctx = ParseContext::default();
    let file = dom.alloc_element(Element::HeaderFile(HeaderFile::default()), 1);
    loop {
        // Bare semicolons at file scope are eaten and dropped
        if stream.get_of_kind(&[TokenKind::Semicolon]).is_some() {
            continue;
        }
        if stream.is_exhausted() {
            break;
        }
        match parse_declaration(dom, stream, &mut ctx) {
            Some(child) => dom.add_child(file, child),
            None => {
                let tok = stream.peek().ok_or(ParseError::UnexpectedEof {
                    context: "a top-level declaration",
                })?;
                return Err(ParseError::UnrecognisedConstruct {
                    line: tok.line,
                    column: tok.column,
                    near: tok.text.clone(),
                });
            }
        }
    }
    Ok(file)
}

/// Tries each declaration form in priority order, returning the parsed node
/// or `None` (with the stream rewound) if nothing matches.
fn parse_declaration(dom: &mut Dom, stream: &mut TokenStream, ctx: &mut ParseContext) -> Option<NodeId> {
    if let Some(id) = parse_namespace(dom, stream, ctx) {
        return Some(id);
    }
    if let Some(id) = parse_typedef(dom, stream) {
        return Some(id);
    }
    if let Some(id) = parse_class(dom, stream, ctx) {
        return Some(id);
    }
    if let Some(id) = parse_enum(dom, stream) {
        return Some(id);
    }
    if let Some(id) = parse_function(dom, stream, ctx) {
        return Some(id);
    }
    if let Some(id) = parse_field(dom, stream) {
        return Some(id);
    }
    if let Some(id) = parse_conditional(dom, stream, ctx, parse_declaration) {
        return Some(id);
    }
    if let Some(id) = parse_directive(dom, stream) {
        return Some(id);
    }
    if let Some(id) = parse_comment(dom, stream) {
        return Some(id);
    }
    if let Some(id) = parse_blank_lines(dom, stream) {
        return Some(id);
    }
    None
}

fn parse_namespace(dom: &mut Dom, stream: &mut TokenStream, ctx: &mut ParseContext) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();
    let keyword = stream.get_of_kind(&[TokenKind::Thing])?;
    if keyword.text != "namespace" {
        stream.rewind(checkpoint);
        return None;
    }
    let name = match stream.get_of_kind(&[TokenKind::Thing]) {
        Some(tok) => tok.text,
        None => {
            stream.rewind(checkpoint);
            return None;
        }
    };
    if stream.get_of_kind(&[TokenKind::LBrace]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    let id = dom.alloc_element(
        Element::Namespace(Namespace {
            name,
            children: Vec::new(),
        }),
        keyword.line,
    );
    loop {
        if stream.get_of_kind(&[TokenKind::RBrace]).is_some() {
            break;
        }
        if stream.get_of_kind(&[TokenKind::Semicolon]).is_some() {
            continue;
        }
        match parse_declaration(dom, stream, ctx) {
            Some(child) => dom.add_child(id, child),
            None => {
                stream.rewind(checkpoint);
                return None;
            }
        }
    }
    Some(id)
}

fn parse_typedef(dom: &mut Dom, stream: &mut TokenStream) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();
    let keyword = stream.get_of_kind(&[TokenKind::Thing])?;
    if keyword.text != "typedef" {
        stream.rewind(checkpoint);
        return None;
    }

    // Function-pointer typedefs (`typedef void (*Name)(args);`) are kept as
    // an opaque token run; only the name is extracted
    let fp_checkpoint = stream.checkpoint();
    if let Some(id) = parse_function_pointer_typedef(dom, stream, keyword.line) {
        return Some(id);
    }
    stream.rewind(fp_checkpoint);

    let underlying = match TypeExpr::parse(stream) {
        Some(ty) => ty,
        None => {
            stream.rewind(checkpoint);
            return None;
        }
    };
    let name = match stream.get_of_kind(&[TokenKind::Thing]) {
        Some(tok) => tok.text,
        None => {
            stream.rewind(checkpoint);
            return None;
        }
    };
    if stream.get_of_kind(&[TokenKind::Semicolon]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    let id = dom.alloc_element(Element::Typedef(Typedef { name, underlying }), keyword.line);
    try_attach_same_line_comment(dom, stream, id);
    Some(id)
}

fn parse_function_pointer_typedef(
    dom: &mut Dom,
    stream: &mut TokenStream,
    line: u32,
) -> Option<NodeId> {
    // Shape: <return type tokens> ( * Name ) ( ... ) ;
    let mut tokens = Vec::new();
    let mut name = None;
    loop {
        let tok = stream.get()?;
        match tok.kind {
            TokenKind::Semicolon => break,
            TokenKind::LParen if name.is_none() => {
                // Expect `* Name )`
                tokens.push(tok);
                let star = stream.get_punct("*")?;
                let name_tok = stream.get_of_kind(&[TokenKind::Thing])?;
                let close = stream.get_of_kind(&[TokenKind::RParen])?;
                name = Some(name_tok.text.clone());
                tokens.push(star);
                tokens.push(name_tok);
                tokens.push(close);
            }
            _ => tokens.push(tok),
        }
    }
    let name = name?;
    let underlying = TypeExpr::raw(collapse_tokens(&tokens));
    let id = dom.alloc_element(Element::Typedef(Typedef { name, underlying }), line);
    try_attach_same_line_comment(dom, stream, id);
    Some(id)
}

fn parse_class(dom: &mut Dom, stream: &mut TokenStream, ctx: &mut ParseContext) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();

    // Optional template prefix
    let mut template_params = Vec::new();
    if stream
        .peek_of_kind(&[TokenKind::Thing])
        .is_some_and(|tok| tok.text == "template")
    {
        stream.get();
        if stream.get_punct("<").is_none() {
            stream.rewind(checkpoint);
            return None;
        }
        loop {
            let tok = match stream.get() {
                Some(tok) => tok,
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            };
            match tok.kind {
                TokenKind::Punct if tok.text == ">" => break,
                TokenKind::Thing if tok.text == "typename" || tok.text == "class" => {
                    if let Some(param) = stream.get_of_kind(&[TokenKind::Thing]) {
                        template_params.push(param.text);
                    }
                }
                TokenKind::Comma => {}
                _ => {
                    stream.rewind(checkpoint);
                    return None;
                }
            }
        }
    }

    let keyword = stream.get_of_kind(&[TokenKind::Thing])?;
    let kind = match keyword.text.as_str() {
        "class" => ClassKind::Class,
        "struct" => ClassKind::Struct,
        "union" => ClassKind::Union,
        _ => {
            stream.rewind(checkpoint);
            return None;
        }
    };

    // Anonymous unions have no name
    let name = stream
        .get_of_kind(&[TokenKind::Thing])
        .map(|tok| tok.text)
        .unwrap_or_default();

    // Forward declaration: `struct Name;`
    if !name.is_empty() && stream.get_of_kind(&[TokenKind::Semicolon]).is_some() {
        let id = dom.alloc_element(
            Element::Class(Class {
                kind,
                name,
                template_params,
                is_forward_declaration: true,
                ..Class::default()
            }),
            keyword.line,
        );
        try_attach_same_line_comment(dom, stream, id);
        return Some(id);
    }

    // Optional base class list
    let mut base_classes = Vec::new();
    if stream.get_of_kind(&[TokenKind::Colon]).is_some() {
        loop {
            // Accessibility keywords in the base list are noise for our
            // purposes
            let tok = match stream.get_of_kind(&[TokenKind::Thing]) {
                Some(tok) => tok,
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            };
            if !matches!(tok.text.as_str(), "public" | "protected" | "private") {
                base_classes.push(tok.text);
            }
            if stream.get_of_kind(&[TokenKind::Comma]).is_none() {
                break;
            }
        }
    }

    if stream.get_of_kind(&[TokenKind::LBrace]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }

    let id = dom.alloc_element(
        Element::Class(Class {
            kind,
            name,
            base_classes,
            template_params,
            ..Class::default()
        }),
        keyword.line,
    );

    // Classes default to private accessibility, structs and unions to public
    let outer_accessibility = ctx.accessibility;
    ctx.accessibility = Some(match kind {
        ClassKind::Class => Accessibility::Private,
        _ => Accessibility::Public,
    });

    loop {
        if stream.get_of_kind(&[TokenKind::RBrace]).is_some() {
            break;
        }
        if stream.get_of_kind(&[TokenKind::Semicolon]).is_some() {
            continue;
        }
        // Accessibility labels switch the state for subsequent members
        let label_checkpoint = stream.checkpoint();
        if let Some(label) = stream.get_of_kind(&[TokenKind::Thing]) {
            let access = match label.text.as_str() {
                "public" => Some(Accessibility::Public),
                "protected" => Some(Accessibility::Protected),
                "private" => Some(Accessibility::Private),
                _ => None,
            };
            if let (Some(access), Some(_)) = (access, stream.get_of_kind(&[TokenKind::Colon])) {
                ctx.accessibility = Some(access);
                continue;
            }
            stream.rewind(label_checkpoint);
        }
        match parse_declaration(dom, stream, ctx) {
            Some(child) => dom.add_child(id, child),
            None => {
                ctx.accessibility = outer_accessibility;
                stream.rewind(checkpoint);
                return None;
            }
        }
    }
    ctx.accessibility = outer_accessibility;

    if stream.get_of_kind(&[TokenKind::Semicolon]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    try_attach_same_line_comment(dom, stream, id);
    Some(id)
}

fn parse_enum(dom: &mut Dom, stream: &mut TokenStream) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();
    let keyword = stream.get_of_kind(&[TokenKind::Thing])?;
    if keyword.text != "enum" {
        stream.rewind(checkpoint);
        return None;
    }
    let name = stream
        .get_of_kind(&[TokenKind::Thing])
        .map(|tok| tok.text)
        .unwrap_or_default();
    let storage_type = if stream.get_of_kind(&[TokenKind::Colon]).is_some() {
        match TypeExpr::parse(stream) {
            Some(ty) => Some(ty),
            None => {
                stream.rewind(checkpoint);
                return None;
            }
        }
    } else {
        None
    };
    if stream.get_of_kind(&[TokenKind::LBrace]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    let id = dom.alloc_element(
        Element::Enum(EnumDecl {
            name,
            storage_type,
            elements: Vec::new(),
        }),
        keyword.line,
    );
    let mut ctx = ParseContext::default();
    loop {
        if stream.get_of_kind(&[TokenKind::RBrace]).is_some() {
            break;
        }
        match parse_enum_member(dom, stream, &mut ctx) {
            Some(child) => dom.add_child(id, child),
            None => {
                stream.rewind(checkpoint);
                return None;
            }
        }
    }
    if stream.get_of_kind(&[TokenKind::Semicolon]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    try_attach_same_line_comment(dom, stream, id);
    Some(id)
}

/// Parses one item inside an enum body: an element, a comment, blank lines,
/// or a conditional containing more enum members.
fn parse_enum_member(dom: &mut Dom, stream: &mut TokenStream, ctx: &mut ParseContext) -> Option<NodeId> {
    if let Some(id) = parse_comment(dom, stream) {
        return Some(id);
    }
    if let Some(id) = parse_blank_lines(dom, stream) {
        return Some(id);
    }
    if let Some(id) = parse_conditional(dom, stream, ctx, parse_enum_member) {
        return Some(id);
    }

    let checkpoint = stream.checkpoint();
    let name_tok = stream.get_of_kind(&[TokenKind::Thing])?;
    let mut value_tokens = None;
    if stream.get_punct("=").is_some() {
        let mut tokens = Vec::new();
        let mut depth = 0i32;
        loop {
            let Some(tok) = stream.peek() else { break };
            match tok.kind {
                TokenKind::Comma | TokenKind::RBrace if depth == 0 => break,
                TokenKind::LineComment | TokenKind::BlockComment | TokenKind::BlankLines => break,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            tokens.push(stream.get().unwrap());
        }
        if tokens.is_empty() {
            stream.rewind(checkpoint);
            return None;
        }
        value_tokens = Some(tokens);
    }
    stream.get_of_kind(&[TokenKind::Comma]);
    let id = dom.alloc_element(
        Element::EnumElement(EnumElement {
            name: name_tok.text,
            value_tokens,
        }),
        name_tok.line,
    );
    try_attach_same_line_comment(dom, stream, id);
    Some(id)
}

fn parse_function(dom: &mut Dom, stream: &mut TokenStream, ctx: &mut ParseContext) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();
    let mut function = Function {
        accessibility: ctx.accessibility,
        ..Function::default()
    };
    let start_line = stream.peek().map(|tok| tok.line)?;

    // Template functions parse like ordinary ones (the parameter list is
    // discarded); the pipeline removes them by qualified name before
    // emission
    if stream
        .peek_of_kind(&[TokenKind::Thing])
        .is_some_and(|tok| tok.text == "template")
    {
        stream.get();
        if stream.get_punct("<").is_none() {
            stream.rewind(checkpoint);
            return None;
        }
        let mut depth = 1i32;
        while depth > 0 {
            let tok = match stream.get() {
                Some(tok) => tok,
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            };
            if tok.kind == TokenKind::Punct && tok.text == "<" {
                depth += 1;
            } else if tok.kind == TokenKind::Punct && tok.text == ">" {
                depth -= 1;
            }
        }
    }

    // Prefix modifiers, in any order
    while let Some(prefix) = stream.peek_of_kind(&[TokenKind::Thing, TokenKind::Constexpr]) {
        match prefix.text.as_str() {
            "IMGUI_API" => {
                stream.get();
                function.is_imgui_api = true;
            }
            "inline" => {
                stream.get();
                function.is_inline = true;
            }
            "static" => {
                stream.get();
                function.is_static = true;
            }
            "constexpr" => {
                stream.get();
                function.is_constexpr = true;
            }
            // Conversion operators (`operator ImVec4() const`) read as a
            // prefix here, with the type parsed as the "return type" below
            "operator" => {
                stream.get();
                function.is_operator = true;
            }
            _ => break,
        }
    }

    // Leading `~` as used on destructors
    let mut name_prefix = String::new();
    if stream.get_punct("~").is_some() {
        name_prefix.push('~');
        function.is_destructor = true;
    }

    // Constructors and destructors have no return type declaration, so peek
    // ahead: a name-like thing directly followed by `(` means there is none
    let mut has_no_return_type = false;
    if stream.get_of_kind(&[TokenKind::Thing]).is_some() {
        if stream.peek_of_kind(&[TokenKind::LParen]).is_some() {
            has_no_return_type = true;
        }
        stream.rewind_one();
    }
    if has_no_return_type && !function.is_destructor && !function.is_operator {
        function.is_constructor = true;
    }

    if !has_no_return_type {
        match TypeExpr::parse(stream) {
            Some(ty) => function.return_type = Some(ty),
            None => {
                stream.rewind(checkpoint);
                return None;
            }
        }
    }

    // Function name; `operator` pulls in every token up to the opening
    // parenthesis (`operator[]`, `operator *=`)
    let name_tok = match stream.get_of_kind(&[TokenKind::Thing]) {
        Some(tok) => tok,
        None => {
            // A conversion operator has consumed its type as the return type
            // and has no name token; synthesize the name from the type
            if function.is_operator && has_no_return_type {
                stream.rewind(checkpoint);
                return None;
            }
            if function.is_operator {
                match function.return_type.take() {
                    Some(ty) => {
                        function.name = format!("operator {}", ty.to_c_string());
                        return finish_function_parse(dom, stream, function, checkpoint, start_line);
                    }
                    None => {
                        stream.rewind(checkpoint);
                        return None;
                    }
                }
            }
            stream.rewind(checkpoint);
            return None;
        }
    };
    if name_tok.text == "operator" {
        let mut operator_name_tokens = Vec::new();
        loop {
            let tok = match stream.get() {
                Some(tok) => tok,
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            };
            if tok.kind == TokenKind::LParen {
                stream.rewind_one();
                break;
            }
            operator_name_tokens.push(tok);
        }
        function.is_operator = true;
        function.name = format!(
            "operator {}{}",
            name_prefix,
            collapse_tokens(&operator_name_tokens)
        );
    } else {
        function.name = format!("{}{}", name_prefix, name_tok.text);
    }

    finish_function_parse(dom, stream, function, checkpoint, start_line)
}

/// The shared tail of function parsing: argument list, suffixes, attached
/// comment, initialiser list, and body.
fn finish_function_parse(
    dom: &mut Dom,
    stream: &mut TokenStream,
    mut function: Function,
    checkpoint: crate::stream::Checkpoint,
    start_line: u32,
) -> Option<NodeId> {
    if stream.get_of_kind(&[TokenKind::LParen]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    loop {
        if stream.get_of_kind(&[TokenKind::RParen]).is_some() {
            break;
        }
        let arg = match parse_argument(stream) {
            Some(arg) => arg,
            None => {
                stream.rewind(checkpoint);
                return None;
            }
        };
        function.arguments.push(arg);
        stream.get_of_kind(&[TokenKind::Comma]);
    }

    if stream.get_of_kind(&[TokenKind::Const]).is_some() {
        function.is_const = true;
    }

    // IM_FMTARGS(n) / IM_FMTLIST(n) annotations
    for (marker, slot) in [
        ("IM_FMTARGS", &mut function.im_fmtargs),
        ("IM_FMTLIST", &mut function.im_fmtlist),
    ] {
        if stream
            .peek_of_kind(&[TokenKind::Thing])
            .is_some_and(|tok| tok.text == marker)
        {
            stream.get();
            if stream.get_of_kind(&[TokenKind::LParen]).is_none() {
                stream.rewind(checkpoint);
                return None;
            }
            let value = stream
                .get_of_kind(&[TokenKind::Number])
                .and_then(|tok| tok.text.parse::<u32>().ok());
            match value {
                Some(value) => *slot = Some(value),
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            }
            if stream.get_of_kind(&[TokenKind::RParen]).is_none() {
                stream.rewind(checkpoint);
                return None;
            }
        }
    }

    // A comment here is treated as attached to the function rather than part
    // of the body
    let mut attached_comment = None;
    if let Some(tok) = stream.peek_of_kind(&[TokenKind::LineComment, TokenKind::BlockComment]) {
        attached_comment = Some(Comment {
            text: tok.text.clone(),
            is_block: tok.kind == TokenKind::BlockComment,
            line: tok.line,
            alignment: 0,
        });
        stream.get();
    }

    // Constructor initialiser list, kept as raw tokens
    if let Some(opener) = stream.get_of_kind(&[TokenKind::Colon]) {
        let mut tokens = vec![opener];
        loop {
            let Some(tok) = stream.peek() else {
                stream.rewind(checkpoint);
                return None;
            };
            if matches!(tok.kind, TokenKind::LBrace | TokenKind::Semicolon) {
                break;
            }
            tokens.push(stream.get().unwrap());
        }
        function.initialiser_list_tokens = Some(tokens);
    }

    match stream.get_of_kind(&[TokenKind::LBrace, TokenKind::Semicolon]) {
        Some(tok) if tok.kind == TokenKind::LBrace => {
            stream.rewind_one();
            match parse_code_block(stream) {
                Some(body) => function.body = Some(body),
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            }
        }
        Some(_) => {}
        None => {
            stream.rewind(checkpoint);
            return None;
        }
    }

    let id = dom.alloc_element(Element::Function(function), start_line);
    if let Some(comment) = attached_comment {
        dom.node_mut(id).attached_comment = Some(comment);
    } else {
        try_attach_same_line_comment(dom, stream, id);
    }
    Some(id)
}

fn parse_argument(stream: &mut TokenStream) -> Option<FunctionArgument> {
    let checkpoint = stream.checkpoint();
    if stream.get_punct("...").is_some() {
        return Some(FunctionArgument {
            is_varargs: true,
            ..FunctionArgument::default()
        });
    }
    let mut arg_type = TypeExpr::parse(stream)?;
    let name = stream.get_of_kind(&[TokenKind::Thing]).map(|tok| tok.text);
    if !parse_array_bounds(stream, &mut arg_type) {
        stream.rewind(checkpoint);
        return None;
    }
    let mut default_value_tokens = None;
    if stream.get_punct("=").is_some() {
        let mut tokens = Vec::new();
        let mut depth = 0i32;
        loop {
            let Some(tok) = stream.peek() else {
                stream.rewind(checkpoint);
                return None;
            };
            match tok.kind {
                TokenKind::Comma | TokenKind::RParen if depth == 0 => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            tokens.push(stream.get().unwrap());
        }
        if tokens.is_empty() {
            stream.rewind(checkpoint);
            return None;
        }
        default_value_tokens = Some(tokens);
    }
    Some(FunctionArgument {
        name,
        arg_type,
        default_value_tokens,
        ..FunctionArgument::default()
    })
}

fn parse_field(dom: &mut Dom, stream: &mut TokenStream) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();
    let start_line = stream.peek().map(|tok| tok.line)?;
    let mut is_static = false;
    while let Some(prefix) = stream.peek_of_kind(&[TokenKind::Thing]) {
        match prefix.text.as_str() {
            "static" => {
                stream.get();
                is_static = true;
            }
            "mutable" => {
                stream.get();
            }
            _ => break,
        }
    }
    let mut field_type = match TypeExpr::parse(stream) {
        Some(ty) => ty,
        None => {
            stream.rewind(checkpoint);
            return None;
        }
    };
    let mut names = Vec::new();
    loop {
        let name = match stream.get_of_kind(&[TokenKind::Thing]) {
            Some(tok) => tok.text,
            None => {
                stream.rewind(checkpoint);
                return None;
            }
        };
        names.push(name);
        if stream.get_of_kind(&[TokenKind::Comma]).is_none() {
            break;
        }
    }
    if !parse_array_bounds(stream, &mut field_type) {
        stream.rewind(checkpoint);
        return None;
    }
    let mut bitfield_width = None;
    if stream.get_of_kind(&[TokenKind::Colon]).is_some() {
        bitfield_width = stream
            .get_of_kind(&[TokenKind::Number])
            .and_then(|tok| tok.text.parse::<u32>().ok());
        if bitfield_width.is_none() {
            stream.rewind(checkpoint);
            return None;
        }
    }
    if stream.get_of_kind(&[TokenKind::Semicolon]).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    let id = dom.alloc_element(
        Element::Field(Field {
            names,
            field_type,
            is_static,
            is_internal: false,
            bitfield_width,
        }),
        start_line,
    );
    try_attach_same_line_comment(dom, stream, id);
    Some(id)
}

/// Parses a preprocessor conditional as a nested scope. `child_parser` is the
/// parser for the containing context, so conditionals inside enums contain
/// enum elements while conditionals at file scope contain declarations.
fn parse_conditional(
    dom: &mut Dom,
    stream: &mut TokenStream,
    ctx: &mut ParseContext,
    child_parser: fn(&mut Dom, &mut TokenStream, &mut ParseContext) -> Option<NodeId>,
) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();
    let directive = stream.get_of_kind(&[TokenKind::PpIf, TokenKind::PpIfdef, TokenKind::PpIfndef])?;
    let kind = match directive.kind {
        TokenKind::PpIf => ConditionalKind::If,
        TokenKind::PpIfdef => ConditionalKind::Ifdef,
        _ => ConditionalKind::Ifndef,
    };
    let condition_tokens = stream.get_rest_of_line(directive.line);
    if condition_tokens.is_empty() {
        stream.rewind(checkpoint);
        return None;
    }
    let id = dom.alloc_element(
        Element::Conditional(Conditional {
            kind,
            condition_tokens,
            ..Conditional::default()
        }),
        directive.line,
    );
    if parse_conditional_branches(dom, stream, ctx, child_parser, id).is_none() {
        stream.rewind(checkpoint);
        return None;
    }
    Some(id)
}

/// Parses the then/else branches of `conditional` up to and including the
/// closing `#endif`. `#elif` becomes a nested conditional as the sole child
/// of the else branch, sharing the final `#endif`.
fn parse_conditional_branches(
    dom: &mut Dom,
    stream: &mut TokenStream,
    ctx: &mut ParseContext,
    child_parser: fn(&mut Dom, &mut TokenStream, &mut ParseContext) -> Option<NodeId>,
    conditional: NodeId,
) -> Option<()> {
    let mut in_else = false;
    loop {
        match stream.peek().map(|tok| (tok.kind, tok.line)) {
            Some((TokenKind::PpEndif, _)) => {
                stream.get();
                return Some(());
            }
            Some((TokenKind::PpElse, line)) if !in_else => {
                stream.get();
                // Anything else on the `#else` line (typically a trailing
                // comment) is discarded
                stream.get_rest_of_line(line);
                in_else = true;
                if let Element::Conditional(cond) = dom.element_mut(conditional) {
                    cond.has_else = true;
                }
            }
            Some((TokenKind::PpElif, line)) if !in_else => {
                stream.get();
                let condition_tokens = stream.get_rest_of_line(line);
                if condition_tokens.is_empty() {
                    return None;
                }
                if let Element::Conditional(cond) = dom.element_mut(conditional) {
                    cond.has_else = true;
                }
                let nested = dom.alloc_element(
                    Element::Conditional(Conditional {
                        kind: ConditionalKind::If,
                        condition_tokens,
                        ..Conditional::default()
                    }),
                    line,
                );
                dom.add_else_child(conditional, nested);
                return parse_conditional_branches(dom, stream, ctx, child_parser, nested);
            }
            Some(_) => {
                let child = child_parser(dom, stream, ctx)?;
                if in_else {
                    dom.add_else_child(conditional, child);
                } else {
                    dom.add_child(conditional, child);
                }
            }
            None => return None,
        }
    }
}

/// Parses the non-conditional preprocessor directives: includes, defines,
/// undefs, pragmas, and `#error` lines.
fn parse_directive(dom: &mut Dom, stream: &mut TokenStream) -> Option<NodeId> {
    let checkpoint = stream.checkpoint();
    let directive = stream.get_of_kind(&[
        TokenKind::PpInclude,
        TokenKind::PpDefine,
        TokenKind::PpUndef,
        TokenKind::PpPragma,
        TokenKind::PpError,
    ])?;
    match directive.kind {
        TokenKind::PpInclude => {
            let target = match stream.get_of_kind(&[TokenKind::Str]) {
                Some(tok) => tok.text,
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            };
            Some(dom.alloc_element(Element::Include(Include { text: target }), directive.line))
        }
        TokenKind::PpDefine => {
            let name_tok = match stream.get_of_kind(&[TokenKind::Thing]) {
                Some(tok) if tok.line == directive.line => tok,
                _ => {
                    stream.rewind(checkpoint);
                    return None;
                }
            };
            // A `(` with no space after the name makes this a function-like
            // macro
            let mut args = None;
            if stream
                .peek_of_kind(&[TokenKind::LParen])
                .is_some_and(|tok| {
                    tok.line == name_tok.line
                        && tok.column == name_tok.column + name_tok.text.chars().count() as u32
                })
            {
                let mut arg_tokens = vec![stream.get().unwrap()];
                let mut depth = 1i32;
                while depth > 0 {
                    let tok = match stream.get() {
                        Some(tok) => tok,
                        None => {
                            stream.rewind(checkpoint);
                            return None;
                        }
                    };
                    match tok.kind {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen => depth -= 1,
                        _ => {}
                    }
                    arg_tokens.push(tok);
                }
                args = Some(collapse_tokens(&arg_tokens));
            }
            let mut content_tokens = stream.get_rest_of_line(directive.line);
            // A trailing comment on the define line attaches to the define
            // rather than being macro content
            let mut attached = None;
            if let Some(last) = content_tokens.last() {
                if matches!(last.kind, TokenKind::LineComment | TokenKind::BlockComment) {
                    let tok = content_tokens.pop().unwrap();
                    attached = Some(Comment {
                        text: tok.text,
                        is_block: tok.kind == TokenKind::BlockComment,
                        line: tok.line,
                        alignment: 0,
                    });
                }
            }
            let id = dom.alloc_element(
                Element::Define(Define {
                    name: name_tok.text,
                    args,
                    content_tokens,
                    is_undef: false,
                    exclude_from_metadata: false,
                }),
                directive.line,
            );
            dom.node_mut(id).attached_comment = attached;
            Some(id)
        }
        TokenKind::PpUndef => {
            let name_tok = match stream.get_of_kind(&[TokenKind::Thing]) {
                Some(tok) => tok,
                None => {
                    stream.rewind(checkpoint);
                    return None;
                }
            };
            Some(dom.alloc_element(
                Element::Define(Define {
                    name: name_tok.text,
                    is_undef: true,
                    ..Define::default()
                }),
                directive.line,
            ))
        }
        TokenKind::PpPragma => {
            let rest = stream.get_rest_of_line(directive.line);
            if rest.len() == 1 && rest[0].text == "once" {
                Some(dom.alloc_element(Element::PragmaOnce, directive.line))
            } else {
                let mut tokens = vec![directive.clone()];
                tokens.extend(rest);
                Some(dom.alloc_element(Element::CodeBlock(CodeBlock { tokens }), directive.line))
            }
        }
        _ => {
            // #error: kept verbatim
            let mut tokens = vec![directive.clone()];
            tokens.extend(stream.get_rest_of_line(directive.line));
            Some(dom.alloc_element(Element::CodeBlock(CodeBlock { tokens }), directive.line))
        }
    }
}

fn parse_comment(dom: &mut Dom, stream: &mut TokenStream) -> Option<NodeId> {
    let tok = stream.get_of_kind(&[TokenKind::LineComment, TokenKind::BlockComment])?;
    Some(dom.alloc_element(
        Element::Comment(Comment {
            text: tok.text,
            is_block: tok.kind == TokenKind::BlockComment,
            line: tok.line,
            alignment: 0,
        }),
        tok.line,
    ))
}

fn parse_blank_lines(dom: &mut Dom, stream: &mut TokenStream) -> Option<NodeId> {
    let tok = stream.get_of_kind(&[TokenKind::BlankLines])?;
    let count = tok.text.matches('\n').count().max(1) as u32;
    Some(dom.alloc_element(Element::BlankLines(count), tok.line))
}

/// Consumes a balanced brace block, returning all its tokens including the
/// outer braces.
fn parse_code_block(stream: &mut TokenStream) -> Option<Vec<Token>> {
    let opener = stream.get_of_kind(&[TokenKind::LBrace])?;
    let mut tokens = vec![opener];
    let mut depth = 1i32;
    while depth > 0 {
        let tok = stream.get()?;
        match tok.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth -= 1,
            _ => {}
        }
        tokens.push(tok);
    }
    Some(tokens)
}

/// If the next token is a comment on the same line as the just-parsed
/// declaration's final token, attaches it to `id`.
fn try_attach_same_line_comment(dom: &mut Dom, stream: &mut TokenStream, id: NodeId) {
    let last_line = stream.last_line();
    if let Some(tok) = stream.peek_of_kind(&[TokenKind::LineComment, TokenKind::BlockComment]) {
        if tok.line == last_line {
            let tok = stream.get().unwrap();
            dom.node_mut(id).attached_comment = Some(Comment {
                text: tok.text,
                is_block: tok.kind == TokenKind::BlockComment,
                line: tok.line,
                alignment: 0,
            });
        }
    }
}

/// Parses a standalone function signature (used for injecting manual helper
/// declarations). The signature must consume the entire stream.
pub fn parse_standalone_function(dom: &mut Dom, stream: &mut TokenStream) -> Option<NodeId> {
    let mut ctx = ParseContext::default();
    let id = parse_function(dom, stream, &mut ctx)?;
    if stream.is_exhausted() {
        Some(id)
    } else {
        None
    }
}
