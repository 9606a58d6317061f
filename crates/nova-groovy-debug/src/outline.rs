//! Best-effort outline scanner for Groovy sources.
//!
//! This is not a parser. It tracks braces, skips comments and string
//! literals, and recognizes just enough syntax to build the lexical scope tree
//! the position manager needs:
//!
//! - `package a.b`
//! - `class` / `interface` / `@interface` / `trait` / `enum` declarations
//! - anonymous classes (`new T(...) { ... }`) and enum constant bodies
//! - closure literals (`{` after `=`, `(`, `,`, `:`, `[`, `->`, a call-like
//!   identifier such as `each`, or the argument list of a call as in
//!   `inject(0) { ... }`)
//! - member bodies (methods, constructors, initializers) directly inside a
//!   type body
//!
//! Files with statements outside type declarations are scripts: they get an
//! implicit script class named after the file, unless one of the declared
//! classes already has that name. A file without any type declaration is
//! always a script.

use text_size::{TextRange, TextSize};

use crate::lexical::{ScopeArena, ScopeId, ScopeKind, ScopeNode};

/// Keywords that introduce a plain block rather than a closure.
const BLOCK_KEYWORDS: &[&str] = &[
    "else",
    "try",
    "finally",
    "do",
    "static",
    "synchronized",
    "extends",
    "implements",
];

/// Keywords whose parenthesized header is followed by a plain block.
const CONTROL_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "synchronized"];

/// Words that start an expression, so the identifier after them is not a
/// declaration name.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "new", "in", "assert", "throw", "case", "else", "do", "try", "finally",
];

/// Modifiers allowed in front of a top-level type declaration.
const TYPE_MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "abstract",
    "final",
    "static",
    "sealed",
    "strictfp",
];

pub fn scan(text: &str, script_name: &str) -> ScopeArena {
    let declared = Scanner::new(text, None).run();
    let declares_script_class = declared
        .top_level_types
        .iter()
        .any(|name| name == script_name);
    let is_script = declared.top_level_types.is_empty()
        || (declared.top_level_code && !declares_script_class);
    if !is_script {
        return declared.arena;
    }

    let script_name = match &declared.package {
        Some(package) => format!("{package}.{script_name}"),
        None => script_name.to_string(),
    };
    Scanner::new(text, Some(script_name)).run().arena
}

struct Outline {
    arena: ScopeArena,
    package: Option<String>,
    /// Simple names of the types declared at the top level.
    top_level_types: Vec<String>,
    /// Whether anything besides package, imports and type declarations sits
    /// at the top level.
    top_level_code: bool,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Class, interface, enum, trait or anonymous class body.
    TypeBody(ScopeId),
    /// Member, closure or plain block; plain blocks have no scope.
    Code(Option<ScopeId>),
}

impl Frame {
    fn scope(self) -> Option<ScopeId> {
        match self {
            Frame::TypeBody(id) => Some(id),
            Frame::Code(id) => id,
        }
    }
}

/// An identifier, as far as brace classification cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Word {
    start: TextSize,
    block_keyword: bool,
    control_keyword: bool,
    /// Can precede a declaration name (`def`, `void`, a type name).
    type_like: bool,
    /// Follows a type-like token on the same line, as in `def greet`.
    after_type: bool,
}

impl Word {
    fn keyword(start: TextSize) -> Self {
        Self {
            start,
            block_keyword: true,
            control_keyword: false,
            type_like: false,
            after_type: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Paren {
    /// Start of `new` when the parenthesis belongs to `new T(...)`.
    new_start: Option<TextSize>,
    /// Identifier directly before `(`.
    callee: Option<Word>,
}

impl Paren {
    fn after_control_keyword(self) -> bool {
        self.callee.is_some_and(|word| word.control_keyword)
    }

    fn declares_method(self) -> bool {
        self.callee.is_some_and(|word| word.after_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    None,
    Punct(u8),
    Arrow,
    Ident(Word),
    CloseParen(Paren),
    CloseBrace,
    Value,
}

impl Prev {
    fn opens_closure_in_code(self) -> bool {
        match self {
            Prev::Punct(b'=' | b'(' | b',' | b':' | b'[' | b'?') | Prev::Arrow => true,
            Prev::Ident(word) => !word.block_keyword,
            Prev::CloseParen(paren) => !paren.after_control_keyword(),
            _ => false,
        }
    }

    fn opens_closure_in_type_body(self) -> bool {
        matches!(self, Prev::Punct(b'=' | b'(' | b',' | b':' | b'['))
    }

    /// Start of the enum constant whose body opens next.
    fn enum_constant_start(self) -> Option<TextSize> {
        match self {
            Prev::Ident(word) if !word.block_keyword => Some(word.start),
            Prev::CloseParen(Paren {
                callee: Some(word),
                ..
            }) => Some(word.start),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct PendingType {
    kind: ScopeKind,
    name: String,
    start: TextSize,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    arena: ScopeArena,
    frames: Vec<Frame>,
    parens: Vec<Paren>,
    /// Parenthesis stacks of the enclosing brace frames.
    saved_parens: Vec<Vec<Paren>>,
    /// Frame depths currently inside a field initializer (`def x = ...`).
    initializers: Vec<usize>,
    /// Frame depths of enum bodies still in their constant list.
    enum_constants: Vec<usize>,
    package: Option<String>,
    script: Option<ScopeId>,
    expect_type_name: Option<(ScopeKind, TextSize)>,
    pending_type: Option<PendingType>,
    pending_new: Option<TextSize>,
    prev: Prev,
    line_start: bool,
    top_level_types: Vec<String>,
    top_level_code: bool,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, script_name: Option<String>) -> Self {
        let mut arena = ScopeArena::default();
        let script = script_name.map(|qualified_name| {
            let name = qualified_name
                .rsplit('.')
                .next()
                .unwrap_or(&qualified_name)
                .to_string();
            arena.alloc(ScopeNode {
                kind: ScopeKind::Script,
                name: Some(name),
                qualified_name: Some(qualified_name),
                parent: None,
                range: TextRange::up_to(TextSize::from(text.len() as u32)),
            })
        });
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            arena,
            frames: Vec::new(),
            parens: Vec::new(),
            saved_parens: Vec::new(),
            initializers: Vec::new(),
            enum_constants: Vec::new(),
            package: None,
            script,
            expect_type_name: None,
            pending_type: None,
            pending_new: None,
            prev: Prev::None,
            line_start: true,
            top_level_types: Vec::new(),
            top_level_code: false,
        }
    }

    fn run(mut self) -> Outline {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'"' | b'\'' => {
                    self.skip_string(b);
                    self.prev = Prev::Value;
                }
                b'\n' | b'\r' => {
                    self.pending_new = None;
                    self.line_start = true;
                    if self.initializers.last() == Some(&self.frames.len()) {
                        self.initializers.pop();
                    }
                    self.pos += 1;
                }
                b if b.is_ascii_whitespace() => self.pos += 1,
                b if is_ident_start(b) => self.ident(),
                b if b.is_ascii_digit() => {
                    while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    self.prev = Prev::Value;
                }
                b'(' => {
                    let callee = match self.prev {
                        Prev::Ident(word) => Some(word),
                        _ => None,
                    };
                    self.parens.push(Paren {
                        new_start: self.pending_new.take(),
                        callee,
                    });
                    self.prev = Prev::Punct(b'(');
                    self.pos += 1;
                }
                b')' => {
                    let paren = self.parens.pop().unwrap_or_default();
                    self.prev = Prev::CloseParen(paren);
                    self.pos += 1;
                }
                b'{' => self.open_brace(),
                b'}' => self.close_brace(),
                b'-' if self.peek(1) == Some(b'>') => {
                    self.prev = Prev::Arrow;
                    self.pos += 2;
                }
                _ => {
                    let depth = self.frames.len();
                    match b {
                        b';' => {
                            self.pending_new = None;
                            self.expect_type_name = None;
                            self.pending_type = None;
                            if self.initializers.last() == Some(&depth) {
                                self.initializers.pop();
                            }
                            if self.enum_constants.last() == Some(&depth) {
                                self.enum_constants.pop();
                            }
                        }
                        b'=' if self.parens.is_empty()
                            && matches!(self.frames.last(), Some(Frame::TypeBody(_)))
                            && self.initializers.last() != Some(&depth) =>
                        {
                            self.initializers.push(depth);
                        }
                        _ => {}
                    }
                    self.prev = Prev::Punct(b);
                    self.pos += 1;
                }
            }
        }

        let end = TextSize::from(self.text.len() as u32);
        while let Some(frame) = self.frames.pop() {
            if let Some(id) = frame.scope() {
                self.arena.set_end(id, end);
            }
        }

        Outline {
            arena: self.arena,
            package: self.package,
            top_level_types: self.top_level_types,
            top_level_code: self.top_level_code,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn offset(&self) -> TextSize {
        TextSize::from(self.pos as u32)
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && !matches!(self.bytes[self.pos], b'\n' | b'\r') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_string(&mut self, quote: u8) {
        if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
            self.pos += 3;
            while self.pos < self.bytes.len() {
                match self.bytes[self.pos] {
                    b'\\' => self.pos += 2,
                    b if b == quote && self.peek(1) == Some(quote) && self.peek(2) == Some(quote) => {
                        self.pos += 3;
                        return;
                    }
                    _ => self.pos += 1,
                }
            }
            return;
        }

        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                // Unterminated single-line literal: resume scanning at the line break.
                b'\n' | b'\r' => return,
                b if b == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn ident(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.pos += 1;
        }
        let word = &self.text[start..self.pos];
        let start = TextSize::from(start as u32);
        let line_start = std::mem::replace(&mut self.line_start, false);

        if let Some((kind, decl_start)) = self.expect_type_name.take() {
            self.pending_type = Some(PendingType {
                kind,
                name: word.to_string(),
                start: decl_start,
            });
            self.prev = Prev::Ident(Word::keyword(start));
            return;
        }

        // `Foo.class`, `x.new`, `map.trait` are member accesses, not keywords.
        let member_access = self.prev == Prev::Punct(b'.');
        if !member_access {
            let kind = match word {
                "class" => Some(ScopeKind::Class),
                "interface" => Some(ScopeKind::Interface),
                "trait" => Some(ScopeKind::Trait),
                "enum" => Some(ScopeKind::Enum),
                _ => None,
            };
            if let Some(kind) = kind {
                let decl_start = match self.prev {
                    Prev::Punct(b'@') => start - TextSize::from(1),
                    _ => start,
                };
                self.expect_type_name = Some((kind, decl_start));
                self.prev = Prev::Ident(Word::keyword(start));
                return;
            }

            match word {
                "package" if self.frames.is_empty() && self.package.is_none() => {
                    self.package = self.rest_of_statement();
                    self.prev = Prev::None;
                    return;
                }
                "import" if self.frames.is_empty() => {
                    self.rest_of_statement();
                    self.prev = Prev::None;
                    return;
                }
                "new" => self.pending_new = Some(start),
                _ => {}
            }
        }

        if self.frames.is_empty()
            && self.parens.is_empty()
            && self.pending_type.is_none()
            && !member_access
            && self.prev != Prev::Punct(b'@')
            && !TYPE_MODIFIERS.contains(&word)
        {
            self.top_level_code = true;
        }

        let after_type = !line_start
            && match self.prev {
                Prev::Ident(prev) => prev.type_like,
                Prev::Punct(b'>' | b']') => true,
                _ => false,
            };
        let control_keyword = CONTROL_KEYWORDS.contains(&word);
        self.prev = Prev::Ident(Word {
            start,
            block_keyword: BLOCK_KEYWORDS.contains(&word),
            control_keyword,
            type_like: !control_keyword && !EXPRESSION_KEYWORDS.contains(&word),
            after_type,
        });
    }

    /// Consumes the rest of a `package` or `import` statement.
    fn rest_of_statement(&mut self) -> Option<String> {
        let start = self.pos;
        while self.pos < self.bytes.len() && !matches!(self.bytes[self.pos], b';' | b'\n' | b'\r')
        {
            self.pos += 1;
        }
        let rest = self.text[start..self.pos].trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }

    fn open_brace(&mut self) {
        let brace = self.offset();
        self.pos += 1;
        self.expect_type_name = None;
        self.pending_new = None;

        let depth = self.frames.len();
        let mut opens_enum = false;
        let frame = if let Some(pending) = self.pending_type.take() {
            let qualified_name = self.qualified_name_for(&pending.name);
            // Top-level types stay top-level even when the file is a script.
            let parent = if self.frames.is_empty() {
                self.top_level_types.push(pending.name.clone());
                None
            } else {
                self.current_scope()
            };
            opens_enum = pending.kind == ScopeKind::Enum;
            let id = self.alloc_in(
                parent,
                pending.kind,
                Some(pending.name),
                qualified_name,
                pending.start,
            );
            Frame::TypeBody(id)
        } else if let Prev::CloseParen(Paren {
            new_start: Some(start),
            ..
        }) = self.prev
        {
            Frame::TypeBody(self.alloc(ScopeKind::Anonymous, None, None, start))
        } else {
            match self.frames.last().copied() {
                Some(Frame::TypeBody(_)) => {
                    let constant = self
                        .prev
                        .enum_constant_start()
                        .filter(|_| self.enum_constants.last() == Some(&depth));
                    let in_initializer = self.initializers.last() == Some(&depth);
                    if let Some(start) = constant {
                        Frame::TypeBody(self.alloc(ScopeKind::Anonymous, None, None, start))
                    } else if self.prev.opens_closure_in_type_body()
                        || (in_initializer && self.prev.opens_closure_in_code())
                    {
                        Frame::Code(Some(self.alloc(ScopeKind::Closure, None, None, brace)))
                    } else {
                        Frame::Code(Some(self.alloc(ScopeKind::Member, None, None, brace)))
                    }
                }
                Some(Frame::Code(_)) if self.prev.opens_closure_in_code() => {
                    Frame::Code(Some(self.alloc(ScopeKind::Closure, None, None, brace)))
                }
                None if self.script.is_some() => match self.prev {
                    // Script method: `def greet(name) { ... }`.
                    Prev::CloseParen(paren) if paren.declares_method() => {
                        Frame::Code(Some(self.alloc(ScopeKind::Member, None, None, brace)))
                    }
                    prev if prev.opens_closure_in_code() => {
                        Frame::Code(Some(self.alloc(ScopeKind::Closure, None, None, brace)))
                    }
                    _ => Frame::Code(None),
                },
                _ => Frame::Code(None),
            }
        };

        self.frames.push(frame);
        self.saved_parens.push(std::mem::take(&mut self.parens));
        if opens_enum {
            self.enum_constants.push(self.frames.len());
        }
        self.prev = Prev::Punct(b'{');
    }

    fn close_brace(&mut self) {
        self.pos += 1;
        if let Some(frame) = self.frames.pop() {
            if let Some(id) = frame.scope() {
                self.arena.set_end(id, self.offset());
            }
            self.parens = self.saved_parens.pop().unwrap_or_default();
        }
        let depth = self.frames.len();
        self.initializers.retain(|&d| d <= depth);
        self.enum_constants.retain(|&d| d <= depth);
        self.pending_new = None;
        self.pending_type = None;
        self.prev = Prev::CloseBrace;
    }

    /// Binary name of a type declared at the current nesting.
    ///
    /// Top-level types are package-qualified, member types extend their
    /// enclosing type's name with `$`, and types declared in code (local
    /// classes) have none.
    fn qualified_name_for(&self, name: &str) -> Option<String> {
        match self.frames.last() {
            None => Some(match &self.package {
                Some(package) => format!("{package}.{name}"),
                None => name.to_string(),
            }),
            Some(Frame::TypeBody(id)) => self
                .arena
                .get(*id)
                .and_then(|outer| outer.qualified_name.as_deref())
                .map(|outer| format!("{outer}${name}")),
            Some(Frame::Code(_)) => None,
        }
    }

    fn current_scope(&self) -> Option<ScopeId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.scope())
            .or(self.script)
    }

    fn alloc(
        &mut self,
        kind: ScopeKind,
        name: Option<String>,
        qualified_name: Option<String>,
        start: TextSize,
    ) -> ScopeId {
        let parent = self.current_scope();
        self.alloc_in(parent, kind, name, qualified_name, start)
    }

    fn alloc_in(
        &mut self,
        parent: Option<ScopeId>,
        kind: ScopeKind,
        name: Option<String>,
        qualified_name: Option<String>,
        start: TextSize,
    ) -> ScopeId {
        let end = self.offset();
        self.arena.alloc(ScopeNode {
            kind,
            name,
            qualified_name,
            parent,
            range: TextRange::new(start, end.max(start)),
        })
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_names(arena: &ScopeArena) -> Vec<(ScopeKind, Option<String>, Option<u32>)> {
        arena
            .iter()
            .map(|(_, node)| {
                (
                    node.kind,
                    node.qualified_name.clone(),
                    node.parent.map(ScopeId::to_raw),
                )
            })
            .collect()
    }

    #[test]
    fn scans_named_anonymous_and_closure_scopes() {
        let text = r#"package com.example

class Foo {
    static class Inner {
        int size() { 1 }
    }

    void run() {
        def task = new Runnable() {
            void run() {
                println "in {anonymous}"
            }
        }
        [1, 2].each { println it }
        if (task) {
            class Local {}
        }
    }
}
"#;
        let arena = scan(text, "Foo");
        assert_eq!(
            kinds_and_names(&arena),
            vec![
                (ScopeKind::Class, Some("com.example.Foo".to_string()), None),
                (ScopeKind::Class, Some("com.example.Foo$Inner".to_string()), Some(0)),
                (ScopeKind::Member, None, Some(1)),
                (ScopeKind::Member, None, Some(0)),
                (ScopeKind::Anonymous, None, Some(3)),
                (ScopeKind::Member, None, Some(4)),
                (ScopeKind::Closure, None, Some(3)),
                (ScopeKind::Class, None, Some(3)),
            ]
        );

        let anonymous = arena.get(ScopeId::from_raw(4)).unwrap();
        let start = u32::from(anonymous.range.start()) as usize;
        let end = u32::from(anonymous.range.end()) as usize;
        assert!(text[start..end].starts_with("new Runnable() {"));
        assert!(text[start..end].ends_with('}'));
    }

    #[test]
    fn comments_strings_and_member_access_do_not_declare_types() {
        let text = r#"
// class Commented {
/* interface Hidden { */
class Real {
    def s = 'class Fake {'
    def t = """
        enum Nope {
    """
    def k = Real.class
}
"#;
        let arena = scan(text, "Real");
        assert_eq!(
            kinds_and_names(&arena),
            vec![(ScopeKind::Class, Some("Real".to_string()), None)]
        );
    }

    #[test]
    fn field_closures_are_closures_not_members() {
        let text = "class Foo {\n    def handler = { x ->\n        x * 2\n    }\n    static {\n    }\n}\n";
        let arena = scan(text, "Foo");
        let kinds: Vec<_> = arena.iter().map(|(_, n)| n.kind).collect();
        assert_eq!(
            kinds,
            vec![ScopeKind::Class, ScopeKind::Closure, ScopeKind::Member]
        );
    }

    #[test]
    fn scripts_get_an_implicit_class() {
        let text = "package scripts\n\ndef greet = { name ->\n    println name\n}\ngreet('x')\n";
        let arena = scan(text, "hello");
        let script = arena.get(ScopeId::from_raw(0)).unwrap();
        assert_eq!(script.kind, ScopeKind::Script);
        assert_eq!(script.qualified_name.as_deref(), Some("scripts.hello"));
        assert_eq!(u32::from(script.range.end()) as usize, text.len());

        let closure = arena.get(ScopeId::from_raw(1)).unwrap();
        assert_eq!(closure.kind, ScopeKind::Closure);
        assert_eq!(closure.parent, Some(ScopeId::from_raw(0)));
    }

    #[test]
    fn annotation_types_and_traits_are_declarations() {
        let text = "@interface Marker {}\ntrait Greets { def hi() { 'hi' } }\n";
        let arena = scan(text, "Marker");
        let names: Vec<_> = arena
            .iter()
            .map(|(_, n)| (n.kind, n.qualified_name.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                (ScopeKind::Interface, Some("Marker".to_string())),
                (ScopeKind::Trait, Some("Greets".to_string())),
                (ScopeKind::Member, None),
            ]
        );
        assert_eq!(u32::from(arena.get(ScopeId::from_raw(0)).unwrap().range.start()), 0);
    }

    #[test]
    fn braces_after_call_arguments_open_closures() {
        let text = r#"class Foo {
    def run() {
        [1, 2].inject(0) { acc, v ->
            acc + v
        }
        for (i in 0..2) {
            println i
        }
        synchronized (this) {
            with(i) { println it }
        }
    }
}
"#;
        let arena = scan(text, "Foo");
        assert_eq!(
            kinds_and_names(&arena),
            vec![
                (ScopeKind::Class, Some("Foo".to_string()), None),
                (ScopeKind::Member, None, Some(0)),
                (ScopeKind::Closure, None, Some(1)),
                (ScopeKind::Closure, None, Some(1)),
            ]
        );
    }

    #[test]
    fn field_initializer_calls_take_closures() {
        let text = r#"class Foo {
    def names = [1, 2].collect {
        it * 2
    }
    def total = sum(1) { a -> a }
    @Deprecated(since = "1") void run() {
    }
}
"#;
        let arena = scan(text, "Foo");
        let kinds: Vec<_> = arena.iter().map(|(_, n)| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ScopeKind::Class,
                ScopeKind::Closure,
                ScopeKind::Closure,
                ScopeKind::Member,
            ]
        );
    }

    #[test]
    fn enum_constant_bodies_are_anonymous_classes() {
        let text = r#"enum Op {
    PLUS {
        int apply(int a) { a }
    },
    MINUS(1) {
        int apply(int a) { -a }
    };

    int apply(int a) { 0 }
}
"#;
        let arena = scan(text, "Op");
        assert_eq!(
            kinds_and_names(&arena),
            vec![
                (ScopeKind::Enum, Some("Op".to_string()), None),
                (ScopeKind::Anonymous, None, Some(0)),
                (ScopeKind::Member, None, Some(1)),
                (ScopeKind::Anonymous, None, Some(0)),
                (ScopeKind::Member, None, Some(3)),
                (ScopeKind::Member, None, Some(0)),
            ]
        );

        let plus = arena.get(ScopeId::from_raw(1)).unwrap();
        let start = u32::from(plus.range.start()) as usize;
        assert!(text[start..].starts_with("PLUS {"));
    }

    #[test]
    fn top_level_statements_next_to_classes_make_a_script() {
        let text = "class Named {\n}\n\nprintln 'top level statement'\ndef r = new Runnable() {\n    void run() {\n        println 'x'\n    }\n}\n";
        let arena = scan(text, "Mixed");
        assert_eq!(
            kinds_and_names(&arena),
            vec![
                (ScopeKind::Script, Some("Mixed".to_string()), None),
                (ScopeKind::Class, Some("Named".to_string()), None),
                (ScopeKind::Anonymous, None, Some(0)),
                (ScopeKind::Member, None, Some(2)),
            ]
        );
    }

    #[test]
    fn a_class_named_after_the_file_suppresses_the_script() {
        let text = "class Tool {\n}\n\nnew Runnable() {\n}\n";
        let arena = scan(text, "Tool");
        assert_eq!(
            kinds_and_names(&arena),
            vec![
                (ScopeKind::Class, Some("Tool".to_string()), None),
                (ScopeKind::Anonymous, None, None),
            ]
        );
    }

    #[test]
    fn imports_and_annotations_are_not_top_level_code() {
        let text = "import static java.lang.Math.max\nimport groovy.transform.CompileStatic\n\n@CompileStatic\n@groovy.transform.ToString(includeNames = true)\npublic final class Foo {\n}\n";
        let arena = scan(text, "Other");
        assert_eq!(
            kinds_and_names(&arena),
            vec![(ScopeKind::Class, Some("Foo".to_string()), None)]
        );
    }

    #[test]
    fn script_methods_are_members_and_calls_take_closures() {
        let text = "def greet(name) {\n    println name\n}\nwith(1) {\n    println it\n}\nif (true) {\n    greet('x')\n}\n";
        let arena = scan(text, "tool");
        assert_eq!(
            kinds_and_names(&arena),
            vec![
                (ScopeKind::Script, Some("tool".to_string()), None),
                (ScopeKind::Member, None, Some(0)),
                (ScopeKind::Closure, None, Some(0)),
            ]
        );
    }

    #[test]
    fn carriage_returns_end_lines() {
        let text = "class Foo {\r    def x = 1\r    def run() {\r    }\r}\r";
        let arena = scan(text, "Foo");
        let kinds: Vec<_> = arena.iter().map(|(_, n)| n.kind).collect();
        assert_eq!(kinds, vec![ScopeKind::Class, ScopeKind::Member]);
    }
}
