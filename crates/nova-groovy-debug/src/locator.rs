//! Lexical type lookup for source positions.

use crate::index::ProjectIndex;
use crate::lexical::TypeRef;
use crate::source::SourcePosition;

/// Innermost type definition enclosing `position`.
///
/// Starts from the innermost scope at the position's offset (the first code
/// character of the line for line-based positions) and walks outward to the
/// first type definition. `None` for unknown or non-Groovy files, lines past
/// the end of the file, and positions outside every type.
pub fn find_enclosing_type(
    index: &ProjectIndex,
    position: &SourcePosition,
    max_depth: usize,
) -> Option<TypeRef> {
    let file = index.file(position.file)?;
    if !file.is_groovy() {
        return None;
    }
    let offset = file.offset_of(position)?;
    let leaf = file.scopes().leaf_at(offset)?;
    let id = file.scopes().enclosing_type(leaf, max_depth)?;
    Some(TypeRef { file: file.id(), id })
}

/// Closest type definition strictly enclosing `ty` that has a qualified name.
///
/// This is the single anchor used for anonymous, local and closure types; if
/// it is absent the type cannot be resolved at all.
pub fn find_named_ancestor(index: &ProjectIndex, ty: TypeRef, max_depth: usize) -> Option<TypeRef> {
    let id = index
        .file(ty.file)?
        .scopes()
        .named_ancestor(ty.id, max_depth)?;
    Some(TypeRef { file: ty.file, id })
}

/// Qualified name of the type definition, if it has one.
pub fn qualified_name(index: &ProjectIndex, ty: TypeRef) -> Option<&str> {
    index.type_definition(ty)?.qualified_name.as_deref()
}

#[cfg(test)]
mod tests {
    use text_size::TextSize;

    use super::*;
    use crate::lexical::ScopeKind;

    const FOO: &str = "package p\n\nclass Foo {\n    void run() {\n        def c = {\n            println 1\n        }\n    }\n}\n";

    fn index() -> (ProjectIndex, crate::source::FileId) {
        let mut index = ProjectIndex::new();
        let module = index.add_module("app");
        let file = index.add_file(module, "src/p/Foo.groovy", FOO).unwrap();
        (index, file)
    }

    #[test]
    fn line_positions_resolve_through_member_scopes() {
        let (index, file) = index();

        let in_method = find_enclosing_type(&index, &SourcePosition::from_line(file, 3), 64).unwrap();
        assert_eq!(qualified_name(&index, in_method), Some("p.Foo"));

        let in_closure = find_enclosing_type(&index, &SourcePosition::from_line(file, 5), 64).unwrap();
        assert_eq!(index.type_definition(in_closure).unwrap().kind, ScopeKind::Closure);
        assert_eq!(qualified_name(&index, in_closure), None);

        let anchor = find_named_ancestor(&index, in_closure, 64).unwrap();
        assert_eq!(anchor, in_method);
        assert_eq!(find_named_ancestor(&index, anchor, 64), None);
    }

    #[test]
    fn positions_outside_types_or_files_are_unresolvable() {
        let (index, file) = index();
        assert_eq!(find_enclosing_type(&index, &SourcePosition::from_line(file, 0), 64), None);
        assert_eq!(find_enclosing_type(&index, &SourcePosition::from_line(file, 40), 64), None);
        assert_eq!(
            find_enclosing_type(
                &index,
                &SourcePosition::from_line(crate::source::FileId::from_raw(9), 0),
                64
            ),
            None
        );

        let source = index.file(file).unwrap();
        let past_end = SourcePosition {
            file,
            line: 0,
            offset: Some(TextSize::from(10_000)),
        };
        assert_eq!(source.offset_of(&past_end), None);
        assert_eq!(find_enclosing_type(&index, &past_end, 64), None);
    }

    #[test]
    fn non_groovy_files_are_not_type_bearing() {
        let mut index = ProjectIndex::new();
        let module = index.add_module("app");
        let file = index.add_file(module, "Foo.java", "class Foo {\n  int x;\n}\n").unwrap();
        assert_eq!(find_enclosing_type(&index, &SourcePosition::from_line(file, 1), 64), None);
    }
}
