//! Lexical scope tree of a Groovy file.
//!
//! Scopes live in an arena and point at their enclosing scope by index. All
//! upward walks are bounded: a malformed tree (self-parent, cycle) ends the
//! walk instead of looping.

use text_size::{TextRange, TextSize};

use crate::source::FileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Class,
    Interface,
    Trait,
    Enum,
    /// Implicit class of a Groovy script file.
    Script,
    /// `new T(...) { ... }`
    Anonymous,
    /// Closure literal; compiled into a synthetic nested class.
    Closure,
    /// Method, constructor or initializer body.
    Member,
}

impl ScopeKind {
    pub fn is_type_definition(self) -> bool {
        !matches!(self, ScopeKind::Member)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeNode {
    pub kind: ScopeKind,
    pub name: Option<String>,
    /// Binary name usable for runtime lookups (`pkg.Outer$Inner`). Absent for
    /// anonymous, local and closure types.
    pub qualified_name: Option<String>,
    pub parent: Option<ScopeId>,
    pub range: TextRange,
}

/// One lexical type definition, addressed project-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    pub file: FileId,
    pub id: ScopeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeArena {
    nodes: Vec<ScopeNode>,
}

impl ScopeArena {
    pub fn alloc(&mut self, node: ScopeNode) -> ScopeId {
        let id = ScopeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&ScopeNode> {
        self.nodes.get(id.0 as usize)
    }

    pub(crate) fn set_end(&mut self, id: ScopeId, end: TextSize) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            let start = node.range.start();
            node.range = TextRange::new(start, end.max(start));
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &ScopeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (ScopeId(idx as u32), node))
    }

    /// Innermost scope whose range contains `offset`.
    ///
    /// Ties between equally sized ranges go to the later (deeper) node, since
    /// children are always allocated after their parents.
    pub fn leaf_at(&self, offset: TextSize) -> Option<ScopeId> {
        let mut best: Option<(ScopeId, TextSize)> = None;
        for (id, node) in self.iter() {
            if !node.range.contains(offset) {
                continue;
            }
            match best {
                Some((_, len)) if node.range.len() > len => {}
                _ => best = Some((id, node.range.len())),
            }
        }
        best.map(|(id, _)| id)
    }

    /// The enclosing scope of `id`. A node listing itself as its parent has
    /// none.
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id)?.parent.filter(|&parent| parent != id)
    }

    /// Nearest type definition at or above `id`.
    pub fn enclosing_type(&self, id: ScopeId, max_depth: usize) -> Option<ScopeId> {
        let mut current = id;
        for _ in 0..self.walk_bound(max_depth) {
            let node = self.get(current)?;
            if node.kind.is_type_definition() {
                return Some(current);
            }
            current = self.parent(current)?;
        }
        None
    }

    /// Nearest type definition strictly above `id` that has a qualified name.
    pub fn named_ancestor(&self, id: ScopeId, max_depth: usize) -> Option<ScopeId> {
        let mut current = self.parent(id)?;
        for _ in 0..self.walk_bound(max_depth) {
            let node = self.get(current)?;
            if node.kind.is_type_definition() && node.qualified_name.is_some() {
                return Some(current);
            }
            current = self.parent(current)?;
        }
        None
    }

    /// Qualified names declared in this file.
    pub fn named_types(&self) -> impl Iterator<Item = (&str, ScopeId)> {
        self.iter()
            .filter(|(_, node)| node.kind.is_type_definition())
            .filter_map(|(id, node)| node.qualified_name.as_deref().map(|name| (name, id)))
    }

    // A walk can visit each node at most once before it must have cycled.
    fn walk_bound(&self, max_depth: usize) -> usize {
        self.nodes.len().min(max_depth.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: ScopeKind, qname: Option<&str>, parent: Option<u32>, range: (u32, u32)) -> ScopeNode {
        ScopeNode {
            kind,
            name: qname.map(str::to_string),
            qualified_name: qname.map(str::to_string),
            parent: parent.map(ScopeId),
            range: TextRange::new(TextSize::from(range.0), TextSize::from(range.1)),
        }
    }

    fn sample() -> ScopeArena {
        let mut arena = ScopeArena::default();
        arena.alloc(node(ScopeKind::Class, Some("Foo"), None, (0, 100)));
        arena.alloc(node(ScopeKind::Member, None, Some(0), (10, 90)));
        arena.alloc(node(ScopeKind::Anonymous, None, Some(1), (20, 80)));
        arena.alloc(node(ScopeKind::Member, None, Some(2), (30, 70)));
        arena.alloc(node(ScopeKind::Closure, None, Some(3), (40, 60)));
        arena
    }

    #[test]
    fn leaf_is_innermost_scope() {
        let arena = sample();
        assert_eq!(arena.leaf_at(TextSize::from(5)), Some(ScopeId(0)));
        assert_eq!(arena.leaf_at(TextSize::from(35)), Some(ScopeId(3)));
        assert_eq!(arena.leaf_at(TextSize::from(45)), Some(ScopeId(4)));
        assert_eq!(arena.leaf_at(TextSize::from(100)), None);
    }

    #[test]
    fn enclosing_type_skips_member_scopes() {
        let arena = sample();
        assert_eq!(arena.enclosing_type(ScopeId(3), 64), Some(ScopeId(2)));
        assert_eq!(arena.enclosing_type(ScopeId(1), 64), Some(ScopeId(0)));
        assert_eq!(arena.enclosing_type(ScopeId(4), 64), Some(ScopeId(4)));
    }

    #[test]
    fn named_ancestor_excludes_self_and_skips_unnamed_types() {
        let arena = sample();
        assert_eq!(arena.named_ancestor(ScopeId(4), 64), Some(ScopeId(0)));
        assert_eq!(arena.named_ancestor(ScopeId(2), 64), Some(ScopeId(0)));
        assert_eq!(arena.named_ancestor(ScopeId(0), 64), None);
    }

    #[test]
    fn malformed_parent_links_terminate() {
        let mut arena = ScopeArena::default();
        arena.alloc(node(ScopeKind::Anonymous, None, Some(0), (0, 10)));
        arena.alloc(node(ScopeKind::Member, None, Some(2), (0, 5)));
        arena.alloc(node(ScopeKind::Member, None, Some(1), (0, 5)));

        assert_eq!(arena.named_ancestor(ScopeId(0), 64), None);
        assert_eq!(arena.enclosing_type(ScopeId(1), 64), None);
        assert_eq!(arena.named_ancestor(ScopeId(1), 64), None);
    }

    #[test]
    fn depth_limit_bounds_the_walk() {
        let arena = sample();
        assert_eq!(arena.named_ancestor(ScopeId(4), 2), None);
        assert_eq!(arena.named_ancestor(ScopeId(4), 4), Some(ScopeId(0)));
    }
}
