//! Runtime types for a source position, including anonymous, local and
//! closure classes that can only be found by searching below their named
//! ancestor.

use std::collections::HashSet;

use nova_jdwp::{ReferenceTypeId, VirtualMachine};

use crate::config::ResolutionConfig;
use crate::index::ProjectIndex;
use crate::lexical::TypeRef;
use crate::lines;
use crate::locator::{find_enclosing_type, find_named_ancestor, qualified_name};
use crate::reverse;
use crate::source::SourcePosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(ReferenceTypeId),
    NotFound,
}

impl SearchOutcome {
    pub fn found(self) -> Option<ReferenceTypeId> {
        match self {
            SearchOutcome::Found(ty) => Some(ty),
            SearchOutcome::NotFound => None,
        }
    }
}

enum Visit {
    Expand { ty: ReferenceTypeId, depth: usize },
    Check(ReferenceTypeId),
}

/// Search below one loaded top-level type for the runtime class compiled from
/// a specific unnamed lexical type.
pub struct NestedClassSearch<'a> {
    index: &'a ProjectIndex,
    vm: &'a dyn VirtualMachine,
    config: &'a ResolutionConfig,
    target: TypeRef,
    position: &'a SourcePosition,
}

impl<'a> NestedClassSearch<'a> {
    pub fn new(
        index: &'a ProjectIndex,
        vm: &'a dyn VirtualMachine,
        config: &'a ResolutionConfig,
        target: TypeRef,
        position: &'a SourcePosition,
    ) -> Self {
        Self {
            index,
            vm,
            config,
            target,
            position,
        }
    }

    /// Depth-first over the nested types of `top_level`, children before
    /// their parent so the innermost match wins. Unprepared types are skipped
    /// along with everything below them. `top_level` itself is never a match.
    pub fn search(&self, top_level: ReferenceTypeId) -> SearchOutcome {
        let mut visited = HashSet::from([top_level]);
        let mut stack = Vec::new();
        self.push_children(&mut stack, top_level, 1);

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Expand { ty, depth } => {
                    if !visited.insert(ty) {
                        continue;
                    }
                    if !self.vm.is_prepared(ty) {
                        tracing::trace!(ty, "skipping unprepared nested type");
                        continue;
                    }
                    stack.push(Visit::Check(ty));
                    if depth < self.config.max_nested_depth {
                        self.push_children(&mut stack, ty, depth + 1);
                    }
                }
                Visit::Check(ty) => {
                    if self.matches(ty) {
                        tracing::trace!(ty, top_level, "nested type matched");
                        return SearchOutcome::Found(ty);
                    }
                }
            }
        }
        SearchOutcome::NotFound
    }

    fn push_children(&self, stack: &mut Vec<Visit>, ty: ReferenceTypeId, depth: usize) {
        // Reversed so the first nested type is visited first.
        for child in self.vm.nested_types(ty).into_iter().rev() {
            stack.push(Visit::Expand { ty: child, depth });
        }
    }

    /// A candidate matches when it has code on the position's line, or when
    /// its first line of code lies lexically inside the target type. The
    /// second case covers closures and anonymous classes whose code starts
    /// after the line that declares them.
    pub fn matches(&self, ty: ReferenceTypeId) -> bool {
        if !lines::locations_of_line(self.vm, self.config, ty, self.position).is_empty() {
            return true;
        }
        let first = match self.vm.all_line_locations(ty) {
            Ok(locations) => locations.into_iter().next(),
            Err(err) => {
                tracing::trace!(ty, error = %err, "no line table for nested type");
                None
            }
        };
        first
            .and_then(|location| reverse::source_position_of(self.index, self.vm, &location))
            .and_then(|position| {
                find_enclosing_type(self.index, &position, self.config.max_scope_depth)
            })
            == Some(self.target)
    }
}

/// Every loaded runtime type the code at `position` may belong to.
///
/// A named enclosing type maps to every loaded class of that name (one per
/// classloader). An unnamed one is searched for below each loaded class of its
/// nearest named ancestor, taking at most one match per ancestor class.
pub fn find_all_runtime_types(
    index: &ProjectIndex,
    vm: &dyn VirtualMachine,
    config: &ResolutionConfig,
    position: &SourcePosition,
) -> Vec<ReferenceTypeId> {
    let Some(target) = find_enclosing_type(index, position, config.max_scope_depth) else {
        tracing::debug!(?position, "no enclosing type");
        return Vec::new();
    };
    if let Some(name) = qualified_name(index, target) {
        return vm.classes_by_name(name);
    }

    let Some(anchor) = find_named_ancestor(index, target, config.max_scope_depth) else {
        tracing::debug!(?position, "unnamed type without a named ancestor");
        return Vec::new();
    };
    let Some(anchor_name) = qualified_name(index, anchor) else {
        return Vec::new();
    };

    let search = NestedClassSearch::new(index, vm, config, target, position);
    vm.classes_by_name(anchor_name)
        .into_iter()
        .filter_map(|outer| search.search(outer).found())
        .collect()
}
