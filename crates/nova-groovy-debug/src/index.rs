//! Project-wide class index: modules, source files and the per-module cache
//! of named type definitions.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::lexical::{ScopeNode, TypeRef};
use crate::source::{FileId, SourceFile};

/// Index shared between the debugger session and the indexer. Resolution
/// only ever takes the read lock.
pub type SharedIndex = Arc<RwLock<ProjectIndex>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("unknown module {0:?}")]
    UnknownModule(ModuleId),
    #[error("unknown file {0:?}")]
    UnknownFile(FileId),
    #[error("file {0} is already indexed")]
    DuplicatePath(String),
}

#[derive(Debug, Default)]
struct ModuleCache {
    name: String,
    classes: HashMap<String, TypeRef>,
}

#[derive(Debug, Default)]
pub struct ProjectIndex {
    // Ordered so "first module wins" lookups are stable.
    modules: BTreeMap<ModuleId, ModuleCache>,
    files: Vec<SourceFile>,
    paths: HashMap<PathBuf, FileId>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedIndex {
        Arc::new(RwLock::new(self))
    }

    pub fn add_module(&mut self, name: impl Into<String>) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.insert(
            id,
            ModuleCache {
                name: name.into(),
                classes: HashMap::new(),
            },
        );
        id
    }

    /// Parse `text` and register its named types in `module`'s cache.
    ///
    /// When two files of a module declare the same qualified name, the first
    /// one indexed wins.
    pub fn add_file(
        &mut self,
        module: ModuleId,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Result<FileId, IndexError> {
        let path = path.into();
        if !self.modules.contains_key(&module) {
            return Err(IndexError::UnknownModule(module));
        }
        if self.paths.contains_key(&path) {
            return Err(IndexError::DuplicatePath(path.display().to_string()));
        }

        let id = FileId::from_raw(self.files.len() as u32);
        let file = SourceFile::new(id, module, path.clone(), text.into());
        self.paths.insert(path, id);
        self.files.push(file);
        self.register_types(id);
        tracing::debug!(file = ?id, module = ?module, "indexed source file");
        Ok(id)
    }

    /// Replace the text of an indexed file and refresh its module cache.
    ///
    /// The whole module is re-registered in index order, so a declaration the
    /// old text shadowed in another file becomes visible again.
    pub fn set_file_text(&mut self, file: FileId, text: impl Into<String>) -> Result<(), IndexError> {
        let source = self
            .files
            .get_mut(file.to_raw() as usize)
            .ok_or(IndexError::UnknownFile(file))?;
        source.replace_text(text.into());
        let module = source.module();
        if let Some(cache) = self.modules.get_mut(&module) {
            cache.classes.clear();
        }
        let module_files: Vec<FileId> = self
            .files
            .iter()
            .filter(|source| source.module() == module)
            .map(SourceFile::id)
            .collect();
        for id in module_files {
            self.register_types(id);
        }
        tracing::debug!(file = ?file, module = ?module, "re-indexed source file");
        Ok(())
    }

    fn register_types(&mut self, file: FileId) {
        let Some(source) = self.files.get(file.to_raw() as usize) else {
            return;
        };
        let Some(cache) = self.modules.get_mut(&source.module()) else {
            return;
        };
        for (name, id) in source.scopes().named_types() {
            cache
                .classes
                .entry(name.to_string())
                .or_insert(TypeRef { file, id });
        }
    }

    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.keys().copied()
    }

    pub fn module_name(&self, module: ModuleId) -> Option<&str> {
        self.modules.get(&module).map(|cache| cache.name.as_str())
    }

    pub fn file(&self, file: FileId) -> Option<&SourceFile> {
        self.files.get(file.to_raw() as usize)
    }

    pub fn file_by_path(&self, path: &Path) -> Option<FileId> {
        self.paths.get(path).copied()
    }

    /// Cached type definition named `qualified_name` within one module.
    pub fn class_by_name(&self, module: ModuleId, qualified_name: &str) -> Option<TypeRef> {
        self.modules
            .get(&module)?
            .classes
            .get(qualified_name)
            .copied()
    }

    /// First module (in index order) that declares `qualified_name`.
    pub fn find_class(&self, qualified_name: &str) -> Option<TypeRef> {
        self.modules()
            .find_map(|module| self.class_by_name(module, qualified_name))
    }

    pub fn type_definition(&self, ty: TypeRef) -> Option<&ScopeNode> {
        self.file(ty.file)?.scopes().get(ty.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_scoped_per_module_and_first_module_wins() {
        let mut index = ProjectIndex::new();
        let app = index.add_module("app");
        let lib = index.add_module("lib");
        let in_lib = index
            .add_file(lib, "lib/Shared.groovy", "class Shared {}\n")
            .unwrap();
        let in_app = index
            .add_file(app, "app/Shared.groovy", "class Shared {}\nclass Only {}\n")
            .unwrap();

        assert_eq!(index.class_by_name(lib, "Shared").map(|t| t.file), Some(in_lib));
        assert_eq!(index.class_by_name(lib, "Only"), None);
        assert_eq!(index.find_class("Shared").map(|t| t.file), Some(in_app));
        assert_eq!(index.find_class("Only").map(|t| t.file), Some(in_app));
        assert_eq!(index.find_class("Missing"), None);
        assert_eq!(index.module_name(lib), Some("lib"));
    }

    #[test]
    fn rejects_unknown_modules_and_duplicate_paths() {
        let mut index = ProjectIndex::new();
        let app = index.add_module("app");
        index.add_file(app, "Foo.groovy", "class Foo {}").unwrap();

        assert_eq!(
            index.add_file(app, "Foo.groovy", "class Foo {}"),
            Err(IndexError::DuplicatePath("Foo.groovy".to_string()))
        );
        assert_eq!(
            index.add_file(ModuleId::from_raw(7), "Bar.groovy", ""),
            Err(IndexError::UnknownModule(ModuleId::from_raw(7)))
        );
    }

    #[test]
    fn reindexing_a_file_refreshes_its_classes() {
        let mut index = ProjectIndex::new();
        let app = index.add_module("app");
        let file = index.add_file(app, "Foo.groovy", "class Foo {}\n").unwrap();
        assert!(index.find_class("Foo").is_some());

        index.set_file_text(file, "class Renamed {}\n").unwrap();
        assert_eq!(index.find_class("Foo"), None);
        assert_eq!(index.find_class("Renamed").map(|t| t.file), Some(file));
        assert_eq!(
            index.file_by_path(Path::new("Foo.groovy")),
            Some(file)
        );
    }

    #[test]
    fn reindexing_restores_a_shadowed_declaration() {
        let mut index = ProjectIndex::new();
        let app = index.add_module("app");
        let first = index.add_file(app, "a/Foo.groovy", "class Foo {}\n").unwrap();
        let second = index.add_file(app, "b/Foo.groovy", "class Foo {}\n").unwrap();
        assert_eq!(index.find_class("Foo").map(|t| t.file), Some(first));

        index.set_file_text(first, "class Bar {}\n").unwrap();
        assert_eq!(index.find_class("Foo").map(|t| t.file), Some(second));
        assert_eq!(index.find_class("Bar").map(|t| t.file), Some(first));

        // Restoring the declaration gives the earlier file precedence again.
        index.set_file_text(first, "class Foo {}\n").unwrap();
        assert_eq!(index.find_class("Foo").map(|t| t.file), Some(first));
        assert_eq!(index.find_class("Bar"), None);
    }
}
