//! Source position ↔ runtime class resolution for debugging Groovy code.
//!
//! Groovy compiles closures, anonymous classes and local classes into
//! synthetic nested classes (`Foo$1`, `Foo$_run_closure2`) whose names never
//! appear in source. This crate bridges the two views:
//!
//! - [`outline`] scans Groovy text into a lexical scope arena;
//! - [`index::ProjectIndex`] keeps the files of each module and a cache of
//!   their named types;
//! - [`GroovyPositionManager`] answers the debugger's questions (which loaded
//!   classes hold this line, where did the VM stop, which class-prepare
//!   request arms this breakpoint) against a [`nova_jdwp::VirtualMachine`].
//!
//! Resolution never fails the caller: every operation returns `None` or an
//! empty result when a position cannot be mapped.

pub mod config;
pub mod index;
pub mod lexical;
pub mod lines;
pub mod locator;
pub mod manager;
pub mod nested;
pub mod outline;
pub mod prepare;
pub mod reverse;
pub mod source;

pub use config::{init_tracing, ConfigError, GroovyDebugConfig, LoggingConfig, ResolutionConfig};
pub use index::{IndexError, ModuleId, ProjectIndex, SharedIndex};
pub use lexical::{ScopeArena, ScopeId, ScopeKind, ScopeNode, TypeRef};
pub use manager::{CompoundPositionManager, GroovyPositionManager, PositionManager};
pub use nested::{NestedClassSearch, SearchOutcome};
pub use prepare::{FilteredRequestor, LineOverlapCheck, NestedCandidateCheck, PrepareCheck, PreparePlan};
pub use source::{FileId, SourceFile, SourcePosition};
