//! Runtime-side view of a debuggee JVM for Nova's debugger engines.
//!
//! The Groovy position manager (`nova-groovy-debug`) resolves source positions
//! against *loaded* classes. It never talks to the wire directly; instead it
//! consumes the small collaborator surface defined here:
//!
//! - [`VirtualMachine`]: loaded reference types by name, nesting, preparation
//!   state and line tables.
//! - [`EventRequests`]: standing class-prepare requests keyed by a
//!   [`ClassPattern`].
//! - [`ClassPrepareRequestor`]: the callback invoked when a matching class is
//!   prepared.
//!
//! [`MockVm`] implements all of it in memory so debugger logic can be tested
//! without a JVM.

mod mock;
mod pattern;

use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;

pub use mock::{MockClass, MockVm};
pub use pattern::ClassPattern;

pub type ReferenceTypeId = u64;
pub type MethodId = u64;
pub type RequestId = i32;

/// Stratum used for Java/Groovy source lines in JDWP `SourceDebugExtension`s.
pub const JAVA_STRATUM: &str = "Java";

/// An executable code location inside a loaded reference type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub declaring_type: ReferenceTypeId,
    pub method: MethodId,
    pub code_index: u64,
    /// One-based source line as reported by the VM. Non-positive values mean
    /// the VM could not attribute a line to this location.
    pub line: i32,
}

impl Location {
    pub fn new(declaring_type: ReferenceTypeId, method: MethodId, code_index: u64, line: i32) -> Self {
        Self {
            declaring_type,
            method,
            code_index,
            line,
        }
    }

    /// The one-based line of this location.
    pub fn line_number(&self) -> Result<u32, JdwpError> {
        u32::try_from(self.line)
            .ok()
            .filter(|&line| line > 0)
            .ok_or(JdwpError::InvalidLineNumber(self.line))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JdwpError {
    #[error("JDWP client is not connected")]
    NotConnected,
    /// The type was compiled without line tables (common for synthetic types).
    #[error("no debug information available for reference type {0}")]
    AbsentInformation(ReferenceTypeId),
    #[error("location has no usable line number ({0})")]
    InvalidLineNumber(i32),
    #[error("invalid reference type id {0}")]
    InvalidReferenceType(ReferenceTypeId),
    #[error("reference type {0} is not prepared")]
    NotPrepared(ReferenceTypeId),
    #[error("{0}")]
    Other(String),
}

/// Query surface over the classes currently loaded in the debuggee.
pub trait VirtualMachine: Send + Sync {
    /// The target VM version string (for example `1.8.0_392` or `17.0.9`).
    fn version(&self) -> String;

    /// All loaded reference types with this exact name, one per defining
    /// classloader.
    fn classes_by_name(&self, name: &str) -> Vec<ReferenceTypeId>;

    /// Fully qualified runtime name (`com.example.Foo$1`), if the type is known.
    fn type_name(&self, ty: ReferenceTypeId) -> Option<String>;

    fn is_prepared(&self, ty: ReferenceTypeId) -> bool;

    /// Directly nested types of a prepared type. Unprepared types report none.
    fn nested_types(&self, ty: ReferenceTypeId) -> Vec<ReferenceTypeId>;

    /// Locations whose one-based line equals `line`, optionally within a
    /// specific stratum.
    fn locations_of_line(
        &self,
        ty: ReferenceTypeId,
        stratum: Option<&str>,
        line: u32,
    ) -> Result<Vec<Location>, JdwpError>;

    /// Every line location of the type, in method then code-index order.
    fn all_line_locations(&self, ty: ReferenceTypeId) -> Result<Vec<Location>, JdwpError>;

    /// Whether [`VirtualMachine::version`] is at least `version`, comparing
    /// dotted numeric components.
    fn version_at_least(&self, version: &str) -> bool {
        compare_versions(&self.version(), version) != Ordering::Less
    }
}

/// Callback for class-prepare notifications.
pub trait ClassPrepareRequestor: Send + Sync {
    fn process_class_prepare(&self, vm: &dyn VirtualMachine, ty: ReferenceTypeId);
}

/// Handle for a registered class-prepare request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPrepareRequest {
    pub id: RequestId,
    pub pattern: ClassPattern,
}

/// Event-request manager of the debug session.
pub trait EventRequests: Send + Sync {
    /// Register a standing request; `requestor` is called once per matching
    /// class load until the request is cancelled.
    fn create_class_prepare_request(
        &self,
        pattern: ClassPattern,
        requestor: Arc<dyn ClassPrepareRequestor>,
    ) -> Result<ClassPrepareRequest, JdwpError>;

    /// Cancel a pending request. Returns `false` if the id is unknown.
    fn cancel(&self, id: RequestId) -> bool;
}

/// Compare two VM version strings component-wise (`1.8.0_392` < `11`).
///
/// Components are split on `.`, `_`, `-` and `+`; each contributes its leading
/// digits (missing digits count as `0`). Missing trailing components count as
/// `0`, so `1.4` == `1.4.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = version_components(a);
    let b = version_components(b);
    let len = a.len().max(b.len());
    for i in 0..len {
        let lhs = a.get(i).copied().unwrap_or(0);
        let rhs = b.get(i).copied().unwrap_or(0);
        match lhs.cmp(&rhs) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn version_components(version: &str) -> Vec<u64> {
    version
        .trim()
        .split(['.', '_', '-', '+'])
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}
