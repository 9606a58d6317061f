//! Deferred class-prepare registration for breakpoints in classes that are
//! not loaded yet.
//!
//! Named types are requested by exact name. Anonymous, local and closure
//! types have no stable runtime name, so the request matches every class
//! nested in their nearest named ancestor (`Outer$*`) and each notification
//! is re-validated by a [`FilteredRequestor`] before it reaches the caller.

use std::sync::Arc;

use nova_jdwp::{
    ClassPattern, ClassPrepareRequest, ClassPrepareRequestor, EventRequests, ReferenceTypeId,
    VirtualMachine,
};

use crate::config::ResolutionConfig;
use crate::index::{ProjectIndex, SharedIndex};
use crate::lines;
use crate::locator::{find_enclosing_type, find_named_ancestor, qualified_name};
use crate::nested::find_all_runtime_types;
use crate::source::SourcePosition;

/// One stage of the class-prepare filter.
pub trait PrepareCheck: Send + Sync {
    fn accepts(&self, vm: &dyn VirtualMachine, candidate: ReferenceTypeId) -> bool;
}

/// The prepared class has code on the requested line.
pub struct LineOverlapCheck {
    config: Arc<ResolutionConfig>,
    position: SourcePosition,
}

impl LineOverlapCheck {
    pub fn new(config: Arc<ResolutionConfig>, position: SourcePosition) -> Self {
        Self { config, position }
    }
}

impl PrepareCheck for LineOverlapCheck {
    fn accepts(&self, vm: &dyn VirtualMachine, candidate: ReferenceTypeId) -> bool {
        !lines::locations_of_line(vm, &self.config, candidate, &self.position).is_empty()
    }
}

/// The prepared class is one the nested-class search picks for the requested
/// position.
pub struct NestedCandidateCheck {
    index: SharedIndex,
    config: Arc<ResolutionConfig>,
    position: SourcePosition,
}

impl NestedCandidateCheck {
    pub fn new(index: SharedIndex, config: Arc<ResolutionConfig>, position: SourcePosition) -> Self {
        Self {
            index,
            config,
            position,
        }
    }
}

impl PrepareCheck for NestedCandidateCheck {
    fn accepts(&self, vm: &dyn VirtualMachine, candidate: ReferenceTypeId) -> bool {
        let index = self.index.read();
        find_all_runtime_types(&index, vm, &self.config, &self.position).contains(&candidate)
    }
}

/// Forwards a class-prepare notification only if one of its checks accepts
/// the prepared class. Checks run in order and stop at the first acceptance.
pub struct FilteredRequestor {
    checks: Vec<Box<dyn PrepareCheck>>,
    requestor: Arc<dyn ClassPrepareRequestor>,
}

impl FilteredRequestor {
    pub fn new(checks: Vec<Box<dyn PrepareCheck>>, requestor: Arc<dyn ClassPrepareRequestor>) -> Self {
        Self { checks, requestor }
    }

    /// Line overlap first, then the nested-class search.
    pub fn for_position(
        index: SharedIndex,
        config: Arc<ResolutionConfig>,
        position: SourcePosition,
        requestor: Arc<dyn ClassPrepareRequestor>,
    ) -> Self {
        Self::new(
            vec![
                Box::new(LineOverlapCheck::new(config.clone(), position)),
                Box::new(NestedCandidateCheck::new(index, config, position)),
            ],
            requestor,
        )
    }

    pub fn accepts(&self, vm: &dyn VirtualMachine, candidate: ReferenceTypeId) -> bool {
        self.checks.iter().any(|check| check.accepts(vm, candidate))
    }
}

impl ClassPrepareRequestor for FilteredRequestor {
    fn process_class_prepare(&self, vm: &dyn VirtualMachine, ty: ReferenceTypeId) {
        if self.accepts(vm, ty) {
            self.requestor.process_class_prepare(vm, ty);
        } else {
            tracing::debug!(ty, "ignoring prepared class that does not contain the position");
        }
    }
}

/// What to register for a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparePlan {
    /// The enclosing type has a runtime name of its own.
    Exact(String),
    /// The enclosing type is unnamed; wait for classes nested in `ancestor`.
    Nested { ancestor: String },
}

impl PreparePlan {
    pub fn pattern(&self) -> ClassPattern {
        match self {
            PreparePlan::Exact(name) => ClassPattern::Exact(name.clone()),
            PreparePlan::Nested { ancestor } => ClassPattern::nested_in(ancestor),
        }
    }
}

/// `None` when the position is outside every type, or inside an unnamed type
/// with no named ancestor.
pub fn plan(
    index: &ProjectIndex,
    config: &ResolutionConfig,
    position: &SourcePosition,
) -> Option<PreparePlan> {
    let ty = find_enclosing_type(index, position, config.max_scope_depth)?;
    if let Some(name) = qualified_name(index, ty) {
        return Some(PreparePlan::Exact(name.to_owned()));
    }
    let anchor = find_named_ancestor(index, ty, config.max_scope_depth)?;
    let ancestor = qualified_name(index, anchor)?.to_owned();
    Some(PreparePlan::Nested { ancestor })
}

/// Register a class-prepare request that notifies `requestor` when a class
/// containing `position` is prepared.
pub fn prepare_request_for(
    index: &SharedIndex,
    requests: &dyn EventRequests,
    config: &Arc<ResolutionConfig>,
    requestor: Arc<dyn ClassPrepareRequestor>,
    position: &SourcePosition,
) -> Option<ClassPrepareRequest> {
    let Some(plan) = plan(&index.read(), config, position) else {
        tracing::debug!(?position, "no class to wait for");
        return None;
    };
    let pattern = plan.pattern();
    let requestor: Arc<dyn ClassPrepareRequestor> = match plan {
        PreparePlan::Exact(_) => requestor,
        PreparePlan::Nested { .. } => Arc::new(FilteredRequestor::for_position(
            index.clone(),
            config.clone(),
            *position,
            requestor,
        )),
    };

    match requests.create_class_prepare_request(pattern.clone(), requestor) {
        Ok(request) => {
            tracing::debug!(%pattern, id = request.id, "registered class-prepare request");
            Some(request)
        }
        Err(err) => {
            tracing::warn!(%pattern, error = %err, "failed to register class-prepare request");
            None
        }
    }
}
