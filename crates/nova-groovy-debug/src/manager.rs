use std::sync::Arc;

use nova_jdwp::{
    ClassPrepareRequest, ClassPrepareRequestor, EventRequests, Location, ReferenceTypeId,
    VirtualMachine,
};

use crate::config::ResolutionConfig;
use crate::index::SharedIndex;
use crate::lexical::TypeRef;
use crate::source::SourcePosition;
use crate::{lines, locator, nested, prepare, reverse};

/// Maps between source positions and runtime classes for one debug session.
///
/// Every operation degrades to `None` or an empty result when it cannot
/// resolve; nothing here fails the caller.
pub trait PositionManager: Send + Sync {
    /// Where the VM stopped, in source terms.
    fn source_position(&self, location: &Location) -> Option<SourcePosition>;

    /// Loaded runtime types the code at `position` may belong to.
    fn all_classes(&self, position: &SourcePosition) -> Vec<ReferenceTypeId>;

    /// Executable locations of `ty` on the line of `position`.
    fn locations_of_line(&self, ty: ReferenceTypeId, position: &SourcePosition) -> Vec<Location>;

    /// Ask to be notified when a class containing `position` is prepared.
    fn create_prepare_request(
        &self,
        requestor: Arc<dyn ClassPrepareRequestor>,
        position: &SourcePosition,
    ) -> Option<ClassPrepareRequest>;
}

/// Position manager for Groovy sources.
#[derive(Clone)]
pub struct GroovyPositionManager {
    index: SharedIndex,
    vm: Arc<dyn VirtualMachine>,
    requests: Arc<dyn EventRequests>,
    config: Arc<ResolutionConfig>,
}

impl GroovyPositionManager {
    pub fn new(
        index: SharedIndex,
        vm: Arc<dyn VirtualMachine>,
        requests: Arc<dyn EventRequests>,
        config: ResolutionConfig,
    ) -> Self {
        Self {
            index,
            vm,
            requests,
            config: Arc::new(config),
        }
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn find_enclosing_type(&self, position: &SourcePosition) -> Option<TypeRef> {
        let index = self.index.read();
        locator::find_enclosing_type(&index, position, self.config.max_scope_depth)
    }

    pub fn find_named_ancestor(&self, ty: TypeRef) -> Option<TypeRef> {
        let index = self.index.read();
        locator::find_named_ancestor(&index, ty, self.config.max_scope_depth)
    }
}

impl PositionManager for GroovyPositionManager {
    fn source_position(&self, location: &Location) -> Option<SourcePosition> {
        let index = self.index.read();
        reverse::source_position_of(&index, self.vm.as_ref(), location)
    }

    fn all_classes(&self, position: &SourcePosition) -> Vec<ReferenceTypeId> {
        let index = self.index.read();
        nested::find_all_runtime_types(&index, self.vm.as_ref(), &self.config, position)
    }

    fn locations_of_line(&self, ty: ReferenceTypeId, position: &SourcePosition) -> Vec<Location> {
        lines::locations_of_line(self.vm.as_ref(), &self.config, ty, position)
    }

    fn create_prepare_request(
        &self,
        requestor: Arc<dyn ClassPrepareRequestor>,
        position: &SourcePosition,
    ) -> Option<ClassPrepareRequest> {
        prepare::prepare_request_for(
            &self.index,
            self.requests.as_ref(),
            &self.config,
            requestor,
            position,
        )
    }
}

/// Consults several position managers in order and returns the first
/// non-empty answer.
#[derive(Clone, Default)]
pub struct CompoundPositionManager {
    managers: Vec<Arc<dyn PositionManager>>,
}

impl CompoundPositionManager {
    pub fn new(managers: Vec<Arc<dyn PositionManager>>) -> Self {
        Self { managers }
    }

    pub fn push(&mut self, manager: Arc<dyn PositionManager>) {
        self.managers.push(manager);
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

impl PositionManager for CompoundPositionManager {
    fn source_position(&self, location: &Location) -> Option<SourcePosition> {
        self.managers
            .iter()
            .find_map(|manager| manager.source_position(location))
    }

    fn all_classes(&self, position: &SourcePosition) -> Vec<ReferenceTypeId> {
        self.managers
            .iter()
            .map(|manager| manager.all_classes(position))
            .find(|classes| !classes.is_empty())
            .unwrap_or_default()
    }

    fn locations_of_line(&self, ty: ReferenceTypeId, position: &SourcePosition) -> Vec<Location> {
        self.managers
            .iter()
            .map(|manager| manager.locations_of_line(ty, position))
            .find(|locations| !locations.is_empty())
            .unwrap_or_default()
    }

    fn create_prepare_request(
        &self,
        requestor: Arc<dyn ClassPrepareRequestor>,
        position: &SourcePosition,
    ) -> Option<ClassPrepareRequest> {
        self.managers
            .iter()
            .find_map(|manager| manager.create_prepare_request(requestor.clone(), position))
    }
}
