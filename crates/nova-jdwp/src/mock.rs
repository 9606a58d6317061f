use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    ClassPattern, ClassPrepareRequest, ClassPrepareRequestor, EventRequests, JdwpError, Location,
    ReferenceTypeId, RequestId, VirtualMachine,
};

/// Description of a class loaded into a [`MockVm`].
#[derive(Clone, Debug)]
pub struct MockClass {
    pub name: String,
    pub prepared: bool,
    /// One-based line of each code location, in code-index order. `None`
    /// simulates a class compiled without line tables.
    pub lines: Option<Vec<i32>>,
}

impl MockClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prepared: true,
            lines: Some(Vec::new()),
        }
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = i32>) -> Self {
        self.lines = Some(lines.into_iter().collect());
        self
    }

    pub fn without_debug_info(mut self) -> Self {
        self.lines = None;
        self
    }

    pub fn unprepared(mut self) -> Self {
        self.prepared = false;
        self
    }
}

#[derive(Debug)]
struct ClassState {
    class: MockClass,
    nested: Vec<ReferenceTypeId>,
}

struct RequestState {
    pattern: ClassPattern,
    requestor: Arc<dyn ClassPrepareRequestor>,
}

struct State {
    version: String,
    next_type_id: ReferenceTypeId,
    next_request_id: RequestId,
    classes: BTreeMap<ReferenceTypeId, ClassState>,
    requests: BTreeMap<RequestId, RequestState>,
    pending_prepares: VecDeque<ReferenceTypeId>,
    stratum_queries: Vec<Option<String>>,
}

/// Deterministic, in-memory debuggee.
///
/// Classes added with [`MockVm::add_class`] are already loaded; classes added
/// with [`MockVm::load_class`] (or prepared later with [`MockVm::prepare`])
/// queue a class-prepare event which is delivered by
/// [`MockVm::dispatch_events`], mimicking the session's event loop.
pub struct MockVm {
    state: Mutex<State>,
}

impl Default for MockVm {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVm {
    pub fn new() -> Self {
        Self::with_version("17.0.9")
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                version: version.into(),
                next_type_id: 1,
                next_request_id: 1,
                classes: BTreeMap::new(),
                requests: BTreeMap::new(),
                pending_prepares: VecDeque::new(),
                stratum_queries: Vec::new(),
            }),
        }
    }

    /// Add an already-loaded class, optionally nested inside `outer`.
    pub fn add_class(&self, class: MockClass, outer: Option<ReferenceTypeId>) -> ReferenceTypeId {
        let mut state = self.state.lock();
        let id = state.next_type_id;
        state.next_type_id += 1;
        state.classes.insert(
            id,
            ClassState {
                class,
                nested: Vec::new(),
            },
        );
        if let Some(outer) = outer.and_then(|outer| state.classes.get_mut(&outer)) {
            outer.nested.push(id);
        }
        id
    }

    /// Add a class and queue its class-prepare event if it is prepared.
    pub fn load_class(&self, class: MockClass, outer: Option<ReferenceTypeId>) -> ReferenceTypeId {
        let prepared = class.prepared;
        let id = self.add_class(class, outer);
        if prepared {
            self.state.lock().pending_prepares.push_back(id);
        }
        id
    }

    /// Move a loaded class into the prepared state and queue its event.
    pub fn prepare(&self, ty: ReferenceTypeId) -> Result<(), JdwpError> {
        let mut state = self.state.lock();
        let class = state
            .classes
            .get_mut(&ty)
            .ok_or(JdwpError::InvalidReferenceType(ty))?;
        if !class.class.prepared {
            class.class.prepared = true;
            state.pending_prepares.push_back(ty);
        }
        Ok(())
    }

    /// Deliver queued class-prepare events to every active request whose
    /// pattern matches. Returns the number of notifications delivered.
    pub fn dispatch_events(&self) -> usize {
        let mut delivered = 0;
        loop {
            // Requestors query the VM, so never call them with the lock held.
            let (ty, requestors) = {
                let mut state = self.state.lock();
                let Some(ty) = state.pending_prepares.pop_front() else {
                    break;
                };
                let Some(name) = state.classes.get(&ty).map(|c| c.class.name.clone()) else {
                    continue;
                };
                let requestors: Vec<_> = state
                    .requests
                    .values()
                    .filter(|req| req.pattern.matches(&name))
                    .map(|req| req.requestor.clone())
                    .collect();
                tracing::trace!(ty, class = %name, requestors = requestors.len(), "class prepared");
                (ty, requestors)
            };
            for requestor in requestors {
                requestor.process_class_prepare(self, ty);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn set_version(&self, version: impl Into<String>) {
        self.state.lock().version = version.into();
    }

    /// Stratum argument of every `locations_of_line` call so far.
    pub fn stratum_queries(&self) -> Vec<Option<String>> {
        self.state.lock().stratum_queries.clone()
    }

    pub fn active_requests(&self) -> Vec<ClassPrepareRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .map(|(&id, req)| ClassPrepareRequest {
                id,
                pattern: req.pattern.clone(),
            })
            .collect()
    }

    fn locations(
        state: &State,
        ty: ReferenceTypeId,
        line: Option<u32>,
    ) -> Result<Vec<Location>, JdwpError> {
        let class = state
            .classes
            .get(&ty)
            .ok_or(JdwpError::InvalidReferenceType(ty))?;
        if !class.class.prepared {
            return Err(JdwpError::NotPrepared(ty));
        }
        let lines = class
            .class
            .lines
            .as_ref()
            .ok_or(JdwpError::AbsentInformation(ty))?;
        Ok(lines
            .iter()
            .enumerate()
            .filter(|&(_, &l)| line.map_or(true, |line| i64::from(l) == i64::from(line)))
            .map(|(idx, &l)| Location::new(ty, 1, idx as u64, l))
            .collect())
    }
}

impl VirtualMachine for MockVm {
    fn version(&self) -> String {
        self.state.lock().version.clone()
    }

    fn classes_by_name(&self, name: &str) -> Vec<ReferenceTypeId> {
        self.state
            .lock()
            .classes
            .iter()
            .filter(|(_, c)| c.class.name == name)
            .map(|(&id, _)| id)
            .collect()
    }

    fn type_name(&self, ty: ReferenceTypeId) -> Option<String> {
        self.state
            .lock()
            .classes
            .get(&ty)
            .map(|c| c.class.name.clone())
    }

    fn is_prepared(&self, ty: ReferenceTypeId) -> bool {
        self.state
            .lock()
            .classes
            .get(&ty)
            .is_some_and(|c| c.class.prepared)
    }

    fn nested_types(&self, ty: ReferenceTypeId) -> Vec<ReferenceTypeId> {
        match self.state.lock().classes.get(&ty) {
            Some(c) if c.class.prepared => c.nested.clone(),
            _ => Vec::new(),
        }
    }

    fn locations_of_line(
        &self,
        ty: ReferenceTypeId,
        stratum: Option<&str>,
        line: u32,
    ) -> Result<Vec<Location>, JdwpError> {
        let mut state = self.state.lock();
        state.stratum_queries.push(stratum.map(str::to_string));
        Self::locations(&state, ty, Some(line))
    }

    fn all_line_locations(&self, ty: ReferenceTypeId) -> Result<Vec<Location>, JdwpError> {
        Self::locations(&self.state.lock(), ty, None)
    }
}

impl EventRequests for MockVm {
    fn create_class_prepare_request(
        &self,
        pattern: ClassPattern,
        requestor: Arc<dyn ClassPrepareRequestor>,
    ) -> Result<ClassPrepareRequest, JdwpError> {
        let mut state = self.state.lock();
        let id = state.next_request_id;
        state.next_request_id += 1;
        state.requests.insert(
            id,
            RequestState {
                pattern: pattern.clone(),
                requestor,
            },
        );
        Ok(ClassPrepareRequest { id, pattern })
    }

    fn cancel(&self, id: RequestId) -> bool {
        self.state.lock().requests.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ReferenceTypeId>>,
    }

    impl ClassPrepareRequestor for Recorder {
        fn process_class_prepare(&self, _vm: &dyn VirtualMachine, ty: ReferenceTypeId) {
            self.seen.lock().push(ty);
        }
    }

    #[test]
    fn classes_by_name_returns_one_type_per_classloader() {
        let vm = MockVm::new();
        let a = vm.add_class(MockClass::new("Foo"), None);
        let b = vm.add_class(MockClass::new("Foo"), None);
        vm.add_class(MockClass::new("Bar"), None);
        assert_eq!(vm.classes_by_name("Foo"), vec![a, b]);
        assert!(vm.classes_by_name("Baz").is_empty());
    }

    #[test]
    fn unprepared_types_hide_nested_types_and_lines() {
        let vm = MockVm::new();
        let outer = vm.add_class(MockClass::new("Foo").unprepared(), None);
        vm.add_class(MockClass::new("Foo$1").with_lines([3]), Some(outer));

        assert!(!vm.is_prepared(outer));
        assert!(vm.nested_types(outer).is_empty());
        assert_eq!(
            vm.all_line_locations(outer),
            Err(JdwpError::NotPrepared(outer))
        );
    }

    #[test]
    fn missing_line_tables_report_absent_information() {
        let vm = MockVm::new();
        let ty = vm.add_class(MockClass::new("Foo$_closure1").without_debug_info(), None);
        assert_eq!(
            vm.locations_of_line(ty, None, 1),
            Err(JdwpError::AbsentInformation(ty))
        );
    }

    #[test]
    fn prepare_events_fire_once_per_matching_request_until_cancelled() {
        let vm = MockVm::new();
        let nested = Arc::new(Recorder::default());
        let exact = Arc::new(Recorder::default());
        let nested_req = vm
            .create_class_prepare_request(ClassPattern::nested_in("Foo"), nested.clone())
            .unwrap();
        vm.create_class_prepare_request(ClassPattern::parse("Foo"), exact.clone())
            .unwrap();

        let outer = vm.load_class(MockClass::new("Foo"), None);
        let inner = vm.load_class(MockClass::new("Foo$1"), Some(outer));
        assert_eq!(vm.dispatch_events(), 2);
        assert_eq!(vm.dispatch_events(), 0);
        assert_eq!(*exact.seen.lock(), vec![outer]);
        assert_eq!(*nested.seen.lock(), vec![inner]);

        assert!(vm.cancel(nested_req.id));
        assert!(!vm.cancel(nested_req.id));
        vm.load_class(MockClass::new("Foo$2"), Some(outer));
        assert_eq!(vm.dispatch_events(), 0);
        assert_eq!(nested.seen.lock().len(), 1);
    }

    #[test]
    fn deferred_preparation_queues_an_event() {
        let vm = MockVm::new();
        let recorder = Arc::new(Recorder::default());
        vm.create_class_prepare_request(ClassPattern::parse("Foo"), recorder.clone())
            .unwrap();

        let ty = vm.load_class(MockClass::new("Foo").unprepared(), None);
        assert_eq!(vm.dispatch_events(), 0);
        vm.prepare(ty).unwrap();
        assert_eq!(vm.dispatch_events(), 1);
        assert_eq!(*recorder.seen.lock(), vec![ty]);
    }
}
