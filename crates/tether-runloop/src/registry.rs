//! Process-wide directory of registered loops.
//!
//! Maps thread ids and names to the [`LoopHandle`] of each active context so
//! producers can address a loop without holding a handle.

use std::sync::LazyLock;
use std::thread::ThreadId;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::error::{RunLoopError, RunLoopResult};
use crate::handle::{LoopHandle, ThreadTarget};

static REGISTRY: LazyLock<LoopRegistry> = LazyLock::new(LoopRegistry::new);

pub(crate) fn registry() -> &'static LoopRegistry {
    &REGISTRY
}

pub(crate) struct LoopRegistry {
    by_id: DashMap<ThreadId, LoopHandle>,
    by_name: DashMap<String, ThreadId>,
    /// Live threads registered under their configured main-thread name, in
    /// registration order. The most recent one is the main thread.
    mains: RwLock<Vec<ThreadId>>,
}

impl LoopRegistry {
    fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_name: DashMap::new(),
            mains: RwLock::new(Vec::new()),
        }
    }

    /// Publish a loop. Fails if another live thread holds the name.
    pub(crate) fn insert(&self, handle: LoopHandle, is_main: bool) -> RunLoopResult<()> {
        match self.by_name.entry(handle.name().to_string()) {
            Entry::Occupied(_) => {
                return Err(RunLoopError::NameInUse(handle.name().to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(handle.thread_id());
            }
        }

        if is_main {
            self.mains.write().push(handle.thread_id());
        }
        self.by_id.insert(handle.thread_id(), handle);
        Ok(())
    }

    /// Withdraw a loop. Later lookups by id or name miss.
    pub(crate) fn remove(&self, id: ThreadId, name: &str) {
        self.by_name.remove_if(name, |_, owner| *owner == id);
        self.by_id.remove(&id);

        self.mains.write().retain(|main| *main != id);
    }

    pub(crate) fn lookup(&self, target: &ThreadTarget) -> Option<LoopHandle> {
        let id = match target {
            ThreadTarget::Id(id) => *id,
            ThreadTarget::Name(name) => *self.by_name.get(name)?,
        };
        self.by_id.get(&id).map(|entry| entry.value().clone())
    }

    pub(crate) fn main_handle(&self) -> Option<LoopHandle> {
        let id = *self.mains.read().last()?;
        self.by_id.get(&id).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_queue::JobQueue;
    use crate::metrics::RunLoopMetrics;
    use std::sync::Arc;
    use std::thread;

    fn handle_on_new_thread(name: &str) -> LoopHandle {
        let id = thread::spawn(|| thread::current().id()).join().unwrap();
        let queue = Arc::new(JobQueue::new(Arc::new(RunLoopMetrics::new())));
        LoopHandle::new(id, name, queue)
    }

    #[test]
    fn test_insert_lookup_remove() {
        let registry = LoopRegistry::new();
        let handle = handle_on_new_thread("registry-worker");
        let id = handle.thread_id();

        registry.insert(handle, false).unwrap();
        assert!(registry.lookup(&ThreadTarget::Id(id)).is_some());
        assert!(registry.lookup(&"registry-worker".into()).is_some());

        registry.remove(id, "registry-worker");
        assert!(registry.lookup(&ThreadTarget::Id(id)).is_none());
        assert!(registry.lookup(&"registry-worker".into()).is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = LoopRegistry::new();
        registry
            .insert(handle_on_new_thread("dup"), false)
            .unwrap();

        let err = registry
            .insert(handle_on_new_thread("dup"), false)
            .unwrap_err();
        assert!(matches!(err, RunLoopError::NameInUse(ref name) if name == "dup"));
    }

    #[test]
    fn test_remove_keeps_name_claimed_by_other_thread() {
        let registry = LoopRegistry::new();
        let owner = handle_on_new_thread("shared");
        let owner_id = owner.thread_id();
        registry.insert(owner, false).unwrap();

        let stranger = thread::spawn(|| thread::current().id()).join().unwrap();
        registry.remove(stranger, "shared");

        let found = registry.lookup(&"shared".into()).unwrap();
        assert_eq!(found.thread_id(), owner_id);
    }

    #[test]
    fn test_main_handle() {
        let registry = LoopRegistry::new();
        assert!(registry.main_handle().is_none());

        let handle = handle_on_new_thread("main");
        let id = handle.thread_id();
        registry.insert(handle, true).unwrap();
        assert_eq!(registry.main_handle().unwrap().thread_id(), id);

        registry.remove(id, "main");
        assert!(registry.main_handle().is_none());
    }

    #[test]
    fn test_main_falls_back_to_earlier_main_thread() {
        let registry = LoopRegistry::new();
        let first = handle_on_new_thread("main");
        let first_id = first.thread_id();
        let second = handle_on_new_thread("ui");
        let second_id = second.thread_id();

        registry.insert(first, true).unwrap();
        registry.insert(second, true).unwrap();
        assert_eq!(registry.main_handle().unwrap().thread_id(), second_id);

        registry.remove(second_id, "ui");
        assert_eq!(registry.main_handle().unwrap().thread_id(), first_id);

        registry.remove(first_id, "main");
        assert!(registry.main_handle().is_none());
    }
}
