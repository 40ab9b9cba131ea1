//! Deferred registration queue.
//!
//! Declarations may reference entities whose metadata is not registered yet.
//! Each declaration therefore enqueues a thunk, and the queue is drained into
//! the registry only once every declaration exists.

use crate::entity::EntityId;
use crate::registry::TypeRegistry;
use std::collections::VecDeque;
use std::fmt;
use tgql_core::{BuildError, BuildResult};
use tracing::{debug, error};

/// A deferred registration step.
pub type LazyThunk = Box<dyn FnOnce(&mut TypeRegistry) -> BuildResult<()>>;

struct QueuedThunk {
    owner: Option<EntityId>,
    thunk: LazyThunk,
}

/// FIFO queue of deferred registration thunks.
#[derive(Default)]
pub struct LazyMetadataQueue {
    queue: VecDeque<QueuedThunk>,
}

impl fmt::Debug for LazyMetadataQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyMetadataQueue")
            .field("len", &self.queue.len())
            .finish()
    }
}

impl LazyMetadataQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a thunk, optionally tied to the entity that declared it.
    pub fn enqueue(
        &mut self,
        owner: Option<EntityId>,
        thunk: impl FnOnce(&mut TypeRegistry) -> BuildResult<()> + 'static,
    ) {
        self.queue.push_back(QueuedThunk {
            owner,
            thunk: Box::new(thunk),
        });
    }

    /// Drops every queued thunk owned by `owner`, returning how many were
    /// removed. Used when the owner's declarations are reloaded.
    pub fn discard(&mut self, owner: EntityId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|queued| queued.owner != Some(owner));
        before - self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs every queued thunk once, in insertion order, and empties the
    /// queue.
    ///
    /// The first failing thunk aborts the drain; its error is attributed to
    /// the owning entity and the remaining thunks are dropped.
    pub fn drain(&mut self, registry: &mut TypeRegistry) -> BuildResult<usize> {
        let mut executed = 0;
        while let Some(QueuedThunk { owner, thunk }) = self.queue.pop_front() {
            if let Err(err) = thunk(registry) {
                let owner_name = owner.map_or("<global>", |id| registry.entity_name(id));
                error!(owner = %owner_name, error = %err, "deferred registration failed");
                let err = BuildError::deferred(owner_name, err);
                self.queue.clear();
                return Err(err);
            }
            executed += 1;
        }
        debug!(executed, "drained deferred registrations");
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tgql_core::Location;

    #[test]
    fn test_drain_fifo_once() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut queue = LazyMetadataQueue::new();
        for i in 0..3 {
            let order = Rc::clone(&order);
            queue.enqueue(None, move |_| {
                order.borrow_mut().push(i);
                Ok(())
            });
        }

        let mut registry = TypeRegistry::new();
        assert_eq!(queue.drain(&mut registry).unwrap(), 3);
        assert!(queue.is_empty());
        assert_eq!(queue.drain(&mut registry).unwrap(), 0);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_failure_is_attributed_to_owner() {
        let mut registry = TypeRegistry::new();
        let owner = registry.entities_mut().declare("RecipeResolver");
        let mut queue = LazyMetadataQueue::new();
        queue.enqueue(Some(owner), |_| {
            Err(BuildError::UndefinedReturnType {
                kind: "Query".into(),
                location: Location::member("RecipeResolver", "recipes"),
            })
        });
        queue.enqueue(None, |_| Ok(()));

        let err = queue.drain(&mut registry).unwrap_err();
        match err {
            BuildError::Deferred { owner, source } => {
                assert_eq!(owner, "RecipeResolver");
                assert!(matches!(*source, BuildError::UndefinedReturnType { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_discard_by_owner() {
        let mut registry = TypeRegistry::new();
        let a = registry.entities_mut().declare("A");
        let b = registry.entities_mut().declare("B");
        let mut queue = LazyMetadataQueue::new();
        queue.enqueue(Some(a), |_| Ok(()));
        queue.enqueue(Some(b), |_| Ok(()));
        queue.enqueue(Some(a), |_| Ok(()));

        assert_eq!(queue.discard(a), 2);
        assert_eq!(queue.len(), 1);
    }
}
