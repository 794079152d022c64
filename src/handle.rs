//! Pinned references to runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use foreignbind_core::{Dynamic, ObjectHandle};

/// Unpin requests queued by dropped handles, drained by the VM.
pub(crate) type ReleaseQueue = Rc<RefCell<Vec<ObjectHandle>>>;

/// A reference to a runtime value that keeps it reachable.
///
/// While any clone of a `Handle` is alive, the object it refers to is a
/// collector root. Dropping the last clone queues an unpin; the VM applies
/// it at its next operation.
#[derive(Clone)]
pub struct Handle {
    inner: Rc<HandleInner>,
}

struct HandleInner {
    value: Dynamic,
    releases: Weak<RefCell<Vec<ObjectHandle>>>,
}

impl Handle {
    /// Wrap a value the caller has already pinned.
    pub(crate) fn new(value: Dynamic, releases: &ReleaseQueue) -> Self {
        Self {
            inner: Rc::new(HandleInner {
                value,
                releases: Rc::downgrade(releases),
            }),
        }
    }

    pub fn value(&self) -> &Dynamic {
        &self.inner.value
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        // A VM that is already gone has nothing left to unpin.
        if let Some(object) = self.value.as_object()
            && let Some(queue) = self.releases.upgrade()
        {
            queue.borrow_mut().push(object);
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.inner.value).finish()
    }
}
