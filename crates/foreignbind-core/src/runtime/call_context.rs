//! Call context bridging the runtime and native Rust functions.

use std::cell::{Ref, RefMut};
use std::fmt;

use crate::convert::{FromSlot, IntoSlot};
use crate::error::NativeError;
use crate::foreign::ForeignHandle;

use super::{Dynamic, ObjectHeap};

/// Context for native function calls.
///
/// Slot 0 holds the receiver on entry (the foreign object for instance
/// members, the class for static members and constructors) and the return
/// value on exit. Argument `i` lives in slot `i + 1`.
///
/// ```ignore
/// let x: i32 = ctx.arg(0)?;
/// let y: f64 = ctx.arg(1)?;
/// ctx.set_return(x as f64 + y)?;
/// ```
pub struct CallContext<'vm> {
    slots: &'vm mut [Dynamic],
    heap: &'vm mut ObjectHeap,
}

impl<'vm> CallContext<'vm> {
    /// Create a new call context over the receiver and argument slots.
    pub fn new(slots: &'vm mut [Dynamic], heap: &'vm mut ObjectHeap) -> Self {
        Self { slots, heap }
    }

    /// Get the number of arguments (excluding the receiver).
    pub fn arg_count(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// Get a raw reference to an argument slot.
    pub fn arg_slot(&self, index: usize) -> Result<&Dynamic, NativeError> {
        self.slots
            .get(index + 1)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.arg_count(),
            })
    }

    /// Get a typed argument value.
    pub fn arg<T: FromSlot>(&self, index: usize) -> Result<T, NativeError> {
        let slot = self.arg_slot(index)?;
        T::from_slot(slot, self.heap).map_err(NativeError::Conversion)
    }

    /// The raw receiver slot.
    pub fn receiver(&self) -> Result<&Dynamic, NativeError> {
        self.slots
            .first()
            .ok_or_else(|| NativeError::invalid_this("no slots available"))
    }

    /// The foreign wrapper of the receiver.
    pub fn this_handle<T: 'static>(&self) -> Result<&ForeignHandle<T>, NativeError> {
        match self.receiver()? {
            Dynamic::Object(handle) => Ok(self.heap.foreign::<T>(*handle)?),
            other => Err(NativeError::invalid_this(format!(
                "expected foreign object, got {}",
                other.type_name()
            ))),
        }
    }

    /// Borrow the receiver immutably.
    pub fn this<T: 'static>(&self) -> Result<Ref<'_, T>, NativeError> {
        Ok(self.this_handle::<T>()?.borrow()?)
    }

    /// Borrow the receiver mutably.
    ///
    /// Fails with `AlreadyBorrowed` if the payload is borrowed elsewhere,
    /// which for borrowed and shared wrappers includes native code.
    pub fn this_mut<T: 'static>(&self) -> Result<RefMut<'_, T>, NativeError> {
        Ok(self.this_handle::<T>()?.borrow_mut()?)
    }

    /// Set the return value from a raw slot.
    pub fn set_return_slot(&mut self, value: Dynamic) -> Result<(), NativeError> {
        let slot = self
            .slots
            .first_mut()
            .ok_or_else(|| NativeError::other("no return slot"))?;
        *slot = value;
        Ok(())
    }

    /// Set a typed return value.
    pub fn set_return<T: IntoSlot>(&mut self, value: T) -> Result<(), NativeError> {
        let value = value.into_slot(self.heap)?;
        self.set_return_slot(value)
    }

    /// Get immutable access to the object heap.
    pub fn heap(&self) -> &ObjectHeap {
        self.heap
    }

    /// Get mutable access to the object heap.
    pub fn heap_mut(&mut self) -> &mut ObjectHeap {
        self.heap
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("arg_count", &self.arg_count())
            .field("receiver", &self.slots.first())
            .finish()
    }
}
