//! Results of calls into the runtime.

use std::cell::RefCell;
use std::rc::Rc;

use foreignbind_core::{ConversionError, Dynamic, ForeignClass, FromSlot, SlotType};

use crate::handle::Handle;
use crate::variable::Method;
use crate::vm::Vm;

/// The value left in slot 0 by a call.
///
/// Holds a [`Handle`], so a returned object stays alive until the
/// `ReturnValue` and every handle cloned from it are dropped.
#[derive(Debug, Clone)]
pub struct ReturnValue {
    handle: Handle,
}

impl ReturnValue {
    pub(crate) fn new(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn dynamic(&self) -> &Dynamic {
        self.handle.value()
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn into_handle(self) -> Handle {
        self.handle
    }

    pub fn is_null(&self) -> bool {
        self.dynamic().is_null()
    }

    /// Whether the value converts to `V`.
    pub fn is<V: FromSlot>(&self, vm: &Vm) -> bool {
        self.get::<V>(vm).is_ok()
    }

    /// Whether the value is a foreign object wrapping a `T`, in any mode.
    pub fn is_foreign<T: ForeignClass>(&self, vm: &Vm) -> bool {
        self.dynamic()
            .as_object()
            .and_then(|handle| vm.heap().foreign_object(handle).ok())
            .is_some_and(|object| object.is::<T>())
    }

    /// Convert the value to `V`.
    ///
    /// Foreign values come out by copy; use [`shared`](Self::shared) to keep
    /// the runtime's own instance.
    pub fn get<V: FromSlot>(&self, vm: &Vm) -> Result<V, ConversionError> {
        vm.get(self.dynamic())
    }

    /// Take a share of a foreign object returned in shared mode.
    pub fn shared<T: ForeignClass>(&self, vm: &Vm) -> Result<Rc<RefCell<T>>, ConversionError> {
        self.get(vm)
    }

    pub fn slot_type(&self, vm: &Vm) -> SlotType {
        vm.heap().slot_type(self.dynamic())
    }

    /// Look up a member to call on the returned object.
    pub fn func(&self, signature: &str) -> Method {
        Method::new(self.handle.clone(), signature)
    }
}
