//! Module variables and callable members looked up from the host.

use foreignbind_core::{Dynamic, RuntimeError};

use crate::args::IntoArgs;
use crate::handle::Handle;
use crate::return_value::ReturnValue;
use crate::vm::Vm;

/// A module variable found with [`Vm::find`].
///
/// The value is captured when found and kept alive by a [`Handle`];
/// reassigning the variable later does not change it.
#[derive(Debug, Clone)]
pub struct Variable {
    handle: Handle,
}

impl Variable {
    pub(crate) fn new(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn value(&self) -> &Dynamic {
        self.handle.value()
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Bind a member signature to this variable as the receiver.
    ///
    /// Signatures use the slot notation: `add(_,_)` for a method, `x` for a
    /// getter, `x=(_)` for a setter, `new(_)` for a constructor on a class.
    pub fn func(&self, signature: &str) -> Method {
        Method::new(self.handle.clone(), signature)
    }
}

/// A receiver paired with a member signature.
#[derive(Debug, Clone)]
pub struct Method {
    receiver: Handle,
    signature: String,
}

impl Method {
    pub(crate) fn new(receiver: Handle, signature: &str) -> Self {
        Self {
            receiver,
            signature: signature.to_string(),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn receiver(&self) -> &Dynamic {
        self.receiver.value()
    }

    /// Call the member with `args`.
    ///
    /// # Errors
    ///
    /// See [`Vm::call`].
    pub fn call<A: IntoArgs>(&self, vm: &mut Vm, args: A) -> Result<ReturnValue, RuntimeError> {
        vm.call(self.receiver.value(), &self.signature, args)
    }
}
