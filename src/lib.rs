//! Bind native Rust values, functions and properties into an embedded,
//! slot-based scripting runtime.
//!
//! Every value that crosses the boundary does so in one of four passing
//! modes, and the mode decides who releases it:
//!
//! | Native form        | Mode      | Wrapper                   | Released by |
//! |--------------------|-----------|---------------------------|-------------|
//! | `T`, `Cloned(&T)`  | value     | [`ForeignHandle::Owned`]    | collector   |
//! | `Option<NativeRef<T>>` | pointer | [`ForeignHandle::Borrowed`] | native side |
//! | `NativeRef<T>`     | reference | [`ForeignHandle::Borrowed`] | native side |
//! | `Rc<RefCell<T>>`   | shared    | [`ForeignHandle::Shared`]   | last share  |
//!
//! # Crates
//!
//! - `foreignbind-core`: the passing-mode policy, wrappers, conversions,
//!   object heap and collector
//! - `foreignbind-registry`: foreign modules and the class builder
//! - this crate: the host [`Vm`] with module variables, handles and calls

mod args;
mod config;
mod handle;
mod return_value;
mod variable;
mod vm;

pub use args::IntoArgs;
pub use config::VmConfig;
pub use handle::Handle;
pub use return_value::ReturnValue;
pub use variable::{Method, Variable};
pub use vm::Vm;

pub use foreignbind_core::{
    CallContext, Cloned, CollectStats, ConversionError, Dynamic, Error, ForeignClass,
    ForeignHandle, FromSlot, IntoSlot, LifetimePolicy, NativeError, NativeRef, Ownership,
    MapKey, PassingMode, RegistrationError, RuntimeError, SlotType, Storage,
};
pub use foreignbind_registry::{ClassBuilder, ForeignModule, MethodFlags};

pub mod prelude {
    pub use crate::{
        CallContext, Cloned, Dynamic, ForeignClass, ForeignHandle, ForeignModule, FromSlot,
        Handle, IntoSlot, Method, NativeRef, PassingMode, ReturnValue, Variable, Vm, VmConfig,
    };
    pub use crate::{ConversionError, Error, NativeError, RegistrationError, RuntimeError};
}
