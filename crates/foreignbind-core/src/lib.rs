//! Core types for binding native Rust values into a slot-based runtime.
//!
//! This crate owns the object lifetime-transfer contract: how a native value
//! is represented once it crosses into the runtime, and which side releases
//! it.
//!
//! - [`policy`]: the passing mode to lifetime policy table
//! - [`foreign`]: [`ForeignHandle`], the wrapper stored in runtime memory
//! - [`convert`]: [`IntoSlot`]/[`FromSlot`], which pick the passing mode
//! - [`runtime`]: slot values, the object heap and its collector, native
//!   call plumbing
//! - [`error`]: the error taxonomy shared by every crate of the workspace

pub mod convert;
pub mod error;
pub mod foreign;
pub mod policy;
pub mod runtime;
mod type_hash;

pub use convert::{FromSlot, IntoSlot};
pub use error::{ConversionError, Error, NativeError, RegistrationError, RuntimeError};
pub use foreign::{Cloned, ForeignClass, ForeignHandle, NativeRef};
pub use policy::{LifetimePolicy, Ownership, PassingMode, Storage};
pub use runtime::{
    CallContext, ClassInfo, ClassRef, CollectStats, Dynamic, ForeignObject, HeapObject,
    MapKey, NativeCallable, NativeFn, ObjectHandle, ObjectHeap, SlotType,
};
pub use type_hash::{TypeHash, hash_constants};
