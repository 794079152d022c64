//! Runtime values, object storage and native call plumbing.
//!
//! ## Key Types
//!
//! - [`Dynamic`]: runtime value type for slots and module variables
//! - [`ObjectHeap`]: generational arena holding foreign wrappers, lists and
//!   maps, with the mark and sweep collector
//! - [`NativeFn`]: type-erased callable wrapper for native functions
//! - [`CallContext`]: bridge between the runtime and Rust for one call

mod call_context;
mod dynamic;
mod native_fn;
mod object_heap;

pub use call_context::CallContext;
pub use dynamic::{ClassRef, Dynamic, MapKey, SlotType};
pub use native_fn::{NativeCallable, NativeFn};
pub use object_heap::{
    ClassInfo, CollectStats, ForeignObject, HeapObject, ObjectHandle, ObjectHeap,
};
