//! The runtime-side wrapper for native values.
//!
//! A [`ForeignHandle`] is created when a native value crosses into the
//! runtime and lives inside a heap object until the collector finds it
//! unreachable. Its variant is fixed at creation by the passing mode:
//!
//! - [`ForeignHandle::Owned`] holds the value itself. Collecting the wrapper
//!   drops the value.
//! - [`ForeignHandle::Borrowed`] points at native storage. Collecting the
//!   wrapper frees nothing.
//! - [`ForeignHandle::Shared`] holds one share of an `Rc`. Collecting the
//!   wrapper drops that share only.
//!
//! Every variant wraps a `RefCell<T>`, so runtime-side access to native
//! storage goes through the same dynamic borrow checks native code uses.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::ConversionError;
use crate::policy::{Ownership, PassingMode};

/// A native type that can be bound as a foreign class.
///
/// ```
/// use foreignbind_core::ForeignClass;
///
/// #[derive(Clone)]
/// struct Vector3 {
///     x: f64,
///     y: f64,
///     z: f64,
/// }
///
/// impl ForeignClass for Vector3 {
///     const NAME: &'static str = "Vector3";
/// }
/// ```
pub trait ForeignClass: 'static {
    /// Default class name used when the type is registered.
    const NAME: &'static str;
}

/// A non-owning reference to native storage, used for pointer and reference
/// crossings.
///
/// The runtime never frees what a `NativeRef` points at.
pub struct NativeRef<T> {
    ptr: NonNull<RefCell<T>>,
    mode: PassingMode,
}

impl<T> NativeRef<T> {
    /// Wrap a reference to native storage.
    ///
    /// # Safety
    ///
    /// `cell` must outlive every runtime value created from this reference,
    /// and must not move while any of them is reachable. The runtime cannot
    /// detect a dangling reference.
    pub unsafe fn new(cell: &RefCell<T>) -> Self {
        Self {
            ptr: NonNull::from(cell),
            mode: PassingMode::Reference,
        }
    }

    /// Wrap a raw pointer to native storage. Returns `None` for null.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point at a live `RefCell<T>` that outlives every
    /// runtime value created from it.
    pub unsafe fn from_ptr(ptr: *const RefCell<T>) -> Option<Self> {
        NonNull::new(ptr as *mut RefCell<T>).map(|ptr| Self {
            ptr,
            mode: PassingMode::Pointer,
        })
    }

    pub(crate) fn from_non_null(ptr: NonNull<RefCell<T>>, mode: PassingMode) -> Self {
        Self { ptr, mode }
    }

    /// The address this reference points at.
    pub fn as_ptr(&self) -> *const RefCell<T> {
        self.ptr.as_ptr()
    }

    /// `Pointer` or `Reference`, as chosen at construction.
    pub fn mode(&self) -> PassingMode {
        self.mode
    }

    /// Access the referenced cell.
    ///
    /// # Safety
    ///
    /// The storage must still be alive.
    pub unsafe fn get(&self) -> &RefCell<T> {
        // SAFETY: liveness is the caller's obligation.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> Clone for NativeRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NativeRef<T> {}

impl<T> fmt::Debug for NativeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRef")
            .field("ptr", &self.ptr)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Copy a borrowed value into the runtime.
///
/// This is the value-mode crossing for a value native code keeps. It needs
/// `T: Clone`; a type that cannot be copied can still be moved in directly.
///
/// ```compile_fail
/// use foreignbind_core::{Cloned, ForeignClass, IntoSlot, ObjectHeap};
///
/// struct Socket;
///
/// impl ForeignClass for Socket {
///     const NAME: &'static str = "Socket";
/// }
///
/// let socket = Socket;
/// let mut heap = ObjectHeap::new();
/// let _ = Cloned(&socket).into_slot(&mut heap);
/// ```
#[derive(Debug)]
pub struct Cloned<'a, T>(pub &'a T);

/// The wrapper stored in runtime memory for a foreign value.
pub enum ForeignHandle<T> {
    /// Runtime-owned copy.
    Owned(RefCell<T>),
    /// Native-owned storage; never freed by the runtime.
    Borrowed(NativeRef<T>),
    /// One share of storage owned by both sides.
    Shared(Rc<RefCell<T>>),
}

impl<T> ForeignHandle<T> {
    pub fn owned(value: T) -> Self {
        ForeignHandle::Owned(RefCell::new(value))
    }

    pub fn shared(value: Rc<RefCell<T>>) -> Self {
        ForeignHandle::Shared(value)
    }

    /// The cell holding the value, whatever the variant.
    pub fn cell(&self) -> &RefCell<T> {
        match self {
            ForeignHandle::Owned(cell) => cell,
            // SAFETY: the creator of the NativeRef guaranteed the storage
            // outlives this wrapper.
            ForeignHandle::Borrowed(native) => unsafe { native.get() },
            ForeignHandle::Shared(rc) => rc,
        }
    }

    /// Immutably borrow the value.
    pub fn borrow(&self) -> Result<Ref<'_, T>, ConversionError> {
        self.cell()
            .try_borrow()
            .map_err(|_| ConversionError::AlreadyBorrowed {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Mutably borrow the value.
    pub fn borrow_mut(&self) -> Result<RefMut<'_, T>, ConversionError> {
        self.cell()
            .try_borrow_mut()
            .map_err(|_| ConversionError::AlreadyBorrowed {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Another share of the value, for the shared variant only.
    pub fn share(&self) -> Option<Rc<RefCell<T>>> {
        match self {
            ForeignHandle::Shared(rc) => Some(Rc::clone(rc)),
            _ => None,
        }
    }

    /// Address of the cell holding the value.
    pub fn as_ptr(&self) -> NonNull<RefCell<T>> {
        NonNull::from(self.cell())
    }

    /// A non-owning reference to the payload.
    ///
    /// # Safety
    ///
    /// The returned reference does not keep the payload alive. It must not
    /// be dereferenced after this wrapper is dropped, nor after the storage
    /// a borrowed wrapper points at goes away.
    pub unsafe fn native_ref(&self) -> NativeRef<T> {
        match self {
            ForeignHandle::Borrowed(native) => *native,
            _ => NativeRef::from_non_null(self.as_ptr(), PassingMode::Pointer),
        }
    }

    pub fn ownership(&self) -> Ownership {
        self.mode().ownership()
    }

    /// The passing mode this wrapper was created with.
    pub fn mode(&self) -> PassingMode {
        match self {
            ForeignHandle::Owned(_) => PassingMode::Value,
            ForeignHandle::Borrowed(native) => native.mode(),
            ForeignHandle::Shared(_) => PassingMode::Shared,
        }
    }
}

impl<T> From<NativeRef<T>> for ForeignHandle<T> {
    fn from(native: NativeRef<T>) -> Self {
        ForeignHandle::Borrowed(native)
    }
}

impl<T> From<Rc<RefCell<T>>> for ForeignHandle<T> {
    fn from(rc: Rc<RefCell<T>>) -> Self {
        ForeignHandle::Shared(rc)
    }
}

impl<T> fmt::Debug for ForeignHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            ForeignHandle::Owned(_) => "Owned",
            ForeignHandle::Borrowed(_) => "Borrowed",
            ForeignHandle::Shared(_) => "Shared",
        };
        f.debug_struct("ForeignHandle")
            .field("variant", &variant)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
