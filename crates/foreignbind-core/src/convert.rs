//! Conversion traits for values crossing the boundary.
//!
//! - [`IntoSlot`] pushes a native value into the runtime ("push").
//! - [`FromSlot`] reads a runtime value back as a native one ("pop").
//!
//! The impl chosen for a foreign type decides its passing mode:
//!
//! | Native type              | Mode        | Wrapper                      |
//! |--------------------------|-------------|------------------------------|
//! | `T: ForeignClass`        | value (move)| [`ForeignHandle::Owned`]     |
//! | `Cloned<'_, T>`          | value (copy)| [`ForeignHandle::Owned`]     |
//! | `NativeRef<T>`           | pointer/ref | [`ForeignHandle::Borrowed`]  |
//! | `Rc<RefCell<T>>`         | shared      | [`ForeignHandle::Shared`]    |
//!
//! Popping works from any wrapper variant for `T: Clone` (a copy). Popping
//! `Rc<RefCell<T>>` only succeeds for a shared wrapper. A `NativeRef<T>`
//! cannot outlive-check its target, so it is only popped through the unsafe
//! [`NativeRef::from_slot_unchecked`].
//!
//! `Vec<V>` crosses as a list and `HashMap<K, V>` or `BTreeMap<K, V>` as a
//! map. Map keys must convert to null, bool, int or string.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::ConversionError;
use crate::foreign::{Cloned, ForeignClass, ForeignHandle, NativeRef};
use crate::policy::Ownership;
use crate::runtime::{Dynamic, MapKey, ObjectHeap};

/// Extract a native value from a runtime value.
pub trait FromSlot: Sized {
    /// Extract a value from the given slot.
    ///
    /// Returns a `ConversionError` if the slot contains an incompatible type.
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError>;
}

/// Convert a native value into a runtime value.
///
/// Foreign values are allocated on the heap, so this can fail when the
/// value's class is not registered.
pub trait IntoSlot {
    /// Convert this value into a runtime value.
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError>;
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_slot_int {
    ($($ty:ty),*) => {
        $(
            impl FromSlot for $ty {
                fn from_slot(slot: &Dynamic, _heap: &ObjectHeap) -> Result<Self, ConversionError> {
                    match slot {
                        Dynamic::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        _ => Err(ConversionError::TypeMismatch {
                            expected: "int",
                            actual: slot.type_name(),
                        }),
                    }
                }
            }

            impl IntoSlot for $ty {
                fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
                    Ok(Dynamic::Int(self as i64))
                }
            }
        )*
    };
}

impl_slot_int!(i8, i16, i32, i64, u8, u16, u32);

impl FromSlot for u64 {
    fn from_slot(slot: &Dynamic, _heap: &ObjectHeap) -> Result<Self, ConversionError> {
        match slot {
            Dynamic::Int(v) => u64::try_from(*v).map_err(|_| ConversionError::IntegerOverflow {
                value: *v,
                target_type: "u64",
            }),
            _ => Err(ConversionError::TypeMismatch {
                expected: "int",
                actual: slot.type_name(),
            }),
        }
    }
}

impl IntoSlot for u64 {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        i64::try_from(self)
            .map(Dynamic::Int)
            .map_err(|_| ConversionError::UnsignedOverflow { value: self })
    }
}

// ============================================================================
// Float implementations
// ============================================================================

impl FromSlot for f64 {
    fn from_slot(slot: &Dynamic, _heap: &ObjectHeap) -> Result<Self, ConversionError> {
        match slot {
            Dynamic::Float(v) => Ok(*v),
            Dynamic::Int(v) => Ok(*v as f64),
            _ => Err(ConversionError::TypeMismatch {
                expected: "float",
                actual: slot.type_name(),
            }),
        }
    }
}

impl FromSlot for f32 {
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError> {
        f64::from_slot(slot, heap).map(|v| v as f32)
    }
}

impl IntoSlot for f64 {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        Ok(Dynamic::Float(self))
    }
}

impl IntoSlot for f32 {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        Ok(Dynamic::Float(self as f64))
    }
}

// ============================================================================
// Bool, unit, strings
// ============================================================================

impl FromSlot for bool {
    fn from_slot(slot: &Dynamic, _heap: &ObjectHeap) -> Result<Self, ConversionError> {
        match slot {
            Dynamic::Bool(v) => Ok(*v),
            _ => Err(ConversionError::TypeMismatch {
                expected: "bool",
                actual: slot.type_name(),
            }),
        }
    }
}

impl IntoSlot for bool {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        Ok(Dynamic::Bool(self))
    }
}

impl FromSlot for () {
    fn from_slot(slot: &Dynamic, _heap: &ObjectHeap) -> Result<Self, ConversionError> {
        match slot {
            Dynamic::Null => Ok(()),
            _ => Err(ConversionError::TypeMismatch {
                expected: "null",
                actual: slot.type_name(),
            }),
        }
    }
}

impl IntoSlot for () {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        Ok(Dynamic::Null)
    }
}

impl FromSlot for String {
    fn from_slot(slot: &Dynamic, _heap: &ObjectHeap) -> Result<Self, ConversionError> {
        match slot {
            Dynamic::String(s) => Ok(s.clone()),
            _ => Err(ConversionError::TypeMismatch {
                expected: "string",
                actual: slot.type_name(),
            }),
        }
    }
}

impl IntoSlot for String {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        Ok(Dynamic::String(self))
    }
}

impl IntoSlot for &str {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        Ok(Dynamic::String(self.to_owned()))
    }
}

impl FromSlot for Dynamic {
    fn from_slot(slot: &Dynamic, _heap: &ObjectHeap) -> Result<Self, ConversionError> {
        Ok(slot.clone())
    }
}

impl IntoSlot for Dynamic {
    fn into_slot(self, _heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        Ok(self)
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<V: FromSlot> FromSlot for Option<V> {
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError> {
        match slot {
            Dynamic::Null => Ok(None),
            other => V::from_slot(other, heap).map(Some),
        }
    }
}

impl<V: IntoSlot> IntoSlot for Option<V> {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        match self {
            Some(value) => value.into_slot(heap),
            None => Ok(Dynamic::Null),
        }
    }
}

impl<V: FromSlot> FromSlot for Vec<V> {
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError> {
        match slot {
            Dynamic::Object(handle) => heap
                .list(*handle)?
                .iter()
                .map(|item| V::from_slot(item, heap))
                .collect(),
            _ => Err(ConversionError::TypeMismatch {
                expected: "list",
                actual: slot.type_name(),
            }),
        }
    }
}

impl<V: IntoSlot> IntoSlot for Vec<V> {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        let items = self
            .into_iter()
            .map(|item| item.into_slot(heap))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dynamic::Object(heap.allocate_list(items)))
    }
}

// ============================================================================
// Map implementations
// ============================================================================

fn map_entries<'h>(
    slot: &Dynamic,
    heap: &'h ObjectHeap,
) -> Result<&'h FxHashMap<MapKey, Dynamic>, ConversionError> {
    match slot {
        Dynamic::Object(handle) => heap.map(*handle),
        _ => Err(ConversionError::TypeMismatch {
            expected: "map",
            actual: slot.type_name(),
        }),
    }
}

fn pop_entries<K: FromSlot, V: FromSlot, C: FromIterator<(K, V)>>(
    slot: &Dynamic,
    heap: &ObjectHeap,
) -> Result<C, ConversionError> {
    map_entries(slot, heap)?
        .iter()
        .map(|(key, value)| {
            let key = K::from_slot(&Dynamic::from(key.clone()), heap)?;
            Ok((key, V::from_slot(value, heap)?))
        })
        .collect()
}

fn push_entries<K: IntoSlot, V: IntoSlot>(
    entries: impl IntoIterator<Item = (K, V)>,
    heap: &mut ObjectHeap,
) -> Result<Dynamic, ConversionError> {
    let mut map = FxHashMap::default();
    for (key, value) in entries {
        let key = MapKey::try_from(key.into_slot(heap)?)?;
        let value = value.into_slot(heap)?;
        map.insert(key, value);
    }
    Ok(Dynamic::Object(heap.allocate_map(map)))
}

impl<K, V, S> FromSlot for HashMap<K, V, S>
where
    K: FromSlot + Eq + Hash,
    V: FromSlot,
    S: BuildHasher + Default,
{
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError> {
        pop_entries(slot, heap)
    }
}

impl<K: IntoSlot, V: IntoSlot, S> IntoSlot for HashMap<K, V, S> {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        push_entries(self, heap)
    }
}

impl<K: FromSlot + Ord, V: FromSlot> FromSlot for BTreeMap<K, V> {
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError> {
        pop_entries(slot, heap)
    }
}

impl<K: IntoSlot, V: IntoSlot> IntoSlot for BTreeMap<K, V> {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        push_entries(self, heap)
    }
}

// ============================================================================
// Foreign values
// ============================================================================

fn foreign_handle<'h, T: ForeignClass>(
    slot: &Dynamic,
    heap: &'h ObjectHeap,
) -> Result<&'h ForeignHandle<T>, ConversionError> {
    match slot {
        Dynamic::Object(handle) => heap.foreign::<T>(*handle),
        Dynamic::Null => Err(ConversionError::NullValue {
            target_type: T::NAME,
        }),
        _ => Err(ConversionError::TypeMismatch {
            expected: T::NAME,
            actual: slot.type_name(),
        }),
    }
}

/// Value mode: the value moves into a runtime-owned wrapper.
impl<T: ForeignClass> IntoSlot for T {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        heap.allocate_foreign(ForeignHandle::owned(self))
            .map(Dynamic::Object)
    }
}

/// Copy the payload out of any wrapper variant.
impl<T: ForeignClass + Clone> FromSlot for T {
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError> {
        let handle = foreign_handle::<T>(slot, heap)?;
        let value = handle.borrow()?;
        Ok(T::clone(&value))
    }
}

impl<T: ForeignClass + Clone> IntoSlot for Cloned<'_, T> {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        self.0.clone().into_slot(heap)
    }
}

impl<T: ForeignClass> IntoSlot for Rc<RefCell<T>> {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        heap.allocate_foreign(ForeignHandle::shared(self))
            .map(Dynamic::Object)
    }
}

impl<T: ForeignClass> FromSlot for Rc<RefCell<T>> {
    fn from_slot(slot: &Dynamic, heap: &ObjectHeap) -> Result<Self, ConversionError> {
        let handle = foreign_handle::<T>(slot, heap)?;
        handle
            .share()
            .ok_or_else(|| ConversionError::OwnershipMismatch {
                expected: Ownership::Shared,
                actual: handle.ownership(),
            })
    }
}

impl<T: ForeignClass> IntoSlot for NativeRef<T> {
    fn into_slot(self, heap: &mut ObjectHeap) -> Result<Dynamic, ConversionError> {
        heap.allocate_foreign(ForeignHandle::from(self))
            .map(Dynamic::Object)
    }
}

impl<T: ForeignClass> NativeRef<T> {
    /// Pop the address of the payload held by any wrapper variant.
    ///
    /// There is no [`FromSlot`] impl for `NativeRef<T>`:
    ///
    /// ```compile_fail
    /// use foreignbind_core::{FromSlot, ForeignClass, NativeRef};
    /// use foreignbind_core::runtime::{Dynamic, ObjectHeap};
    ///
    /// struct Point;
    /// impl ForeignClass for Point {
    ///     const NAME: &'static str = "Point";
    /// }
    ///
    /// let heap = ObjectHeap::new();
    /// let _ = <NativeRef<Point> as FromSlot>::from_slot(&Dynamic::Null, &heap);
    /// ```
    ///
    /// # Safety
    ///
    /// The returned reference does not keep the payload alive. The caller
    /// must not dereference it after the wrapper is collected, after the
    /// last share of a shared payload is released, or after the storage a
    /// borrowed wrapper points at goes away.
    pub unsafe fn from_slot_unchecked(
        slot: &Dynamic,
        heap: &ObjectHeap,
    ) -> Result<Self, ConversionError> {
        let handle = foreign_handle::<T>(slot, heap)?;
        // SAFETY: forwarded to the caller.
        Ok(unsafe { handle.native_ref() })
    }
}
