//! Generational arena for runtime objects, with a mark and sweep collector.
//!
//! Every foreign value that crosses into the runtime becomes a
//! [`ForeignObject`] on this heap. The collector marks from the roots it is
//! given plus every pinned object, traces through lists and map values, and
//! sweeps the rest.
//! Sweeping drops the boxed [`ForeignHandle`], which is the finalizer: an
//! owned payload is freed, a shared payload loses one share, and a borrowed
//! payload is left alone.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{ClassRef, Dynamic, MapKey, SlotType};
use crate::error::{ConversionError, RegistrationError};
use crate::foreign::ForeignHandle;
use crate::policy::{Ownership, PassingMode};

/// Handle to a heap-allocated object.
///
/// The generational index turns a handle to a collected object into a
/// [`ConversionError::StaleHandle`] instead of aliasing the reused slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    /// Index into ObjectHeap.slots
    pub index: u32,
    /// Generation for use-after-free detection
    pub generation: u32,
}

impl ObjectHandle {
    /// Create a new object handle.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Class binding for a native type.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub class: ClassRef,
    pub name: Rc<str>,
    pub type_name: &'static str,
}

/// A type-erased foreign wrapper stored on the heap.
pub struct ForeignObject {
    class: ClassRef,
    class_name: Rc<str>,
    mode: PassingMode,
    payload: Box<dyn Any>,
}

impl ForeignObject {
    pub fn class(&self) -> ClassRef {
        self.class
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The passing mode the wrapper was created with.
    pub fn mode(&self) -> PassingMode {
        self.mode
    }

    pub fn ownership(&self) -> Ownership {
        self.mode.ownership()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.payload.is::<ForeignHandle<T>>()
    }

    pub fn downcast<T: 'static>(&self) -> Option<&ForeignHandle<T>> {
        self.payload.downcast_ref::<ForeignHandle<T>>()
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignObject")
            .field("class", &self.class_name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// An object living on the heap.
#[derive(Debug)]
pub enum HeapObject {
    Foreign(ForeignObject),
    List(Vec<Dynamic>),
    Map(FxHashMap<MapKey, Dynamic>),
}

impl HeapObject {
    pub fn type_name(&self) -> &'static str {
        match self {
            HeapObject::Foreign(_) => "foreign",
            HeapObject::List(_) => "list",
            HeapObject::Map(_) => "map",
        }
    }
}

/// Result of one collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectStats {
    /// Objects found reachable.
    pub marked: usize,
    /// Objects swept and finalized.
    pub freed: usize,
    /// Objects alive after the sweep.
    pub live: usize,
}

struct HeapSlot {
    generation: u32,
    object: Option<HeapObject>,
    pins: u32,
    marked: bool,
}

/// Heap storage for runtime objects with generational indices.
pub struct ObjectHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
    live: usize,
    classes: FxHashMap<TypeId, ClassInfo>,
}

impl ObjectHeap {
    /// Create a new empty object heap.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
            classes: FxHashMap::default(),
        }
    }

    /// Create a heap with room for `capacity` objects before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // ========================================================================
    // Class bindings
    // ========================================================================

    /// Bind a native type to a class so its values can be allocated.
    pub fn register_class(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
        class: ClassRef,
        name: &str,
    ) -> Result<(), RegistrationError> {
        if let Some(existing) = self.classes.get(&type_id) {
            return Err(RegistrationError::DuplicateType {
                type_name,
                existing: existing.name.to_string(),
            });
        }
        self.classes.insert(
            type_id,
            ClassInfo {
                class,
                name: Rc::from(name),
                type_name,
            },
        );
        Ok(())
    }

    pub fn class_of<T: 'static>(&self) -> Option<&ClassInfo> {
        self.class_of_type(TypeId::of::<T>())
    }

    pub fn class_of_type(&self, type_id: TypeId) -> Option<&ClassInfo> {
        self.classes.get(&type_id)
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate a foreign wrapper. The type's class must be registered.
    pub fn allocate_foreign<T: 'static>(
        &mut self,
        handle: ForeignHandle<T>,
    ) -> Result<ObjectHandle, ConversionError> {
        let info = self
            .class_of::<T>()
            .ok_or(ConversionError::UnregisteredClass {
                type_name: std::any::type_name::<T>(),
            })?;
        let object = ForeignObject {
            class: info.class,
            class_name: Rc::clone(&info.name),
            mode: handle.mode(),
            payload: Box::new(handle),
        };
        log::trace!(
            "allocating {} wrapper for {}",
            object.mode.name(),
            object.class_name
        );
        Ok(self.insert(HeapObject::Foreign(object)))
    }

    /// Allocate a list.
    pub fn allocate_list(&mut self, items: Vec<Dynamic>) -> ObjectHandle {
        self.insert(HeapObject::List(items))
    }

    /// Allocate a map.
    pub fn allocate_map(&mut self, entries: FxHashMap<MapKey, Dynamic>) -> ObjectHandle {
        self.insert(HeapObject::Map(entries))
    }

    fn insert(&mut self, object: HeapObject) -> ObjectHandle {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            slot.pins = 0;
            slot.marked = false;
            ObjectHandle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                object: Some(object),
                pins: 0,
                marked: false,
            });
            ObjectHandle::new(index, 0)
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    fn slot(&self, handle: ObjectHandle) -> Option<&HeapSlot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
    }

    fn slot_mut(&mut self, handle: ObjectHandle) -> Option<&mut HeapSlot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
    }

    /// Get an object. Fails if the handle is stale.
    pub fn get(&self, handle: ObjectHandle) -> Result<&HeapObject, ConversionError> {
        self.slot(handle)
            .and_then(|slot| slot.object.as_ref())
            .ok_or(ConversionError::StaleHandle {
                index: handle.index,
            })
    }

    /// Get a foreign object of any class.
    pub fn foreign_object(&self, handle: ObjectHandle) -> Result<&ForeignObject, ConversionError> {
        match self.get(handle)? {
            HeapObject::Foreign(object) => Ok(object),
            other => Err(ConversionError::TypeMismatch {
                expected: "foreign",
                actual: other.type_name(),
            }),
        }
    }

    /// Get the wrapper of a foreign object of type `T`.
    pub fn foreign<T: 'static>(
        &self,
        handle: ObjectHandle,
    ) -> Result<&ForeignHandle<T>, ConversionError> {
        let object = self.foreign_object(handle)?;
        object
            .downcast::<T>()
            .ok_or_else(|| ConversionError::ForeignTypeMismatch {
                expected: self
                    .class_of::<T>()
                    .map(|info| info.name.to_string())
                    .unwrap_or_else(|| std::any::type_name::<T>().to_string()),
                actual: object.class_name().to_string(),
            })
    }

    pub fn list(&self, handle: ObjectHandle) -> Result<&[Dynamic], ConversionError> {
        match self.get(handle)? {
            HeapObject::List(items) => Ok(items),
            other => Err(ConversionError::TypeMismatch {
                expected: "list",
                actual: other.type_name(),
            }),
        }
    }

    pub fn list_mut(&mut self, handle: ObjectHandle) -> Result<&mut Vec<Dynamic>, ConversionError> {
        let index = handle.index;
        match self
            .slot_mut(handle)
            .and_then(|slot| slot.object.as_mut())
        {
            Some(HeapObject::List(items)) => Ok(items),
            Some(other) => Err(ConversionError::TypeMismatch {
                expected: "list",
                actual: other.type_name(),
            }),
            None => Err(ConversionError::StaleHandle { index }),
        }
    }

    pub fn map(&self, handle: ObjectHandle) -> Result<&FxHashMap<MapKey, Dynamic>, ConversionError> {
        match self.get(handle)? {
            HeapObject::Map(entries) => Ok(entries),
            other => Err(ConversionError::TypeMismatch {
                expected: "map",
                actual: other.type_name(),
            }),
        }
    }

    pub fn map_mut(
        &mut self,
        handle: ObjectHandle,
    ) -> Result<&mut FxHashMap<MapKey, Dynamic>, ConversionError> {
        let index = handle.index;
        match self
            .slot_mut(handle)
            .and_then(|slot| slot.object.as_mut())
        {
            Some(HeapObject::Map(entries)) => Ok(entries),
            Some(other) => Err(ConversionError::TypeMismatch {
                expected: "map",
                actual: other.type_name(),
            }),
            None => Err(ConversionError::StaleHandle { index }),
        }
    }

    /// Whether the handle refers to a live object.
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.slot(handle).is_some()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Classify a value the way the slot API reports it.
    pub fn slot_type(&self, value: &Dynamic) -> SlotType {
        match value {
            Dynamic::Null => SlotType::Null,
            Dynamic::Bool(_) => SlotType::Bool,
            Dynamic::Int(_) | Dynamic::Float(_) => SlotType::Num,
            Dynamic::String(_) => SlotType::String,
            Dynamic::Object(handle) => match self.get(*handle) {
                Ok(HeapObject::Foreign(_)) => SlotType::Foreign,
                Ok(HeapObject::List(_)) => SlotType::List,
                Ok(HeapObject::Map(_)) => SlotType::Map,
                Err(_) => SlotType::Unknown,
            },
            Dynamic::Class(_) => SlotType::Unknown,
        }
    }

    // ========================================================================
    // Pinning
    // ========================================================================

    /// Pin an object so the collector treats it as a root.
    pub fn pin(&mut self, handle: ObjectHandle) -> bool {
        if let Some(slot) = self.slot_mut(handle) {
            slot.pins = slot.pins.saturating_add(1);
            return true;
        }
        false
    }

    /// Release one pin.
    pub fn unpin(&mut self, handle: ObjectHandle) -> bool {
        if let Some(slot) = self.slot_mut(handle)
            && slot.pins > 0
        {
            slot.pins -= 1;
            return true;
        }
        false
    }

    pub fn pin_count(&self, handle: ObjectHandle) -> Option<u32> {
        self.slot(handle).map(|slot| slot.pins)
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Run a full mark and sweep cycle.
    ///
    /// `roots` are the values the caller keeps reachable (module variables,
    /// live slots). Pinned objects are always roots.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collect<'a, I>(&mut self, roots: I) -> CollectStats
    where
        I: IntoIterator<Item = &'a Dynamic>,
    {
        let mut stack: Vec<ObjectHandle> = roots.into_iter().filter_map(Dynamic::as_object).collect();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.pins > 0 && slot.object.is_some() {
                stack.push(ObjectHandle::new(index as u32, slot.generation));
            }
        }

        let mut marked = 0;
        while let Some(handle) = stack.pop() {
            let Some(slot) = self.slot_mut(handle) else {
                continue;
            };
            if slot.marked {
                continue;
            }
            slot.marked = true;
            marked += 1;
            match &slot.object {
                Some(HeapObject::List(items)) => {
                    stack.extend(items.iter().filter_map(Dynamic::as_object));
                }
                Some(HeapObject::Map(entries)) => {
                    stack.extend(entries.values().filter_map(Dynamic::as_object));
                }
                _ => {}
            }
        }

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.is_none() {
                continue;
            }
            if slot.marked {
                slot.marked = false;
                continue;
            }
            if let Some(HeapObject::Foreign(object)) = slot.object.take() {
                log::trace!(
                    "finalizing {} wrapper for {}",
                    object.mode.name(),
                    object.class_name
                );
            }
            slot.generation = slot.generation.wrapping_add(1);
            slot.pins = 0;
            self.free_list.push(index as u32);
            freed += 1;
        }
        self.live -= freed;

        CollectStats {
            marked,
            freed,
            live: self.live,
        }
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .field("live", &self.live)
            .finish()
    }
}
