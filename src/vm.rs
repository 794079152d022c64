//! The host runtime.
//!
//! A `Vm` owns the object heap, the installed foreign modules, module
//! variables and the slot array used for calls. It has no script front end:
//! calls are issued from the host through [`Vm::call`] or a [`Method`]
//! looked up with [`Vm::find`].
//!
//! # Example
//!
//! ```
//! use foreignbind::prelude::*;
//!
//! #[derive(Clone)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! impl ForeignClass for Counter {
//!     const NAME: &'static str = "Counter";
//! }
//!
//! let mut module = ForeignModule::new("main");
//! module
//!     .class::<Counter>()
//!     .constructor("new", |count: i64| Counter { count })
//!     .method_mut("bump", |c: &mut Counter| {
//!         c.count += 1;
//!         c.count
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut vm = Vm::new();
//! vm.install(module).unwrap();
//!
//! let counter = vm.find("main", "Counter").unwrap().func("new(_)").call(&mut vm, (41,)).unwrap();
//! let bumped = counter.func("bump()").call(&mut vm, ()).unwrap();
//! assert_eq!(bumped.get::<i64>(&vm).unwrap(), 42);
//! ```
//!
//! [`Method`]: crate::Method

use std::fmt;

use foreignbind_core::{
    CallContext, ClassRef, CollectStats, ConversionError, Dynamic, FromSlot, HeapObject,
    IntoSlot, NativeFn, ObjectHeap, RegistrationError, RuntimeError, SlotType,
};
use foreignbind_registry::{ForeignClassDef, ForeignModule};
use rustc_hash::FxHashMap;

use crate::args::IntoArgs;
use crate::config::VmConfig;
use crate::handle::{Handle, ReleaseQueue};
use crate::return_value::ReturnValue;
use crate::variable::Variable;

/// The host runtime that foreign modules are installed into.
///
/// Not `Send`: values cross the boundary on the owning thread only.
pub struct Vm {
    config: VmConfig,
    heap: ObjectHeap,
    modules: Vec<ForeignModule>,
    module_index: FxHashMap<String, usize>,
    /// Class to (module index, class index).
    classes: FxHashMap<ClassRef, (usize, usize)>,
    variables: FxHashMap<String, FxHashMap<String, Dynamic>>,
    slots: Vec<Dynamic>,
    releases: ReleaseQueue,
    next_gc: usize,
    last_error: Option<String>,
}

impl Vm {
    /// Create a VM with the default configuration.
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            heap: ObjectHeap::with_capacity(config.initial_heap_objects),
            next_gc: config.initial_heap_objects,
            config,
            modules: Vec::new(),
            module_index: FxHashMap::default(),
            classes: FxHashMap::default(),
            variables: FxHashMap::default(),
            slots: Vec::new(),
            releases: ReleaseQueue::default(),
            last_error: None,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// The object heap, for inspection.
    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    // ========================================================================
    // Modules
    // ========================================================================

    /// Install a foreign module.
    ///
    /// Every class of the module becomes allocatable and is bound to a module
    /// variable of the same name, so `vm.find("game", "Vector3")` yields the
    /// class itself.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::DuplicateModule` if a module with the same
    /// name is installed, or `RegistrationError::DuplicateType` if one of its
    /// native types is already bound by another module. Nothing is installed
    /// on error.
    pub fn install(&mut self, module: ForeignModule) -> Result<(), RegistrationError> {
        if self.module_index.contains_key(module.name()) {
            return Err(RegistrationError::DuplicateModule(module.name().to_string()));
        }
        for class in module.classes() {
            if let Some(existing) = self.heap.class_of_type(class.type_id) {
                return Err(RegistrationError::DuplicateType {
                    type_name: class.type_name,
                    existing: existing.name.to_string(),
                });
            }
        }

        let module_slot = self.modules.len();
        let variables = self.variables.entry(module.name().to_string()).or_default();
        for (index, class) in module.classes().iter().enumerate() {
            self.heap
                .register_class(class.type_id, class.type_name, class.class, &class.name)?;
            self.classes.insert(class.class, (module_slot, index));
            variables.insert(class.name.clone(), Dynamic::Class(class.class));
        }

        log::debug!(
            "installed module {} with {} classes",
            module.name(),
            module.classes().len()
        );
        self.module_index.insert(module.name().to_string(), module_slot);
        self.modules.push(module);
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&ForeignModule> {
        self.module_index.get(name).map(|&index| &self.modules[index])
    }

    pub fn modules(&self) -> &[ForeignModule] {
        &self.modules
    }

    fn class_def(&self, class: ClassRef) -> Option<&ForeignClassDef> {
        let &(module, index) = self.classes.get(&class)?;
        self.modules[module].classes().get(index)
    }

    // ========================================================================
    // Variables
    // ========================================================================

    /// Assign a module variable, creating the module scope if needed.
    ///
    /// The value crosses with the passing mode its type selects and stays
    /// reachable for as long as the variable holds it.
    pub fn set_variable<V: IntoSlot>(
        &mut self,
        module: &str,
        name: &str,
        value: V,
    ) -> Result<(), ConversionError> {
        self.drain_releases();
        let value = value.into_slot(&mut self.heap)?;
        self.variables
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Read a module variable.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::ModuleNotFound` or `RuntimeError::VariableNotFound`.
    pub fn variable(&self, module: &str, name: &str) -> Result<&Dynamic, RuntimeError> {
        let scope = self
            .variables
            .get(module)
            .ok_or_else(|| RuntimeError::ModuleNotFound(module.to_string()))?;
        scope.get(name).ok_or_else(|| RuntimeError::VariableNotFound {
            module: module.to_string(),
            name: name.to_string(),
        })
    }

    /// Remove a module variable, returning its last value.
    ///
    /// An object held only by this variable becomes garbage.
    pub fn remove_variable(&mut self, module: &str, name: &str) -> Option<Dynamic> {
        self.variables.get_mut(module)?.remove(name)
    }

    /// Look up a module variable and pin its current value.
    pub fn find(&mut self, module: &str, name: &str) -> Result<Variable, RuntimeError> {
        self.drain_releases();
        let value = self.variable(module, name)?.clone();
        Ok(Variable::new(self.handle(value)))
    }

    // ========================================================================
    // Values and handles
    // ========================================================================

    /// Pin a runtime value.
    pub fn handle(&mut self, value: Dynamic) -> Handle {
        if let Some(object) = value.as_object() {
            self.heap.pin(object);
        }
        Handle::new(value, &self.releases)
    }

    /// Convert a native value into the runtime and pin the result.
    pub fn push<V: IntoSlot>(&mut self, value: V) -> Result<Handle, ConversionError> {
        self.drain_releases();
        let value = value.into_slot(&mut self.heap)?;
        Ok(self.handle(value))
    }

    /// Convert a runtime value back to a native one.
    pub fn get<V: FromSlot>(&self, value: &Dynamic) -> Result<V, ConversionError> {
        V::from_slot(value, &self.heap)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Call the member `signature` on `receiver`.
    ///
    /// The receiver goes into slot 0 and `args` into the following slots. A
    /// class receiver resolves constructors first, then static methods; a
    /// foreign object resolves instance methods and property accessors.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Conversion` if an argument cannot cross the boundary
    /// - `RuntimeError::NotCallable` if the receiver is neither a class nor a
    ///   foreign object
    /// - `RuntimeError::MethodNotFound` if the class has no such member
    /// - `RuntimeError::Native` if the native function fails; the VM stays
    ///   usable and the message is kept in [`last_error`](Self::last_error)
    pub fn call<A: IntoArgs>(
        &mut self,
        receiver: &Dynamic,
        signature: &str,
        args: A,
    ) -> Result<ReturnValue, RuntimeError> {
        self.drain_releases();
        self.slots.clear();
        self.slots.push(receiver.clone());
        let args = args.into_args(&mut self.heap)?;
        self.slots.extend(args);

        let result = self.call_slots(signature);
        let value = std::mem::take(&mut self.slots[0]);
        self.slots.clear();
        result?;
        Ok(ReturnValue::new(self.handle(value)))
    }

    /// Call `signature` on the receiver already in slot 0, with the
    /// arguments in the following slots. The result replaces slot 0.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call_slots(&mut self, signature: &str) -> Result<(), RuntimeError> {
        self.drain_releases();
        let receiver = self.slots.first().cloned().ok_or(RuntimeError::SlotOutOfRange {
            index: 0,
            count: 0,
        })?;
        let native = self.resolve(&receiver, signature)?;
        self.maybe_collect();

        log::trace!("dispatching '{}' on {}", signature, receiver.type_name());
        let mut ctx = CallContext::new(&mut self.slots, &mut self.heap);
        match native.call(&mut ctx) {
            Ok(()) => Ok(()),
            Err(source) => {
                log::warn!("native call '{}' failed: {}", signature, source);
                self.last_error = Some(source.to_string());
                self.slots[0] = Dynamic::Null;
                Err(RuntimeError::Native {
                    signature: signature.to_string(),
                    source,
                })
            }
        }
    }

    fn resolve(&self, receiver: &Dynamic, signature: &str) -> Result<NativeFn, RuntimeError> {
        let (class, member) = match receiver {
            Dynamic::Class(class) => {
                let class = self.class_def(*class).ok_or(RuntimeError::NotCallable {
                    type_name: "class",
                })?;
                let member = class
                    .find_constructor(signature)
                    .or_else(|| class.find_method(signature, true));
                (class, member)
            }
            Dynamic::Object(handle) => match self.heap.get(*handle)? {
                HeapObject::Foreign(object) => {
                    let class = self.class_def(object.class()).ok_or(
                        RuntimeError::NotCallable {
                            type_name: "object",
                        },
                    )?;
                    (class, class.find_method(signature, false))
                }
                other => {
                    return Err(RuntimeError::NotCallable {
                        type_name: other.type_name(),
                    });
                }
            },
            other => {
                return Err(RuntimeError::NotCallable {
                    type_name: other.type_name(),
                });
            }
        };

        member
            .map(|member| member.native.clone())
            .ok_or_else(|| RuntimeError::MethodNotFound {
                receiver: class.name.clone(),
                signature: signature.to_string(),
            })
    }

    /// Message of the most recent failed native call.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Run a full collection.
    ///
    /// Roots are module variables, pinned handles and the live slots.
    /// Unreachable wrappers are dropped: owned payloads are destroyed,
    /// borrowed ones are left alone, shared ones release one share.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collect_garbage(&mut self) -> CollectStats {
        self.drain_releases();
        let roots = self
            .variables
            .values()
            .flat_map(|scope| scope.values())
            .chain(self.slots.iter());
        let stats = self.heap.collect(roots);
        self.next_gc = self.config.next_threshold(stats.live);
        log::debug!(
            "collected {} objects, {} live, next collection at {}",
            stats.freed,
            stats.live,
            self.next_gc
        );
        stats
    }

    fn maybe_collect(&mut self) {
        if self.config.auto_collect && self.heap.len() > self.next_gc {
            self.collect_garbage();
        }
    }

    fn drain_releases(&mut self) {
        let released = std::mem::take(&mut *self.releases.borrow_mut());
        for object in released {
            self.heap.unpin(object);
        }
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Grow the slot array to at least `count` slots.
    pub fn ensure_slots(&mut self, count: usize) {
        if self.slots.len() < count {
            self.slots.resize(count, Dynamic::Null);
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn set_slot<V: IntoSlot>(&mut self, index: usize, value: V) -> Result<(), RuntimeError> {
        self.check_slot(index)?;
        self.slots[index] = value.into_slot(&mut self.heap)?;
        Ok(())
    }

    pub fn get_slot<V: FromSlot>(&self, index: usize) -> Result<V, RuntimeError> {
        Ok(V::from_slot(self.slot(index)?, &self.heap)?)
    }

    pub fn slot(&self, index: usize) -> Result<&Dynamic, RuntimeError> {
        self.check_slot(index)?;
        Ok(&self.slots[index])
    }

    pub fn slot_type(&self, index: usize) -> Result<SlotType, RuntimeError> {
        Ok(self.heap.slot_type(self.slot(index)?))
    }

    fn check_slot(&self, index: usize) -> Result<(), RuntimeError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(RuntimeError::SlotOutOfRange {
                index,
                count: self.slots.len(),
            })
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("modules", &self.module_index.keys().collect::<Vec<_>>())
            .field("heap", &self.heap)
            .field("slots", &self.slots.len())
            .field("next_gc", &self.next_gc)
            .finish()
    }
}
