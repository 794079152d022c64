//! ClassBuilder for binding native types as foreign classes.
//!
//! # Example
//!
//! ```
//! use foreignbind_registry::ForeignModule;
//! use foreignbind_core::ForeignClass;
//!
//! #[derive(Clone, Default)]
//! struct Vector3 {
//!     x: f64,
//!     y: f64,
//!     z: f64,
//! }
//!
//! impl ForeignClass for Vector3 {
//!     const NAME: &'static str = "Vector3";
//! }
//!
//! let mut module = ForeignModule::new("game");
//! module
//!     .class::<Vector3>()
//!     .constructor("new", |x: f64, y: f64, z: f64| Vector3 { x, y, z })
//!     .method("length", |v: &Vector3| (v.x * v.x + v.y * v.y + v.z * v.z).sqrt())
//!     .method_mut("scale", |v: &mut Vector3, by: f64| {
//!         v.x *= by;
//!         v.y *= by;
//!         v.z *= by;
//!     })
//!     .static_method("zero", || Vector3::default())
//!     .property("x", |v: &Vector3| v.x, |v: &mut Vector3, x: f64| v.x = x)
//!     .build()
//!     .unwrap();
//!
//! assert!(module.find_class("Vector3").is_some());
//! ```

use std::any::TypeId;
use std::marker::PhantomData;

use foreignbind_core::{
    CallContext, ClassRef, ForeignClass, FromSlot, IntoSlot, NativeError, NativeFn,
    RegistrationError, TypeHash,
};
use rustc_hash::FxHashMap;

use crate::adapters::{IntoFunction, IntoMethod, IntoMethodMut};
use crate::module::{ForeignClassDef, ForeignMethodDef, ForeignModule, MethodFlags};
use crate::signature::{constructor_signature, getter_signature, method_signature, setter_signature};

/// Builder for binding a native type as a foreign class.
///
/// Created by [`ForeignModule::class`]. Nothing is added to the module until
/// [`build`](Self::build) succeeds.
pub struct ClassBuilder<'m, T: ForeignClass> {
    module: &'m mut ForeignModule,
    name: String,
    class: ClassRef,
    members: Vec<ForeignMethodDef>,
    _marker: PhantomData<T>,
}

impl<'m, T: ForeignClass> ClassBuilder<'m, T> {
    pub(crate) fn new(module: &'m mut ForeignModule, name: String) -> Self {
        let class = ClassRef(TypeHash::from_class(module.name(), &name));
        Self {
            module,
            name,
            class,
            members: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn push(
        mut self,
        name: &str,
        signature: String,
        flags: MethodFlags,
        arity: usize,
        make: impl FnOnce(TypeHash) -> NativeFn,
    ) -> Self {
        let id = TypeHash::from_signature(
            self.class.0,
            &signature,
            flags.contains(MethodFlags::STATIC),
        );
        self.members.push(ForeignMethodDef {
            name: name.to_string(),
            signature,
            flags,
            arity,
            native: make(id),
        });
        self
    }

    /// Bind a constructor, called from the runtime as `Class.name(..)`.
    ///
    /// The returned value crosses into the runtime in value mode.
    pub fn constructor<F, Args>(self, name: &str, f: F) -> Self
    where
        F: IntoFunction<Args, Output = T>,
    {
        self.push(
            name,
            constructor_signature(name, F::ARITY),
            MethodFlags::STATIC | MethodFlags::CONSTRUCTOR,
            F::ARITY,
            |id| f.into_native(id),
        )
    }

    /// Bind an instance method taking `&T`.
    pub fn method<F, Args>(self, name: &str, f: F) -> Self
    where
        F: IntoMethod<T, Args>,
    {
        self.push(
            name,
            method_signature(name, F::ARITY),
            MethodFlags::empty(),
            F::ARITY,
            |id| f.into_native(id),
        )
    }

    /// Bind an instance method taking `&mut T`.
    pub fn method_mut<F, Args>(self, name: &str, f: F) -> Self
    where
        F: IntoMethodMut<T, Args>,
    {
        self.push(
            name,
            method_signature(name, F::ARITY),
            MethodFlags::empty(),
            F::ARITY,
            |id| f.into_native(id),
        )
    }

    /// Bind a static method, called on the class.
    pub fn static_method<F, Args>(self, name: &str, f: F) -> Self
    where
        F: IntoFunction<Args>,
    {
        self.push(
            name,
            method_signature(name, F::ARITY),
            MethodFlags::STATIC,
            F::ARITY,
            |id| f.into_native(id),
        )
    }

    /// Bind a read/write property.
    pub fn property<V, G, S>(self, name: &str, getter: G, setter: S) -> Self
    where
        G: Fn(&T) -> V + 'static,
        S: Fn(&mut T, V) + 'static,
        V: IntoSlot + FromSlot + 'static,
    {
        self.property_readonly(name, getter).push(
            name,
            setter_signature(name),
            MethodFlags::SETTER,
            1,
            |id| IntoMethodMut::<T, (V,)>::into_native(setter, id),
        )
    }

    /// Bind a read-only property.
    pub fn property_readonly<V, G>(self, name: &str, getter: G) -> Self
    where
        G: Fn(&T) -> V + 'static,
        V: IntoSlot + 'static,
    {
        self.push(
            name,
            getter_signature(name),
            MethodFlags::GETTER,
            0,
            |id| IntoMethod::<T, ()>::into_native(getter, id),
        )
    }

    /// Bind an untyped instance member under an explicit signature.
    ///
    /// The callable works on the [`CallContext`] directly. `name=(_)` binds a
    /// setter and a signature without parentheses binds a getter.
    pub fn raw_method<F>(self, signature: &str, f: F) -> Self
    where
        F: Fn(&mut CallContext) -> Result<(), NativeError> + 'static,
    {
        let (name, flags) = if let Some(name) = signature.strip_suffix("=(_)") {
            (name, MethodFlags::SETTER)
        } else if let Some(open) = signature.find('(') {
            (&signature[..open], MethodFlags::empty())
        } else {
            (signature, MethodFlags::GETTER)
        };
        let arity = match (signature.find('('), signature.rfind(')')) {
            (Some(open), Some(close)) if open < close => {
                signature[open + 1..close].matches('_').count()
            }
            _ => 0,
        };
        self.push(name, signature.to_string(), flags, arity, |id| {
            NativeFn::new(id, f)
        })
    }

    /// Validate the class and add it to the module.
    pub fn build(self) -> Result<(), RegistrationError> {
        if self.module.contains_name(&self.name) {
            return Err(RegistrationError::DuplicateClass {
                module: self.module.name().to_string(),
                class: self.name,
            });
        }
        if let Some(existing) = self.module.class_for_type(TypeId::of::<T>()) {
            return Err(RegistrationError::DuplicateType {
                type_name: std::any::type_name::<T>(),
                existing: existing.name.clone(),
            });
        }

        let mut lookup = FxHashMap::default();
        for (index, member) in self.members.iter().enumerate() {
            if lookup.insert(member.native.id, index).is_some() {
                return Err(RegistrationError::DuplicateSignature {
                    class: self.name,
                    signature: member.signature.clone(),
                });
            }
        }

        log::debug!(
            "bound class {}.{} with {} members",
            self.module.name(),
            self.name,
            self.members.len()
        );

        let class = ForeignClassDef::new(
            self.name,
            self.class,
            TypeId::of::<T>(),
            std::any::type_name::<T>(),
            self.members,
            lookup,
        );
        self.module.add_class(class);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Vector3 {
        x: f64,
        y: f64,
        z: f64,
    }

    impl ForeignClass for Vector3 {
        const NAME: &'static str = "Vector3";
    }

    struct Socket;

    impl ForeignClass for Socket {
        const NAME: &'static str = "Socket";
    }

    fn vector_module() -> ForeignModule {
        let mut module = ForeignModule::new("game");
        module
            .class::<Vector3>()
            .constructor("new", |x: f64, y: f64, z: f64| Vector3 { x, y, z })
            .method("dot", |a: &Vector3, b: Vector3| a.x * b.x + a.y * b.y + a.z * b.z)
            .static_method("zero", Vector3::default)
            .property("x", |v: &Vector3| v.x, |v: &mut Vector3, x: f64| v.x = x)
            .property_readonly("y", |v: &Vector3| v.y)
            .build()
            .unwrap();
        module
    }

    #[test]
    fn members_are_found_by_signature() {
        let module = vector_module();
        let class = module.find_class("Vector3").unwrap();

        assert!(class.find_constructor("new(_,_,_)").is_some());
        assert!(class.find_method("dot(_)", false).is_some());
        assert!(class.find_method("zero()", true).is_some());
        assert!(class.find_method("x", false).is_some());
        assert!(class.find_method("x=(_)", false).is_some());
        assert!(class.find_method("y=(_)", false).is_none());
    }

    #[test]
    fn static_and_instance_lookups_are_separate() {
        let module = vector_module();
        let class = module.find_class("Vector3").unwrap();
        assert!(class.find_method("zero()", false).is_none());
        assert!(class.find_method("dot(_)", true).is_none());
    }

    #[test]
    fn class_identity_comes_from_module_and_name() {
        let module = vector_module();
        let class = module.find_class("Vector3").unwrap();
        assert_eq!(class.class, ClassRef(TypeHash::from_class("game", "Vector3")));
        assert_eq!(class.type_id, TypeId::of::<Vector3>());
    }

    #[test]
    fn class_named_overrides_default_name() {
        let mut module = ForeignModule::new("net");
        module.class_named::<Socket>("Connection").build().unwrap();
        assert!(module.find_class("Connection").is_some());
        assert!(module.find_class("Socket").is_none());
    }

    #[test]
    fn duplicate_class_name_is_rejected() {
        let mut module = vector_module();
        let err = module.class_named::<Socket>("Vector3").build().unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateClass { .. }));
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let mut module = vector_module();
        let err = module
            .class_named::<Vector3>("Other")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateType {
                type_name: std::any::type_name::<Vector3>(),
                existing: "Vector3".into()
            }
        );
    }

    #[test]
    fn duplicate_signature_is_rejected() {
        let mut module = ForeignModule::new("game");
        let err = module
            .class::<Vector3>()
            .method("len", |v: &Vector3| v.x)
            .method_mut("len", |v: &mut Vector3| v.x)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateSignature {
                class: "Vector3".into(),
                signature: "len()".into()
            }
        );
        assert!(module.classes().is_empty());
    }

    #[test]
    fn overloads_by_arity_are_distinct() {
        let mut module = ForeignModule::new("game");
        module
            .class::<Vector3>()
            .method("get", |v: &Vector3| v.x)
            .method("get", |v: &Vector3, i: u8| match i {
                0 => v.x,
                1 => v.y,
                _ => v.z,
            })
            .build()
            .unwrap();
        let class = module.find_class("Vector3").unwrap();
        assert!(class.find_method("get()", false).is_some());
        assert!(class.find_method("get(_)", false).is_some());
    }

    #[test]
    fn raw_method_derives_kind_from_signature() {
        let mut module = ForeignModule::new("game");
        module
            .class::<Vector3>()
            .raw_method("sum(_,_)", |ctx: &mut CallContext| {
                let a: f64 = ctx.arg(0)?;
                let b: f64 = ctx.arg(1)?;
                ctx.set_return(a + b)
            })
            .raw_method("w", |ctx: &mut CallContext| ctx.set_return(0.0))
            .raw_method("w=(_)", |_: &mut CallContext| Ok(()))
            .build()
            .unwrap();

        let class = module.find_class("Vector3").unwrap();
        let sum = class.find_method("sum(_,_)", false).unwrap();
        assert_eq!(sum.arity, 2);
        assert_eq!(sum.name, "sum");
        assert!(class.find_method("w", false).unwrap().flags.contains(MethodFlags::GETTER));
        assert!(class.find_method("w=(_)", false).unwrap().flags.contains(MethodFlags::SETTER));
    }

    #[test]
    fn raw_method_arity_ignores_underscores_in_name() {
        let mut module = ForeignModule::new("game");
        module
            .class::<Vector3>()
            .raw_method("set_pos(_,_)", |_: &mut CallContext| Ok(()))
            .raw_method("max_len", |ctx: &mut CallContext| ctx.set_return(1.0))
            .raw_method("max_len=(_)", |_: &mut CallContext| Ok(()))
            .build()
            .unwrap();

        let class = module.find_class("Vector3").unwrap();
        let set_pos = class.find_method("set_pos(_,_)", false).unwrap();
        assert_eq!(set_pos.name, "set_pos");
        assert_eq!(set_pos.arity, 2);
        assert_eq!(class.find_method("max_len", false).unwrap().arity, 0);
        assert_eq!(class.find_method("max_len=(_)", false).unwrap().arity, 1);

        let declarations = module.declarations();
        assert!(declarations.contains("    foreign set_pos(arg0, arg1)\n"));
        assert!(declarations.contains("    foreign max_len\n"));
        assert!(declarations.contains("    foreign max_len=(rhs)\n"));
    }
}
