//! Foreign modules and the class definitions they hold.

use std::any::TypeId;
use std::fmt::Write as _;

use bitflags::bitflags;
use foreignbind_core::{ClassRef, ForeignClass, NativeFn, TypeHash};
use rustc_hash::FxHashMap;

use crate::class_builder::ClassBuilder;

bitflags! {
    /// Kind of a class member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u8 {
        /// Called on the class rather than an instance.
        const STATIC = 1 << 0;
        /// Creates a new instance.
        const CONSTRUCTOR = 1 << 1;
        /// Property read.
        const GETTER = 1 << 2;
        /// Property write.
        const SETTER = 1 << 3;
    }
}

/// One bound member of a foreign class.
#[derive(Debug, Clone)]
pub struct ForeignMethodDef {
    pub name: String,
    pub signature: String,
    pub flags: MethodFlags,
    pub arity: usize,
    pub native: NativeFn,
}

impl ForeignMethodDef {
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    fn declaration(&self, out: &mut String) {
        let args = (0..self.arity)
            .map(|i| format!("arg{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = if self.is_static() { "static " } else { "" };
        // Writing into a String cannot fail.
        let _ = if self.flags.contains(MethodFlags::CONSTRUCTOR) {
            writeln!(out, "    construct {}({}) {{}}", self.name, args)
        } else if self.flags.contains(MethodFlags::GETTER) {
            writeln!(out, "    foreign {}{}", prefix, self.name)
        } else if self.flags.contains(MethodFlags::SETTER) {
            writeln!(out, "    foreign {}{}=(rhs)", prefix, self.name)
        } else {
            writeln!(out, "    foreign {}{}({})", prefix, self.name, args)
        };
    }
}

/// A native type bound as a foreign class.
#[derive(Debug)]
pub struct ForeignClassDef {
    pub name: String,
    pub class: ClassRef,
    pub type_id: TypeId,
    pub type_name: &'static str,
    members: Vec<ForeignMethodDef>,
    lookup: FxHashMap<TypeHash, usize>,
}

impl ForeignClassDef {
    pub(crate) fn new(
        name: String,
        class: ClassRef,
        type_id: TypeId,
        type_name: &'static str,
        members: Vec<ForeignMethodDef>,
        lookup: FxHashMap<TypeHash, usize>,
    ) -> Self {
        Self {
            name,
            class,
            type_id,
            type_name,
            members,
            lookup,
        }
    }

    /// Members in registration order.
    pub fn members(&self) -> &[ForeignMethodDef] {
        &self.members
    }

    /// Find a member by signature.
    pub fn find_method(&self, signature: &str, is_static: bool) -> Option<&ForeignMethodDef> {
        let id = TypeHash::from_signature(self.class.0, signature, is_static);
        self.lookup.get(&id).map(|&index| &self.members[index])
    }

    /// Find a constructor by its call signature, e.g. `new(_,_)`.
    pub fn find_constructor(&self, signature: &str) -> Option<&ForeignMethodDef> {
        self.find_method(&format!("init {}", signature), true)
    }

    /// Render the `foreign class` declaration for this class.
    pub fn declaration(&self) -> String {
        let mut out = format!("foreign class {} {{\n", self.name);
        let accessor = MethodFlags::GETTER | MethodFlags::SETTER;
        let ctors = self
            .members
            .iter()
            .filter(|m| m.flags.contains(MethodFlags::CONSTRUCTOR));
        let methods = self
            .members
            .iter()
            .filter(|m| !m.flags.intersects(MethodFlags::CONSTRUCTOR | accessor));
        let properties = self.members.iter().filter(|m| m.flags.intersects(accessor));
        for member in ctors.chain(methods).chain(properties) {
            member.declaration(&mut out);
        }
        out.push_str("}\n");
        out
    }
}

/// A named module of foreign classes, installed into a VM as one unit.
///
/// ```ignore
/// let mut module = ForeignModule::new("game");
/// module
///     .class::<Vector3>()
///     .constructor("new", Vector3::new)
///     .method("length", |v: &Vector3| v.length())
///     .property("x", |v: &Vector3| v.x, |v: &mut Vector3, x: f64| v.x = x)
///     .build()?;
/// vm.install(module)?;
/// ```
#[derive(Debug)]
pub struct ForeignModule {
    name: String,
    classes: Vec<ForeignClassDef>,
    by_name: FxHashMap<String, usize>,
    by_type: FxHashMap<TypeId, usize>,
}

impl ForeignModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
            by_name: FxHashMap::default(),
            by_type: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start binding `T` under its default class name.
    pub fn class<T: ForeignClass>(&mut self) -> ClassBuilder<'_, T> {
        self.class_named::<T>(T::NAME)
    }

    /// Start binding `T` under an explicit class name.
    pub fn class_named<T: ForeignClass>(&mut self, name: impl Into<String>) -> ClassBuilder<'_, T> {
        ClassBuilder::new(self, name.into())
    }

    pub fn find_class(&self, name: &str) -> Option<&ForeignClassDef> {
        self.by_name.get(name).map(|&index| &self.classes[index])
    }

    /// Classes in registration order.
    pub fn classes(&self) -> &[ForeignClassDef] {
        &self.classes
    }

    /// The stub source declaring every class of this module.
    pub fn declarations(&self) -> String {
        self.classes
            .iter()
            .map(ForeignClassDef::declaration)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub(crate) fn class_for_type(&self, type_id: TypeId) -> Option<&ForeignClassDef> {
        self.by_type.get(&type_id).map(|&index| &self.classes[index])
    }

    pub(crate) fn add_class(&mut self, class: ForeignClassDef) {
        let index = self.classes.len();
        self.by_name.insert(class.name.clone(), index);
        self.by_type.insert(class.type_id, index);
        self.classes.push(class);
    }
}
