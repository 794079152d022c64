//! Foreign module registration.
//!
//! A [`ForeignModule`] collects native types bound as foreign classes,
//! together with their constructors, methods and properties. The module is
//! then installed into a runtime as one unit.

mod adapters;
mod class_builder;
mod module;
pub mod signature;

pub use adapters::{IntoFunction, IntoMethod, IntoMethodMut};
pub use class_builder::ClassBuilder;
pub use module::{ForeignClassDef, ForeignMethodDef, ForeignModule, MethodFlags};
