//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use foreignbind::prelude::*;

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A plain value type, copyable across the boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl ForeignClass for Vector3 {
    const NAME: &'static str = "Vector3";
}

/// A non-`Clone` type that counts how often it is destroyed.
#[derive(Debug)]
pub struct Tracked {
    pub value: i64,
    drops: Rc<Cell<usize>>,
}

impl Tracked {
    pub fn new(value: i64, drops: &Rc<Cell<usize>>) -> Self {
        Self {
            value,
            drops: Rc::clone(drops),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

impl ForeignClass for Tracked {
    const NAME: &'static str = "Tracked";
}

pub fn drop_counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

/// `Vector3` and `Tracked` bound into a module named `main`.
pub fn main_module() -> ForeignModule {
    let mut module = ForeignModule::new("main");
    module
        .class::<Vector3>()
        .constructor("new", Vector3::new)
        .static_method("zero", Vector3::default)
        .method("dot", |a: &Vector3, b: Vector3| a.dot(&b))
        .method("scaled", |v: &Vector3, by: f64| {
            Vector3::new(v.x * by, v.y * by, v.z * by)
        })
        .method_mut("scale", |v: &mut Vector3, by: f64| {
            v.x *= by;
            v.y *= by;
            v.z *= by;
        })
        .property("x", |v: &Vector3| v.x, |v: &mut Vector3, x: f64| v.x = x)
        .property("y", |v: &Vector3| v.y, |v: &mut Vector3, y: f64| v.y = y)
        .property("z", |v: &Vector3| v.z, |v: &mut Vector3, z: f64| v.z = z)
        .build()
        .unwrap();
    module
        .class::<Tracked>()
        .property(
            "value",
            |t: &Tracked| t.value,
            |t: &mut Tracked, value: i64| t.value = value,
        )
        .method_mut("bump", |t: &mut Tracked| {
            t.value += 1;
            t.value
        })
        .build()
        .unwrap();
    module
}

pub fn main_vm() -> Vm {
    init_logging();
    let mut vm = Vm::new();
    vm.install(main_module()).unwrap();
    vm
}
