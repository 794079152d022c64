//! Integration tests for error reporting at the boundary.

mod common;

use std::cell::RefCell;

use common::{Tracked, Vector3, drop_counter, main_module, main_vm};
use foreignbind::prelude::*;

// =============================================================================
// Conversion at the crossing point
// =============================================================================

#[test]
fn test_argument_type_mismatch_is_catchable() {
    let mut vm = main_vm();
    let v = vm.push(Vector3::new(1.0, 0.0, 0.0)).unwrap();

    let err = vm.call(v.value(), "scale(_)", ("two",)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Native {
            source: NativeError::Conversion(ConversionError::TypeMismatch { .. }),
            ..
        }
    ));
    assert!(err.to_string().starts_with("native call 'scale(_)' failed"));
    assert!(vm.last_error().is_some());

    // The VM stays usable and the receiver untouched.
    let x = vm.call(v.value(), "x", ()).unwrap();
    assert_eq!(x.get::<f64>(&vm).unwrap(), 1.0);
}

#[test]
fn test_foreign_argument_of_wrong_class() {
    let mut vm = main_vm();
    let drops = drop_counter();
    let v = vm.push(Vector3::default()).unwrap();
    let t = vm.push(Tracked::new(1, &drops)).unwrap();

    let err = vm.call(v.value(), "dot(_)", (t.value().clone(),)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Native {
            source: NativeError::Conversion(ConversionError::ForeignTypeMismatch { .. }),
            ..
        }
    ));
}

#[test]
fn test_null_where_object_required() {
    let mut vm = main_vm();
    let v = vm.push(Vector3::default()).unwrap();

    let err = vm.call(v.value(), "dot(_)", ((),)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Native {
            source: NativeError::Conversion(ConversionError::NullValue {
                target_type: "Vector3"
            }),
            ..
        }
    ));
}

#[test]
fn test_unregistered_class_cannot_cross() {
    let mut vm = Vm::new();
    let err = vm.push(Vector3::default()).unwrap_err();
    assert!(matches!(err, ConversionError::UnregisteredClass { .. }));
}

#[test]
fn test_narrowing_overflow_is_reported() {
    let mut module = ForeignModule::new("bytes");
    module
        .class::<Vector3>()
        .static_method("byte", |b: u8| b)
        .build()
        .unwrap();
    let mut vm = Vm::new();
    vm.install(module).unwrap();
    let class = vm.find("bytes", "Vector3").unwrap();

    let err = class.func("byte(_)").call(&mut vm, (300,)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Native {
            source: NativeError::Conversion(ConversionError::IntegerOverflow { value: 300, .. }),
            ..
        }
    ));
}

// =============================================================================
// Native failures
// =============================================================================

#[test]
fn test_native_error_is_surfaced_and_recorded() {
    let mut module = ForeignModule::new("fail");
    module
        .class::<Vector3>()
        .raw_method("explode()", |_: &mut CallContext| {
            Err(NativeError::other("boom"))
        })
        .build()
        .unwrap();
    let mut vm = Vm::new();
    vm.install(module).unwrap();
    let v = vm.push(Vector3::default()).unwrap();

    let err = vm.call(v.value(), "explode()", ()).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Native {
            signature: "explode()".into(),
            source: NativeError::other("boom"),
        }
    );
    assert_eq!(vm.last_error(), Some("native error: boom"));
}

#[test]
fn test_borrowed_storage_in_use_natively() {
    let mut vm = main_vm();
    let native = RefCell::new(Vector3::default());
    let handle = vm.push(unsafe { NativeRef::new(&native) }).unwrap();

    let guard = native.borrow();
    let err = vm.call(handle.value(), "scale(_)", (2.0,)).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Native {
            source: NativeError::Conversion(ConversionError::AlreadyBorrowed { .. }),
            ..
        }
    ));
    drop(guard);

    vm.call(handle.value(), "scale(_)", (2.0,)).unwrap();
}

// =============================================================================
// Lookup and registration
// =============================================================================

#[test]
fn test_lookup_errors() {
    let mut vm = main_vm();
    assert_eq!(
        vm.find("missing", "Vector3").unwrap_err(),
        RuntimeError::ModuleNotFound("missing".into())
    );

    let v = vm.push(Vector3::default()).unwrap();
    assert_eq!(
        vm.call(v.value(), "w", ()).unwrap_err(),
        RuntimeError::MethodNotFound {
            receiver: "Vector3".into(),
            signature: "w".into(),
        }
    );

    let list = vm.push(vec![1, 2]).unwrap();
    assert_eq!(
        vm.call(list.value(), "count", ()).unwrap_err(),
        RuntimeError::NotCallable { type_name: "list" }
    );
}

#[test]
fn test_duplicate_install_is_rejected() {
    let mut vm = main_vm();
    let err = vm.install(main_module()).unwrap_err();
    assert_eq!(err, RegistrationError::DuplicateModule("main".into()));
}

#[test]
fn test_errors_unify() {
    let mut vm = main_vm();
    let err: Error = vm.find("missing", "x").unwrap_err().into();
    assert!(err.is_runtime());

    let err: Error = Vm::new().push(Vector3::default()).unwrap_err().into();
    assert!(err.is_conversion());

    let err: Error = vm.install(main_module()).unwrap_err().into();
    assert!(err.is_registration());
}
