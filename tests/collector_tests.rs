//! Integration tests for reachability and the collector.

mod common;

use std::collections::HashMap;

use common::{Tracked, Vector3, drop_counter, init_logging, main_module, main_vm};
use foreignbind::prelude::*;

fn vm_with(config: VmConfig) -> Vm {
    init_logging();
    let mut vm = Vm::with_config(config);
    vm.install(main_module()).unwrap();
    vm
}

// =============================================================================
// Roots
// =============================================================================

#[test]
fn test_module_variables_are_roots() {
    let mut vm = main_vm();
    let drops = drop_counter();

    vm.set_variable("main", "kept", Tracked::new(1, &drops)).unwrap();
    assert_eq!(vm.collect_garbage().freed, 0);
    assert_eq!(drops.get(), 0);

    vm.set_variable("main", "kept", 0).unwrap();
    assert_eq!(vm.collect_garbage().freed, 1);
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_handle_clones_keep_object_alive() {
    let mut vm = main_vm();
    let drops = drop_counter();

    let handle = vm.push(Tracked::new(1, &drops)).unwrap();
    let clone = handle.clone();
    drop(handle);
    vm.collect_garbage();
    assert_eq!(drops.get(), 0);

    drop(clone);
    vm.collect_garbage();
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_return_value_keeps_result_alive() {
    let mut vm = main_vm();
    let class = vm.find("main", "Vector3").unwrap();

    let made = class.func("zero()").call(&mut vm, ()).unwrap();
    assert_eq!(vm.collect_garbage().freed, 0);
    assert!(made.is_foreign::<Vector3>(&vm));

    drop(made);
    assert_eq!(vm.collect_garbage().freed, 1);
}

#[test]
fn test_handle_taken_from_return_value_keeps_result_alive() {
    let mut vm = main_vm();
    let class = vm.find("main", "Vector3").unwrap();

    let kept: Handle = class.func("zero()").call(&mut vm, ()).unwrap().into_handle();
    assert_eq!(vm.collect_garbage().freed, 0);
    assert_eq!(vm.get::<Vector3>(kept.value()).unwrap(), Vector3::default());

    drop(kept);
    assert_eq!(vm.collect_garbage().freed, 1);
}

#[test]
fn test_lists_keep_elements_reachable() {
    let mut vm = main_vm();
    let items = vec![
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
    ];

    vm.set_variable("main", "items", items).unwrap();
    assert_eq!(vm.heap().len(), 4);
    assert_eq!(vm.collect_garbage().freed, 0);

    let back: Vec<Vector3> = vm.get(vm.variable("main", "items").unwrap()).unwrap();
    assert_eq!(back[1], Vector3::new(0.0, 1.0, 0.0));

    vm.remove_variable("main", "items");
    assert_eq!(vm.collect_garbage().freed, 4);
    assert!(vm.heap().is_empty());
}

#[test]
fn test_maps_keep_values_reachable() {
    let mut vm = main_vm();
    let drops = drop_counter();
    let mut tracked = HashMap::new();
    for key in 0..3i64 {
        tracked.insert(key, vm.push(Tracked::new(key, &drops)).unwrap());
    }
    let values: HashMap<i64, Dynamic> = tracked
        .iter()
        .map(|(key, handle)| (*key, handle.value().clone()))
        .collect();

    vm.set_variable("main", "table", values).unwrap();
    drop(tracked);
    assert_eq!(vm.heap().len(), 4);
    assert_eq!(vm.collect_garbage().freed, 0);
    assert_eq!(drops.get(), 0);

    vm.remove_variable("main", "table");
    assert_eq!(vm.collect_garbage().freed, 4);
    assert_eq!(drops.get(), 3);
}

#[test]
fn test_map_of_values_round_trips() {
    let mut vm = main_vm();
    let points = HashMap::from([
        ("origin".to_string(), Vector3::default()),
        ("unit".to_string(), Vector3::new(1.0, 1.0, 1.0)),
    ]);

    vm.set_variable("main", "points", points.clone()).unwrap();
    vm.collect_garbage();
    let back: HashMap<String, Vector3> = vm.get(vm.variable("main", "points").unwrap()).unwrap();
    assert_eq!(back, points);
}

#[test]
fn test_stale_handle_is_rejected() {
    let mut vm = main_vm();
    let handle = vm.push(Vector3::default()).unwrap();
    let stale = handle.value().clone();

    drop(handle);
    vm.collect_garbage();
    vm.push(Vector3::new(9.0, 9.0, 9.0)).unwrap();

    let err = vm.get::<Vector3>(&stale).unwrap_err();
    assert!(matches!(err, ConversionError::StaleHandle { .. }));
}

// =============================================================================
// Automatic collection
// =============================================================================

#[test]
fn test_auto_collect_runs_at_call_boundary() {
    let mut vm = vm_with(
        VmConfig::default()
            .with_initial_heap_objects(4)
            .with_min_heap_objects(2),
    );
    let drops = drop_counter();

    for value in 0..6 {
        vm.push(Tracked::new(value, &drops)).unwrap();
    }
    assert_eq!(vm.heap().len(), 6);
    assert_eq!(drops.get(), 0);

    let class = vm.find("main", "Vector3").unwrap();
    let zero = class.func("zero()").call(&mut vm, ()).unwrap();
    assert_eq!(drops.get(), 6);
    assert!(zero.is_foreign::<Vector3>(&vm));
    assert_eq!(vm.heap().len(), 1);
}

#[test]
fn test_auto_collect_waits_for_threshold() {
    let mut vm = vm_with(VmConfig::default().with_initial_heap_objects(8));
    let drops = drop_counter();

    for value in 0..3 {
        vm.push(Tracked::new(value, &drops)).unwrap();
    }
    let class = vm.find("main", "Vector3").unwrap();
    class.func("zero()").call(&mut vm, ()).unwrap();
    assert_eq!(drops.get(), 0);
}

#[test]
fn test_auto_collect_can_be_disabled() {
    let mut vm = vm_with(
        VmConfig::default()
            .with_initial_heap_objects(0)
            .with_auto_collect(false),
    );
    let drops = drop_counter();

    vm.push(Tracked::new(1, &drops)).unwrap();
    let class = vm.find("main", "Vector3").unwrap();
    class.func("zero()").call(&mut vm, ()).unwrap();
    assert_eq!(drops.get(), 0);

    vm.collect_garbage();
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_collect_stats() {
    let mut vm = main_vm();
    let keep = vm.push(Vector3::default()).unwrap();
    vm.push(Vector3::default()).unwrap();

    let stats = vm.collect_garbage();
    assert_eq!(stats.marked, 1);
    assert_eq!(stats.freed, 1);
    assert_eq!(stats.live, 1);
    drop(keep);
}
