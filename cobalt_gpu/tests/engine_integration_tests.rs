//! Integration tests for the Engine singleton and resource teardown
//!
//! These tests drive the public API only, with plain CPU-side resources.
//! No GPU required.
//!
//! Run with: cargo test --test engine_integration_tests

use cobalt_gpu::cobalt::{Engine, Error, Handle, Resource};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST RESOURCES
// ============================================================================

type DropLog = Arc<Mutex<Vec<String>>>;

/// Stands in for a native object; records its destruction
struct Native {
    name: String,
    log: DropLog,
}

impl Native {
    fn new(name: &str, log: &DropLog) -> Self {
        Self { name: name.to_string(), log: log.clone() }
    }
}

impl Resource for Native {}

impl Drop for Native {
    fn drop(&mut self) {
        self.log.lock().unwrap().push(self.name.clone());
    }
}

/// Built from a parent resource, like a swapchain from a device
struct Child {
    parent: String,
    _native: Native,
}

impl Resource for Child {}

fn start() {
    Engine::initialize().unwrap();
    let _ = Engine::destroy_resource_manager();
    Engine::create_resource_manager().unwrap();
}

// ============================================================================
// LIFECYCLE TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_reverse_creation_teardown() {
    start();
    let log = DropLog::default();

    {
        let rm = Engine::resource_manager().unwrap();
        let mut rm = rm.lock().unwrap();

        let device = rm.create_resource(|| Ok(Native::new("device", &log))).unwrap();
        let parent = rm.get(device).unwrap().name.clone();
        let swapchain = rm
            .create_resource(|| Ok(Child { parent, _native: Native::new("swapchain", &log) }))
            .unwrap();
        rm.create_resource(|| Ok(Native::new("command_pool", &log))).unwrap();

        assert_eq!(rm.get(swapchain).unwrap().parent, "device");
        assert_eq!(rm.len(), 3);
    }

    Engine::reset_resource_manager().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["command_pool", "swapchain", "device"]);
    Engine::destroy_resource_manager().unwrap();
}

#[test]
#[serial]
fn test_integration_failed_constructor_registers_nothing() {
    start();
    let rm = Engine::resource_manager().unwrap();
    let mut rm = rm.lock().unwrap();

    let result: Result<Handle<Native>, Error> =
        rm.create_resource(|| Err(Error::InitializationFailed("no suitable GPU".to_string())));

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert!(rm.is_empty());
    assert_eq!(rm.pending_deletions(), 0);
    drop(rm);
    Engine::destroy_resource_manager().unwrap();
}

#[test]
#[serial]
fn test_integration_handles_go_stale_after_reset() {
    start();
    let log = DropLog::default();

    let handle = {
        let rm = Engine::resource_manager().unwrap();
        let mut rm = rm.lock().unwrap();
        rm.insert_resource(Native::new("buffer", &log))
    };

    Engine::reset_resource_manager().unwrap();

    let rm = Engine::resource_manager().unwrap();
    let mut rm = rm.lock().unwrap();
    assert!(!rm.contains(handle));
    assert!(matches!(rm.get(handle), Err(Error::StaleHandle(_))));

    // The slot is reused, the old handle stays dead
    let fresh = rm.insert_resource(Native::new("buffer2", &log));
    assert!(rm.get(fresh).is_ok());
    assert!(rm.get(handle).is_err());
    drop(rm);
    Engine::destroy_resource_manager().unwrap();
}

#[test]
#[serial]
fn test_integration_deferred_actions_interleave() {
    start();
    let log = DropLog::default();

    {
        let rm = Engine::resource_manager().unwrap();
        let mut rm = rm.lock().unwrap();
        rm.insert_resource(Native::new("allocator", &log));
        let deferred = log.clone();
        rm.defer(move || deferred.lock().unwrap().push("unmap".to_string()));
        rm.insert_resource(Native::new("image", &log));
    }

    Engine::shutdown();

    assert_eq!(*log.lock().unwrap(), vec!["image", "unmap", "allocator"]);
}

#[test]
#[serial]
fn test_integration_shutdown_then_restart() {
    start();
    Engine::shutdown();
    assert!(Engine::resource_manager().is_err());

    Engine::create_resource_manager().unwrap();
    assert!(Engine::resource_manager().unwrap().lock().unwrap().is_empty());
    Engine::destroy_resource_manager().unwrap();
}

#[test]
#[serial]
fn test_integration_handle_is_stale_after_restart() {
    start();
    let log = DropLog::default();
    let old: Handle<Native> = {
        let rm = Engine::resource_manager().unwrap();
        let mut rm = rm.lock().unwrap();
        rm.insert_resource(Native::new("before", &log))
    };

    Engine::shutdown();
    Engine::create_resource_manager().unwrap();

    let rm = Engine::resource_manager().unwrap();
    let mut rm = rm.lock().unwrap();
    // The new occupant lands in the slot the old handle points at
    let new = rm.insert_resource(Native::new("after", &log));
    assert_eq!(old.key(), new.key());

    assert!(matches!(rm.get(old), Err(Error::StaleHandle(_))));
    assert!(!rm.contains(old));
    assert_eq!(rm.get(new).unwrap().name, "after");

    drop(rm);
    Engine::destroy_resource_manager().unwrap();
}
