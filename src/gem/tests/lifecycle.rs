//! Testes de criação e destruição de objetos

#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use super::{create_test_device, RecordingDriver};
use crate::gem::config::PAGE_SIZE;
use crate::gem::{
    ClientId, GemConfig, GemDevice, GemDriver, GemError, GemObject, GemResult, OffsetToken,
};

#[test]
fn test_new_object_state() {
    let (driver, device) = create_test_device();
    let obj = device.create_object(3 * PAGE_SIZE).unwrap();

    assert_eq!(obj.size(), 3 * PAGE_SIZE);
    assert_eq!(GemObject::refcount(&obj), 1);
    assert_eq!(obj.handle_count(), 0);
    assert_eq!(obj.name(), None);
    assert_eq!(obj.offset_token(), None);
    assert_eq!(driver.inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_object_ids_are_unique() {
    let (_driver, device) = create_test_device();
    let a = device.create_object(PAGE_SIZE).unwrap();
    let b = device.create_object(PAGE_SIZE).unwrap();
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_invalid_sizes() {
    let (driver, device) = create_test_device();
    assert_eq!(device.create_object(0).err(), Some(GemError::InvalidSize));
    assert_eq!(device.create_object(100).err(), Some(GemError::InvalidSize));
    assert_eq!(
        device.create_object(PAGE_SIZE + 512).err(),
        Some(GemError::InvalidSize)
    );
    assert_eq!(driver.inits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_init_failure_skips_free_callback() {
    let (driver, device) = create_test_device();
    driver.fail_init.store(true, Ordering::SeqCst);

    assert_eq!(
        device.create_object(PAGE_SIZE).err(),
        Some(GemError::OutOfMemory)
    );
    assert_eq!(driver.inits.load(Ordering::SeqCst), 1);
    assert_eq!(driver.freed(), 0);
}

#[test]
fn test_last_reference_frees_once() {
    let (driver, device) = create_test_device();
    let a = device.open_client().unwrap();
    let b = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    let id = obj.id().0;

    let handle_a = a.create_handle(&obj).unwrap();
    let handle_b = b.create_handle(&obj).unwrap();
    device.registry().publish_name(&obj).unwrap();
    let transient = a.lookup_handle(handle_a).unwrap();
    drop(obj);

    a.delete_handle(handle_a).unwrap();
    assert_eq!(driver.freed(), 0);
    b.delete_handle(handle_b).unwrap();
    // Nome aposentado, mas a referência transitória segura o objeto
    assert_eq!(driver.freed(), 0);
    assert_eq!(transient.name(), None);

    drop(transient);
    assert_eq!(driver.freed(), 1);
    assert_eq!(*driver.freed_ids.lock().unwrap(), vec![id]);
}

#[test]
fn test_destruction_ordering() {
    let (driver, device) = create_test_device();
    let client = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    let handle = client.create_handle(&obj).unwrap();
    drop(obj);

    let name = device.flink(&client, handle).unwrap();
    let addr = device.map_offset(&client, handle).unwrap();
    let token = client.lookup_handle(handle).unwrap().offset_token().unwrap();

    client.delete_handle(handle).unwrap();

    assert_eq!(driver.freed(), 1);
    assert_eq!(client.lookup_handle(handle).err(), Some(GemError::InvalidHandle));
    assert_eq!(
        device.registry().resolve_name(name).err(),
        Some(GemError::NoSuchName)
    );
    assert_eq!(
        device.registry().resolve_offset(token).err(),
        Some(GemError::NotFound)
    );
    assert_eq!(device.object_from_offset(addr).err(), Some(GemError::NotFound));
    assert_eq!(device.registry().name_count(), 0);
    assert_eq!(device.registry().offset_count(), 0);
}

#[test]
fn test_last_client_frees_published_objects() {
    let driver = Arc::new(RecordingDriver::new());
    let device = GemDevice::new(driver.clone(), GemConfig::default()).unwrap();
    let client = device.open_client().unwrap();

    let obj = device.create_object(PAGE_SIZE).unwrap();
    client.create_handle(&obj).unwrap();
    device.registry().publish_name(&obj).unwrap();
    device.registry().create_offset(&obj).unwrap();
    drop(obj);

    // O cliente mantém o dispositivo vivo
    drop(device);
    assert_eq!(driver.freed(), 0);

    drop(client);
    assert_eq!(driver.freed(), 1);
}

#[test]
fn test_object_outlives_device() {
    let driver = Arc::new(RecordingDriver::new());
    let device = GemDevice::new(driver.clone(), GemConfig::default()).unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    device.registry().create_offset(&obj).unwrap();

    drop(device);
    assert_eq!(driver.freed(), 0);
    drop(obj);
    assert_eq!(driver.freed(), 1);
}

/// Driver que volta ao dispositivo de dentro dos hooks.
struct ReentrantDriver {
    device: OnceLock<Weak<GemDevice>>,
    freed: AtomicUsize,
    observed_names: AtomicUsize,
}

impl ReentrantDriver {
    fn device(&self) -> Option<Arc<GemDevice>> {
        self.device.get().and_then(Weak::upgrade)
    }
}

impl GemDriver for ReentrantDriver {
    fn on_object_freed(&self, _obj: &GemObject) {
        // Deadlock aqui se algum lock de tabela estivesse seguro
        if let Some(device) = self.device() {
            let registry = device.registry();
            self.observed_names
                .store(registry.name_count(), Ordering::SeqCst);
            let _ = registry.offset_count();
            let _ = registry.resolve_offset(OffsetToken(0));
        }
        self.freed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_handle_opened(&self, obj: &GemObject, _client: ClientId) -> GemResult<()> {
        if let Some(device) = self.device() {
            let _ = device.registry().name_count();
            assert_eq!(obj.handle_count(), 1);
        }
        Ok(())
    }

    fn on_handle_closed(&self, _obj: &GemObject, _client: ClientId) {
        if let Some(device) = self.device() {
            let _ = device.registry().offset_count();
        }
    }
}

#[test]
fn test_hooks_run_without_table_locks() {
    let driver = Arc::new(ReentrantDriver {
        device: OnceLock::new(),
        freed: AtomicUsize::new(0),
        observed_names: AtomicUsize::new(usize::MAX),
    });
    let device = GemDevice::new(driver.clone(), GemConfig::default()).unwrap();
    driver.device.set(Arc::downgrade(&device)).unwrap();

    let client = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    let handle = client.create_handle(&obj).unwrap();
    drop(obj);
    device.flink(&client, handle).unwrap();
    device.map_offset(&client, handle).unwrap();

    client.delete_handle(handle).unwrap();
    assert_eq!(driver.freed.load(Ordering::SeqCst), 1);
    // O nome já tinha saído da tabela quando o objeto foi liberado
    assert_eq!(driver.observed_names.load(Ordering::SeqCst), 0);
}
