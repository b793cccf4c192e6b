//! Testes dos nomes globais

#![cfg(test)]

use std::sync::Arc;

use super::create_test_device;
use crate::gem::config::PAGE_SIZE;
use crate::gem::{GemError, GemName, GemObject};

#[test]
fn test_publish_is_idempotent() {
    let (_driver, device) = create_test_device();
    let registry = device.registry();
    let client = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    client.create_handle(&obj).unwrap();

    let first = registry.publish_name(&obj).unwrap();
    let refs = GemObject::refcount(&obj);
    let second = registry.publish_name(&obj).unwrap();

    assert_eq!(first, second);
    assert_eq!(obj.name(), Some(first));
    assert_eq!(registry.name_count(), 1);
    // A segunda publicação não toma referência
    assert_eq!(GemObject::refcount(&obj), refs);
}

#[test]
fn test_name_holds_one_reference() {
    let (_driver, device) = create_test_device();
    let client = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    client.create_handle(&obj).unwrap();
    assert_eq!(GemObject::refcount(&obj), 2);

    device.registry().publish_name(&obj).unwrap();
    assert_eq!(GemObject::refcount(&obj), 3);
}

#[test]
fn test_resolve_round_trip() {
    let (_driver, device) = create_test_device();
    let registry = device.registry();
    let client = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    client.create_handle(&obj).unwrap();
    let name = registry.publish_name(&obj).unwrap();

    // Local, handle, nome e o resultado da resolução
    let found = registry.resolve_name(name).unwrap();
    assert!(Arc::ptr_eq(&found, &obj));
    assert_eq!(GemObject::refcount(&obj), 4);
}

#[test]
fn test_unknown_name() {
    let (_driver, device) = create_test_device();
    assert_eq!(
        device.registry().resolve_name(GemName(42)).err(),
        Some(GemError::NoSuchName)
    );
    assert_eq!(
        device.registry().resolve_name(GemName(0)).err(),
        Some(GemError::NoSuchName)
    );
}

#[test]
fn test_names_are_dense_from_one() {
    let (_driver, device) = create_test_device();
    let registry = device.registry();
    let client = device.open_client().unwrap();
    let objs: Vec<_> = (0..3)
        .map(|_| device.create_object(PAGE_SIZE).unwrap())
        .collect();
    for obj in &objs {
        client.create_handle(obj).unwrap();
    }

    let names: Vec<_> = objs
        .iter()
        .map(|obj| registry.publish_name(obj).unwrap())
        .collect();
    assert_eq!(names, vec![GemName(1), GemName(2), GemName(3)]);
}

#[test]
fn test_publish_requires_open_handle() {
    let (driver, device) = create_test_device();
    let client = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    assert_eq!(
        device.registry().publish_name(&obj).err(),
        Some(GemError::NotFound)
    );

    let handle = client.create_handle(&obj).unwrap();
    drop(obj);

    // Referência tomada antes do último fechamento, publicada depois dele
    let held = client.lookup_handle(handle).unwrap();
    client.delete_handle(handle).unwrap();
    assert_eq!(
        device.registry().publish_name(&held).err(),
        Some(GemError::NotFound)
    );
    assert_eq!(held.name(), None);
    assert_eq!(device.registry().name_count(), 0);

    drop(held);
    assert_eq!(driver.freed(), 1);
}

#[test]
fn test_last_handle_close_retires_name() {
    let (driver, device) = create_test_device();
    let client = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    let handle = client.create_handle(&obj).unwrap();
    drop(obj);

    let name = device.flink(&client, handle).unwrap();
    assert_eq!(device.registry().name_count(), 1);

    client.delete_handle(handle).unwrap();
    assert_eq!(device.registry().name_count(), 0);
    assert_eq!(
        device.registry().resolve_name(name).err(),
        Some(GemError::NoSuchName)
    );
    assert_eq!(driver.freed(), 1);
}

#[test]
fn test_name_survives_while_any_handle_is_open() {
    let (driver, device) = create_test_device();
    let a = device.open_client().unwrap();
    let b = device.open_client().unwrap();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    let handle_a = a.create_handle(&obj).unwrap();
    let handle_b = b.create_handle(&obj).unwrap();
    drop(obj);

    let name = device.flink(&a, handle_a).unwrap();
    a.delete_handle(handle_a).unwrap();

    let again = device.registry().resolve_name(name).unwrap();
    assert_eq!(again.name(), Some(name));
    drop(again);

    b.delete_handle(handle_b).unwrap();
    assert!(device.registry().resolve_name(name).is_err());
    assert_eq!(driver.freed(), 1);
}

#[test]
fn test_retired_name_is_reissued() {
    let (_driver, device) = create_test_device();
    let client = device.open_client().unwrap();

    let first = device.create_object(PAGE_SIZE).unwrap();
    let handle = client.create_handle(&first).unwrap();
    let name = device.flink(&client, handle).unwrap();
    client.delete_handle(handle).unwrap();
    assert_eq!(first.name(), None);

    let second = device.create_object(PAGE_SIZE).unwrap();
    let handle = client.create_handle(&second).unwrap();
    assert_eq!(device.flink(&client, handle), Ok(name));

    let found = device.registry().resolve_name(name).unwrap();
    assert!(Arc::ptr_eq(&found, &second));
}

#[test]
fn test_retire_without_name_is_noop() {
    let (_driver, device) = create_test_device();
    let obj = device.create_object(PAGE_SIZE).unwrap();
    device.registry().retire_name(&obj);
    assert_eq!(GemObject::refcount(&obj), 1);
    assert_eq!(device.registry().name_count(), 0);
}
