//! Testes do subsistema GEM
//!
//! Testes de subsistema e de integração do núcleo de objetos: handles,
//! nomes, offsets, destruição e concorrência.
//!
//! # Como Executar os Testes
//!
//! ```bash
//! # Todos os testes do GEM
//! cargo test --lib gem::tests
//!
//! # Um módulo específico
//! cargo test --lib gem::tests::naming
//! ```
//!
//! # Estrutura dos Testes
//!
//! - `handle.rs` - Tabela de handles do cliente
//! - `naming.rs` - Nomes globais (flink/open)
//! - `offsets.rs` - Tokens de offset
//! - `lifecycle.rs` - Criação e destruição de objetos
//! - `device.rs` - Operações de requisição e caminho de fault
//! - `concurrency.rs` - Corridas entre lookup, criação e remoção
//! - `scenario.rs` - Dois clientes compartilhando um objeto

#![cfg(test)]

pub mod lifecycle;
pub mod naming;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::boxed::Box;
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use crate::gem::{
    ClientId, DriverFeatures, GemConfig, GemDevice, GemDriver, GemError, GemObject, GemResult,
};

/// Ação executada uma vez dentro de `on_handle_opened`.
pub type OpenHook = Box<dyn FnOnce() + Send>;

/// Driver de teste: conta cada hook e pode recusar aberturas.
pub struct RecordingDriver {
    pub features: DriverFeatures,
    pub fail_init: AtomicBool,
    pub fail_open: AtomicBool,
    pub inits: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub freed: AtomicUsize,
    pub freed_ids: Mutex<Vec<u64>>,
    /// Roda na próxima abertura, que então é recusada
    pub open_hook: Mutex<Option<OpenHook>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::with_features(DriverFeatures::GEM)
    }

    pub fn with_features(features: DriverFeatures) -> Self {
        Self {
            features,
            fail_init: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            inits: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            freed: AtomicUsize::new(0),
            freed_ids: Mutex::new(Vec::new()),
            open_hook: Mutex::new(None),
        }
    }

    pub fn freed(&self) -> usize {
        self.freed.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn set_open_hook(&self, hook: impl FnOnce() + Send + 'static) {
        *self.open_hook.lock().unwrap() = Some(Box::new(hook));
    }
}

impl GemDriver for RecordingDriver {
    fn features(&self) -> DriverFeatures {
        self.features
    }

    fn init_object(&self, _obj: &GemObject) -> GemResult<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(GemError::OutOfMemory);
        }
        Ok(())
    }

    fn on_object_freed(&self, obj: &GemObject) {
        self.freed.fetch_add(1, Ordering::SeqCst);
        self.freed_ids.lock().unwrap().push(obj.id().0);
    }

    fn on_handle_opened(&self, _obj: &GemObject, _client: ClientId) -> GemResult<()> {
        let hook = self.open_hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
            return Err(GemError::Driver(16));
        }
        if self.fail_open.load(Ordering::SeqCst) {
            // EBUSY
            return Err(GemError::Driver(16));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_handle_closed(&self, _obj: &GemObject, _client: ClientId) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Helper: dispositivo com configuração padrão
pub fn create_test_device() -> (Arc<RecordingDriver>, Arc<GemDevice>) {
    create_test_device_with(GemConfig::default())
}

/// Helper: dispositivo com configuração própria
pub fn create_test_device_with(config: GemConfig) -> (Arc<RecordingDriver>, Arc<GemDevice>) {
    let driver = Arc::new(RecordingDriver::new());
    let device = GemDevice::new(driver.clone(), config).unwrap();
    (driver, device)
}
