//! Arquivo: gem/device.rs
//!
//! Propósito: Contexto GEM de um dispositivo.
//! Dono do registro global (nomes e offsets), do driver e da
//! configuração. Os clientes (`ClientHandleTable`) mantêm o dispositivo
//! vivo enquanto existirem.
//!
//! As operações de requisição (`flink`, `open_by_name`, `close`,
//! `map_offset`) são composições das operações do núcleo, na forma em
//! que a camada de ioctl as consome.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::config::{GemConfig, PAGE_SIZE};
use super::driver::{DriverFeatures, GemDriver};
use super::error::{GemError, GemResult};
use super::handle::{ClientHandleTable, ClientId};
use super::mapping;
use super::object::{GemName, GemObject, GemRef, Handle, ObjectId, OffsetToken};
use super::registry::ObjectRegistry;
use crate::klib::is_aligned;

/// Dispositivo com suporte a GEM.
pub struct GemDevice {
    driver: Arc<dyn GemDriver>,
    registry: Arc<ObjectRegistry>,
    config: GemConfig,
    next_object: AtomicU64,
    next_client: AtomicU32,
}

impl GemDevice {
    /// Inicializa o contexto GEM do dispositivo.
    pub fn new(driver: Arc<dyn GemDriver>, config: GemConfig) -> GemResult<Arc<Self>> {
        config.validate()?;
        let registry = Arc::new(ObjectRegistry::new(&config)?);

        crate::kinfo!("(GEM) Dispositivo inicializado, tokens max=", config.max_offset_index);
        Ok(Arc::new(Self {
            driver,
            registry,
            config,
            next_object: AtomicU64::new(1),
            next_client: AtomicU32::new(1),
        }))
    }

    pub fn driver(&self) -> &Arc<dyn GemDriver> {
        &self.driver
    }

    /// Registro de nomes e offsets
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub(crate) fn registry_arc(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GemConfig {
        &self.config
    }

    fn require_gem(&self) -> GemResult<()> {
        if self.driver.features().contains(DriverFeatures::GEM) {
            Ok(())
        } else {
            Err(GemError::NoDevice)
        }
    }

    fn check_client(&self, client: &ClientHandleTable) -> GemResult<()> {
        if core::ptr::eq(Arc::as_ptr(client.device()), self) {
            Ok(())
        } else {
            crate::kwarn!("(GEM) Cliente de outro dispositivo=", client.client().0);
            Err(GemError::InvalidArgument)
        }
    }

    // =========================================================================
    // OBJETOS E CLIENTES
    // =========================================================================

    /// Cria um objeto de `size` bytes com uma referência (a do chamador).
    pub fn create_object(&self, size: usize) -> GemResult<GemRef> {
        self.require_gem()?;
        if size == 0 || !is_aligned(size, PAGE_SIZE) {
            crate::kwarn!("(GEM) Tamanho de objeto inválido=", size);
            return Err(GemError::InvalidSize);
        }

        let id = ObjectId(self.next_object.fetch_add(1, Ordering::Relaxed));
        let obj = Arc::new(GemObject::new(
            id,
            size,
            Arc::clone(&self.driver),
            Arc::downgrade(&self.registry),
        ));

        if let Err(err) = self.driver.init_object(&obj) {
            crate::kwarn!("(GEM) init_object falhou, objeto=", id.0);
            return Err(err);
        }
        obj.arm();

        crate::ktrace!("(GEM) Objeto criado=", id.0);
        Ok(obj)
    }

    /// Abre um novo contexto de cliente.
    pub fn open_client(self: &Arc<Self>) -> GemResult<ClientHandleTable> {
        self.require_gem()?;
        let client = ClientId(self.next_client.fetch_add(1, Ordering::Relaxed));
        crate::kdebug!("(GEM) Cliente aberto=", client.0);
        ClientHandleTable::new(Arc::clone(self), client)
    }

    // =========================================================================
    // REQUISIÇÕES
    // =========================================================================

    /// Publica um nome global para o objeto de `handle`.
    pub fn flink(&self, client: &ClientHandleTable, handle: Handle) -> GemResult<GemName> {
        self.require_gem()?;
        self.check_client(client)?;

        let obj = client.lookup_handle(handle)?;
        self.registry.publish_name(&obj)
    }

    /// Abre um handle em `client` para o objeto publicado como `name`.
    /// Retorna o handle e o tamanho do objeto.
    pub fn open_by_name(
        &self,
        client: &ClientHandleTable,
        name: GemName,
    ) -> GemResult<(Handle, usize)> {
        self.require_gem()?;
        self.check_client(client)?;

        let obj = self.registry.resolve_name(name)?;
        let handle = client.create_handle(&obj)?;
        Ok((handle, obj.size()))
    }

    /// Fecha `handle` em `client`.
    pub fn close(&self, client: &ClientHandleTable, handle: Handle) -> GemResult<()> {
        self.require_gem()?;
        self.check_client(client)?;
        client.delete_handle(handle)
    }

    /// Garante um token de offset para o objeto de `handle` e retorna o
    /// endereço falso que o cliente passa ao mmap.
    pub fn map_offset(&self, client: &ClientHandleTable, handle: Handle) -> GemResult<u64> {
        self.require_gem()?;
        self.check_client(client)?;

        let obj = client.lookup_handle(handle)?;
        let token = self.registry.create_offset(&obj)?;
        Ok(mapping::encode(token))
    }

    // =========================================================================
    // CAMINHO DE FAULT
    // =========================================================================

    /// Resolve um endereço falso para uma referência ao objeto.
    pub fn object_from_offset(&self, addr: u64) -> GemResult<GemRef> {
        if !mapping::is_gem_address(addr) {
            return Err(GemError::NotFound);
        }
        let token = OffsetToken(mapping::index_of(addr));
        self.registry.resolve_offset(token).map_err(|err| {
            crate::kdebug!("(GEM) Offset sem objeto, addr=", addr);
            err
        })
    }

    /// Prepara o mapeamento de `len` bytes a partir de `addr`.
    /// Retorna o objeto e o deslocamento dentro dele.
    pub fn map_single(&self, addr: u64, len: usize) -> GemResult<(GemRef, u64)> {
        self.require_gem()?;

        let obj = self.object_from_offset(addr)?;
        let offset = mapping::map_offset_of(addr);
        let fits = offset
            .checked_add(len as u64)
            .is_some_and(|end| end <= obj.size() as u64);
        if !fits {
            crate::kwarn!("(GEM) Mapeamento excede o objeto, offset=", offset);
            return Err(GemError::InvalidArgument);
        }

        Ok((obj, offset))
    }
}
