//! Arquivo: gem/handle.rs
//!
//! Propósito: Tabela de handles de um cliente.
//! Um cliente só opera sobre objetos para os quais recebeu um handle;
//! acesso entre clientes passa sempre pelos nomes globais.
//!
//! Detalhes de Implementação:
//! - Handles começam em 1 (0 é inválido) e o menor livre é reutilizado.
//! - Cada entrada guarda um `GemRef`: a referência do handle.
//! - Lookup clona a referência ANTES de soltar o lock.
//! - Remoção: tira da tabela sob o lock, chama o driver e solta a
//!   referência fora do lock.
//! - Quando o último handle (de qualquer cliente) fecha, o nome global é
//!   aposentado enquanto a referência do handle ainda está viva.

use alloc::sync::Arc;

use super::config::FIRST_HANDLE;
use super::device::GemDevice;
use super::error::{GemError, GemResult};
use super::object::{GemRef, Handle};
use crate::klib::hash::{HashError, KeyTable};
use crate::klib::idr::DenseIdAllocator;
use crate::sync::Spinlock;

/// Identificador do contexto de cliente (um por abertura do dispositivo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u32);

struct HandleTableState {
    handles: KeyTable<GemRef>,
    ids: DenseIdAllocator,
}

/// Handles de um cliente.
///
/// `None` depois do teardown: a tabela não aceita mais handles.
pub struct ClientHandleTable {
    client: ClientId,
    device: Arc<GemDevice>,
    state: Spinlock<Option<HandleTableState>>,
}

impl ClientHandleTable {
    pub(crate) fn new(device: Arc<GemDevice>, client: ClientId) -> GemResult<Self> {
        let handles = KeyTable::create(device.config().handle_hash_order)?;
        Ok(Self {
            client,
            device,
            state: Spinlock::new(Some(HandleTableState {
                handles,
                ids: DenseIdAllocator::unbounded(FIRST_HANDLE),
            })),
        })
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn device(&self) -> &Arc<GemDevice> {
        &self.device
    }

    /// Handles abertos
    pub fn handle_count(&self) -> usize {
        match &*self.state.lock() {
            Some(state) => state.handles.len(),
            None => 0,
        }
    }

    /// O teardown já rodou?
    pub fn is_closed(&self) -> bool {
        self.state.lock().is_none()
    }

    /// Cria um handle para `obj`, tomando uma referência.
    ///
    /// Se o driver recusar (`on_handle_opened`), o handle é desfeito e o
    /// erro do driver é devolvido.
    pub fn create_handle(&self, obj: &GemRef) -> GemResult<Handle> {
        if !obj.belongs_to(self.device.registry_arc()) {
            crate::kwarn!("(GEM) Objeto de outro dispositivo, id=", obj.id().0);
            return Err(GemError::InvalidArgument);
        }

        let handle = {
            let mut guard = self.state.lock();
            let state = (*guard).as_mut().ok_or(GemError::InvalidArgument)?;

            let id = state.ids.alloc()?;
            if let Err(err) = state.handles.insert(id as u64, Arc::clone(obj)) {
                state.ids.free(id);
                if err == HashError::DuplicateKey {
                    crate::kerror!("(GEM) Handle duplicado na tabela=", id);
                    state.handles.dump_chain(id as u64);
                }
                return Err(err.into());
            }
            obj.open_handle();
            Handle(id)
        };

        if let Err(err) = self.device.driver().on_handle_opened(obj, self.client) {
            crate::kwarn!("(GEM) Driver recusou handle, desfazendo=", handle.0);
            self.rollback(handle);
            return Err(err);
        }

        crate::ktrace!("(GEM) Handle criado=", handle.0);
        Ok(handle)
    }

    /// Desfaz um handle recém-criado sem notificar o fechamento ao driver.
    ///
    /// Se outro cliente fechou seus handles enquanto o driver decidia, este
    /// pode ser o último: o nome é retirado como em [`Self::delete_handle`].
    fn rollback(&self, handle: Handle) {
        let removed = {
            let mut guard = self.state.lock();
            match (*guard).as_mut() {
                Some(state) => match state.handles.remove(handle.0 as u64) {
                    Ok(obj) => {
                        state.ids.free(handle.0);
                        Some(obj)
                    }
                    Err(_) => None,
                },
                None => None,
            }
        };

        // Sem entrada: um teardown concorrente já fechou o handle
        if let Some(obj) = removed {
            if obj.close_handle() {
                self.device.registry().retire_name(&obj);
            }
            drop(obj);
        }
    }

    /// Resolve `handle` para uma nova referência.
    pub fn lookup_handle(&self, handle: Handle) -> GemResult<GemRef> {
        let guard = self.state.lock();
        let state = (*guard).as_ref().ok_or(GemError::InvalidHandle)?;
        state
            .handles
            .find(handle.0 as u64)
            .map(Arc::clone)
            .map_err(|_| GemError::InvalidHandle)
    }

    /// Fecha `handle`.
    ///
    /// O handle fica inválido assim que sai da tabela; a referência é
    /// solta por último e pode destruir o objeto.
    pub fn delete_handle(&self, handle: Handle) -> GemResult<()> {
        let obj = {
            let mut guard = self.state.lock();
            let state = (*guard).as_mut().ok_or(GemError::InvalidHandle)?;
            let obj = state
                .handles
                .remove(handle.0 as u64)
                .map_err(|_| GemError::InvalidHandle)?;
            state.ids.free(handle.0);
            obj
        };

        crate::ktrace!("(GEM) Handle removido=", handle.0);
        self.release(obj);
        Ok(())
    }

    /// Fecha todos os handles e destrói a tabela. Operação terminal;
    /// chamadas seguintes não fazem nada.
    pub fn teardown(&self) {
        let state = match self.state.lock().take() {
            Some(state) => state,
            None => return,
        };

        let mut handles = state.handles;
        let entries = handles.drain();
        handles.destroy();

        crate::klog!("(GEM) Teardown cliente=", self.client.0, " handles=", entries.len());
        crate::knl!();

        for (_, obj) in entries {
            self.release(obj);
        }
    }

    /// Caminho comum de fechamento: driver, contagem de handles, nome,
    /// e por fim a referência do handle.
    fn release(&self, obj: GemRef) {
        self.device.driver().on_handle_closed(&obj, self.client);

        if obj.close_handle() {
            self.device.registry().retire_name(&obj);
        }

        drop(obj);
    }
}

impl Drop for ClientHandleTable {
    fn drop(&mut self) {
        self.teardown();
    }
}
