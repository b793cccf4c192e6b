//! Arquivo: gem/object.rs
//!
//! Propósito: O objeto GEM e seu protocolo de destruição.
//!
//! Detalhes de Implementação:
//! - A contagem de referências é a do `Arc`: cada entrada de tabela de
//!   handles e de nomes guarda um clone, chamadores transitórios também.
//! - A tabela de offsets guarda apenas `Weak`, sem referência extra.
//! - `handle_count` não mantém o objeto vivo; quando cai a zero o nome
//!   global é aposentado.
//! - O `Drop` é o estado "Dying": roda uma vez, fora de qualquer lock de
//!   tabela, libera o token de offset e só então chama o driver.
//!
//! ```text
//! create_object ──► Live (Arc ≥ 1) ──última ref──► Dying (Drop) ──► livre
//! ```

use alloc::sync::{Arc, Weak};
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use super::driver::GemDriver;
use super::registry::ObjectRegistry;
use crate::sync::RefCount;

// =============================================================================
// IDENTIFICADORES
// =============================================================================

/// Identificador único do objeto dentro do dispositivo (logs, semente de hash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

/// Handle local de um cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub u32);

impl Handle {
    /// Valor nunca emitido
    pub const INVALID: Handle = Handle(0);
}

/// Nome global do dispositivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GemName(pub u32);

/// Token sintético da tabela de offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OffsetToken(pub u64);

/// Referência contada para um objeto
pub type GemRef = Arc<GemObject>;

/// `name` == 0: sem nome
const NO_NAME: u32 = 0;
/// `offset` == NO_OFFSET: sem token
const NO_OFFSET: u64 = u64::MAX;

// =============================================================================
// OBJETO
// =============================================================================

/// Objeto de buffer gerenciado pelo GEM.
pub struct GemObject {
    id: ObjectId,
    size: usize,
    /// Handles abertos em todas as tabelas de clientes
    handle_count: RefCount,
    /// Escrito somente sob o lock da tabela de nomes
    name: AtomicU32,
    /// Escrito somente sob o lock da tabela de offsets
    offset: AtomicU64,
    /// `init_object` concluiu: `on_object_freed` é devido
    armed: AtomicBool,
    driver: Arc<dyn GemDriver>,
    registry: Weak<ObjectRegistry>,
}

impl GemObject {
    pub(crate) fn new(
        id: ObjectId,
        size: usize,
        driver: Arc<dyn GemDriver>,
        registry: Weak<ObjectRegistry>,
    ) -> Self {
        Self {
            id,
            size,
            handle_count: RefCount::new(0),
            name: AtomicU32::new(NO_NAME),
            offset: AtomicU64::new(NO_OFFSET),
            armed: AtomicBool::new(false),
            driver,
            registry,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Tamanho em bytes (múltiplo de página, imutável)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Nome global publicado, se houver
    pub fn name(&self) -> Option<GemName> {
        match self.name.load(Ordering::Acquire) {
            NO_NAME => None,
            name => Some(GemName(name)),
        }
    }

    /// Token de offset, se houver
    pub fn offset_token(&self) -> Option<OffsetToken> {
        match self.offset.load(Ordering::Acquire) {
            NO_OFFSET => None,
            token => Some(OffsetToken(token)),
        }
    }

    /// Número de handles abertos
    pub fn handle_count(&self) -> usize {
        self.handle_count.get()
    }

    /// Há pelo menos um handle aberto?
    pub fn handle_outstanding(&self) -> bool {
        self.handle_count() > 0
    }

    /// Referências vivas (tabelas + chamadores)
    pub fn refcount(this: &GemRef) -> usize {
        Arc::strong_count(this)
    }

    // =========================================================================
    // ESTADO INTERNO (chamado sob o lock da tabela dona do campo)
    // =========================================================================

    pub(crate) fn set_name(&self, name: GemName) {
        self.name.store(name.0, Ordering::Release);
    }

    pub(crate) fn take_name(&self) -> Option<GemName> {
        match self.name.swap(NO_NAME, Ordering::AcqRel) {
            NO_NAME => None,
            name => Some(GemName(name)),
        }
    }

    pub(crate) fn set_offset_token(&self, token: OffsetToken) {
        self.offset.store(token.0, Ordering::Release);
    }

    pub(crate) fn take_offset_token(&self) -> Option<OffsetToken> {
        match self.offset.swap(NO_OFFSET, Ordering::AcqRel) {
            NO_OFFSET => None,
            token => Some(OffsetToken(token)),
        }
    }

    pub(crate) fn open_handle(&self) {
        self.handle_count.inc();
    }

    /// Retorna `true` se este era o último handle.
    #[must_use]
    pub(crate) fn close_handle(&self) -> bool {
        self.handle_count.dec()
    }

    /// O objeto foi criado pelo dispositivo dono de `registry`?
    pub(crate) fn belongs_to(&self, registry: &Arc<ObjectRegistry>) -> bool {
        core::ptr::eq(self.registry.as_ptr(), Arc::as_ptr(registry))
    }

    pub(crate) fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }
}

impl Drop for GemObject {
    fn drop(&mut self) {
        crate::ktrace!("(GEM) Destruindo objeto id=", self.id.0);

        // Sem registry vivo a tabela de offsets já foi embora
        if let Some(registry) = self.registry.upgrade() {
            registry.destroy_offset(self);
        }

        if self.armed.load(Ordering::Acquire) {
            self.driver.on_object_freed(self);
        } else {
            crate::kdebug!("(GEM) Objeto descartado sem init, id=", self.id.0);
        }
    }
}

impl core::fmt::Debug for GemObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GemObject")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("handle_count", &self.handle_count())
            .field("name", &self.name())
            .field("offset", &self.offset_token())
            .finish()
    }
}
