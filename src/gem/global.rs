//! # Registro de Referências Globais
//!
//! Singletons compartilhados entre dispositivos (contabilidade de
//! memória, estado global de buffer objects). Cada tipo tem um slot com
//! o objeto e um contador de uso: o primeiro `item_ref` cria o objeto,
//! o último `item_unref` o libera.
//!
//! O registro é um valor explícito, criado por quem carrega os drivers.

use alloc::sync::Arc;
use core::any::Any;

use super::error::{GemError, GemResult};
use crate::sync::Spinlock;

/// Tipos de singleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalKind {
    /// Contabilidade de memória
    Memory,
    /// Estado global de buffer objects
    BufferObject,
    /// Estado global de objetos base
    Object,
}

impl GlobalKind {
    pub const COUNT: usize = 3;

    pub const ALL: [GlobalKind; Self::COUNT] = [Self::Memory, Self::BufferObject, Self::Object];

    const fn index(self) -> usize {
        match self {
            Self::Memory => 0,
            Self::BufferObject => 1,
            Self::Object => 2,
        }
    }
}

type GlobalObject = Arc<dyn Any + Send + Sync>;

struct GlobalSlot {
    object: Option<GlobalObject>,
    refcount: usize,
}

impl GlobalSlot {
    const EMPTY: GlobalSlot = GlobalSlot {
        object: None,
        refcount: 0,
    };
}

/// Slots de singletons, um lock por slot.
pub struct GlobalRegistry {
    slots: [Spinlock<GlobalSlot>; GlobalKind::COUNT],
}

impl GlobalRegistry {
    pub const fn new() -> Self {
        Self {
            slots: [
                Spinlock::new(GlobalSlot::EMPTY),
                Spinlock::new(GlobalSlot::EMPTY),
                Spinlock::new(GlobalSlot::EMPTY),
            ],
        }
    }

    /// Toma uma referência ao singleton `kind`.
    ///
    /// Na primeira referência `init` cria o objeto; se falhar, o slot
    /// continua vazio e o erro é devolvido. `init` roda com o lock do
    /// slot seguro e não pode usar o mesmo `kind`.
    pub fn item_ref<T, F>(&self, kind: GlobalKind, init: F) -> GemResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> GemResult<T>,
    {
        let mut slot = self.slots[kind.index()].lock();

        let existing = slot.object.clone();
        let object: GlobalObject = match existing {
            Some(object) => object,
            None => {
                let created: GlobalObject = Arc::new(init()?);
                slot.object = Some(Arc::clone(&created));
                crate::kdebug!("(GEM) Singleton global criado, kind=", kind.index());
                created
            }
        };

        let typed = match object.downcast::<T>() {
            Ok(typed) => typed,
            Err(_) => {
                crate::kerror!("(GEM) Tipo incompatível no slot global=", kind.index());
                return Err(GemError::InvalidArgument);
            }
        };

        slot.refcount += 1;
        Ok(typed)
    }

    /// Solta uma referência. Na última, `release` recebe o objeto e o
    /// slot fica vazio.
    ///
    /// `object` precisa ser o objeto do slot e o contador não pode estar
    /// zerado: violação é bug do chamador.
    pub fn item_unref<T, F>(&self, kind: GlobalKind, object: &Arc<T>, release: F)
    where
        T: Any + Send + Sync,
        F: FnOnce(Arc<T>),
    {
        let mut slot = self.slots[kind.index()].lock();

        let matches = match &slot.object {
            Some(current) => {
                core::ptr::eq(Arc::as_ptr(current) as *const u8, Arc::as_ptr(object) as *const u8)
            }
            None => false,
        };
        if !matches || slot.refcount == 0 {
            crate::kerror!("(GEM) item_unref inválido, kind=", kind.index());
            debug_assert!(false, "item_unref sem referência correspondente");
            return;
        }

        slot.refcount -= 1;
        if slot.refcount > 0 {
            return;
        }

        if let Some(current) = slot.object.take() {
            if let Ok(typed) = current.downcast::<T>() {
                crate::kdebug!("(GEM) Singleton global liberado, kind=", kind.index());
                release(typed);
            }
        }
    }

    /// Referências ativas de `kind`
    pub fn use_count(&self, kind: GlobalKind) -> usize {
        self.slots[kind.index()].lock().refcount
    }

    /// Nenhum slot ocupado?
    pub fn is_idle(&self) -> bool {
        GlobalKind::ALL
            .iter()
            .all(|kind| self.slots[kind.index()].lock().object.is_none())
    }
}

impl Default for GlobalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GlobalRegistry {
    fn drop(&mut self) {
        if !self.is_idle() {
            crate::kerror!("(GEM) Registro global destruído com singletons vivos");
        }
    }
}
