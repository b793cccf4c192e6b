//! Arquivo: gem/registry.rs
//!
//! Propósito: Namespaces globais do dispositivo.
//! - Nomes: inteiro global → objeto, para compartilhar entre clientes.
//! - Offsets: token sintético → objeto, para o caminho de page fault.
//!
//! Detalhes de Implementação:
//! - Cada tabela tem seu próprio spinlock; nenhuma operação toma os dois.
//! - A tabela de nomes guarda um `GemRef` (uma referência por nome).
//! - A tabela de offsets guarda `Weak`: o token não mantém o objeto vivo.
//!   `resolve_offset` promove o `Weak` sob o lock, então um objeto em
//!   destruição nunca é devolvido.
//! - Toda remoção devolve a entrada e ela é solta DEPOIS do lock.

use alloc::sync::{Arc, Weak};

use super::config::{GemConfig, FIRST_NAME, FIRST_OFFSET_INDEX};
use super::error::{GemError, GemResult};
use super::object::{GemName, GemObject, GemRef, OffsetToken};
use crate::klib::hash::{HashError, KeyTable};
use crate::klib::idr::{DenseIdAllocator, IdrError};
use crate::sync::Spinlock;

// =============================================================================
// TABELAS
// =============================================================================

struct NameTable {
    table: KeyTable<GemRef>,
    ids: DenseIdAllocator,
}

/// Estratégia de emissão de tokens de offset
enum OffsetKeys {
    /// Menor índice livre em `[0, max]`
    Dense(DenseIdAllocator),
    /// `(hash(seed) << shift) + add` com sondagem linear
    Hashed { bits: u32, shift: u32, add: u64 },
}

struct OffsetTable {
    table: KeyTable<Weak<GemObject>>,
    keys: OffsetKeys,
}

/// Registro de nomes e offsets de um dispositivo.
pub struct ObjectRegistry {
    names: Spinlock<NameTable>,
    offsets: Spinlock<OffsetTable>,
}

impl ObjectRegistry {
    /// Cria as duas tabelas conforme `config` (já validado).
    pub fn new(config: &GemConfig) -> GemResult<Self> {
        let names = NameTable {
            table: KeyTable::create(config.name_hash_order)?,
            ids: DenseIdAllocator::unbounded(FIRST_NAME),
        };

        let keys = if config.uses_hashed_offsets() {
            OffsetKeys::Hashed {
                bits: config.offset_key_bits(),
                shift: config.offset_key_shift,
                add: config.offset_key_add,
            }
        } else {
            OffsetKeys::Dense(DenseIdAllocator::new(
                FIRST_OFFSET_INDEX,
                config.max_offset_index,
            ))
        };
        let offsets = OffsetTable {
            table: KeyTable::create(config.offset_hash_order)?,
            keys,
        };

        Ok(Self {
            names: Spinlock::new(names),
            offsets: Spinlock::new(offsets),
        })
    }

    // =========================================================================
    // NOMES
    // =========================================================================

    /// Publica um nome global para `obj`.
    ///
    /// Idempotente: se o objeto já tem nome, devolve o mesmo sem tomar
    /// outra referência. Um objeto sem handles abertos devolve
    /// [`GemError::NotFound`].
    pub fn publish_name(&self, obj: &GemRef) -> GemResult<GemName> {
        let mut names = self.names.lock();

        // Sem handles ninguém retiraria o nome: retire_name já passou
        if obj.handle_count() == 0 {
            crate::kwarn!("(GEM) Publicação recusada, objeto sem handles=", obj.id().0);
            return Err(GemError::NotFound);
        }

        if let Some(name) = obj.name() {
            return Ok(name);
        }

        let id = names.ids.alloc()?;
        if let Err(err) = names.table.insert(id as u64, Arc::clone(obj)) {
            names.ids.free(id);
            if err == HashError::DuplicateKey {
                crate::kerror!("(GEM) Nome duplicado na tabela=", id);
                names.table.dump_chain(id as u64);
            }
            return Err(err.into());
        }
        obj.set_name(GemName(id));

        crate::ktrace!("(GEM) Nome publicado=", id);
        Ok(GemName(id))
    }

    /// Resolve `name` para uma nova referência.
    pub fn resolve_name(&self, name: GemName) -> GemResult<GemRef> {
        let names = self.names.lock();
        names
            .table
            .find(name.0 as u64)
            .map(Arc::clone)
            .map_err(|_| GemError::NoSuchName)
    }

    /// Remove o nome de `obj`, se houver, e solta a referência da tabela.
    ///
    /// Chamado quando o último handle fecha, com a referência desse
    /// handle ainda viva: o decremento aqui nunca é o final.
    pub fn retire_name(&self, obj: &GemObject) {
        let removed = {
            let mut names = self.names.lock();
            let name = match obj.take_name() {
                Some(name) => name,
                None => return,
            };
            names.ids.free(name.0);
            match names.table.remove(name.0 as u64) {
                Ok(entry) => entry,
                Err(_) => {
                    crate::kerror!("(GEM) Nome sem entrada na tabela=", name.0);
                    return;
                }
            }
        };

        debug_assert!(
            Arc::strong_count(&removed) > 1,
            "nome aposentado sem referência de handle em voo"
        );
        crate::ktrace!("(GEM) Nome aposentado, objeto=", removed.id().0);
        drop(removed);
    }

    /// Nomes publicados
    pub fn name_count(&self) -> usize {
        self.names.lock().table.len()
    }

    // =========================================================================
    // OFFSETS
    // =========================================================================

    /// Cria o token de offset de `obj`.
    ///
    /// Idempotente: um objeto que já tem token devolve o mesmo. Nenhuma
    /// referência é tomada; quem pede deve manter uma (handle aberto)
    /// enquanto o token for usado.
    pub fn create_offset(&self, obj: &GemRef) -> GemResult<OffsetToken> {
        let mut guard = self.offsets.lock();
        let offsets = &mut *guard;

        if let Some(token) = obj.offset_token() {
            return Ok(token);
        }

        let weak = Arc::downgrade(obj);
        let key = match &mut offsets.keys {
            OffsetKeys::Dense(ids) => {
                let id = ids.alloc().map_err(|err| match err {
                    IdrError::OutOfSpace => GemError::KeySpaceExhausted,
                    IdrError::OutOfMemory => GemError::OutOfMemory,
                })?;
                if let Err(err) = offsets.table.insert(id as u64, weak) {
                    ids.free(id);
                    return Err(err.into());
                }
                id as u64
            }
            OffsetKeys::Hashed { bits, shift, add } => {
                offsets
                    .table
                    .insert_any(weak, obj.id().0, *bits, *shift, *add)?
            }
        };
        obj.set_offset_token(OffsetToken(key));

        crate::ktrace!("(GEM) Token de offset criado=", key);
        Ok(OffsetToken(key))
    }

    /// Resolve `token` para uma referência ao objeto.
    ///
    /// `NotFound` também para tokens cujo objeto já está em destruição.
    pub fn resolve_offset(&self, token: OffsetToken) -> GemResult<GemRef> {
        let offsets = self.offsets.lock();
        offsets
            .table
            .find(token.0)
            .ok()
            .and_then(Weak::upgrade)
            .ok_or(GemError::NotFound)
    }

    /// Libera o token de `obj`. Sem token: nada a fazer.
    pub fn destroy_offset(&self, obj: &GemObject) {
        let removed = {
            let mut guard = self.offsets.lock();
            let offsets = &mut *guard;
            let token = match obj.take_offset_token() {
                Some(token) => token,
                None => return,
            };
            if let OffsetKeys::Dense(ids) = &mut offsets.keys {
                ids.free(token.0 as u32);
            }
            offsets.table.remove(token.0)
        };

        match removed {
            Ok(_) => crate::ktrace!("(GEM) Token de offset liberado, objeto=", obj.id().0),
            Err(_) => crate::kerror!("(GEM) Token sem entrada na tabela, objeto=", obj.id().0),
        }
    }

    /// Tokens de offset ativos
    pub fn offset_count(&self) -> usize {
        self.offsets.lock().table.len()
    }
}
