//! Arquivo: sync/refcount.rs
//!
//! Propósito: Contagem de referências atômica.
//! Usada para a contagem de handles abertos de um objeto GEM: não é a
//! contagem de vida do objeto (essa é o `Arc`), e sim o gatilho que
//! aposenta o nome global quando o último handle fecha.
//!
//! Detalhes de Implementação:
//! - Usa `AtomicUsize` para thread-safety.
//! - Semântica Acquire/Release ao decrementar a última referência.

use core::sync::atomic::{fence, AtomicUsize, Ordering};

/// Contador de referências atômico
#[derive(Debug)]
pub struct RefCount {
    count: AtomicUsize,
}

impl RefCount {
    /// Cria um novo contador com valor inicial
    pub const fn new(initial: usize) -> Self {
        Self {
            count: AtomicUsize::new(initial),
        }
    }

    /// Incrementa o contador de referências.
    /// Retorna o valor ANTERIOR.
    #[inline]
    pub fn inc(&self) -> usize {
        self.count.fetch_add(1, Ordering::Relaxed)
    }

    /// Decrementa o contador de referências.
    /// Retorna `true` se a contagem chegou a ZERO.
    #[inline]
    #[must_use]
    pub fn dec(&self) -> bool {
        let prev = self.count.fetch_sub(1, Ordering::Release);
        debug_assert!(prev != 0, "RefCount decrementado abaixo de zero");

        if prev == 1 {
            // Quem observa o zero vê todas as escritas dos outros releases
            fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    /// Retorna o valor atual (aproximado/relaxado).
    #[inline]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}
