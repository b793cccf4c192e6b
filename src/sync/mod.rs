//! # Synchronization Primitives
//!
//! Primitivas de sincronização usadas pelo GEM.
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! Spinlock   → Tabelas (handles, nomes, offsets): seções curtas, O(cadeia)
//! RefCount   → Contagem de handles abertos por objeto
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: seção crítica = mutação da tabela (+ clone da referência
//!   em lookups). Nunca chamar callbacks do driver com lock seguro.
//! - **Ordem de Lock**: `names` → `offsets` nunca é necessário; cada
//!   operação toma no máximo um lock de tabela por vez.
//! - **Destruição**: a última referência de um objeto nunca é solta com
//!   lock de tabela seguro.

// =============================================================================
// PRIMITIVAS BÁSICAS
// =============================================================================

/// Contagem de referências atômica
pub mod refcount;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use refcount::RefCount;
pub use spin::Mutex as Spinlock;
