//! Redstone GEM Library.
//!
//! Núcleo de vida dos objetos de buffer gráfico (GEM) do Redstone OS:
//! handles por cliente, nomes globais, tokens de offset para o caminho de
//! page fault e o protocolo de contagem de referências que impede que um
//! lookup encontre um objeto já liberado.
//!
//! Roda dentro do kernel (`no_std` + `alloc`); os testes do host usam
//! `std` para threads.

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para Vec/Arc)
extern crate alloc;

// --- Infraestrutura ---
pub mod logging; // Macros kerror!/kinfo!/... e sink de log
pub mod klib; // KeyTable, bitmap, alocador de IDs
pub mod sync; // Spinlock, RefCount
pub mod sys; // Errno

// --- Subsistema ---
pub mod gem; // Handles, nomes, offsets, objetos

// Re-exports para conveniência
pub use gem::{
    ClientHandleTable, GemConfig, GemDevice, GemDriver, GemError, GemObject, GemRef, GemResult,
};
