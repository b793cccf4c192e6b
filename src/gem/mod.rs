//! # GEM (Graphics Execution Manager)
//!
//! Núcleo de vida dos objetos de buffer compartilhados entre o driver e
//! clientes não confiáveis.
//!
//! ---------------------------------------------------------------------
//! NAMESPACES
//! ---------------------------------------------------------------------
//!
//! | Namespace | Escopo      | Chave         | Guarda       |
//! |-----------|-------------|---------------|--------------|
//! | Handles   | Cliente     | `Handle` ≥ 1  | `GemRef`     |
//! | Nomes     | Dispositivo | `GemName` ≥ 1 | `GemRef`     |
//! | Offsets   | Dispositivo | `OffsetToken` | `Weak` (0)   |
//!
//! ---------------------------------------------------------------------
//! GARANTIAS
//! ---------------------------------------------------------------------
//!
//! - Um lookup que encontra a entrada toma a referência antes de soltar
//!   o lock da tabela.
//! - Toda remoção tira a entrada da tabela antes de soltar a referência
//!   que ela guardava: quando a contagem chega a zero, nenhuma tabela
//!   resolve mais o objeto.
//! - `on_object_freed` roda exatamente uma vez, sem lock de tabela.
//! - Falhas no meio de uma criação desfazem todo o estado parcial.
//!
//! ---------------------------------------------------------------------

pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod global;
pub mod handle;
pub mod mapping;
pub mod object;
pub mod registry;


mod tests;

// Re-exports para conveniência
pub use config::GemConfig;
pub use device::GemDevice;
pub use driver::{DriverFeatures, GemDriver};
pub use error::{GemError, GemResult};
pub use global::{GlobalKind, GlobalRegistry};
pub use handle::{ClientHandleTable, ClientId};
pub use object::{GemName, GemObject, GemRef, Handle, ObjectId, OffsetToken};
pub use registry::ObjectRegistry;

#[cfg(feature = "self_test")]
pub use test::run_gem_self_tests;
