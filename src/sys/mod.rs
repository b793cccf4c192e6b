//! System Definitions (ABI).
//!
//! Códigos de erro devolvidos à camada de ioctl.

pub mod error;

pub use error::Errno;
