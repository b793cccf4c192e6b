//! # Hash
//!
//! Tabela hash de chaves inteiras com encadeamento ordenado por bucket.

pub mod hashtable;

pub use hashtable::{hash_long, KeyTable, GOLDEN_RATIO_PRIME_64};

/// Erros da tabela hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashError {
    /// Falha ao alocar buckets ou entradas
    OutOfMemory,
    /// Chave já presente na tabela
    DuplicateKey,
    /// Chave não encontrada
    NotFound,
    /// Todo o espaço de chaves de `insert_any` foi tentado
    KeySpaceExhausted,
    /// Parâmetros de espaço de chaves inválidos (bits/shift)
    InvalidKeySpace,
}

impl HashError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "Sem memória para a tabela hash",
            Self::DuplicateKey => "Chave duplicada",
            Self::NotFound => "Chave não encontrada",
            Self::KeySpaceExhausted => "Espaço de chaves esgotado",
            Self::InvalidKeySpace => "Espaço de chaves inválido",
        }
    }
}

impl core::fmt::Display for HashError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result da tabela hash
pub type HashResult<T> = Result<T, HashError>;
