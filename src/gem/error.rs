//! Tipos de Erro do Subsistema GEM
//!
//! Erro único devolvido pelas operações de handles, nomes e offsets,
//! com conversão para o `Errno` que a camada de ioctl devolve.

use crate::klib::hash::HashError;
use crate::klib::idr::IdrError;
use crate::sys::Errno;

/// Erros do subsistema GEM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemError {
    /// Handle não existe na tabela do cliente
    InvalidHandle,
    /// Nome global não publicado
    NoSuchName,
    /// Chave ou token não encontrado
    NotFound,
    /// Chave duplicada numa tabela (falha interna de consistência)
    DuplicateKey,
    /// Range de IDs esgotado (handles/nomes)
    OutOfSpace,
    /// Espaço de tokens de offset esgotado
    KeySpaceExhausted,
    /// Falha de alocação
    OutOfMemory,
    /// Tamanho zero ou não múltiplo de página
    InvalidSize,
    /// Parâmetro inválido
    InvalidArgument,
    /// Driver sem suporte a GEM
    NoDevice,
    /// Erro devolvido por um callback do driver (errno positivo)
    Driver(i32),
}

impl GemError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidHandle => "Handle inválido",
            Self::NoSuchName => "Nome não publicado",
            Self::NotFound => "Não encontrado",
            Self::DuplicateKey => "Chave duplicada",
            Self::OutOfSpace => "Range de IDs esgotado",
            Self::KeySpaceExhausted => "Espaço de tokens esgotado",
            Self::OutOfMemory => "Sem memória",
            Self::InvalidSize => "Tamanho inválido",
            Self::InvalidArgument => "Parâmetro inválido",
            Self::NoDevice => "Driver sem suporte a GEM",
            Self::Driver(_) => "Erro do driver",
        }
    }

    /// Código POSIX devolvido ao cliente.
    pub fn errno(&self) -> Errno {
        match self {
            Self::InvalidHandle => Errno::EINVAL,
            Self::NoSuchName | Self::NotFound => Errno::ENOENT,
            Self::DuplicateKey => Errno::EEXIST,
            Self::OutOfSpace | Self::KeySpaceExhausted => Errno::ENOSPC,
            Self::OutOfMemory => Errno::ENOMEM,
            Self::InvalidSize | Self::InvalidArgument => Errno::EINVAL,
            Self::NoDevice => Errno::ENODEV,
            Self::Driver(code) => Errno::from_code(*code).unwrap_or(Errno::EIO),
        }
    }

    /// Valor de retorno negativo do ioctl.
    pub fn as_isize(&self) -> isize {
        self.errno().as_isize()
    }
}

impl core::fmt::Display for GemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Driver(code) => write!(f, "{} ({})", self.as_str(), code),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

impl From<HashError> for GemError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::OutOfMemory => Self::OutOfMemory,
            HashError::DuplicateKey => Self::DuplicateKey,
            HashError::NotFound => Self::NotFound,
            HashError::KeySpaceExhausted => Self::KeySpaceExhausted,
            HashError::InvalidKeySpace => Self::InvalidArgument,
        }
    }
}

impl From<IdrError> for GemError {
    fn from(err: IdrError) -> Self {
        match err {
            IdrError::OutOfSpace => Self::OutOfSpace,
            IdrError::OutOfMemory => Self::OutOfMemory,
        }
    }
}

/// Tipo Result específico do GEM
pub type GemResult<T> = Result<T, GemError>;
