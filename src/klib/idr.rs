//! # Alocador de IDs Densos
//!
//! Entrega inteiros pequenos não-negativos, reutilizando um ID somente
//! depois de liberado explicitamente. Sempre devolve o MENOR ID livre,
//! o que mantém os namespaces (handles, nomes, tokens) compactos.
//!
//! Não tem lock próprio: vive ao lado da `KeyTable` que indexa, sob o
//! mesmo lock.

use super::bitmap::Bitmap;

/// Limite superior dos alocadores "ilimitados" (cabe em `int` do ioctl)
pub const UNBOUNDED_MAX: u32 = i32::MAX as u32;

/// Crescimento mínimo do bitmap (uma palavra)
const GROW_STEP: usize = 64;

/// Erros do alocador
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdrError {
    /// Todo o range de IDs está em uso
    OutOfSpace,
    /// Falha ao crescer o bitmap interno
    OutOfMemory,
}

impl IdrError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfSpace => "Range de IDs esgotado",
            Self::OutOfMemory => "Sem memória para o bitmap de IDs",
        }
    }
}

impl core::fmt::Display for IdrError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type IdrResult<T> = Result<T, IdrError>;

/// Alocador de IDs no intervalo fechado `[start, max]`.
#[derive(Debug)]
pub struct DenseIdAllocator {
    /// Bit `i` = ID `start + i` em uso
    used: Bitmap,
    start: u32,
    max: u32,
    /// Menor índice possivelmente livre
    hint: usize,
    allocated: usize,
}

impl DenseIdAllocator {
    /// Cria alocador para `[start, max]`. Nenhuma memória é alocada aqui.
    pub const fn new(start: u32, max: u32) -> Self {
        Self {
            used: Bitmap::new(),
            start,
            max,
            hint: 0,
            allocated: 0,
        }
    }

    /// Alocador limitado apenas pela largura do inteiro do ioctl.
    pub const fn unbounded(start: u32) -> Self {
        Self::new(start, UNBOUNDED_MAX)
    }

    /// Quantidade de IDs possíveis no range
    pub fn capacity(&self) -> usize {
        if self.max < self.start {
            return 0;
        }
        (self.max - self.start) as usize + 1
    }

    /// IDs atualmente em uso
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Aloca o menor ID livre.
    pub fn alloc(&mut self) -> IdrResult<u32> {
        let index = match self.used.find_first_zero_from(self.hint) {
            Some(index) => index,
            None => {
                // Tudo abaixo de `len` está ocupado: crescer
                let old_len = self.used.len();
                let limit = self.capacity();
                if old_len >= limit {
                    return Err(IdrError::OutOfSpace);
                }
                let new_len = old_len.saturating_mul(2).max(GROW_STEP).min(limit);
                self.used
                    .grow_to(new_len)
                    .map_err(|_| IdrError::OutOfMemory)?;
                old_len
            }
        };

        self.used.set(index);
        self.hint = index + 1;
        self.allocated += 1;
        Ok(self.start + index as u32)
    }

    /// Verifica se `id` está alocado.
    pub fn is_allocated(&self, id: u32) -> bool {
        match self.index_of(id) {
            Some(index) => self.used.test(index),
            None => false,
        }
    }

    /// Devolve `id` ao pool.
    ///
    /// Liberar um ID não alocado é bug do chamador (só a lógica do
    /// registry chama isto), não um erro recuperável.
    pub fn free(&mut self, id: u32) {
        let index = match self.index_of(id) {
            Some(index) if self.used.test(index) => index,
            _ => {
                crate::kerror!("(IDR) Double free / ID fora do range=", id);
                debug_assert!(false, "free de ID não alocado");
                return;
            }
        };

        self.used.clear(index);
        self.allocated -= 1;
        if index < self.hint {
            self.hint = index;
        }
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        if id < self.start || id > self.max {
            return None;
        }
        Some((id - self.start) as usize)
    }
}
