//! Bitmap genérico (crescível)
//!
//! Base do alocador de IDs: cada bit representa um ID em uso.

use alloc::vec::Vec;

/// Falha ao crescer o bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapGrowError;

/// Bitmap para gerenciamento de bits
#[derive(Debug, Default)]
pub struct Bitmap {
    data: Vec<u64>,
    len: usize,
}

impl Bitmap {
    /// Cria bitmap vazio (zero bits)
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            len: 0,
        }
    }

    /// Número de bits endereçáveis
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Garante pelo menos `bits` bits, novos bits zerados.
    ///
    /// Usa `try_reserve` para reportar OOM em vez de abortar.
    pub fn grow_to(&mut self, bits: usize) -> Result<(), BitmapGrowError> {
        if bits <= self.len {
            return Ok(());
        }
        let words = bits.div_ceil(64);
        if words > self.data.len() {
            let extra = words - self.data.len();
            self.data
                .try_reserve_exact(extra)
                .map_err(|_| BitmapGrowError)?;
            self.data.resize(words, 0);
        }
        self.len = bits;
        Ok(())
    }

    /// Define um bit
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        let word = index / 64;
        let bit = index % 64;
        self.data[word] |= 1 << bit;
    }

    /// Limpa um bit
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < self.len);
        let word = index / 64;
        let bit = index % 64;
        self.data[word] &= !(1 << bit);
    }

    /// Testa um bit (fora do range = livre)
    pub fn test(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        let word = index / 64;
        let bit = index % 64;
        (self.data[word] & (1 << bit)) != 0
    }

    /// Encontra o primeiro bit livre (0) em `start..len`
    pub fn find_first_zero_from(&self, start: usize) -> Option<usize> {
        if start >= self.len {
            return None;
        }
        let first_word = start / 64;
        for (i, &word) in self.data.iter().enumerate().skip(first_word) {
            // Mascarar bits abaixo de `start` na primeira palavra
            let masked = if i == first_word {
                word | ((1u64 << (start % 64)) - 1)
            } else {
                word
            };
            if masked != u64::MAX {
                let index = i * 64 + masked.trailing_ones() as usize;
                if index < self.len {
                    return Some(index);
                }
                return None;
            }
        }
        None
    }

    /// Encontra primeiro bit livre (0)
    pub fn find_first_zero(&self) -> Option<usize> {
        self.find_first_zero_from(0)
    }

    /// Quantidade de bits setados
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }
}
