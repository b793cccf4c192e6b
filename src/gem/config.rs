//! # Configuração do Subsistema GEM
//!
//! Constantes de compilação (página, layout de endereço de mapeamento,
//! ordens padrão das tabelas) e a configuração por dispositivo
//! (`GemConfig`).

use super::error::{GemError, GemResult};
use crate::klib::hash::hashtable::MAX_ORDER;

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB). Objetos GEM são múltiplos disto.
pub const PAGE_SIZE: usize = 4096;

// =============================================================================
// ORDENS PADRÃO DAS TABELAS
// =============================================================================

/// Tabela de handles por cliente (2^6 buckets)
pub const DEFAULT_HANDLE_HASH_ORDER: u32 = 6;

/// Tabela global de nomes (2^8 buckets)
pub const DEFAULT_NAME_HASH_ORDER: u32 = 8;

/// Tabela de offsets de mapeamento (2^12 buckets)
pub const DEFAULT_OFFSET_HASH_ORDER: u32 = 12;

// =============================================================================
// NAMESPACES
// =============================================================================

/// Primeiro handle emitido (0 é inválido)
pub const FIRST_HANDLE: u32 = 1;

/// Primeiro nome global emitido (0 é "sem nome")
pub const FIRST_NAME: u32 = 1;

/// Primeiro token de offset
pub const FIRST_OFFSET_INDEX: u32 = 0;

// =============================================================================
// LAYOUT DO ENDEREÇO DE MAPEAMENTO
// =============================================================================
//
//  63 62 61            40 39                      0
// +-----+----------------+-------------------------+
// | 1 0 |  token (22b)   |  offset no objeto (40b) |
// +-----+----------------+-------------------------+

/// Bits que identificam um endereço GEM
pub const MAPPING_MASK: u64 = 3 << 62;

/// Valor dos bits de `MAPPING_MASK` num endereço GEM
pub const MAPPING_KEY: u64 = 2 << 62;

/// Posição do token dentro do endereço
pub const MAPPING_INDEX_SHIFT: u32 = 40;

/// Maior token representável
pub const MAPPING_MAX_INDEX: u64 = 0x3f_ffff;

// =============================================================================
// CONFIGURAÇÃO POR DISPOSITIVO
// =============================================================================

/// Configuração de um `GemDevice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemConfig {
    pub handle_hash_order: u32,
    pub name_hash_order: u32,
    pub offset_hash_order: u32,
    /// Maior token de offset (inclusive)
    pub max_offset_index: u32,
    /// Com `shift`/`add` != 0 os tokens saem de `KeyTable::insert_any`
    pub offset_key_shift: u32,
    pub offset_key_add: u64,
}

impl Default for GemConfig {
    fn default() -> Self {
        Self {
            handle_hash_order: DEFAULT_HANDLE_HASH_ORDER,
            name_hash_order: DEFAULT_NAME_HASH_ORDER,
            offset_hash_order: DEFAULT_OFFSET_HASH_ORDER,
            max_offset_index: MAPPING_MAX_INDEX as u32,
            offset_key_shift: 0,
            offset_key_add: 0,
        }
    }
}

impl GemConfig {
    pub fn with_handle_hash_order(mut self, order: u32) -> Self {
        self.handle_hash_order = order;
        self
    }

    pub fn with_name_hash_order(mut self, order: u32) -> Self {
        self.name_hash_order = order;
        self
    }

    pub fn with_offset_hash_order(mut self, order: u32) -> Self {
        self.offset_hash_order = order;
        self
    }

    pub fn with_max_offset_index(mut self, max: u32) -> Self {
        self.max_offset_index = max;
        self
    }

    /// Ativa a emissão de tokens alinhada: `(h << shift) + add`.
    pub fn with_offset_alignment(mut self, shift: u32, add: u64) -> Self {
        self.offset_key_shift = shift;
        self.offset_key_add = add;
        self
    }

    /// Tokens emitidos por sondagem de hash em vez do alocador denso?
    pub fn uses_hashed_offsets(&self) -> bool {
        self.offset_key_shift != 0 || self.offset_key_add != 0
    }

    /// Largura em bits do espaço de candidatos no modo `insert_any`.
    pub fn offset_key_bits(&self) -> u32 {
        (self.max_offset_index as u64 + 1).trailing_zeros()
    }

    /// Valida combinações de parâmetros.
    pub fn validate(&self) -> GemResult<()> {
        for order in [
            self.handle_hash_order,
            self.name_hash_order,
            self.offset_hash_order,
        ] {
            if order > MAX_ORDER {
                crate::kerror!("(GEM) Ordem de tabela inválida=", order);
                return Err(GemError::InvalidArgument);
            }
        }

        if self.max_offset_index as u64 > MAPPING_MAX_INDEX {
            crate::kerror!("(GEM) max_offset_index excede o layout=", self.max_offset_index);
            return Err(GemError::InvalidArgument);
        }

        if self.uses_hashed_offsets() {
            let space = self.max_offset_index as u64 + 1;
            // insert_any precisa de pelo menos um bit de chave
            if space < 2 {
                crate::kerror!("(GEM) Espaço de tokens pequeno demais=", space);
                return Err(GemError::InvalidArgument);
            }
            if !space.is_power_of_two() {
                crate::kerror!("(GEM) Espaço de tokens não é potência de 2=", space);
                return Err(GemError::InvalidArgument);
            }
            let shift = self.offset_key_shift;
            if shift >= 64 || (shift > 0 && self.offset_key_add >= 1u64 << shift) {
                crate::kerror!("(GEM) offset_key_add invade o candidato=", self.offset_key_add);
                return Err(GemError::InvalidArgument);
            }
            // O maior token possível ainda precisa caber no endereço
            let largest = (self.max_offset_index as u64)
                .checked_shl(shift)
                .filter(|v| v >> shift == self.max_offset_index as u64)
                .and_then(|v| v.checked_add(self.offset_key_add));
            match largest {
                Some(v) if v <= MAPPING_MAX_INDEX => {}
                _ => {
                    crate::kerror!("(GEM) Token alinhado não cabe no endereço, shift=", shift);
                    return Err(GemError::InvalidArgument);
                }
            }
        }

        Ok(())
    }
}
