//! # Endereços de Mapeamento
//!
//! Codificação do "endereço falso" que o cliente passa ao mmap: bits
//! altos marcam o endereço como GEM, o token fica no bit 40 e os 40
//! bits baixos são o deslocamento dentro do objeto.

use super::config::{MAPPING_INDEX_SHIFT, MAPPING_KEY, MAPPING_MASK, MAPPING_MAX_INDEX};
use super::object::OffsetToken;

/// Deslocamento correspondente a um índice de token.
#[inline]
pub const fn offset_of_index(index: u64) -> u64 {
    index << MAPPING_INDEX_SHIFT
}

/// Endereço base do mapeamento de `token`.
#[inline]
pub const fn encode(token: OffsetToken) -> u64 {
    MAPPING_KEY | offset_of_index(token.0 & MAPPING_MAX_INDEX)
}

/// O endereço pertence ao espaço GEM?
#[inline]
pub const fn is_gem_address(addr: u64) -> bool {
    (addr & MAPPING_MASK) == MAPPING_KEY
}

/// Índice do token contido no endereço.
#[inline]
pub const fn index_of(addr: u64) -> u64 {
    (addr >> MAPPING_INDEX_SHIFT) & MAPPING_MAX_INDEX
}

/// Deslocamento dentro do objeto.
#[inline]
pub const fn map_offset_of(addr: u64) -> u64 {
    addr & !(offset_of_index(MAPPING_MAX_INDEX) | MAPPING_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode(OffsetToken(0)), 0x8000_0000_0000_0000);
        assert_eq!(encode(OffsetToken(1)), 0x8000_0100_0000_0000);
        assert_eq!(
            encode(OffsetToken(MAPPING_MAX_INDEX)),
            0xbfff_ff00_0000_0000
        );
    }

    #[test]
    fn test_decode_address() {
        let addr = encode(OffsetToken(0x1234)) + 0x2000;
        assert!(is_gem_address(addr));
        assert_eq!(index_of(addr), 0x1234);
        assert_eq!(map_offset_of(addr), 0x2000);
    }

    #[test]
    fn test_foreign_addresses() {
        assert!(!is_gem_address(0));
        assert!(!is_gem_address(0x0000_7fff_ffff_f000));
        // Kernel canônico: 11 nos bits 63..62
        assert!(!is_gem_address(0xffff_8000_0000_0000));
        assert!(!is_gem_address(0x4000_0000_0000_0000));
    }

    #[test]
    fn test_offset_keeps_low_40_bits() {
        let addr = encode(OffsetToken(7)) | 0xff_ffff_ffff;
        assert_eq!(index_of(addr), 7);
        assert_eq!(map_offset_of(addr), 0xff_ffff_ffff);
    }
}
