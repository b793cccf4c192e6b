//! Kernel Library (KLib).
//!
//! Estruturas genéricas usadas pelo subsistema GEM:
//! tabela hash de chaves inteiras, bitmap e alocador de IDs densos.
//! Não conhecem objetos GEM, apenas chaves e itens opacos.

pub mod bitmap;
pub mod hash;
pub mod idr;

#[cfg(feature = "self_test")]
pub mod test_framework;

/// Verifica se um valor está alinhado.
#[inline]
pub const fn is_aligned(val: usize, align: usize) -> bool {
    (val & (align - 1)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_aligned() {
        assert!(is_aligned(0, 4096));
        assert!(is_aligned(8192, 4096));
        assert!(!is_aligned(4097, 4096));
        assert!(!is_aligned(1, 4));
    }
}
