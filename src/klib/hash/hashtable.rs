//! Arquivo: klib/hash/hashtable.rs
//!
//! Propósito: Tabela Hash de chaves inteiras (KeyTable).
//! Mapeia uma chave `u64` para um item opaco com acesso O(1) médio.
//! É o substrato de todos os namespaces do GEM (handles, nomes, offsets).
//!
//! Detalhes de Implementação:
//! - `2^order` buckets, encadeamento por Vec em cada bucket.
//! - Cada cadeia é mantida ORDENADA por chave crescente: a busca
//!   termina cedo assim que encontra uma chave maior.
//! - Hash multiplicativo (golden ratio) sobre a chave.
//! - A tabela não tem lock próprio: quem a embute decide a proteção.

use super::{HashError, HashResult};
use alloc::vec::Vec;

/// Ordem máxima aceita (2^24 buckets)
pub const MAX_ORDER: u32 = 24;

/// Primo próximo da razão áurea para 64 bits
pub const GOLDEN_RATIO_PRIME_64: u64 = 0x9e37_ffff_fffc_0001;

/// Hash multiplicativo de `val` para um espaço de `bits` bits.
///
/// `bits == 0` sempre retorna 0 (tabela de um bucket só).
#[inline]
pub const fn hash_long(val: u64, bits: u32) -> u64 {
    if bits == 0 {
        return 0;
    }
    let bits = if bits > 64 { 64 } else { bits };
    val.wrapping_mul(GOLDEN_RATIO_PRIME_64) >> (64 - bits)
}

struct Entry<T> {
    key: u64,
    item: T,
}

/// Tabela hash de chaves inteiras com cadeias ordenadas.
pub struct KeyTable<T> {
    buckets: Vec<Vec<Entry<T>>>,
    order: u32,
    len: usize,
}

impl<T> KeyTable<T> {
    /// Cria tabela com `2^order` buckets vazios.
    pub fn create(order: u32) -> HashResult<Self> {
        if order > MAX_ORDER {
            return Err(HashError::InvalidKeySpace);
        }
        let size = 1usize << order;

        let mut buckets = Vec::new();
        if buckets.try_reserve_exact(size).is_err() {
            crate::kerror!("(KeyTable) Sem memória para buckets, ordem=", order);
            return Err(HashError::OutOfMemory);
        }
        buckets.resize_with(size, Vec::new);

        Ok(Self {
            buckets,
            order,
            len: 0,
        })
    }

    /// Ordem da tabela (log2 do número de buckets)
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Número de buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Número de entradas
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn bucket_index(&self, key: u64) -> usize {
        hash_long(key, self.order) as usize
    }

    /// Posição da chave na cadeia: `Ok(i)` se presente, `Err(i)` = ponto
    /// de inserção que mantém a ordem.
    fn find_position(chain: &[Entry<T>], key: u64) -> Result<usize, usize> {
        for (i, entry) in chain.iter().enumerate() {
            if entry.key == key {
                return Ok(i);
            }
            if entry.key > key {
                return Err(i);
            }
        }
        Err(chain.len())
    }

    /// Insere `item` sob `key`.
    ///
    /// Falha com `DuplicateKey` se a chave já existe (o item é descartado).
    pub fn insert(&mut self, key: u64, item: T) -> HashResult<()> {
        let index = self.bucket_index(key);
        let chain = &mut self.buckets[index];

        match Self::find_position(chain, key) {
            Ok(_) => Err(HashError::DuplicateKey),
            Err(pos) => {
                chain
                    .try_reserve(1)
                    .map_err(|_| HashError::OutOfMemory)?;
                chain.insert(pos, Entry { key, item });
                self.len += 1;
                Ok(())
            }
        }
    }

    /// Busca o item de `key`.
    pub fn find(&self, key: u64) -> HashResult<&T> {
        let chain = &self.buckets[self.bucket_index(key)];
        match Self::find_position(chain, key) {
            Ok(pos) => Ok(&chain[pos].item),
            Err(_) => Err(HashError::NotFound),
        }
    }

    /// Busca mutável.
    pub fn find_mut(&mut self, key: u64) -> HashResult<&mut T> {
        let index = self.bucket_index(key);
        let chain = &mut self.buckets[index];
        match Self::find_position(chain, key) {
            Ok(pos) => Ok(&mut chain[pos].item),
            Err(_) => Err(HashError::NotFound),
        }
    }

    /// Verifica se a chave está presente.
    pub fn contains(&self, key: u64) -> bool {
        self.find(key).is_ok()
    }

    /// Remove a entrada de `key` e devolve o item.
    ///
    /// O item volta para o chamador, que decide quando soltá-lo
    /// (tipicamente depois de liberar o lock que protege a tabela).
    pub fn remove(&mut self, key: u64) -> HashResult<T> {
        let index = self.bucket_index(key);
        let chain = &mut self.buckets[index];
        match Self::find_position(chain, key) {
            Ok(pos) => {
                self.len -= 1;
                Ok(chain.remove(pos).item)
            }
            Err(_) => Err(HashError::NotFound),
        }
    }

    /// Insere `item` sob qualquer chave livre derivada de `seed`.
    ///
    /// A semente é espalhada num espaço de `bits` bits; candidatos têm a
    /// forma `(h << shift) + add` e são sondados linearmente (com wrap)
    /// até achar um livre ou voltar ao primeiro. `shift`/`add` codificam
    /// restrições de alinhamento dos bits baixos; com ambos 0 a chave é
    /// o próprio candidato.
    pub fn insert_any(
        &mut self,
        item: T,
        seed: u64,
        bits: u32,
        shift: u32,
        add: u64,
    ) -> HashResult<u64> {
        if bits == 0 || bits > 63 || bits + shift > 64 {
            return Err(HashError::InvalidKeySpace);
        }
        let mask = (1u64 << bits) - 1;
        if shift > 0 && add >= (1u64 << shift) {
            // `add` invadiria os bits do candidato
            return Err(HashError::InvalidKeySpace);
        }

        let first = hash_long(seed, bits);
        let mut unshifted = first;
        loop {
            let key = (unshifted << shift).wrapping_add(add);
            if !self.contains(key) {
                self.insert(key, item)?;
                return Ok(key);
            }
            unshifted = (unshifted + 1) & mask;
            if unshifted == first {
                crate::kerror!("(KeyTable) Espaço de chaves esgotado, bits=", bits);
                return Err(HashError::KeySpaceExhausted);
            }
        }
    }

    /// Remove e devolve todas as entradas (ordem por bucket, chave crescente).
    pub fn drain(&mut self) -> Vec<(u64, T)> {
        let mut out = Vec::with_capacity(self.len);
        for chain in self.buckets.iter_mut() {
            out.extend(chain.drain(..).map(|e| (e.key, e.item)));
        }
        self.len = 0;
        out
    }

    /// Itera sobre `(chave, item)`.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        self.buckets
            .iter()
            .flat_map(|chain| chain.iter().map(|e| (e.key, &e.item)))
    }

    /// Lista no log de debug a cadeia para onde `key` é espalhada.
    pub fn dump_chain(&self, key: u64) {
        let index = self.bucket_index(key);
        crate::kdebug!("(KeyTable) Chave=", key);
        crate::kdebug!("(KeyTable) Bucket=", index);
        for entry in &self.buckets[index] {
            crate::kdebug!("(KeyTable)   entrada=", entry.key);
        }
    }

    /// Tamanho da cadeia do bucket de `key`.
    pub fn chain_len(&self, key: u64) -> usize {
        self.buckets[self.bucket_index(key)].len()
    }

    /// Destrói a tabela. O chamador deve ter removido todos os itens antes.
    pub fn destroy(self) {
        if !self.is_empty() {
            crate::kerror!("(KeyTable) Destruída com entradas vivas=", self.len);
        }
    }
}
