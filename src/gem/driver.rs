//! # Interface do Driver
//!
//! O núcleo GEM não sabe alocar memória de vídeo nem programar a GPU.
//! Cada driver concreto implementa `GemDriver` e o dispositivo chama os
//! hooks nos pontos de vida do objeto.
//!
//! ## Contrato de Locks
//!
//! | Hook               | Lock de tabela seguro? |
//! |--------------------|------------------------|
//! | `init_object`      | Nenhum                 |
//! | `on_handle_opened` | Nenhum                 |
//! | `on_handle_closed` | Nenhum                 |
//! | `on_object_freed`  | Nenhum                 |
//!
//! Os hooks podem chamar operações do próprio dispositivo, exceto soltar a
//! última referência do objeto que estão recebendo.

use bitflags::bitflags;

use super::error::GemResult;
use super::handle::ClientId;
use super::object::GemObject;

bitflags! {
    /// Capacidades anunciadas pelo driver.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DriverFeatures: u32 {
        /// Gerência de buffers GEM (handles, nomes, offsets)
        const GEM = 1 << 0;
        /// Exportação de buffers entre dispositivos
        const PRIME = 1 << 1;
        /// Configuração de modo de vídeo
        const MODESET = 1 << 2;
    }
}

/// Hooks do driver chamados pelo núcleo GEM.
pub trait GemDriver: Send + Sync {
    /// Capacidades do driver. Sem `GEM`, as operações de requisição
    /// falham com `NoDevice`.
    fn features(&self) -> DriverFeatures {
        DriverFeatures::GEM
    }

    /// Prepara o armazenamento do objeto recém-criado.
    ///
    /// Em caso de erro o objeto é descartado sem `on_object_freed`.
    fn init_object(&self, _obj: &GemObject) -> GemResult<()> {
        Ok(())
    }

    /// Libera o armazenamento. Chamado exatamente uma vez por objeto
    /// inicializado, quando a última referência cai.
    fn on_object_freed(&self, obj: &GemObject);

    /// Um cliente ganhou um handle para `obj`. Erro desfaz o handle.
    fn on_handle_opened(&self, _obj: &GemObject, _client: ClientId) -> GemResult<()> {
        Ok(())
    }

    /// Um handle de `client` para `obj` foi removido.
    fn on_handle_closed(&self, _obj: &GemObject, _client: ClientId) {}
}
