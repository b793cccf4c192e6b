// =============================================================================
// GEM LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do subsistema GEM com custo ZERO em release.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - Apenas strings literais + valores em hex
// - SEM alocação
// - Escreve no sink registrado pelo kernel hospedeiro (serial, ring buffer...)
//   Sem sink registrado, o registro é descartado.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Violação de invariante interna (chave duplicada, double free)
// - WARN:  Rollback ou situação suspeita mas recuperável
// - INFO:  Fluxo normal (init/destroy de device, teardown de cliente)
// - DEBUG: Informações de debugging (tokens, nomes)
// - TRACE: Cada handle/nome/offset criado ou removido
//
// FEATURES:
// - no_logs:   Remove 100% dos logs
// - log_error: Apenas ERROR e WARN
// - log_info:  ERROR, WARN, INFO
// - log_debug: + DEBUG
// - log_trace: Todos os níveis (padrão)
//
// COMO USAR:
//   kinfo!("(GEM) Device inicializado");        // Apenas string
//   kdebug!("(GEM) Nome publicado=", name);     // String + hex
//   klog!("Handle=", h, " Obj=", id);           // Múltiplos valores
//
// =============================================================================

use spin::RwLock;

// =============================================================================
// SINK
// =============================================================================

/// Destino dos registros de log.
///
/// O kernel hospedeiro registra um sink (ex: porta serial) via [`set_sink`].
pub trait LogSink: Sync {
    /// Escreve um fragmento de texto. Não deve tentar logar recursivamente.
    fn write_str(&self, s: &str);
}

static SINK: RwLock<Option<&'static dyn LogSink>> = RwLock::new(None);

/// Registra o sink global de log.
pub fn set_sink(sink: &'static dyn LogSink) {
    *SINK.write() = Some(sink);
}

/// Remove o sink (registros passam a ser descartados).
pub fn clear_sink() {
    *SINK.write() = None;
}

/// Emite uma string crua.
#[inline]
pub fn emit_str(s: &str) {
    if let Some(sink) = *SINK.read() {
        sink.write_str(s);
    }
}

/// Formata `val` como `0x...` no buffer, sem usar `core::fmt`.
fn hex_str(val: u64, buf: &mut [u8; 18]) -> &str {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    buf[0] = b'0';
    buf[1] = b'x';

    // Número de nibbles significativos (mínimo 1)
    let nibbles = if val == 0 {
        1
    } else {
        (16 - (val.leading_zeros() / 4)) as usize
    };

    for i in 0..nibbles {
        let shift = (nibbles - 1 - i) * 4;
        buf[2 + i] = DIGITS[((val >> shift) & 0xF) as usize];
    }

    // Apenas dígitos ASCII foram escritos
    core::str::from_utf8(&buf[..2 + nibbles]).unwrap_or("0x?")
}

/// Emite um valor em hexadecimal (`0x...`).
pub fn emit_hex(val: u64) {
    let mut buf = [0u8; 18];
    emit_str(hex_str(val, &mut buf));
}

/// Emite quebra de linha.
#[inline]
pub fn emit_nl() {
    emit_str("\n");
}

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";

// =============================================================================
// MACRO INTERNA
// =============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __klog_line {
    ($prefix:expr, $msg:expr) => {{
        $crate::logging::emit_str($prefix);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_nl();
    }};
    ($prefix:expr, $msg:expr, $val:expr) => {{
        $crate::logging::emit_str($prefix);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_hex($val as u64);
        $crate::logging::emit_nl();
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================
//
// kerror! - Sempre ativo (exceto com no_logs)
//

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {
        $crate::__klog_line!($crate::logging::P_ERROR, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::logging::P_ERROR, $msg, $val)
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {
        $crate::__klog_line!($crate::logging::P_WARN, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::logging::P_WARN, $msg, $val)
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(not(any(feature = "no_logs", feature = "log_error")))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {
        $crate::__klog_line!($crate::logging::P_INFO, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::logging::P_INFO, $msg, $val)
    };
}

#[cfg(any(feature = "no_logs", feature = "log_error"))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================
//
// kdebug! - Ativo apenas com log_debug ou log_trace
//

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {
        $crate::__klog_line!($crate::logging::P_DEBUG, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::logging::P_DEBUG, $msg, $val)
    };
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================
//
// ktrace! - Ativo apenas com log_trace
//

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {
        $crate::__klog_line!($crate::logging::P_TRACE, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::logging::P_TRACE, $msg, $val)
    };
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS AUXILIARES
// =============================================================================

/// klog! - Log genérico sem prefixo de nível.
///
/// Útil para construir logs com múltiplos valores.
///
/// # Uso
/// ```rust,ignore
/// klog!("Handle=", handle);                  // String + hex
/// klog!("Handle=", handle, " Obj=", id);     // Múltiplos
/// knl!();                                     // Fecha a linha
/// ```
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! klog {
    ($msg:expr) => {{
        $crate::logging::emit_str($msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::logging::emit_str($msg);
        $crate::logging::emit_hex($val as u64);
    }};
    ($msg1:expr, $val:expr, $msg2:expr) => {{
        $crate::logging::emit_str($msg1);
        $crate::logging::emit_hex($val as u64);
        $crate::logging::emit_str($msg2);
    }};
    ($msg1:expr, $val1:expr, $msg2:expr, $val2:expr) => {{
        $crate::logging::emit_str($msg1);
        $crate::logging::emit_hex($val1 as u64);
        $crate::logging::emit_str($msg2);
        $crate::logging::emit_hex($val2 as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! klog {
    ($($t:tt)*) => {{}};
}

/// knl! - Emite apenas newline (fecha uma linha montada com `klog!`).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! knl {
    () => {{
        $crate::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! knl {
    () => {{}};
}
