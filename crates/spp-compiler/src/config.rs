//! Target configuration consulted by type reasoning and literal lowering
//! (spec.md §6: "`executionContext` handle used for pointer-width-sensitive
//! decisions").

/// Byte order of the target's multi-byte scalar representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Target-machine parameters a host supplies once per compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetConfig {
    pub pointer_bits: u16,
    pub endianness: Endianness,
    /// Default bit width for an `IntegerLiteral`/`FloatLiteral` lacking an
    /// explicit size suffix (spec.md §4.3).
    pub default_int_bits: u16,
    pub default_float_bits: u16,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            pointer_bits: 64,
            endianness: Endianness::Little,
            default_int_bits: 32,
            default_float_bits: 32,
        }
    }
}

/// The `executionContext` handle of spec.md §6: the live target parameters
/// consulted while lowering an expression, plus a place for a host to attach
/// its own target-generator implementation via [`crate::target::TargetGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    pub config: TargetConfig,
}

impl ExecutionContext {
    pub fn new(config: TargetConfig) -> Self {
        Self { config }
    }

    /// The natural signed integer type used for array indices, `sizeof`, and
    /// pointer arithmetic: always 64-bit per spec.md §4.3's array-indexing
    /// and `ContentOp` rules.
    pub fn index_bits(&self) -> u16 {
        64
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(TargetConfig::default())
    }
}
