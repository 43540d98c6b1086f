//! Host configuration.
//!
//! All limits are constants of the protocol revision; the struct exists
//! so the driver, the handlers and the tests share one source of truth.

/// Configuration for hook execution.
#[derive(Debug, Clone)]
pub struct HookHostConfig {
    /// Margin applied to the ledger base fee by `fee_base`, as a ratio.
    pub fee_margin_numerator: u64,
    pub fee_margin_denominator: u64,
    /// Drops charged per byte of emitted transaction.
    pub drops_per_byte: u64,
    /// Fuel budget per invocation; consumed fuel is reported as the
    /// instruction count.
    pub fuel_limit: u64,
}

impl Default for HookHostConfig {
    fn default() -> Self {
        Self {
            fee_margin_numerator: 110,
            fee_margin_denominator: 100,
            drops_per_byte: 31,
            fuel_limit: 10_000_000,
        }
    }
}

impl HookHostConfig {
    /// The fee base hooks see: the ledger base fee with the margin
    /// applied.
    pub fn fee_base(&self, ledger_base_fee: u64) -> u64 {
        ledger_base_fee * self.fee_margin_numerator / self.fee_margin_denominator
    }
}
