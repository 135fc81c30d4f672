// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Workforce Policy Simulation Suite - Decimal Rounding Adapter
//
// Converts between the engine's f64 state and rust_decimal. Rounding works on
// the exact binary value of the input, so a weight computed as
// 0.7250000000000001 rounds up to 0.73 rather than being read back as 0.725.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Convert f64 to Decimal (lossy but sufficient for simulation).
/// Non-finite input maps to zero.
pub fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal to f64.
pub fn from_decimal(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Round `v` to `dp` decimal places, half-to-even on exact ties of the
/// binary value.
pub fn round_to(v: f64, dp: u32) -> f64 {
    match Decimal::from_f64_retain(v) {
        Some(d) => {
            from_decimal(d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        }
        None => v,
    }
}

/// Two decimal places, used for relationship edge weights.
pub fn round_weight(v: f64) -> f64 {
    round_to(v, 2)
}

/// Four decimal places, used for aggregated report statistics.
pub fn round_stat(v: f64) -> f64 {
    round_to(v, 4)
}
