//! Construction state: bounded decay attributes carried by every building.
//!
//! Values live in [0, 100]. Updates never fail: anything outside the
//! range is clamped to the nearest bound.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATE_MIN: f64 = 0.0;
pub const STATE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionParam {
    Fire,
    Damage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructionState {
    values: BTreeMap<ConstructionParam, f64>,
}

impl ConstructionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value; unset attributes read as zero.
    pub fn get(&self, param: ConstructionParam) -> f64 {
        self.values.get(&param).copied().unwrap_or(STATE_MIN)
    }

    /// Set `param` to `value`, or shift it by `value` when `relative`.
    /// Returns the clamped result.
    pub fn update(&mut self, param: ConstructionParam, value: f64, relative: bool) -> f64 {
        let raw = if relative { self.get(param) + value } else { value };
        let clamped = clamp_state(raw);
        self.values.insert(param, clamped);
        clamped
    }
}

/// Clamp into [STATE_MIN, STATE_MAX]. NaN collapses to the lower bound.
pub fn clamp_state(value: f64) -> f64 {
    if value.is_nan() {
        return STATE_MIN;
    }
    value.clamp(STATE_MIN, STATE_MAX)
}
