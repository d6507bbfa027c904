//! Fee schedule and split arithmetic.

use crate::types::AccountId;
use serde::{Deserialize, Serialize};

/// Fee rates are expressed against this basis.
pub const FEE_BASIS: u128 = 10_000;

/// The active fee schedule. Royalty fields are a cache refreshed from the
/// royalty oracle; dev and burn are set by the admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Platform fee, basis points of 10000. Stored in 8 bits.
    pub dev_rate: u8,
    /// Share of each sale that is destroyed, basis points of 10000.
    pub burn_rate: u16,
    /// Cached royalty rate, basis points of 10000.
    pub royalty_rate: u16,
    pub dev_recipient: AccountId,
    pub royalty_recipient: AccountId,
}

/// Fee portions carved out of one gross amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeSplit {
    pub royalty: u128,
    pub dev: u128,
    pub burn: u128,
}

impl FeeSplit {
    pub fn total(&self) -> u128 {
        self.royalty + self.dev + self.burn
    }
}

impl FeeConfig {
    /// Carve the fee portions out of `gross` at the current rates. Rounds
    /// each portion down, so the maker remainder absorbs the dust. Portions
    /// are taken in royalty, dev, burn order and clamped to what is left of
    /// the gross: the cached royalty rate comes from an external oracle, so
    /// the three rates may sum past the basis.
    pub fn split(&self, gross: u128) -> FeeSplit {
        let royalty = (gross * self.royalty_rate as u128 / FEE_BASIS).min(gross);
        let dev = (gross * self.dev_rate as u128 / FEE_BASIS).min(gross - royalty);
        let burn = (gross * self.burn_rate as u128 / FEE_BASIS).min(gross - royalty - dev);
        FeeSplit { royalty, dev, burn }
    }

    /// `gross` with the fee portions removed.
    pub fn net(&self, gross: u128) -> u128 {
        gross - self.split(gross).total()
    }
}
