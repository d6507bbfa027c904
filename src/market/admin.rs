//! Administrative configuration: item registration, level capacity, fees.

use super::book::{ItemBook, Market};
use super::error::MarketError;
use super::events::MarketEvent;
use super::fees::FEE_BASIS;
use crate::ledger::{CoinLedger, ItemCustody, RoyaltyOracle};
use crate::segments::SLOTS_PER_SEGMENT;
use crate::types::{AccountId, ItemConfig, ItemId};
use dashmap::mapref::entry::Entry;
use std::sync::atomic::Ordering;
use tracing::trace;

impl<C, V, R> Market<C, V, R>
where
    C: CoinLedger,
    V: ItemCustody,
    R: RoyaltyOracle,
{
    /// Register or update item configurations for parallel arrays of ids
    /// and configs. A tick, once set non-zero, can never change; the
    /// minimum quantity may be updated by re-sending the same tick.
    pub fn set_item_configs(
        &self,
        item_ids: &[ItemId],
        configs: &[ItemConfig],
    ) -> Result<(), MarketError> {
        if item_ids.len() != configs.len() {
            return Err(MarketError::LengthMismatch);
        }

        for (item_id, config) in item_ids.iter().zip(configs) {
            if let Some(book) = self.books.get(item_id)
                && book.config.tick != 0
                && config.tick != book.config.tick
            {
                return Err(MarketError::TickCannotBeChanged(*item_id));
            }
        }

        for (item_id, config) in item_ids.iter().zip(configs) {
            match self.books.entry(*item_id) {
                Entry::Occupied(mut occupied) => {
                    occupied.get_mut().config = *config;
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(ItemBook::new(*config));
                }
            }
            trace!(
                item_id = *item_id,
                tick = config.tick,
                min_quantity = config.min_quantity,
                "item configured"
            );
        }
        Ok(())
    }

    /// Bound on resting orders per price level; must be a positive multiple
    /// of the four-slot segment width.
    pub fn set_max_orders_per_price(&self, value: u32) -> Result<(), MarketError> {
        if value == 0 || value % SLOTS_PER_SEGMENT as u32 != 0 {
            return Err(MarketError::MaxOrdersNotMultiple(value));
        }
        self.max_orders_per_price.store(value, Ordering::Relaxed);
        Ok(())
    }

    /// Set the platform fee schedule. The dev rate lives in an 8-bit field;
    /// a non-zero rate requires a non-zero recipient.
    pub fn set_fees(
        &self,
        dev_recipient: AccountId,
        dev_rate: u16,
        burn_rate: u16,
    ) -> Result<(), MarketError> {
        if dev_rate > u8::MAX as u16 {
            return Err(MarketError::DevFeeTooHigh(dev_rate));
        }
        if burn_rate as u128 >= FEE_BASIS {
            return Err(MarketError::BurnFeeTooHigh(burn_rate));
        }
        if dev_rate > 0 && dev_recipient.is_zero() {
            return Err(MarketError::ZeroAddress);
        }

        let mut fees = match self.fees.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        fees.dev_rate = dev_rate as u8;
        fees.burn_rate = burn_rate;
        fees.dev_recipient = dev_recipient;
        trace!(dev_rate, burn_rate, %dev_recipient, "fees updated");
        Ok(())
    }

    /// Re-query the royalty oracle and cache its recipient and rate. The
    /// rate is derived from a full-basis probe and capped at the basis; a
    /// zero recipient disables the royalty entirely.
    pub fn update_royalty_fee(&self, item_id: ItemId) -> (AccountId, u16) {
        let (recipient, amount) = self.royalty.info(item_id, FEE_BASIS);
        let rate = if recipient.is_zero() {
            0
        } else {
            amount.min(FEE_BASIS) as u16
        };
        let recipient = if rate == 0 { AccountId::ZERO } else { recipient };

        let mut fees = match self.fees.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        fees.royalty_rate = rate;
        fees.royalty_recipient = recipient;
        drop(fees);

        self.emit(MarketEvent::RoyaltyUpdated { recipient, rate });
        (recipient, rate)
    }
}
