//! Public commands: batched limit orders, cancellation, claims.
//!
//! Every command validates everything that can fail before its first
//! mutation, so an error always leaves the engine unchanged. Collaborator
//! transfers run last, once the book and the claim ledgers are consistent.

use super::book::Market;
use super::error::MarketError;
use super::events::MarketEvent;
use super::matching::MatchResult;
use crate::ledger::{CoinLedger, ItemCustody, RoyaltyOracle};
use crate::segments::QUANTITY_MAX;
use crate::types::{AccountId, ItemId, LimitOrder, OrderId, OrderLocation, Side};
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

/// Upper bound on order ids per claim call.
pub const MAX_CLAIM_ORDERS: usize = 200;

impl<C, V, R> Market<C, V, R>
where
    C: CoinLedger,
    V: ItemCustody,
    R: RoyaltyOracle,
{
    /// Submit a batch of limit orders for one taker. Validation failures
    /// abort the whole batch before any order executes; a residual below the
    /// item's minimum quantity is the only non-fatal condition and surfaces
    /// as a `FailedToAddToBook` event on its order's result.
    ///
    /// Each order is atomic on its own: a `TooManyOrdersHit` abort is
    /// detected by a dry-run scan before that order mutates anything, so
    /// earlier orders in the batch stand and the failing order leaves no
    /// trace.
    pub fn limit_orders(
        &self,
        taker: AccountId,
        orders: &[LimitOrder],
    ) -> Result<Vec<MatchResult>, MarketError> {
        for order in orders {
            self.validate_order(order)?;
        }
        let mut results = Vec::with_capacity(orders.len());
        for order in orders {
            results.push(self.execute_limit_order(taker, order)?);
        }
        Ok(results)
    }

    /// Submit a single limit order.
    pub fn limit_order(
        &self,
        taker: AccountId,
        order: LimitOrder,
    ) -> Result<MatchResult, MarketError> {
        self.validate_order(&order)?;
        self.execute_limit_order(taker, &order)
    }

    fn validate_order(&self, order: &LimitOrder) -> Result<(), MarketError> {
        if order.quantity == 0 {
            return Err(MarketError::NoQuantity);
        }
        if order.quantity > QUANTITY_MAX {
            return Err(MarketError::QuantityOverflow(order.quantity));
        }
        if order.price == 0 {
            return Err(MarketError::PriceZero);
        }
        let config = self
            .books
            .get(&order.item_id)
            .map(|book| book.config)
            .unwrap_or_default();
        if !config.is_enabled() {
            return Err(MarketError::TokenDoesNotExist(order.item_id));
        }
        if order.price % config.tick != 0 {
            return Err(MarketError::PriceNotMultipleOfTick {
                price: order.price,
                tick: config.tick,
            });
        }
        Ok(())
    }

    /// Cancel a batch of resting orders owned by `maker` and refund their
    /// unfilled economics: escrowed coins for bids, escrowed items for asks.
    /// `order_ids` and `locations` are parallel arrays.
    pub fn cancel_orders(
        &self,
        maker: AccountId,
        order_ids: &[OrderId],
        locations: &[OrderLocation],
    ) -> Result<(), MarketError> {
        if order_ids.len() != locations.len() {
            return Err(MarketError::LengthMismatch);
        }

        // Locate and authorize everything, duplicates included, before
        // touching the book.
        let mut seen = HashSet::new();
        for (order_id, location) in order_ids.iter().zip(locations) {
            if !seen.insert(*order_id) {
                return Err(MarketError::OrderNotFound(*order_id));
            }
            let book = self.books.get(&location.item_id).ok_or(
                MarketError::OrderNotFoundInTree {
                    side: location.side,
                    item_id: location.item_id,
                    price: location.price,
                },
            )?;
            book.side(location.side).lookup(
                location.side,
                location.item_id,
                location.price,
                *order_id,
            )?;
            match self.makers.get(order_id) {
                Some(owner) if *owner == maker => {}
                _ => return Err(MarketError::NotMaker(*order_id)),
            }
        }

        let mut refunds = Vec::with_capacity(order_ids.len());
        for (order_id, location) in order_ids.iter().zip(locations) {
            let Some(mut book) = self.books.get_mut(&location.item_id) else {
                continue;
            };
            let quantity = book.side_mut(location.side).cancel(
                location.side,
                location.item_id,
                location.price,
                *order_id,
            )?;
            drop(book);
            trace!(%maker, order_id = %order_id, price = location.price, quantity, "order cancelled");
            self.emit(MarketEvent::Canceled {
                order_id: *order_id,
                maker,
                side: location.side,
                item_id: location.item_id,
                price: location.price,
                quantity,
            });
            refunds.push((*location, quantity));
        }

        for (location, quantity) in refunds {
            match location.side {
                Side::Buy => {
                    self.coins
                        .transfer_from_core(maker, quantity as u128 * location.price as u128)?;
                }
                Side::Sell => {
                    self.items
                        .transfer_batch_from_core(maker, &[(location.item_id, quantity)])?;
                }
            }
        }
        Ok(())
    }

    /// Claim the gross coin proceeds of the given sold orders, with the
    /// current fee split applied to the total. All-or-nothing: any id with
    /// zero claimable fails the whole call. Returns the net amount paid out.
    pub fn claim_coins(&self, maker: AccountId, order_ids: &[OrderId]) -> Result<u128, MarketError> {
        let taken = self.take_coin_claims(maker, order_ids)?;
        self.settle_coin_claims(maker, &taken)
    }

    /// Claim bought items for parallel `(order_id, item_id)` arrays and
    /// deliver them in one batch.
    pub fn claim_items(
        &self,
        maker: AccountId,
        order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<(), MarketError> {
        let taken = self.take_item_claims(maker, order_ids, item_ids)?;
        self.settle_item_claims(maker, &taken)
    }

    /// Claim coins and items in one call.
    pub fn claim_all(
        &self,
        maker: AccountId,
        coin_order_ids: &[OrderId],
        item_order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<u128, MarketError> {
        let coins_taken = self.take_coin_claims(maker, coin_order_ids)?;
        let items_taken = match self.take_item_claims(maker, item_order_ids, item_ids) {
            Ok(taken) => taken,
            Err(err) => {
                self.restore_coin_claims(&coins_taken);
                return Err(err);
            }
        };
        let net = self.settle_coin_claims(maker, &coins_taken)?;
        self.settle_item_claims(maker, &items_taken)?;
        Ok(net)
    }

    /// Zero the claimable coin balances of `order_ids`, validating ownership
    /// and non-emptiness. Restores everything already taken on failure.
    fn take_coin_claims(
        &self,
        maker: AccountId,
        order_ids: &[OrderId],
    ) -> Result<Vec<(OrderId, u128)>, MarketError> {
        if order_ids.len() > MAX_CLAIM_ORDERS {
            return Err(MarketError::TooManyOrdersHit);
        }
        let mut taken: Vec<(OrderId, u128)> = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            let failure = match self.makers.get(order_id) {
                Some(owner) if *owner == maker => {
                    match self.claimable_coins.remove(order_id) {
                        Some((_, amount)) if amount > 0 => {
                            taken.push((*order_id, amount));
                            None
                        }
                        _ => Some(MarketError::NothingToClaim(*order_id)),
                    }
                }
                _ => Some(MarketError::NotMaker(*order_id)),
            };
            if let Some(err) = failure {
                self.restore_coin_claims(&taken);
                return Err(err);
            }
        }
        Ok(taken)
    }

    fn restore_coin_claims(&self, taken: &[(OrderId, u128)]) {
        for (order_id, amount) in taken {
            *self.claimable_coins.entry(*order_id).or_insert(0) += amount;
        }
    }

    fn settle_coin_claims(
        &self,
        maker: AccountId,
        taken: &[(OrderId, u128)],
    ) -> Result<u128, MarketError> {
        if taken.is_empty() {
            return Ok(0);
        }
        let gross: u128 = taken.iter().map(|(_, amount)| amount).sum();
        let net = self.distribute_proceeds(maker, gross)?;
        trace!(%maker, orders = taken.len(), gross, net, "coins claimed");
        self.emit(MarketEvent::CoinsClaimed {
            maker,
            orders: taken.len() as u32,
            gross,
            net,
        });
        Ok(net)
    }

    /// Zero the claimable item balances of parallel `(order_id, item_id)`
    /// pairs. Restores everything already taken on failure.
    fn take_item_claims(
        &self,
        maker: AccountId,
        order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<Vec<((OrderId, ItemId), u64)>, MarketError> {
        if order_ids.len() != item_ids.len() {
            return Err(MarketError::LengthMismatch);
        }
        if order_ids.len() > MAX_CLAIM_ORDERS {
            return Err(MarketError::TooManyOrdersHit);
        }
        let mut taken: Vec<((OrderId, ItemId), u64)> = Vec::with_capacity(order_ids.len());
        for (order_id, item_id) in order_ids.iter().zip(item_ids) {
            let failure = match self.makers.get(order_id) {
                Some(owner) if *owner == maker => {
                    match self.claimable_items.remove(&(*order_id, *item_id)) {
                        Some((key, quantity)) if quantity > 0 => {
                            taken.push((key, quantity));
                            None
                        }
                        _ => Some(MarketError::NothingToClaim(*order_id)),
                    }
                }
                _ => Some(MarketError::NotMaker(*order_id)),
            };
            if let Some(err) = failure {
                self.restore_item_claims(&taken);
                return Err(err);
            }
        }
        Ok(taken)
    }

    fn restore_item_claims(&self, taken: &[((OrderId, ItemId), u64)]) {
        for (key, quantity) in taken {
            *self.claimable_items.entry(*key).or_insert(0) += quantity;
        }
    }

    fn settle_item_claims(
        &self,
        maker: AccountId,
        taken: &[((OrderId, ItemId), u64)],
    ) -> Result<(), MarketError> {
        if taken.is_empty() {
            return Ok(());
        }
        let mut by_item: BTreeMap<ItemId, u64> = BTreeMap::new();
        for ((_, item_id), quantity) in taken {
            *by_item.entry(*item_id).or_insert(0) += quantity;
        }
        let entries: Vec<(ItemId, u64)> = by_item.into_iter().collect();
        self.items.transfer_batch_from_core(maker, &entries)?;
        trace!(%maker, orders = taken.len(), "items claimed");
        self.emit(MarketEvent::ItemsClaimed {
            maker,
            orders: taken.len() as u32,
        });
        Ok(())
    }
}
