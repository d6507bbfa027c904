//! Taker matching against the resting book.
//!
//! Price priority comes from the index (`first` for asks, `last` for bids),
//! time priority from slot scan order within each level. A dry-run count of
//! the orders a taker would hit runs before any mutation, so the per-call
//! fan-out cap aborts with the book untouched.

use super::book::{BookSide, Market};
use super::error::MarketError;
use super::events::MarketEvent;
use crate::ledger::{CoinLedger, ItemCustody, RoyaltyOracle};
use crate::types::{AccountId, ItemId, LimitOrder, OrderId, Side};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use tracing::trace;
use uuid::Uuid;

/// A taker scan that would hit this many resting orders fails the call.
pub const MAX_MATCHES_PER_CALL: usize = 500;

/// One fill against a resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub maker_order_id: OrderId,
    /// The resting level's price, not the taker's limit.
    pub price: u64,
    pub quantity: u64,
    pub transaction_id: Uuid,
}

/// The residual that rested on the book after matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub order_id: OrderId,
    /// Actual resting price after any overflow walk.
    pub price: u64,
    pub quantity: u64,
}

/// Outcome of one limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub side: Side,
    pub item_id: ItemId,
    pub limit_price: u64,
    pub quantity: u64,
    pub fills: Vec<Fill>,
    /// Coins exchanged across all fills, at resting-level prices.
    pub cost: u128,
    /// Quantity left unfilled after matching.
    pub residual: u64,
    pub resting: Option<RestingOrder>,
    /// True when the residual was refused (below the item's minimum
    /// quantity, or the overflow walk left the price domain).
    pub rejected_residual: bool,
}

impl MatchResult {
    pub fn executed_quantity(&self) -> u64 {
        self.quantity - self.residual
    }

    pub fn is_complete(&self) -> bool {
        self.residual == 0
    }
}

pub(super) struct RawFill {
    pub maker_order_id: OrderId,
    pub price: u64,
    pub quantity: u64,
}

pub(super) struct TakeOutcome {
    pub fills: Vec<RawFill>,
    pub residual: u64,
    pub cost: u128,
}

impl BookSide {
    /// Dry-run the taker scan and report whether it would hit `cap` or more
    /// resting orders.
    pub(super) fn would_exceed_hits(
        &self,
        taker_side: Side,
        limit: u64,
        quantity: u64,
        cap: usize,
    ) -> bool {
        let mut residual = quantity;
        let mut hits = 0usize;
        match taker_side {
            Side::Buy => {
                for (price, offset) in self.tree.iter() {
                    if price > limit || residual == 0 {
                        break;
                    }
                    if let Some(level) = self.levels.get(&price) {
                        hits += level.count_consumable(offset, &mut residual);
                    }
                    if hits >= cap {
                        return true;
                    }
                }
            }
            Side::Sell => {
                for (price, offset) in self.tree.iter_rev() {
                    if price < limit || residual == 0 {
                        break;
                    }
                    if let Some(level) = self.levels.get(&price) {
                        hits += level.count_consumable(offset, &mut residual);
                    }
                    if hits >= cap {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Consume resting orders at acceptable prices until `quantity` is
    /// exhausted or the book runs out. Fully consumed levels leave the tree;
    /// partially consumed levels advance their tombstone offset by the
    /// number of segments retired.
    pub(super) fn take(&mut self, taker_side: Side, limit: u64, quantity: u64) -> TakeOutcome {
        let mut residual = quantity;
        let mut fills: Vec<RawFill> = Vec::new();
        let mut cost: u128 = 0;

        while residual > 0 {
            let best = match taker_side {
                Side::Buy => self.tree.first(),
                Side::Sell => self.tree.last(),
            };
            let Some(price) = best else { break };
            let acceptable = match taker_side {
                Side::Buy => price <= limit,
                Side::Sell => price >= limit,
            };
            if !acceptable {
                break;
            }

            let offset = self.tree.offset(price).unwrap_or(0);
            let Some(level) = self.levels.get_mut(&price) else {
                break;
            };
            let active = (level.segment_count() as u32).saturating_sub(offset);
            let fills_before = fills.len();
            let consumed = level.consume(offset, &mut residual, &mut |slot, _fully| {
                cost += slot.quantity as u128 * price as u128;
                fills.push(RawFill {
                    maker_order_id: slot.id,
                    price,
                    quantity: slot.quantity,
                });
            });

            if consumed == active {
                self.levels.remove(&price);
                self.tree.remove(price);
            } else if consumed > 0 {
                self.tree.add_offset(price, consumed);
            }

            if fills.len() == fills_before {
                break;
            }
        }

        TakeOutcome {
            fills,
            residual,
            cost,
        }
    }
}

impl<C, V, R> Market<C, V, R>
where
    C: CoinLedger,
    V: ItemCustody,
    R: RoyaltyOracle,
{
    /// Match one pre-validated limit order, rest or reject its residual,
    /// then settle against the collaborators.
    pub(super) fn execute_limit_order(
        &self,
        taker: AccountId,
        order: &LimitOrder,
    ) -> Result<MatchResult, MarketError> {
        let LimitOrder {
            side,
            item_id,
            price,
            quantity,
        } = *order;
        let max_orders = self.max_orders_per_price.load(Ordering::Relaxed);

        let Some(mut book) = self.books.get_mut(&item_id) else {
            return Err(MarketError::TokenDoesNotExist(item_id));
        };
        let config = book.config;
        if !config.is_enabled() {
            return Err(MarketError::TokenDoesNotExist(item_id));
        }

        let opposite = book.side_mut(side.opposite());
        if opposite.would_exceed_hits(side, price, quantity, MAX_MATCHES_PER_CALL) {
            return Err(MarketError::TooManyOrdersHit);
        }
        let outcome = opposite.take(side, price, quantity);
        trace!(
            %taker, %side, item_id, price, quantity,
            fills = outcome.fills.len(), residual = outcome.residual,
            "limit order matched"
        );

        for fill in &outcome.fills {
            match side {
                Side::Buy => {
                    *self
                        .claimable_coins
                        .entry(fill.maker_order_id)
                        .or_insert(0) += fill.quantity as u128 * fill.price as u128;
                }
                Side::Sell => {
                    *self
                        .claimable_items
                        .entry((fill.maker_order_id, item_id))
                        .or_insert(0) += fill.quantity;
                }
            }
        }

        let mut resting = None;
        let mut rejected_residual = false;
        if outcome.residual > 0 {
            if outcome.residual < config.min_quantity {
                rejected_residual = true;
            } else {
                let order_id = self.alloc_order_id();
                match book.side_mut(side).insert_order(
                    side,
                    price,
                    config.tick,
                    order_id,
                    outcome.residual,
                    max_orders,
                ) {
                    Some(actual_price) => {
                        self.makers.insert(order_id, taker);
                        resting = Some(RestingOrder {
                            order_id,
                            price: actual_price,
                            quantity: outcome.residual,
                        });
                    }
                    None => rejected_residual = true,
                }
            }
        }
        drop(book);

        let mut fills = Vec::with_capacity(outcome.fills.len());
        for raw in &outcome.fills {
            let transaction_id = self.transaction_ids.next();
            self.emit(MarketEvent::Filled {
                transaction_id,
                maker_order_id: raw.maker_order_id,
                taker,
                taker_side: side,
                item_id,
                price: raw.price,
                quantity: raw.quantity,
            });
            fills.push(Fill {
                maker_order_id: raw.maker_order_id,
                price: raw.price,
                quantity: raw.quantity,
                transaction_id,
            });
        }
        if let Some(rested) = &resting {
            self.emit(MarketEvent::Placed {
                order_id: rested.order_id,
                maker: taker,
                side,
                item_id,
                price: rested.price,
                quantity: rested.quantity,
            });
        }
        if rejected_residual {
            self.emit(MarketEvent::FailedToAddToBook {
                maker: taker,
                side,
                item_id,
                price,
                quantity: outcome.residual,
            });
        }

        self.settle_taker(taker, side, item_id, quantity, &outcome, &resting)?;

        Ok(MatchResult {
            side,
            item_id,
            limit_price: price,
            quantity,
            fills,
            cost: outcome.cost,
            residual: outcome.residual,
            resting,
            rejected_residual,
        })
    }

    /// Move coins and items for a matched taker. Runs strictly after the
    /// book mutations for this order.
    fn settle_taker(
        &self,
        taker: AccountId,
        side: Side,
        item_id: ItemId,
        quantity: u64,
        outcome: &TakeOutcome,
        resting: &Option<RestingOrder>,
    ) -> Result<(), MarketError> {
        let rested_quantity = resting.as_ref().map(|rested| rested.quantity).unwrap_or(0);
        let filled = quantity - outcome.residual;
        match side {
            Side::Buy => {
                let escrow = resting
                    .as_ref()
                    .map(|rested| rested.quantity as u128 * rested.price as u128)
                    .unwrap_or(0);
                let due = outcome.cost + escrow;
                if due > 0 {
                    self.coins.transfer_to_core(taker, due)?;
                }
                if filled > 0 {
                    self.items
                        .transfer_batch_from_core(taker, &[(item_id, filled)])?;
                }
            }
            Side::Sell => {
                let delivered = filled + rested_quantity;
                if delivered > 0 {
                    self.items
                        .transfer_batch_to_core(taker, &[(item_id, delivered)])?;
                }
                if outcome.cost > 0 {
                    self.distribute_proceeds(taker, outcome.cost)?;
                }
            }
        }
        Ok(())
    }
}
