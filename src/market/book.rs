//! Core market state: per-item books, maker table, claimable ledgers.
//!
//! Each item id owns an independent book with a bid side and an ask side.
//! A side pairs an ordered price index with the packed level storage; the
//! DashMap entry lock around each `ItemBook` is the critical section that
//! serialises every mutation of that book, so concurrent readers never
//! observe a partial rewrite.

use super::error::MarketError;
use super::events::{EventListener, MarketEvent};
use super::fees::FeeConfig;
use crate::ledger::{CoinLedger, ItemCustody, RoyaltyOracle};
use crate::pricetree::PriceTree;
use crate::segments::Level;
use crate::types::{AccountId, ItemConfig, ItemId, NodeInfo, OrderId, OrderInfo, Side};
use crate::utils::TransactionIdGenerator;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::trace;

/// Default bound on resting orders per price level; a multiple of the
/// four-slot segment width.
pub const DEFAULT_MAX_ORDERS_PER_PRICE: u32 = 100;

/// One side of one item's book: the price index plus per-price storage.
#[derive(Debug, Default)]
pub(super) struct BookSide {
    pub(super) tree: PriceTree,
    pub(super) levels: HashMap<u64, Level>,
}

impl BookSide {
    /// Non-mutating order lookup; the validation half of cancellation.
    /// Returns the order's resting quantity.
    pub(super) fn lookup(
        &self,
        side: Side,
        item_id: ItemId,
        price: u64,
        order_id: OrderId,
    ) -> Result<u64, MarketError> {
        let Some(level) = self.levels.get(&price) else {
            return Err(MarketError::OrderNotFoundInTree {
                side,
                item_id,
                price,
            });
        };
        let offset = self.tree.offset(price).unwrap_or(0);
        let (segment, slot) = level
            .locate(offset, order_id)
            .ok_or(MarketError::OrderNotFound(order_id))?;
        Ok(level.segment(segment).slot(slot).quantity)
    }

    /// Surgically remove one order from its level. Retires the level when
    /// its last active segment goes. Returns the removed quantity.
    pub(super) fn cancel(
        &mut self,
        side: Side,
        item_id: ItemId,
        price: u64,
        order_id: OrderId,
    ) -> Result<u64, MarketError> {
        let offset = self.tree.offset(price).unwrap_or(0);
        let Some(level) = self.levels.get_mut(&price) else {
            return Err(MarketError::OrderNotFoundInTree {
                side,
                item_id,
                price,
            });
        };
        let (segment, slot) = level
            .locate(offset, order_id)
            .ok_or(MarketError::OrderNotFound(order_id))?;
        let quantity = level.remove(segment, slot);
        if level.segment_count() <= offset as usize {
            self.levels.remove(&price);
            self.tree.remove(price);
        }
        Ok(quantity)
    }

    /// Rest an order at `price`, walking tick by tick when levels are full:
    /// down for bids, up for asks, stopping at the first absent or non-full
    /// price. Returns the price actually written, or `None` when the walk
    /// stepped past the edge of the price domain.
    pub(super) fn insert_order(
        &mut self,
        side: Side,
        price: u64,
        tick: u64,
        order_id: OrderId,
        quantity: u64,
        max_orders: u32,
    ) -> Option<u64> {
        let mut candidate = price;
        loop {
            if !self.levels.contains_key(&candidate) {
                self.tree.insert(candidate);
                self.levels.insert(candidate, Level::new(order_id, quantity));
                return Some(candidate);
            }
            let offset = self.tree.offset(candidate).unwrap_or(0);
            let level = self.levels.get_mut(&candidate)?;
            if !level.is_full(offset, max_orders) {
                level.append(order_id, quantity);
                return Some(candidate);
            }
            candidate = match side {
                Side::Buy => candidate.checked_sub(tick).filter(|stepped| *stepped > 0)?,
                Side::Sell => candidate.checked_add(tick)?,
            };
        }
    }

    /// Concrete orders resting at a price, in time order.
    pub(super) fn orders_at(&self, price: u64) -> Vec<(OrderId, u64)> {
        let Some(level) = self.levels.get(&price) else {
            return Vec::new();
        };
        let offset = self.tree.offset(price).unwrap_or(0);
        level
            .iter_from(offset)
            .map(|slot| (slot.id, slot.quantity))
            .collect()
    }

    pub(super) fn node(&self, price: u64) -> Option<NodeInfo> {
        let tombstone_offset = self.tree.offset(price)?;
        let segments = self
            .levels
            .get(&price)
            .map(|level| level.segment_count() as u32)
            .unwrap_or(0);
        Some(NodeInfo {
            price,
            tombstone_offset,
            segments,
        })
    }
}

/// Everything the engine tracks for one item id.
#[derive(Debug)]
pub(super) struct ItemBook {
    pub(super) config: ItemConfig,
    pub(super) bids: BookSide,
    pub(super) asks: BookSide,
}

impl ItemBook {
    pub(super) fn new(config: ItemConfig) -> Self {
        ItemBook {
            config,
            bids: BookSide::default(),
            asks: BookSide::default(),
        }
    }

    pub(super) fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(super) fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

/// The matching engine and its external interface.
///
/// Generic over the collaborators it settles against: the coin ledger, the
/// item custody layer and the royalty oracle. All collaborator calls happen
/// after the book mutations for a command have been applied.
pub struct Market<C, V, R> {
    pub(super) books: DashMap<ItemId, ItemBook>,

    /// Order id to maker; written once per order, never reassigned.
    pub(super) makers: DashMap<OrderId, AccountId>,

    /// Gross coin proceeds of resting sells that matched, per order id.
    pub(super) claimable_coins: DashMap<OrderId, u128>,

    /// Items delivered to resting buys that matched, per order and item.
    pub(super) claimable_items: DashMap<(OrderId, ItemId), u64>,

    /// Process-wide order id counter; advances only when a residual rests.
    pub(super) next_order_id: AtomicU64,

    pub(super) max_orders_per_price: AtomicU32,

    pub(super) fees: RwLock<FeeConfig>,

    pub(super) coins: C,
    pub(super) items: V,
    pub(super) royalty: R,

    pub(super) transaction_ids: TransactionIdGenerator,
    pub(super) event_listener: Option<EventListener>,
}

impl<C, V, R> Market<C, V, R>
where
    C: CoinLedger,
    V: ItemCustody,
    R: RoyaltyOracle,
{
    pub fn new(coins: C, items: V, royalty: R) -> Self {
        Market {
            books: DashMap::new(),
            makers: DashMap::new(),
            claimable_coins: DashMap::new(),
            claimable_items: DashMap::new(),
            next_order_id: AtomicU64::new(1),
            max_orders_per_price: AtomicU32::new(DEFAULT_MAX_ORDERS_PER_PRICE),
            fees: RwLock::new(FeeConfig::default()),
            coins,
            items,
            royalty,
            transaction_ids: TransactionIdGenerator::new(),
            event_listener: None,
        }
    }

    /// Construct with an event listener that observes every fill, placement,
    /// rejection, cancellation and claim.
    pub fn with_event_listener(coins: C, items: V, royalty: R, listener: EventListener) -> Self {
        let mut market = Self::new(coins, items, royalty);
        market.event_listener = Some(listener);
        market
    }

    /// Register an event listener after construction.
    pub fn set_event_listener(&mut self, listener: EventListener) {
        self.event_listener = Some(listener);
    }

    pub(super) fn emit(&self, event: MarketEvent) {
        trace!(?event, "market event");
        if let Some(listener) = self.event_listener {
            listener(&event);
        }
    }

    pub(super) fn alloc_order_id(&self) -> OrderId {
        OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(super) fn fee_config_snapshot(&self) -> FeeConfig {
        match self.fees.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Pay `gross` out of core custody to `to`, with the current fee split
    /// carved out first. Returns the net amount delivered.
    pub(super) fn distribute_proceeds(&self, to: AccountId, gross: u128) -> Result<u128, MarketError> {
        let fees = self.fee_config_snapshot();
        let split = fees.split(gross);
        let net = gross - split.total();
        if net > 0 {
            self.coins.transfer_from_core(to, net)?;
        }
        if split.royalty > 0 {
            self.coins.transfer_from_core(fees.royalty_recipient, split.royalty)?;
        }
        if split.dev > 0 {
            self.coins.transfer_from_core(fees.dev_recipient, split.dev)?;
        }
        if split.burn > 0 {
            self.coins.burn(split.burn)?;
        }
        Ok(net)
    }

    /// The coin ledger collaborator.
    pub fn coins(&self) -> &C {
        &self.coins
    }

    /// The item custody collaborator.
    pub fn items(&self) -> &V {
        &self.items
    }

    // --- queries ---

    /// Best bid for an item, if any.
    pub fn highest_bid(&self, item_id: ItemId) -> Option<u64> {
        self.books.get(&item_id)?.bids.tree.last()
    }

    /// Best ask for an item, if any.
    pub fn lowest_ask(&self, item_id: ItemId) -> Option<u64> {
        self.books.get(&item_id)?.asks.tree.first()
    }

    /// Spread between best ask and best bid.
    pub fn spread(&self, item_id: ItemId) -> Option<u64> {
        match (self.highest_bid(item_id), self.lowest_ask(item_id)) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Mid price (average of best bid and best ask).
    pub fn mid_price(&self, item_id: ItemId) -> Option<f64> {
        match (self.highest_bid(item_id), self.lowest_ask(item_id)) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Concrete orders resting at a price, active segments only, in time
    /// order.
    pub fn all_orders_at_price(&self, side: Side, item_id: ItemId, price: u64) -> Vec<OrderInfo> {
        let Some(book) = self.books.get(&item_id) else {
            return Vec::new();
        };
        book.side(side)
            .orders_at(price)
            .into_iter()
            .map(|(order_id, quantity)| OrderInfo {
                order_id,
                maker: self.maker_of(order_id).unwrap_or(AccountId::ZERO),
                price,
                quantity,
            })
            .collect()
    }

    /// Price-level metadata, tombstone offset included.
    pub fn node(&self, side: Side, item_id: ItemId, price: u64) -> Option<NodeInfo> {
        self.books.get(&item_id)?.side(side).node(price)
    }

    pub fn maker_of(&self, order_id: OrderId) -> Option<AccountId> {
        self.makers.get(&order_id).map(|maker| *maker)
    }

    /// Claimable coin proceeds per order id, optionally with the current fee
    /// split applied per order.
    pub fn coins_claimable(&self, order_ids: &[OrderId], apply_fees: bool) -> Vec<u128> {
        let fees = self.fee_config_snapshot();
        order_ids
            .iter()
            .map(|order_id| {
                let gross = self
                    .claimable_coins
                    .get(order_id)
                    .map(|amount| *amount)
                    .unwrap_or(0);
                if apply_fees { fees.net(gross) } else { gross }
            })
            .collect()
    }

    /// Claimable item balances for parallel `(order_id, item_id)` arrays.
    pub fn items_claimable(
        &self,
        order_ids: &[OrderId],
        item_ids: &[ItemId],
    ) -> Result<Vec<u64>, MarketError> {
        if order_ids.len() != item_ids.len() {
            return Err(MarketError::LengthMismatch);
        }
        Ok(order_ids
            .iter()
            .zip(item_ids)
            .map(|(order_id, item_id)| {
                self.claimable_items
                    .get(&(*order_id, *item_id))
                    .map(|quantity| *quantity)
                    .unwrap_or(0)
            })
            .collect())
    }

    pub fn item_config(&self, item_id: ItemId) -> Option<ItemConfig> {
        self.books.get(&item_id).map(|book| book.config)
    }

    pub fn fee_config(&self) -> FeeConfig {
        self.fee_config_snapshot()
    }

    pub fn max_orders_per_price(&self) -> u32 {
        self.max_orders_per_price.load(Ordering::Relaxed)
    }

    /// The next order id that will be assigned.
    pub fn next_order_id(&self) -> u64 {
        self.next_order_id.load(Ordering::Relaxed)
    }
}
