//! Depth snapshots for market data

use super::book::Market;
use crate::ledger::{CoinLedger, ItemCustody, RoyaltyOracle};
use crate::types::{AccountId, ItemId, OrderInfo};
use crate::utils::current_time_millis;
use serde::{Deserialize, Serialize};

/// One price level with its concrete orders, active segments only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: u64,
    pub tombstone_offset: u32,
    pub orders: Vec<OrderInfo>,
    pub total_quantity: u64,
}

/// A snapshot of one item's book at a specific point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub item_id: ItemId,
    /// Milliseconds since epoch at capture time.
    pub timestamp: u64,
    /// Bid levels, best (highest) first.
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    /// Best bid price and quantity.
    pub fn best_bid(&self) -> Option<(u64, u64)> {
        self.bids
            .first()
            .map(|level| (level.price, level.total_quantity))
    }

    /// Best ask price and quantity.
    pub fn best_ask(&self) -> Option<(u64, u64)> {
        self.asks
            .first()
            .map(|level| (level.price, level.total_quantity))
    }

    /// Spread (best ask - best bid).
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Total quantity resting on the bid side.
    pub fn total_bid_quantity(&self) -> u64 {
        self.bids.iter().map(|level| level.total_quantity).sum()
    }

    /// Total quantity resting on the ask side.
    pub fn total_ask_quantity(&self) -> u64 {
        self.asks.iter().map(|level| level.total_quantity).sum()
    }
}

impl<C, V, R> Market<C, V, R>
where
    C: CoinLedger,
    V: ItemCustody,
    R: RoyaltyOracle,
{
    /// Capture the top `depth` levels of each side of an item's book.
    /// Returns `None` for an unregistered item.
    pub fn snapshot(&self, item_id: ItemId, depth: usize) -> Option<BookSnapshot> {
        let book = self.books.get(&item_id)?;

        let bid_prices: Vec<u64> = book
            .bids
            .tree
            .iter_rev()
            .take(depth)
            .map(|(price, _)| price)
            .collect();
        let ask_prices: Vec<u64> = book
            .asks
            .tree
            .iter()
            .take(depth)
            .map(|(price, _)| price)
            .collect();

        let mut bids = Vec::with_capacity(bid_prices.len());
        for price in bid_prices {
            bids.push(self.level_snapshot(&book.bids, price));
        }
        let mut asks = Vec::with_capacity(ask_prices.len());
        for price in ask_prices {
            asks.push(self.level_snapshot(&book.asks, price));
        }

        Some(BookSnapshot {
            item_id,
            timestamp: current_time_millis(),
            bids,
            asks,
        })
    }

    fn level_snapshot(&self, side: &super::book::BookSide, price: u64) -> LevelSnapshot {
        let orders: Vec<OrderInfo> = side
            .orders_at(price)
            .into_iter()
            .map(|(order_id, quantity)| OrderInfo {
                order_id,
                maker: self.maker_of(order_id).unwrap_or(AccountId::ZERO),
                price,
                quantity,
            })
            .collect();
        let total_quantity = orders.iter().map(|order| order.quantity).sum();
        LevelSnapshot {
            price,
            tombstone_offset: side.tree.offset(price).unwrap_or(0),
            orders,
            total_quantity,
        }
    }
}
