//! Core identifier and configuration types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a resting order.
///
/// Ids are assigned from a process-wide monotone counter starting at 1 and
/// occupy 40 bits so they pack into a segment slot. Id 0 is the empty-slot
/// sentinel and never names a real order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct OrderId(u64);

impl OrderId {
    /// The empty-slot sentinel.
    pub const NONE: OrderId = OrderId(0);

    /// Largest representable id (40-bit field).
    pub const MAX: u64 = (1 << 40) - 1;

    pub fn new(raw: u64) -> Self {
        debug_assert!(raw <= Self::MAX, "order id exceeds 40-bit field");
        OrderId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a market participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct AccountId(pub u64);

impl AccountId {
    /// The zero identity; only valid as a disabled fee recipient.
    pub const ZERO: AccountId = AccountId(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account:{}", self.0)
    }
}

/// Identifier of a semi-fungible asset class. Each item id has its own book.
pub type ItemId = u64;

/// Which side of the book an order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Bid: pays coins, receives items.
    Buy,
    /// Ask: delivers items, receives coins.
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Per-item configuration. `tick == 0` means the item is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemConfig {
    /// Minimum price increment; every order price must be a multiple.
    /// Immutable once set non-zero.
    pub tick: u64,
    /// Smallest remainder permitted to rest on the book.
    pub min_quantity: u64,
}

impl ItemConfig {
    pub fn is_enabled(&self) -> bool {
        self.tick != 0
    }
}

/// One limit order as submitted by a taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub side: Side,
    pub item_id: ItemId,
    /// Price cap (buy) or floor (sell); must be a positive multiple of the
    /// item's tick.
    pub price: u64,
    pub quantity: u64,
}

/// Where a resting order lives; pairs with its id in cancellation batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLocation {
    pub side: Side,
    pub item_id: ItemId,
    pub price: u64,
}

/// A concrete resting order as reported by book queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub order_id: OrderId,
    pub maker: AccountId,
    pub price: u64,
    pub quantity: u64,
}

/// Price-level metadata exposed by the `node` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub price: u64,
    /// Leading segments that are fully consumed and skipped by all scans.
    pub tombstone_offset: u32,
    /// Total segments allocated at this level, tombstoned ones included.
    pub segments: u32,
}
