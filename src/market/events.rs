//! Observable market events.
//!
//! Hosts register a listener to mirror fills and book changes into their own
//! plumbing. The `FailedToAddToBook` event is load-bearing: a residual below
//! the item's minimum quantity is rejected without failing the call, and
//! this event is the only signal of that rejection.

use crate::types::{AccountId, ItemId, OrderId, Side};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Callback invoked synchronously for every event.
pub type EventListener = fn(&MarketEvent);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// A taker fill against one resting order.
    Filled {
        transaction_id: Uuid,
        maker_order_id: OrderId,
        taker: AccountId,
        taker_side: Side,
        item_id: ItemId,
        price: u64,
        quantity: u64,
    },

    /// A residual rested on the book as a new order.
    Placed {
        order_id: OrderId,
        maker: AccountId,
        side: Side,
        item_id: ItemId,
        /// Actual resting price; may differ from the requested price when
        /// the level was full and the order walked to the next tick.
        price: u64,
        quantity: u64,
    },

    /// A residual below the item's minimum quantity was dropped. The matched
    /// portion of the order still stands.
    FailedToAddToBook {
        maker: AccountId,
        side: Side,
        item_id: ItemId,
        price: u64,
        quantity: u64,
    },

    /// A resting order was cancelled and its economics refunded.
    Canceled {
        order_id: OrderId,
        maker: AccountId,
        side: Side,
        item_id: ItemId,
        price: u64,
        quantity: u64,
    },

    /// Sale proceeds were claimed, with the current fee split applied.
    CoinsClaimed {
        maker: AccountId,
        orders: u32,
        gross: u128,
        net: u128,
    },

    /// Bought items were claimed.
    ItemsClaimed {
        maker: AccountId,
        orders: u32,
    },

    /// The cached royalty configuration was refreshed from the oracle.
    RoyaltyUpdated {
        recipient: AccountId,
        rate: u16,
    },
}
