//! # Item Marketplace Matching Engine
//!
//! A limit-order matching engine that pairs fungible payment units
//! ("coins") against multi-instance semi-fungible assets ("items"). Each
//! item id owns an independent book; limit orders match against resting
//! liquidity at acceptable prices, rest their remainders, and accrue
//! claimable proceeds that makers later pull.
//!
//! ## Key Features
//!
//! - **Packed price levels**: orders at one price live in 256-bit segments
//!   of four `(quantity, id)` slots, with a per-level tombstone offset that
//!   retires fully consumed segments in O(1).
//!
//! - **Red-black price index**: per-side ordered index over active prices
//!   driving find-min/find-max matching, with the tombstone counter stored
//!   on the node so matching never reshapes the tree.
//!
//! - **Strict ordering discipline**: price priority, then time priority,
//!   then maker-id priority — monotone order ids double as the in-level
//!   sort key, which is what makes cancellation a binary search.
//!
//! - **Bounded levels**: a full price level overflows to the next tick
//!   instead of growing without bound.
//!
//! - **Pull-style claims**: per-order accumulators for coin proceeds and
//!   delivered items, with the fee split (royalty, platform, burn) applied
//!   at claim time against current rates.
//!
//! - **Collaborator seams**: coin ledger, item custody and royalty oracle
//!   are traits the engine settles against only after its own state is
//!   consistent.
//!
//! ## Status
//!
//! This engine is the core of a marketplace; custody, access control and
//! batch dispatch live with the embedding host.

pub mod ledger;
pub mod market;
pub mod pricetree;
pub mod segments;
pub mod types;

mod utils;

pub use ledger::{
    CoinLedger, FixedRoyaltyOracle, ItemCustody, MemoryCoinLedger, MemoryItemCustody,
    RoyaltyOracle, TransferError,
};
pub use market::{
    BookSnapshot, DEFAULT_MAX_ORDERS_PER_PRICE, EventListener, FEE_BASIS, FeeConfig, FeeSplit,
    Fill, LevelSnapshot, MAX_CLAIM_ORDERS, MAX_MATCHES_PER_CALL, Market, MarketError, MarketEvent,
    MatchResult, RestingOrder,
};
pub use types::{
    AccountId, ItemConfig, ItemId, LimitOrder, NodeInfo, OrderId, OrderInfo, OrderLocation, Side,
};
pub use utils::current_time_millis;
