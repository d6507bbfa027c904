//! Market error types

use crate::ledger::TransferError;
use crate::types::{ItemId, OrderId, Side};
use std::fmt;

/// Errors that can occur within the market engine. Every variant aborts the
/// whole call with no state change; the only non-fatal condition (a residual
/// below the item's minimum quantity) surfaces as an event instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// Order quantity is zero
    NoQuantity,

    /// Order price is zero
    PriceZero,

    /// Order quantity does not fit the 24-bit slot field
    QuantityOverflow(u64),

    /// The item has no configuration, or its tick is zero
    TokenDoesNotExist(ItemId),

    /// Order price is not a multiple of the item's tick
    PriceNotMultipleOfTick {
        price: u64,
        tick: u64,
    },

    /// Parallel input arrays differ in length
    LengthMismatch,

    /// A single call would touch more resting orders than permitted
    TooManyOrdersHit,

    /// Cancellation referenced a price level that does not exist
    OrderNotFoundInTree {
        side: Side,
        item_id: ItemId,
        price: u64,
    },

    /// The order id is not present in its level
    OrderNotFound(OrderId),

    /// Caller does not own the order
    NotMaker(OrderId),

    /// Claim referenced an order with zero claimable balance
    NothingToClaim(OrderId),

    /// Tick is immutable once set non-zero
    TickCannotBeChanged(ItemId),

    /// `max_orders_per_price` must be a positive multiple of the segment width
    MaxOrdersNotMultiple(u32),

    /// Dev fee rate exceeds its 8-bit storage field
    DevFeeTooHigh(u16),

    /// Burn fee rate reaches or exceeds the fee basis
    BurnFeeTooHigh(u16),

    /// A non-zero fee rate requires a non-zero recipient
    ZeroAddress,

    /// A collaborator transfer failed
    Transfer(TransferError),
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketError::NoQuantity => write!(f, "order quantity is zero"),
            MarketError::PriceZero => write!(f, "order price is zero"),
            MarketError::QuantityOverflow(quantity) => {
                write!(f, "quantity {quantity} exceeds the 24-bit slot field")
            }
            MarketError::TokenDoesNotExist(item_id) => {
                write!(f, "item {item_id} is not registered")
            }
            MarketError::PriceNotMultipleOfTick { price, tick } => {
                write!(f, "price {price} is not a multiple of tick {tick}")
            }
            MarketError::LengthMismatch => write!(f, "parallel input arrays differ in length"),
            MarketError::TooManyOrdersHit => {
                write!(f, "call would touch more resting orders than permitted")
            }
            MarketError::OrderNotFoundInTree {
                side,
                item_id,
                price,
            } => {
                write!(f, "no {side} level at price {price} for item {item_id}")
            }
            MarketError::OrderNotFound(order_id) => write!(f, "order {order_id} not found"),
            MarketError::NotMaker(order_id) => {
                write!(f, "caller is not the maker of order {order_id}")
            }
            MarketError::NothingToClaim(order_id) => {
                write!(f, "nothing to claim for order {order_id}")
            }
            MarketError::TickCannotBeChanged(item_id) => {
                write!(f, "tick of item {item_id} cannot be changed")
            }
            MarketError::MaxOrdersNotMultiple(value) => {
                write!(f, "max orders per price {value} is not a positive multiple of 4")
            }
            MarketError::DevFeeTooHigh(rate) => write!(f, "dev fee rate {rate} is too high"),
            MarketError::BurnFeeTooHigh(rate) => write!(f, "burn fee rate {rate} is too high"),
            MarketError::ZeroAddress => {
                write!(f, "non-zero fee rate requires a non-zero recipient")
            }
            MarketError::Transfer(err) => write!(f, "transfer failed: {err}"),
        }
    }
}

impl std::error::Error for MarketError {}

impl From<TransferError> for MarketError {
    fn from(err: TransferError) -> Self {
        MarketError::Transfer(err)
    }
}
