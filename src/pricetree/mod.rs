//! Ordered price index.
//!
//! One tree per `(side, item)` book side maps each active price to its
//! level's tombstone offset. Find-min drives ask matching, find-max drives
//! bid matching; insert and remove track level creation and retirement.

mod tree;

pub use tree::{Iter, IterRev, PriceTree};
