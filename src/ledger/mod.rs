//! Seams to the asset custody layer, the coin ledger and the royalty
//! oracle.
//!
//! The engine never holds balances itself; it instructs these collaborators
//! once all book mutations for a command have been applied. Implementations
//! must be transactional with respect to that state change. The in-memory
//! implementations below back the test suite and benches, and serve hosts
//! that embed the engine without a real ledger.

use crate::types::{AccountId, ItemId};
use dashmap::DashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

fn lock(counter: &Mutex<u128>) -> MutexGuard<'_, u128> {
    match counter.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Failure raised by a collaborator transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    InsufficientCoins { needed: u128, available: u128 },
    InsufficientItems { item_id: ItemId, needed: u64, available: u64 },
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::InsufficientCoins { needed, available } => {
                write!(f, "insufficient coins: needed {needed}, available {available}")
            }
            TransferError::InsufficientItems {
                item_id,
                needed,
                available,
            } => {
                write!(
                    f,
                    "insufficient items of {item_id}: needed {needed}, available {available}"
                )
            }
        }
    }
}

impl std::error::Error for TransferError {}

/// Fungible payment units.
pub trait CoinLedger: Send + Sync {
    /// Pull coins from `from` into the engine's custody.
    fn transfer_to_core(&self, from: AccountId, amount: u128) -> Result<(), TransferError>;

    /// Pay coins out of the engine's custody.
    fn transfer_from_core(&self, to: AccountId, amount: u128) -> Result<(), TransferError>;

    /// Destroy coins held by the engine.
    fn burn(&self, amount: u128) -> Result<(), TransferError>;
}

/// Semi-fungible item custody.
pub trait ItemCustody: Send + Sync {
    /// Move items from `from` into the engine's custody.
    fn transfer_batch_to_core(
        &self,
        from: AccountId,
        entries: &[(ItemId, u64)],
    ) -> Result<(), TransferError>;

    /// Deliver items out of the engine's custody.
    fn transfer_batch_from_core(
        &self,
        to: AccountId,
        entries: &[(ItemId, u64)],
    ) -> Result<(), TransferError>;
}

/// Royalty information source, queried when the cached royalty config is
/// refreshed.
pub trait RoyaltyOracle: Send + Sync {
    /// Recipient and royalty amount owed on a sale of `gross`.
    fn info(&self, item_id: ItemId, gross: u128) -> (AccountId, u128);
}

/// In-memory coin ledger.
#[derive(Debug, Default)]
pub struct MemoryCoinLedger {
    balances: DashMap<AccountId, u128>,
    core: Mutex<u128>,
    burned: Mutex<u128>,
}

impl MemoryCoinLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, to: AccountId, amount: u128) {
        *self.balances.entry(to).or_insert(0) += amount;
    }

    pub fn balance_of(&self, who: AccountId) -> u128 {
        self.balances.get(&who).map(|balance| *balance).unwrap_or(0)
    }

    /// Coins currently escrowed by the engine.
    pub fn core_balance(&self) -> u128 {
        *lock(&self.core)
    }

    /// Total coins destroyed so far.
    pub fn burned(&self) -> u128 {
        *lock(&self.burned)
    }
}

impl CoinLedger for MemoryCoinLedger {
    fn transfer_to_core(&self, from: AccountId, amount: u128) -> Result<(), TransferError> {
        let mut balance = self.balances.entry(from).or_insert(0);
        if *balance < amount {
            return Err(TransferError::InsufficientCoins {
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        drop(balance);
        *lock(&self.core) += amount;
        Ok(())
    }

    fn transfer_from_core(&self, to: AccountId, amount: u128) -> Result<(), TransferError> {
        let mut core = lock(&self.core);
        if *core < amount {
            return Err(TransferError::InsufficientCoins {
                needed: amount,
                available: *core,
            });
        }
        *core -= amount;
        drop(core);
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }

    fn burn(&self, amount: u128) -> Result<(), TransferError> {
        let mut core = lock(&self.core);
        if *core < amount {
            return Err(TransferError::InsufficientCoins {
                needed: amount,
                available: *core,
            });
        }
        *core -= amount;
        drop(core);
        *lock(&self.burned) += amount;
        Ok(())
    }
}

/// In-memory item custody.
#[derive(Debug, Default)]
pub struct MemoryItemCustody {
    holdings: DashMap<(AccountId, ItemId), u64>,
    core: DashMap<ItemId, u64>,
}

impl MemoryItemCustody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, to: AccountId, item_id: ItemId, quantity: u64) {
        *self.holdings.entry((to, item_id)).or_insert(0) += quantity;
    }

    pub fn balance_of(&self, who: AccountId, item_id: ItemId) -> u64 {
        self.holdings
            .get(&(who, item_id))
            .map(|quantity| *quantity)
            .unwrap_or(0)
    }

    /// Items of one class currently escrowed by the engine.
    pub fn core_balance(&self, item_id: ItemId) -> u64 {
        self.core.get(&item_id).map(|quantity| *quantity).unwrap_or(0)
    }
}

impl ItemCustody for MemoryItemCustody {
    fn transfer_batch_to_core(
        &self,
        from: AccountId,
        entries: &[(ItemId, u64)],
    ) -> Result<(), TransferError> {
        for &(item_id, needed) in entries {
            let available = self.balance_of(from, item_id);
            if available < needed {
                return Err(TransferError::InsufficientItems {
                    item_id,
                    needed,
                    available,
                });
            }
        }
        for &(item_id, quantity) in entries {
            *self.holdings.entry((from, item_id)).or_insert(0) -= quantity;
            *self.core.entry(item_id).or_insert(0) += quantity;
        }
        Ok(())
    }

    fn transfer_batch_from_core(
        &self,
        to: AccountId,
        entries: &[(ItemId, u64)],
    ) -> Result<(), TransferError> {
        for &(item_id, needed) in entries {
            let available = self.core_balance(item_id);
            if available < needed {
                return Err(TransferError::InsufficientItems {
                    item_id,
                    needed,
                    available,
                });
            }
        }
        for &(item_id, quantity) in entries {
            *self.core.entry(item_id).or_insert(0) -= quantity;
            *self.holdings.entry((to, item_id)).or_insert(0) += quantity;
        }
        Ok(())
    }
}

/// Oracle returning a fixed basis-point royalty to a fixed recipient.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoyaltyOracle {
    pub recipient: AccountId,
    pub rate_bps: u16,
}

impl FixedRoyaltyOracle {
    pub fn new(recipient: AccountId, rate_bps: u16) -> Self {
        FixedRoyaltyOracle { recipient, rate_bps }
    }

    /// No royalty at all.
    pub fn none() -> Self {
        FixedRoyaltyOracle {
            recipient: AccountId::ZERO,
            rate_bps: 0,
        }
    }
}

impl RoyaltyOracle for FixedRoyaltyOracle {
    fn info(&self, _item_id: ItemId, gross: u128) -> (AccountId, u128) {
        (self.recipient, gross * self.rate_bps as u128 / 10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_ledger_round_trip() {
        let ledger = MemoryCoinLedger::new();
        let alice = AccountId(1);
        ledger.mint(alice, 1_000);

        ledger.transfer_to_core(alice, 400).unwrap();
        assert_eq!(ledger.balance_of(alice), 600);
        assert_eq!(ledger.core_balance(), 400);

        ledger.transfer_from_core(alice, 150).unwrap();
        assert_eq!(ledger.balance_of(alice), 750);
        assert_eq!(ledger.core_balance(), 250);

        ledger.burn(250).unwrap();
        assert_eq!(ledger.core_balance(), 0);
        assert_eq!(ledger.burned(), 250);
    }

    #[test]
    fn coin_ledger_rejects_overdraw() {
        let ledger = MemoryCoinLedger::new();
        let alice = AccountId(1);
        ledger.mint(alice, 10);

        let err = ledger.transfer_to_core(alice, 11).unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientCoins {
                needed: 11,
                available: 10
            }
        );
        assert_eq!(ledger.balance_of(alice), 10);
    }

    #[test]
    fn item_custody_batches_are_all_or_nothing() {
        let custody = MemoryItemCustody::new();
        let alice = AccountId(1);
        custody.mint(alice, 7, 5);
        custody.mint(alice, 9, 1);

        let err = custody
            .transfer_batch_to_core(alice, &[(7, 5), (9, 2)])
            .unwrap_err();
        assert!(matches!(err, TransferError::InsufficientItems { item_id: 9, .. }));
        // First entry must not have moved.
        assert_eq!(custody.balance_of(alice, 7), 5);
        assert_eq!(custody.core_balance(7), 0);

        custody.transfer_batch_to_core(alice, &[(7, 5), (9, 1)]).unwrap();
        assert_eq!(custody.core_balance(7), 5);
        assert_eq!(custody.core_balance(9), 1);
    }

    #[test]
    fn fixed_oracle_scales_with_gross() {
        let oracle = FixedRoyaltyOracle::new(AccountId(9), 250);
        let (recipient, amount) = oracle.info(1, 10_000);
        assert_eq!(recipient, AccountId(9));
        assert_eq!(amount, 250);
        assert_eq!(oracle.info(1, 40_000).1, 1_000);
    }
}
