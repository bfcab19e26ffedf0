use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
    error::TokenError,
    event::{Event, EventLog},
    primitives::{Amount, Principal, UNLIMITED},
};

/// Balances, allowances and total supply.
///
/// Every operation validates before it writes, so an `Err` leaves the ledger
/// and the event log untouched. Zero balances and allowances are not stored.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    total_supply: Amount,
    balances: BTreeMap<Principal, Amount>,
    allowances: BTreeMap<(Principal, Principal), Amount>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Principal, spender: &Principal) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn balances(&self) -> &BTreeMap<Principal, Amount> {
        &self.balances
    }

    pub fn allowances(&self) -> &BTreeMap<(Principal, Principal), Amount> {
        &self.allowances
    }

    pub fn transfer(
        &mut self,
        from: Principal,
        to: Principal,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), TokenError> {
        if from.is_null() || to.is_null() {
            return Err(TokenError::InvalidPrincipal);
        }
        self.move_units(from, to, amount)?;
        debug!(%from, %to, %amount, "transfer");
        events.emit(Event::Transfer { from, to, amount });
        Ok(())
    }

    pub fn approve(
        &mut self,
        owner: Principal,
        spender: Principal,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), TokenError> {
        if owner.is_null() || spender.is_null() {
            return Err(TokenError::InvalidPrincipal);
        }
        self.set_allowance(owner, spender, amount);
        debug!(%owner, %spender, %amount, "approval");
        events.emit(Event::Approval {
            owner,
            spender,
            amount,
        });
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        spender: Principal,
        owner: Principal,
        to: Principal,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), TokenError> {
        if spender.is_null() || owner.is_null() || to.is_null() {
            return Err(TokenError::InvalidPrincipal);
        }
        let allowed = self.allowance(&owner, &spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance { owner, spender });
        }
        self.move_units(owner, to, amount)?;
        debug!(%spender, from = %owner, %to, %amount, "delegated transfer");
        events.emit(Event::Transfer {
            from: owner,
            to,
            amount,
        });

        if allowed != UNLIMITED {
            // allowed >= amount was checked above
            let remaining = allowed - amount;
            self.set_allowance(owner, spender, remaining);
            events.emit(Event::Approval {
                owner,
                spender,
                amount: remaining,
            });
        }
        Ok(())
    }

    pub fn mint(
        &mut self,
        to: Principal,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), TokenError> {
        if to.is_null() {
            return Err(TokenError::InvalidPrincipal);
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;
        self.total_supply = supply;
        self.set_balance(to, balance);
        debug!(%to, %amount, %supply, "mint");
        events.emit(Event::Transfer {
            from: Principal::NULL,
            to,
            amount,
        });
        Ok(())
    }

    pub fn burn(
        &mut self,
        from: Principal,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), TokenError> {
        if from.is_null() {
            return Err(TokenError::InvalidPrincipal);
        }
        let balance = self
            .balance_of(&from)
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance { account: from })?;
        // sum of balances == total supply, so this only fails on a broken invariant
        let supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance { account: from })?;
        self.set_balance(from, balance);
        self.total_supply = supply;
        debug!(%from, %amount, %supply, "burn");
        events.emit(Event::Transfer {
            from,
            to: Principal::NULL,
            amount,
        });
        Ok(())
    }

    /// Debits `from` and credits `to`, computing both results before writing.
    fn move_units(
        &mut self,
        from: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let debited = self
            .balance_of(&from)
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance { account: from })?;
        let credit_base = if from == to {
            debited
        } else {
            self.balance_of(&to)
        };
        let credited = credit_base
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;
        self.set_balance(from, debited);
        self.set_balance(to, credited);
        Ok(())
    }

    fn set_balance(&mut self, account: Principal, amount: Amount) {
        if amount.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    fn set_allowance(&mut self, owner: Principal, spender: Principal, amount: Amount) {
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }
}

pub(crate) fn balance_leaf(account: &Principal, amount: &Amount) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"bal");
    hasher.update(account.as_bytes());
    hasher.update(amount_bytes(amount));
    hasher.finalize().into()
}

pub(crate) fn allowance_leaf(owner: &Principal, spender: &Principal, amount: &Amount) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"allow");
    hasher.update(owner.as_bytes());
    hasher.update(spender.as_bytes());
    hasher.update(amount_bytes(amount));
    hasher.finalize().into()
}

fn amount_bytes(amount: &Amount) -> [u8; 32] {
    let mut buf = [0u8; 32];
    amount.to_big_endian(&mut buf);
    buf
}

pub(crate) fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"eegg-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
