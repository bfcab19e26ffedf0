use thiserror::Error;

use crate::primitives::{Principal, Role};

/// Reasons a state transition is rejected.
///
/// A rejected operation leaves balances, allowances, role membership and the
/// event log exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Caller lacks the role a restricted operation requires.
    #[error("{caller} does not hold {role:?}")]
    Unauthorized { caller: Principal, role: Role },

    /// The null principal was supplied where a real account is required.
    #[error("null principal is not a valid account")]
    InvalidPrincipal,

    /// A debit would drive a balance below zero.
    #[error("insufficient balance in account {account}")]
    InsufficientBalance { account: Principal },

    /// A delegated spend exceeds the remaining allowance.
    #[error("allowance granted by {owner} to {spender} is insufficient")]
    InsufficientAllowance { owner: Principal, spender: Principal },

    /// A credit or supply increase would exceed 256 bits.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Revoking would leave ROLE_ADMIN without holders.
    #[error("cannot revoke the last ROLE_ADMIN holder")]
    LastAdminProtected,
}
