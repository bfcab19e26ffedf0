//! EEGG token ledger.
//!
//! A deterministic, single-writer state machine tracking fungible balances
//! for a set of principals, with supply creation and destruction gated by a
//! role-based access layer:
//!
//! * [`access`]: role membership; `ROLE_ADMIN` can never be left empty.
//! * [`ledger`]: balances, allowances and total supply with checked 256-bit
//!   arithmetic.
//! * [`token`]: the composed token, its request surface and snapshots.
//! * [`service`]: a lock-serialized handle for concurrent front ends.
//!
//! Every operation either commits and appends its events, or fails with a
//! [`TokenError`] and changes nothing.

pub mod access;
pub mod config;
pub mod event;
pub mod ledger;
pub mod primitives;
pub mod service;
pub mod token;

mod error;

pub use config::{ConfigError, TokenConfig};
pub use error::TokenError;
pub use event::Event;
pub use primitives::{Amount, Principal, Role, UNLIMITED};
pub use service::SharedToken;
pub use token::{Request, Token, TokenSnapshot};
