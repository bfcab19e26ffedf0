#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use eegg_ledger::{Amount, Principal, Role, Token, TokenConfig};
use rand::rngs::OsRng;

/// A fresh principal backed by a random ed25519 key.
pub fn account() -> Principal {
    SigningKey::generate(&mut OsRng).verifying_key().into()
}

pub fn amt(n: u64) -> Amount {
    Amount::from(n)
}

/// Deploys a default token; returns it with its deployer (the first admin)
/// and two unprivileged accounts.
pub fn deploy() -> anyhow::Result<(Token, Principal, Principal, Principal)> {
    let owner = account();
    let token = Token::new(TokenConfig::default(), owner)?;
    Ok((token, owner, account(), account()))
}

pub fn role_foo() -> Role {
    Role::named("ROLE_FOO")
}

pub fn balance_sum(token: &Token) -> Amount {
    token
        .snapshot()
        .balances
        .iter()
        .fold(Amount::zero(), |acc, entry| acc + entry.amount)
}

pub fn admin_count(token: &Token) -> usize {
    token.admins().count()
}
