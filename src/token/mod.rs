use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    access::AccessControl,
    config::TokenConfig,
    error::TokenError,
    event::{Event, EventLog},
    ledger::{allowance_leaf, balance_leaf, build_merkle, Ledger},
    primitives::{Amount, Principal, Role},
};

/// A mutating call submitted by a front end on behalf of some caller.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    GrantRole {
        role: Role,
        account: Principal,
    },
    RevokeRole {
        role: Role,
        account: Principal,
    },
    Transfer {
        to: Principal,
        #[serde(with = "crate::primitives::decimal")]
        amount: Amount,
    },
    Approve {
        spender: Principal,
        #[serde(with = "crate::primitives::decimal")]
        amount: Amount,
    },
    TransferFrom {
        owner: Principal,
        to: Principal,
        #[serde(with = "crate::primitives::decimal")]
        amount: Amount,
    },
    Mint {
        to: Principal,
        #[serde(with = "crate::primitives::decimal")]
        amount: Amount,
    },
    Burn {
        from: Principal,
        #[serde(with = "crate::primitives::decimal")]
        amount: Amount,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceEntry {
    pub account: Principal,
    #[serde(with = "crate::primitives::decimal")]
    pub amount: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowanceEntry {
    pub owner: Principal,
    pub spender: Principal,
    #[serde(with = "crate::primitives::decimal")]
    pub amount: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleEntry {
    pub role: Role,
    pub account: Principal,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "crate::primitives::decimal")]
    pub total_supply: Amount,
    pub balances: Vec<BalanceEntry>,
    pub allowances: Vec<AllowanceEntry>,
    pub roles: Vec<RoleEntry>,
    pub event_count: usize,
    #[serde(with = "hex_root")]
    pub state_root: [u8; 32],
}

/// The token: role membership, accounting and the event log of one instance.
///
/// All state is owned here and only changes through the methods below.
/// Each method either commits fully or returns an error having changed
/// nothing.
#[derive(Clone, Debug)]
pub struct Token {
    config: TokenConfig,
    access: AccessControl,
    ledger: Ledger,
    events: EventLog,
}

impl Token {
    pub fn new(config: TokenConfig, deployer: Principal) -> Result<Self, TokenError> {
        let mut events = EventLog::new();
        let access = AccessControl::new(deployer, &mut events)?;
        let mut ledger = Ledger::new();
        if !config.initial_supply.is_zero() {
            ledger.mint(deployer, config.initial_supply, &mut events)?;
        }
        info!(
            name = %config.name,
            symbol = %config.symbol,
            %deployer,
            supply = %ledger.total_supply(),
            "token deployed"
        );
        Ok(Self {
            config,
            access,
            ledger,
            events,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn has_role(&self, role: &Role, account: &Principal) -> bool {
        self.access.has_role(role, account)
    }

    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: &Principal, spender: &Principal) -> Amount {
        self.ledger.allowance(owner, spender)
    }

    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn events(&self) -> &[Event] {
        self.events.as_slice()
    }

    pub fn admins(&self) -> impl Iterator<Item = &Principal> {
        self.access.members(&Role::ADMIN)
    }

    pub fn grant_role(
        &mut self,
        caller: Principal,
        role: Role,
        account: Principal,
    ) -> Result<(), TokenError> {
        self.access.grant_role(caller, role, account, &mut self.events)
    }

    pub fn revoke_role(
        &mut self,
        caller: Principal,
        role: Role,
        account: Principal,
    ) -> Result<(), TokenError> {
        self.access.revoke_role(caller, role, account, &mut self.events)
    }

    pub fn transfer(
        &mut self,
        caller: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.transfer(caller, to, amount, &mut self.events)
    }

    pub fn approve(
        &mut self,
        caller: Principal,
        spender: Principal,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.approve(caller, spender, amount, &mut self.events)
    }

    pub fn transfer_from(
        &mut self,
        caller: Principal,
        owner: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger
            .transfer_from(caller, owner, to, amount, &mut self.events)
    }

    pub fn mint(
        &mut self,
        caller: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.access.ensure_role(&Role::ADMIN, &caller)?;
        self.ledger.mint(to, amount, &mut self.events)
    }

    pub fn burn(
        &mut self,
        caller: Principal,
        from: Principal,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.access.ensure_role(&Role::ADMIN, &caller)?;
        self.ledger.burn(from, amount, &mut self.events)
    }

    /// Applies one request and returns the events it emitted, in order.
    pub fn apply(
        &mut self,
        caller: Principal,
        request: &Request,
    ) -> Result<Vec<Event>, TokenError> {
        let mark = self.events.len();
        let outcome = match *request {
            Request::GrantRole { role, account } => self.grant_role(caller, role, account),
            Request::RevokeRole { role, account } => self.revoke_role(caller, role, account),
            Request::Transfer { to, amount } => self.transfer(caller, to, amount),
            Request::Approve { spender, amount } => self.approve(caller, spender, amount),
            Request::TransferFrom { owner, to, amount } => {
                self.transfer_from(caller, owner, to, amount)
            }
            Request::Mint { to, amount } => self.mint(caller, to, amount),
            Request::Burn { from, amount } => self.burn(caller, from, amount),
        };
        match outcome {
            Ok(()) => {
                let emitted = self.events.since(mark).to_vec();
                debug!(%caller, ?request, events = emitted.len(), "request committed");
                Ok(emitted)
            }
            Err(err) => {
                warn!(%caller, ?request, %err, "request rejected");
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            name: self.config.name.clone(),
            symbol: self.config.symbol.clone(),
            decimals: self.config.decimals,
            total_supply: self.ledger.total_supply(),
            balances: self
                .ledger
                .balances()
                .iter()
                .map(|(account, amount)| BalanceEntry {
                    account: *account,
                    amount: *amount,
                })
                .collect(),
            allowances: self
                .ledger
                .allowances()
                .iter()
                .map(|((owner, spender), amount)| AllowanceEntry {
                    owner: *owner,
                    spender: *spender,
                    amount: *amount,
                })
                .collect(),
            roles: self
                .access
                .memberships()
                .map(|(role, account)| RoleEntry {
                    role: *role,
                    account: *account,
                })
                .collect(),
            event_count: self.events.len(),
            state_root: self.state_root(),
        }
    }

    pub fn state_root(&self) -> [u8; 32] {
        let mut leaves: Vec<[u8; 32]> = Vec::new();
        for (account, amount) in self.ledger.balances() {
            leaves.push(balance_leaf(account, amount));
        }
        for ((owner, spender), amount) in self.ledger.allowances() {
            leaves.push(allowance_leaf(owner, spender, amount));
        }
        for (role, account) in self.access.memberships() {
            leaves.push(role_leaf(role, account));
        }
        build_merkle(leaves)
    }
}

fn role_leaf(role: &Role, account: &Principal) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(b"role");
    hasher.update(role.as_bytes());
    hasher.update(account.as_bytes());
    hasher.finalize().into()
}

mod hex_root {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(encoded.trim(), &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}
