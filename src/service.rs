use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::TokenError,
    event::Event,
    primitives::{Amount, Principal, Role},
    token::{Request, Token, TokenSnapshot},
};

/// Cloneable handle that funnels every call through a single lock, so
/// concurrent front ends observe one total order of state transitions.
#[derive(Clone)]
pub struct SharedToken {
    inner: Arc<Mutex<Token>>,
}

impl SharedToken {
    pub fn new(token: Token) -> Self {
        Self {
            inner: Arc::new(Mutex::new(token)),
        }
    }

    pub fn submit(&self, caller: Principal, request: &Request) -> Result<Vec<Event>, TokenError> {
        self.inner.lock().apply(caller, request)
    }

    pub fn balance_of(&self, account: &Principal) -> Amount {
        self.inner.lock().balance_of(account)
    }

    pub fn allowance(&self, owner: &Principal, spender: &Principal) -> Amount {
        self.inner.lock().allowance(owner, spender)
    }

    pub fn total_supply(&self) -> Amount {
        self.inner.lock().total_supply()
    }

    pub fn has_role(&self, role: &Role, account: &Principal) -> bool {
        self.inner.lock().has_role(role, account)
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        self.inner.lock().snapshot()
    }

    /// Runs `f` against the locked token; nothing else can interleave.
    pub fn with<R>(&self, f: impl FnOnce(&Token) -> R) -> R {
        f(&self.inner.lock())
    }
}
