use serde::{Deserialize, Serialize};

use crate::primitives::{Amount, Principal, Role};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Transfer {
        from: Principal,
        to: Principal,
        #[serde(with = "crate::primitives::decimal")]
        amount: Amount,
    },
    Approval {
        owner: Principal,
        spender: Principal,
        #[serde(with = "crate::primitives::decimal")]
        amount: Amount,
    },
    RoleGranted {
        role: Role,
        account: Principal,
        sender: Principal,
    },
    RoleRevoked {
        role: Role,
        account: Principal,
        sender: Principal,
    },
}

/// Append-only, ordered record of every emitted [`Event`].
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Events appended after the log had `mark` entries.
    pub fn since(&self, mark: usize) -> &[Event] {
        self.events.get(mark..).unwrap_or(&[])
    }
}
