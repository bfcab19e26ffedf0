use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{
    error::TokenError,
    event::{Event, EventLog},
    primitives::{Principal, Role},
};

/// Role membership with the guarantee that [`Role::ADMIN`] is never empty.
#[derive(Clone, Debug)]
pub struct AccessControl {
    members: BTreeMap<Role, BTreeSet<Principal>>,
}

impl AccessControl {
    /// Grants `ROLE_ADMIN` to `admin`, the only implicit grant.
    pub fn new(admin: Principal, events: &mut EventLog) -> Result<Self, TokenError> {
        if admin.is_null() {
            return Err(TokenError::InvalidPrincipal);
        }
        let mut access = Self {
            members: BTreeMap::new(),
        };
        access.insert(Role::ADMIN, admin, admin, events);
        Ok(access)
    }

    pub fn has_role(&self, role: &Role, account: &Principal) -> bool {
        self.members
            .get(role)
            .map_or(false, |set| set.contains(account))
    }

    pub fn ensure_role(&self, role: &Role, caller: &Principal) -> Result<(), TokenError> {
        if self.has_role(role, caller) {
            Ok(())
        } else {
            Err(TokenError::Unauthorized {
                caller: *caller,
                role: *role,
            })
        }
    }

    /// Number of principals currently holding `role`.
    pub fn member_count(&self, role: &Role) -> usize {
        self.members.get(role).map_or(0, BTreeSet::len)
    }

    pub fn members(&self, role: &Role) -> impl Iterator<Item = &Principal> {
        self.members.get(role).into_iter().flatten()
    }

    /// Every (role, principal) pair, ordered by role then principal.
    pub fn memberships(&self) -> impl Iterator<Item = (&Role, &Principal)> {
        self.members
            .iter()
            .flat_map(|(role, set)| set.iter().map(move |p| (role, p)))
    }

    pub fn grant_role(
        &mut self,
        caller: Principal,
        role: Role,
        account: Principal,
        events: &mut EventLog,
    ) -> Result<(), TokenError> {
        self.ensure_role(&Role::ADMIN, &caller)?;
        if account.is_null() {
            return Err(TokenError::InvalidPrincipal);
        }
        if self.has_role(&role, &account) {
            debug!(?role, %account, "role already held, nothing to grant");
            return Ok(());
        }
        self.insert(role, account, caller, events);
        Ok(())
    }

    pub fn revoke_role(
        &mut self,
        caller: Principal,
        role: Role,
        account: Principal,
        events: &mut EventLog,
    ) -> Result<(), TokenError> {
        self.ensure_role(&Role::ADMIN, &caller)?;
        if !self.has_role(&role, &account) {
            debug!(?role, %account, "role not held, nothing to revoke");
            return Ok(());
        }
        // `account` is a holder here, so any other holder means count > 1.
        if role.is_admin() && self.member_count(&Role::ADMIN) < 2 {
            return Err(TokenError::LastAdminProtected);
        }
        if let Some(set) = self.members.get_mut(&role) {
            set.remove(&account);
            if set.is_empty() {
                self.members.remove(&role);
            }
        }
        debug!(?role, %account, sender = %caller, "role revoked");
        events.emit(Event::RoleRevoked {
            role,
            account,
            sender: caller,
        });
        Ok(())
    }

    fn insert(&mut self, role: Role, account: Principal, sender: Principal, events: &mut EventLog) {
        self.members.entry(role).or_default().insert(account);
        debug!(?role, %account, %sender, "role granted");
        events.emit(Event::RoleGranted {
            role,
            account,
            sender,
        });
    }
}
