mod common;

use common::{account, amt, deploy, role_foo};
use eegg_ledger::{Event, Principal, Request, Role, TokenError, UNLIMITED};

#[test]
fn end_to_end_walkthrough() -> anyhow::Result<()> {
    let (mut token, a, b, c) = deploy()?;

    // 1. construction
    assert!(token.total_supply().is_zero());
    assert!(token.has_role(&Role::ADMIN, &a));

    // 2. mint
    let events = token.apply(a, &Request::Mint { to: a, amount: amt(1000) })?;
    assert_eq!(token.balance_of(&a), amt(1000));
    assert_eq!(token.total_supply(), amt(1000));
    assert_eq!(
        events,
        vec![Event::Transfer {
            from: Principal::NULL,
            to: a,
            amount: amt(1000)
        }]
    );

    // 3. transfer
    let events = token.apply(a, &Request::Transfer { to: b, amount: amt(42) })?;
    assert_eq!(token.balance_of(&a), amt(958));
    assert_eq!(token.balance_of(&b), amt(42));
    assert_eq!(token.total_supply(), amt(1000));
    assert_eq!(
        events,
        vec![Event::Transfer {
            from: a,
            to: b,
            amount: amt(42)
        }]
    );

    // 4. delegated spend
    token.apply(b, &Request::Approve { spender: c, amount: amt(21) })?;
    let events = token.apply(
        c,
        &Request::TransferFrom {
            owner: b,
            to: a,
            amount: amt(11),
        },
    )?;
    assert_eq!(token.balance_of(&a), amt(969));
    assert_eq!(token.balance_of(&b), amt(31));
    assert_eq!(token.allowance(&b, &c), amt(10));
    assert_eq!(
        events,
        vec![
            Event::Transfer {
                from: b,
                to: a,
                amount: amt(11)
            },
            Event::Approval {
                owner: b,
                spender: c,
                amount: amt(10)
            },
        ]
    );

    // 5. non-admin mint
    let addr1 = account();
    let before = token.snapshot();
    let err = token
        .apply(addr1, &Request::Mint { to: addr1, amount: amt(1) })
        .unwrap_err();
    assert!(matches!(err, TokenError::Unauthorized { .. }));
    assert_eq!(token.snapshot(), before);

    // 6. over-burn
    let err = token
        .apply(a, &Request::Burn { from: b, amount: amt(43) })
        .unwrap_err();
    assert_eq!(err, TokenError::InsufficientBalance { account: b });
    assert_eq!(token.snapshot(), before);
    Ok(())
}

#[test]
fn only_admins_manage_roles() -> anyhow::Result<()> {
    let (mut token, _, addr1, addr2) = deploy()?;
    let grant = token.grant_role(addr1, Role::ADMIN, addr2).unwrap_err();
    assert!(matches!(grant, TokenError::Unauthorized { .. }));
    let revoke = token.revoke_role(addr1, Role::ADMIN, addr2).unwrap_err();
    assert!(matches!(revoke, TokenError::Unauthorized { .. }));
    assert_eq!(token.events().len(), 1);
    Ok(())
}

#[test]
fn granting_a_role_twice_emits_once() -> anyhow::Result<()> {
    let (mut token, owner, addr1, _) = deploy()?;
    token.grant_role(owner, role_foo(), addr1)?;
    let after_first = token.snapshot();
    token.grant_role(owner, role_foo(), addr1)?;

    assert!(token.has_role(&role_foo(), &addr1));
    assert!(!token.has_role(&Role::ADMIN, &addr1));
    let granted = token
        .events()
        .iter()
        .filter(|e| matches!(e, Event::RoleGranted { account, .. } if *account == addr1))
        .count();
    assert_eq!(granted, 1);
    assert_eq!(token.snapshot(), after_first);
    Ok(())
}

#[test]
fn role_events_carry_sender() -> anyhow::Result<()> {
    let (mut token, owner, addr1, _) = deploy()?;
    let granted = token.apply(
        owner,
        &Request::GrantRole {
            role: role_foo(),
            account: addr1,
        },
    )?;
    assert_eq!(
        granted,
        vec![Event::RoleGranted {
            role: role_foo(),
            account: addr1,
            sender: owner
        }]
    );
    let revoked = token.apply(
        owner,
        &Request::RevokeRole {
            role: role_foo(),
            account: addr1,
        },
    )?;
    assert_eq!(
        revoked,
        vec![Event::RoleRevoked {
            role: role_foo(),
            account: addr1,
            sender: owner
        }]
    );
    assert!(!token.has_role(&role_foo(), &addr1));

    // revoking again is a silent success
    let again = token.apply(
        owner,
        &Request::RevokeRole {
            role: role_foo(),
            account: addr1,
        },
    )?;
    assert!(again.is_empty());
    Ok(())
}

#[test]
fn last_admin_guard_follows_membership() -> anyhow::Result<()> {
    let (mut token, owner, addr1, _) = deploy()?;
    assert_eq!(
        token.revoke_role(owner, Role::ADMIN, owner).unwrap_err(),
        TokenError::LastAdminProtected
    );

    // not a holder: silent no-op even with a single admin left
    let events_before = token.events().len();
    token.revoke_role(owner, Role::ADMIN, addr1)?;
    assert_eq!(token.events().len(), events_before);
    assert_eq!(token.admins().copied().collect::<Vec<_>>(), vec![owner]);

    token.grant_role(owner, Role::ADMIN, addr1)?;
    token.revoke_role(owner, Role::ADMIN, owner)?;
    assert!(!token.has_role(&Role::ADMIN, &owner));

    assert!(token.revoke_role(owner, Role::ADMIN, owner).is_err());
    assert!(token.revoke_role(owner, Role::ADMIN, addr1).is_err());
    assert_eq!(
        token.revoke_role(addr1, Role::ADMIN, addr1).unwrap_err(),
        TokenError::LastAdminProtected
    );
    assert_eq!(token.admins().copied().collect::<Vec<_>>(), vec![addr1]);
    Ok(())
}

#[test]
fn new_admin_can_mint_and_old_one_cannot() -> anyhow::Result<()> {
    let (mut token, owner, addr1, addr2) = deploy()?;
    token.grant_role(owner, Role::ADMIN, addr1)?;
    token.revoke_role(addr1, Role::ADMIN, owner)?;
    token.mint(addr1, addr2, amt(5))?;
    assert!(matches!(
        token.mint(owner, addr2, amt(5)),
        Err(TokenError::Unauthorized { .. })
    ));
    assert_eq!(token.balance_of(&addr2), amt(5));
    Ok(())
}

#[test]
fn null_principal_is_rejected_everywhere() -> anyhow::Result<()> {
    let (mut token, owner, addr1, addr2) = deploy()?;
    token.mint(owner, addr1, amt(42))?;
    token.approve(addr1, addr2, amt(21))?;
    let before = token.snapshot();
    let null = Principal::NULL;

    let requests = [
        (owner, Request::Transfer { to: null, amount: amt(1) }),
        (owner, Request::Approve { spender: null, amount: amt(1) }),
        (addr2, Request::TransferFrom { owner: null, to: owner, amount: amt(1) }),
        (addr2, Request::TransferFrom { owner: addr1, to: null, amount: amt(1) }),
        (null, Request::TransferFrom { owner: addr1, to: owner, amount: amt(0) }),
        (owner, Request::Mint { to: null, amount: amt(0) }),
        (owner, Request::Burn { from: null, amount: amt(0) }),
        (owner, Request::GrantRole { role: role_foo(), account: null }),
    ];
    for (caller, request) in &requests {
        assert_eq!(
            token.apply(*caller, request).unwrap_err(),
            TokenError::InvalidPrincipal,
            "{request:?}"
        );
    }
    assert_eq!(token.snapshot(), before);
    Ok(())
}

#[test]
fn zero_transfer_changes_nothing_but_emits() -> anyhow::Result<()> {
    let (mut token, owner, addr1, _) = deploy()?;
    token.mint(owner, owner, amt(100))?;
    let events = token.apply(owner, &Request::Transfer { to: addr1, amount: amt(0) })?;
    assert_eq!(events.len(), 1);
    assert_eq!(token.balance_of(&owner), amt(100));
    assert!(token.balance_of(&addr1).is_zero());
    Ok(())
}

#[test]
fn delegated_spend_respects_allowance() -> anyhow::Result<()> {
    let (mut token, owner, addr1, addr2) = deploy()?;
    token.mint(owner, owner, amt(100))?;
    token.transfer(owner, addr1, amt(42))?;
    token.approve(addr1, addr2, amt(21))?;

    let err = token.transfer_from(addr2, addr1, owner, amt(42)).unwrap_err();
    assert_eq!(
        err,
        TokenError::InsufficientAllowance {
            owner: addr1,
            spender: addr2
        }
    );
    // the owner itself has no allowance on its own funds
    assert!(matches!(
        token.transfer_from(addr1, addr1, owner, amt(1)),
        Err(TokenError::InsufficientAllowance { .. })
    ));
    Ok(())
}

#[test]
fn unlimited_allowance_survives_repeated_spends() -> anyhow::Result<()> {
    let (mut token, owner, addr1, addr2) = deploy()?;
    token.mint(owner, addr1, amt(42))?;
    token.approve(addr1, addr2, UNLIMITED)?;
    assert_eq!(token.allowance(&addr1, &addr2), UNLIMITED);

    let mut spent = 0u64;
    while spent + 11 <= 42 {
        let events = token.apply(
            addr2,
            &Request::TransferFrom {
                owner: addr1,
                to: owner,
                amount: amt(11),
            },
        )?;
        assert!(events.iter().all(|e| matches!(e, Event::Transfer { .. })));
        spent += 11;
    }
    assert_eq!(token.allowance(&addr1, &addr2), UNLIMITED);
    assert_eq!(token.balance_of(&addr1), amt(42 - spent));
    assert!(matches!(
        token.transfer_from(addr2, addr1, owner, amt(11)),
        Err(TokenError::InsufficientBalance { .. })
    ));
    Ok(())
}

#[test]
fn supply_overflow_is_rejected() -> anyhow::Result<()> {
    let (mut token, owner, addr1, _) = deploy()?;
    token.mint(owner, addr1, UNLIMITED)?;
    let before = token.snapshot();
    assert_eq!(
        token.mint(owner, owner, amt(1)).unwrap_err(),
        TokenError::ArithmeticOverflow
    );
    assert_eq!(token.snapshot(), before);
    // a full-width balance can still move around
    token.transfer(addr1, owner, UNLIMITED)?;
    assert_eq!(token.balance_of(&owner), UNLIMITED);
    Ok(())
}
