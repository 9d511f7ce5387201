#![cfg(test)]

use super::Error;
use crate::test_support::{assert_contract_error, setup_token};
use crate::MeridianTokenClient;
use soroban_sdk::testutils::{Address as _, Events};
use soroban_sdk::{symbol_short, Address, Env, IntoVal};

/// Owner plus two funded holders, 1000 each.
fn setup_holders<'a>(env: &Env) -> (Address, Address, Address, Address, MeridianTokenClient<'a>) {
    let owner = Address::generate(env);
    let acc1 = Address::generate(env);
    let acc2 = Address::generate(env);
    let acc3 = Address::generate(env);
    let client = setup_token(env, &owner);
    client.mock_all_auths().transfer(&owner, &acc1, &1_000);
    client.mock_all_auths().transfer(&owner, &acc2, &1_000);
    (owner, acc1, acc2, acc3, client)
}

#[test]
fn test_locked_balances_default_to_zero() {
    let env = Env::default();
    let (_, acc1, acc2, _, client) = setup_holders(&env);

    assert_eq!(client.locked_balance_of(&acc1), 0);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 0);
}

#[test]
fn test_lock_amount_is_available_only_for_own_funds() {
    let env = Env::default();
    let (owner, acc1, acc2, _, client) = setup_holders(&env);

    assert_contract_error(
        client.mock_all_auths().try_lock_amount(&owner, &acc1, &acc2, &100),
        Error::NotOwnFunds,
    );
    // a zero-address owner can never be the caller either
    assert_contract_error(
        client
            .mock_all_auths()
            .try_lock_amount(&acc1, &crate::zero_address(&env), &acc2, &10),
        Error::NotOwnFunds,
    );
}

#[test]
fn test_lock_amount_rejects_zero_amount_and_zero_spender() {
    let env = Env::default();
    let (_, acc1, acc2, _, client) = setup_holders(&env);

    assert_contract_error(
        client.mock_all_auths().try_lock_amount(&acc1, &acc1, &acc2, &0),
        Error::ZeroAmount,
    );
    assert_contract_error(
        client
            .mock_all_auths()
            .try_lock_amount(&acc1, &acc1, &crate::zero_address(&env), &10),
        Error::ZeroAddress,
    );
    assert_contract_error(
        client.mock_all_auths().try_lock_amount(&acc1, &acc1, &acc2, &-10),
        Error::InvalidAmount,
    );
}

#[test]
fn test_lock_amount_tracks_aggregate_and_per_pair_balances() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    assert_eq!(client.locked_balance_of(&acc1), 50);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 50);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);
    assert_eq!(
        env.events().all().last_unchecked(),
        (
            client.address.clone(),
            (symbol_short!("lock"), acc1.clone(), acc3.clone()).into_val(&env),
            20_i128.into_val(&env)
        )
    );

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &15);
    assert_eq!(client.locked_balance_of(&acc1), 85);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 65);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 20);
}

#[test]
fn test_lock_amount_cannot_exceed_the_lockable_balance() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &65);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);

    // balance 1000, already locked 85
    assert_contract_error(
        client.mock_all_auths().try_lock_amount(&acc1, &acc1, &acc2, &916),
        Error::ExceedsLockable,
    );
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &915);
    assert_eq!(client.locked_balance_of(&acc1), 1_000);
}

#[test]
fn test_unlock_amount_is_spender_only() {
    let env = Env::default();
    let (_, acc1, acc2, _, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    assert_contract_error(
        client.mock_all_auths().try_unlock_amount(&acc1, &acc1, &acc2, &10),
        Error::NotSpender,
    );
    // zero-address spender can never be the caller
    assert_contract_error(
        client
            .mock_all_auths()
            .try_unlock_amount(&acc1, &acc1, &crate::zero_address(&env), &10),
        Error::NotSpender,
    );
}

#[test]
fn test_unlock_amount_rejects_zero_amount_and_zero_owner() {
    let env = Env::default();
    let (_, acc1, acc2, _, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    assert_contract_error(
        client.mock_all_auths().try_unlock_amount(&acc2, &acc1, &acc2, &0),
        Error::ZeroAmount,
    );
    assert_contract_error(
        client
            .mock_all_auths()
            .try_unlock_amount(&acc2, &crate::zero_address(&env), &acc2, &10),
        Error::ZeroAddress,
    );
}

#[test]
fn test_unlock_amount_is_bounded_by_locked_balances() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &65);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);

    assert_contract_error(
        client.mock_all_auths().try_unlock_amount(&acc2, &acc1, &acc2, &1_000),
        Error::ExceedsLockedTotal,
    );
    assert_contract_error(
        client.mock_all_auths().try_unlock_amount(&acc2, &acc1, &acc2, &70),
        Error::ExceedsLockedForSpender,
    );
}

#[test]
fn test_unlock_amount_decreases_both_balances() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &65);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);

    client.mock_all_auths().unlock_amount(&acc2, &acc1, &acc2, &15);
    assert_eq!(client.locked_balance_of(&acc1), 70);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 50);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 20);

    client.mock_all_auths().unlock_amount(&acc3, &acc1, &acc3, &5);
    assert_eq!(
        env.events().all().last_unchecked(),
        (
            client.address.clone(),
            (symbol_short!("unlock"), acc1.clone(), acc3.clone()).into_val(&env),
            5_i128.into_val(&env)
        )
    );
    assert_eq!(client.locked_balance_of(&acc1), 65);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 15);
}

#[test]
fn test_transfer_cannot_spend_funds_locked_for_others() {
    let env = Env::default();
    let (owner, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &15);

    // spendable toward the owner: 1000 - 65 = 935
    assert_contract_error(
        client.mock_all_auths().try_transfer(&acc1, &owner, &936),
        Error::LockedFundsExceeded,
    );
    client.mock_all_auths().transfer(&acc1, &owner, &935);
    assert_eq!(client.balance(&acc1), 65);
}

#[test]
fn test_transfer_from_cannot_spend_beyond_the_caller_headroom() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &15);
    client.mock_all_auths().approve(&acc1, &acc2, &1_000);

    // acc2 can move at most 1000 - 65 + 50 = 985
    assert_contract_error(
        client
            .mock_all_auths()
            .try_transfer_from(&acc2, &acc1, &acc3, &986),
        Error::LockedFundsExceeded,
    );
}

#[test]
fn test_burn_cannot_spend_locked_funds() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &15);

    assert_contract_error(
        client.mock_all_auths().try_burn(&acc1, &936),
        Error::LockedFundsExceeded,
    );
    client.mock_all_auths().burn(&acc1, &935);
    assert_eq!(client.balance(&acc1), 65);
    assert_eq!(client.locked_balance_of(&acc1), 65);
}

#[test]
fn test_transfer_reduces_the_receivers_locked_allocation_first() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &15);

    client.mock_all_auths().transfer(&acc1, &acc2, &10);
    assert_eq!(client.locked_balance_of(&acc1), 55);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 40);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 15);
    assert_eq!(client.balance(&acc1), 990);
    assert_eq!(client.balance(&acc2), 1_010);
}

#[test]
fn test_transfer_clears_the_receivers_lock_when_amount_exceeds_it() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &40);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &15);

    client.mock_all_auths().transfer(&acc1, &acc3, &30);
    assert_eq!(client.locked_balance_of(&acc1), 40);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 40);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 0);
    assert_eq!(client.balance(&acc3), 30);
}

#[test]
fn test_transfer_from_reduces_the_callers_lock_not_the_receivers() {
    let env = Env::default();
    let (_, acc1, acc2, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &40);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);
    client.mock_all_auths().approve(&acc1, &acc2, &500);

    client
        .mock_all_auths()
        .transfer_from(&acc2, &acc1, &acc3, &10);
    assert_eq!(client.locked_balance_of(&acc1), 50);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 30);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 20);

    client
        .mock_all_auths()
        .transfer_from(&acc2, &acc1, &acc3, &40);
    assert_eq!(client.locked_balance_of(&acc1), 20);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 0);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 20);
}

#[test]
fn test_transfer_can_spend_exactly_balance_minus_reserved() {
    let env = Env::default();
    let owner = Address::generate(&env);
    let acc1 = Address::generate(&env);
    let acc2 = Address::generate(&env);
    let acc3 = Address::generate(&env);
    let client = setup_token(&env, &owner);

    client.mock_all_auths().transfer(&owner, &acc1, &670);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);

    // 670 - (70 - 50) = 650 toward acc2
    client.mock_all_auths().transfer(&acc1, &acc2, &650);
    assert_eq!(client.balance(&acc1), 20);
    assert_eq!(client.balance(&acc2), 650);
    assert_eq!(client.locked_balance_of(&acc1), 20);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 0);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 20);
}

#[test]
fn test_transfer_from_can_spend_exactly_balance_minus_reserved() {
    let env = Env::default();
    let owner = Address::generate(&env);
    let acc1 = Address::generate(&env);
    let acc2 = Address::generate(&env);
    let acc3 = Address::generate(&env);
    let client = setup_token(&env, &owner);

    client.mock_all_auths().transfer(&owner, &acc1, &320);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);
    client.mock_all_auths().approve(&acc1, &acc2, &300);

    client
        .mock_all_auths()
        .transfer_from(&acc2, &acc1, &acc3, &300);
    assert_eq!(client.balance(&acc1), 20);
    assert_eq!(client.balance(&acc3), 300);
    assert_eq!(client.locked_balance_of(&acc1), 20);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 0);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 20);
}

#[test]
fn test_self_burn_leaves_locked_allocations_untouched() {
    let env = Env::default();
    let owner = Address::generate(&env);
    let acc1 = Address::generate(&env);
    let acc2 = Address::generate(&env);
    let acc3 = Address::generate(&env);
    let client = setup_token(&env, &owner);

    client.mock_all_auths().transfer(&owner, &acc1, &100);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &50);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);

    client.mock_all_auths().withdraw(&acc1, &30);
    assert_eq!(client.balance(&acc1), 70);
    assert_eq!(client.locked_balance_of(&acc1), 70);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 50);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc3), 20);

    assert_contract_error(
        client.mock_all_auths().try_withdraw(&acc1, &1),
        Error::LockedFundsExceeded,
    );
}

#[test]
fn test_spending_locked_funds_emits_a_claim_event_before_the_transfer() {
    let env = Env::default();
    let (_, acc1, _, acc3, client) = setup_holders(&env);

    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc3, &20);
    client.mock_all_auths().transfer(&acc1, &acc3, &20);

    let events = env.events().all();
    let n = events.len();
    assert_eq!(
        events.get_unchecked(n - 2),
        (
            client.address.clone(),
            (symbol_short!("lockspend"), acc1.clone(), acc3.clone()).into_val(&env),
            20_i128.into_val(&env)
        )
    );
    assert_eq!(
        events.get_unchecked(n - 1),
        (
            client.address.clone(),
            (symbol_short!("transfer"), acc1, acc3).into_val(&env),
            20_i128.into_val(&env)
        )
    );
}

#[test]
fn test_lock_amount_from_is_spender_only() {
    let env = Env::default();
    let (_, acc1, acc2, _, client) = setup_holders(&env);

    assert_contract_error(
        client
            .mock_all_auths()
            .try_lock_amount_from(&acc1, &acc1, &acc2, &100),
        Error::NotSpender,
    );
}

#[test]
fn test_lock_amount_from_is_bounded_by_the_allowance() {
    let env = Env::default();
    let (_, acc1, acc2, _, client) = setup_holders(&env);

    assert_contract_error(
        client
            .mock_all_auths()
            .try_lock_amount_from(&acc2, &acc1, &acc2, &5),
        Error::AllowanceExceeded,
    );

    client.mock_all_auths().approve(&acc1, &acc2, &5);
    client
        .mock_all_auths()
        .lock_amount_from(&acc2, &acc1, &acc2, &5);
    assert_eq!(client.locked_balance_of(&acc1), 5);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 5);
    // the allowance itself is left in place
    assert_eq!(client.allowance(&acc1, &acc2), 5);
}

#[test]
fn test_lock_amount_from_counts_already_locked_funds_against_the_allowance() {
    let env = Env::default();
    let (_, acc1, acc2, _, client) = setup_holders(&env);

    client.mock_all_auths().approve(&acc1, &acc2, &5);
    client
        .mock_all_auths()
        .lock_amount_from(&acc2, &acc1, &acc2, &5);

    client.mock_all_auths().approve(&acc1, &acc2, &7);
    assert_contract_error(
        client
            .mock_all_auths()
            .try_lock_amount_from(&acc2, &acc1, &acc2, &3),
        Error::AllowanceExceeded,
    );
    client
        .mock_all_auths()
        .lock_amount_from(&acc2, &acc1, &acc2, &2);
    assert_eq!(client.locked_balance_per_account(&acc1, &acc2), 7);
}

#[test]
fn test_mint_is_unaffected_by_locked_funds() {
    let env = Env::default();
    let (owner, acc1, acc2, _, client) = setup_holders(&env);

    client.mock_all_auths().burn(&owner, &1_000);
    client.mock_all_auths().lock_amount(&acc1, &acc1, &acc2, &65);

    client.mock_all_auths().mint(&owner, &acc1, &100);
    assert_eq!(client.balance(&acc1), 1_100);
    assert_eq!(client.locked_balance_of(&acc1), 65);
}
