#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Bytes, Env,
    String, Symbol, Vec,
};

/// Root role; administers every other role including itself.
pub const ADMIN_ROLE: Symbol = symbol_short!("admin");
/// Accounts allowed to mint new supply.
pub const MINTER_ROLE: Symbol = symbol_short!("minter");
/// Accounts allowed to pause and unpause the token.
pub const PAUSER_ROLE: Symbol = symbol_short!("pauser");

/// Strkey of the all-zero ed25519 public key, used as the zero identity.
const ZERO_ADDRESS_STRKEY: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

#[contract]
pub struct MeridianToken;

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Name,
    Symbol,
    Decimals,
    /// `Some(owner)` while owned, `None` once ownership is renounced. The
    /// key itself doubles as the initialization marker.
    Owner,
    Cap,
    TotalSupply,
    Paused,
    /// When set, approve/increase/decrease allowance stay usable while paused.
    ApprovalPauseExempt,
    BridgeProxy,
    Balance(Address),
    Allowance(Address, Address),
    Blocked(Address),
    LockedTotal(Address),
    LockedPair(Address, Address),
    RoleFlag(Symbol, Address),
    RoleMembers(Symbol),
    RoleAdmin(Symbol),
}

#[contracterror]
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotOwner = 3,
    MissingRole = 4,
    RenounceNotSelf = 5,
    InvalidAmount = 6,
    ZeroAddress = 7,
    MathOverflow = 8,
    TokenPaused = 9,
    AlreadyPaused = 10,
    NotPaused = 11,
    ApprovalWhilePaused = 12,
    CapUpdateWhilePaused = 13,
    CapIncreaseForbidden = 14,
    CapBelowSupply = 15,
    ZeroCap = 16,
    CapExceeded = 17,
    AllowanceExceeded = 18,
    AllowanceUnderflow = 19,
    BlockedSender = 20,
    BlockedReceiver = 21,
    BlockedCaller = 22,
    AlreadyBlocked = 23,
    NotBlocked = 24,
    LockedFundsExceeded = 25,
    NotOwnFunds = 26,
    NotSpender = 27,
    ZeroAmount = 28,
    ExceedsLockable = 29,
    ExceedsLockedTotal = 30,
    ExceedsLockedForSpender = 31,
    OnlyProxy = 32,
}

fn zero_address(env: &Env) -> Address {
    Address::from_string(&String::from_str(env, ZERO_ADDRESS_STRKEY))
}

fn require_non_zero(env: &Env, address: &Address) -> Result<(), Error> {
    if *address == zero_address(env) {
        return Err(Error::ZeroAddress);
    }
    Ok(())
}

fn require_non_negative(amount: i128) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}

fn read_owner(env: &Env) -> Result<Option<Address>, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Owner)
        .ok_or(Error::NotInitialized)
}

fn require_owner(env: &Env, caller: &Address) -> Result<(), Error> {
    match read_owner(env)? {
        Some(owner) if owner == *caller => Ok(()),
        _ => Err(Error::NotOwner),
    }
}

fn read_cap(env: &Env) -> Result<i128, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Cap)
        .ok_or(Error::NotInitialized)
}

fn read_total_supply(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

fn write_total_supply(env: &Env, supply: i128) {
    env.storage().instance().set(&DataKey::TotalSupply, &supply);
}

fn is_paused(env: &Env) -> bool {
    env.storage().instance().get(&DataKey::Paused).unwrap_or(false)
}

fn approval_pause_exempt(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::ApprovalPauseExempt)
        .unwrap_or(false)
}

fn read_balance(env: &Env, account: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Balance(account.clone()))
        .unwrap_or(0)
}

fn write_balance(env: &Env, account: &Address, amount: i128) {
    env.storage()
        .persistent()
        .set(&DataKey::Balance(account.clone()), &amount);
}

fn read_allowance(env: &Env, owner: &Address, spender: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Allowance(owner.clone(), spender.clone()))
        .unwrap_or(0)
}

fn write_allowance(env: &Env, owner: &Address, spender: &Address, amount: i128) {
    env.storage()
        .persistent()
        .set(&DataKey::Allowance(owner.clone(), spender.clone()), &amount);
}

fn is_blocked(env: &Env, account: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Blocked(account.clone()))
        .unwrap_or(false)
}

fn read_locked_total(env: &Env, owner: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::LockedTotal(owner.clone()))
        .unwrap_or(0)
}

fn write_locked_total(env: &Env, owner: &Address, amount: i128) {
    let key = DataKey::LockedTotal(owner.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &amount);
    }
}

fn read_locked_pair(env: &Env, owner: &Address, spender: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::LockedPair(owner.clone(), spender.clone()))
        .unwrap_or(0)
}

fn write_locked_pair(env: &Env, owner: &Address, spender: &Address, amount: i128) {
    let key = DataKey::LockedPair(owner.clone(), spender.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &amount);
    }
}

fn has_role(env: &Env, role: &Symbol, account: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::RoleFlag(role.clone(), account.clone()))
        .unwrap_or(false)
}

fn require_role(env: &Env, role: &Symbol, account: &Address) -> Result<(), Error> {
    if !has_role(env, role, account) {
        return Err(Error::MissingRole);
    }
    Ok(())
}

fn read_role_members(env: &Env, role: &Symbol) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::RoleMembers(role.clone()))
        .unwrap_or_else(|| Vec::new(env))
}

fn read_role_admin(env: &Env, role: &Symbol) -> Symbol {
    env.storage()
        .persistent()
        .get(&DataKey::RoleAdmin(role.clone()))
        .unwrap_or(ADMIN_ROLE)
}

/// Grants `role` to `account`. No-op (and no event) when already held.
fn grant_role_internal(env: &Env, role: &Symbol, account: &Address, actor: &Address) {
    if has_role(env, role, account) {
        return;
    }
    env.storage()
        .persistent()
        .set(&DataKey::RoleFlag(role.clone(), account.clone()), &true);
    let mut members = read_role_members(env, role);
    members.push_back(account.clone());
    env.storage()
        .persistent()
        .set(&DataKey::RoleMembers(role.clone()), &members);
    env.events().publish(
        (symbol_short!("rolegrant"), role.clone(), account.clone()),
        actor.clone(),
    );
}

/// Revokes `role` from `account`, keeping member order stable. No-op (and no
/// event) when not held.
fn revoke_role_internal(env: &Env, role: &Symbol, account: &Address, actor: &Address) {
    if !has_role(env, role, account) {
        return;
    }
    env.storage()
        .persistent()
        .remove(&DataKey::RoleFlag(role.clone(), account.clone()));
    let mut members = read_role_members(env, role);
    if let Some(index) = members.first_index_of(account.clone()) {
        members.remove(index);
    }
    env.storage()
        .persistent()
        .set(&DataKey::RoleMembers(role.clone()), &members);
    env.events().publish(
        (symbol_short!("rolervoke"), role.clone(), account.clone()),
        actor.clone(),
    );
}

/// Pause and block gate shared by every balance-mutating path. `from` is the
/// debited side (absent for mint/deposit), `to` the credited side (absent for
/// burn/withdraw).
fn require_transfer_allowed(
    env: &Env,
    from: Option<&Address>,
    to: Option<&Address>,
    caller: &Address,
) -> Result<(), Error> {
    if is_paused(env) {
        return Err(Error::TokenPaused);
    }
    if let Some(from) = from {
        if is_blocked(env, from) {
            return Err(Error::BlockedSender);
        }
    }
    if let Some(to) = to {
        if is_blocked(env, to) {
            return Err(Error::BlockedReceiver);
        }
    }
    if from != Some(caller) && is_blocked(env, caller) {
        return Err(Error::BlockedCaller);
    }
    Ok(())
}

/// Amount of `owner`'s balance that `instigator` may move: everything except
/// funds locked in favor of other spenders. The instigator's own locked
/// allocation stays spendable by them.
fn spendable_balance(env: &Env, owner: &Address, instigator: &Address) -> i128 {
    let balance = read_balance(env, owner);
    let reserved = read_locked_total(env, owner) - read_locked_pair(env, owner, instigator);
    balance - reserved.max(0)
}

fn require_spendable(
    env: &Env,
    owner: &Address,
    instigator: &Address,
    amount: i128,
) -> Result<(), Error> {
    if amount > spendable_balance(env, owner, instigator) {
        return Err(Error::LockedFundsExceeded);
    }
    Ok(())
}

/// A movement instigated by `instigator` draws from their locked allocation
/// first. Consumed entries are removed, never kept at zero.
fn consume_locked(env: &Env, owner: &Address, instigator: &Address, amount: i128) {
    let pair = read_locked_pair(env, owner, instigator);
    let claimed = amount.min(pair);
    if claimed == 0 {
        return;
    }
    write_locked_pair(env, owner, instigator, pair - claimed);
    write_locked_total(env, owner, read_locked_total(env, owner) - claimed);
    env.events().publish(
        (symbol_short!("lockspend"), owner.clone(), instigator.clone()),
        claimed,
    );
}

fn move_balance(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
    let from_balance = read_balance(env, from)
        .checked_sub(amount)
        .ok_or(Error::MathOverflow)?;
    let to_balance = read_balance(env, to)
        .checked_add(amount)
        .ok_or(Error::MathOverflow)?;
    write_balance(env, from, from_balance);
    write_balance(env, to, to_balance);
    env.events()
        .publish((symbol_short!("transfer"), from.clone(), to.clone()), amount);
    Ok(())
}

/// Mint tail shared by `mint` and `deposit`: cap check, supply and balance
/// credit, mint event.
fn credit_supply(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    let new_supply = read_total_supply(env)
        .checked_add(amount)
        .ok_or(Error::MathOverflow)?;
    if new_supply > read_cap(env)? {
        return Err(Error::CapExceeded);
    }
    write_total_supply(env, new_supply);
    let balance = read_balance(env, to)
        .checked_add(amount)
        .ok_or(Error::MathOverflow)?;
    write_balance(env, to, balance);
    env.events().publish((symbol_short!("mint"), to.clone()), amount);
    Ok(())
}

/// Burn tail shared by `burn`, `burn_from` and `withdraw`. The spendable
/// check has already run, so the balance subtraction cannot underflow.
fn debit_supply(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    let supply = read_total_supply(env)
        .checked_sub(amount)
        .ok_or(Error::MathOverflow)?;
    write_total_supply(env, supply);
    write_balance(env, from, read_balance(env, from) - amount);
    env.events().publish((symbol_short!("burn"), from.clone()), amount);
    Ok(())
}

fn spend_allowance(
    env: &Env,
    owner: &Address,
    spender: &Address,
    amount: i128,
) -> Result<(), Error> {
    let allowance = read_allowance(env, owner, spender);
    if amount > allowance {
        return Err(Error::AllowanceExceeded);
    }
    write_allowance(env, owner, spender, allowance - amount);
    Ok(())
}

fn require_approval_allowed(env: &Env, spender: &Address) -> Result<(), Error> {
    require_non_zero(env, spender)?;
    if is_paused(env) && !approval_pause_exempt(env) {
        return Err(Error::ApprovalWhilePaused);
    }
    Ok(())
}

fn write_approval(env: &Env, owner: &Address, spender: &Address, amount: i128) {
    write_allowance(env, owner, spender, amount);
    env.events().publish(
        (symbol_short!("approve"), owner.clone(), spender.clone()),
        amount,
    );
}

fn burn_internal(env: &Env, from: &Address, caller: &Address, amount: i128) -> Result<(), Error> {
    require_non_negative(amount)?;
    require_transfer_allowed(env, Some(from), None, caller)?;
    if caller != from {
        require_spendable(env, from, caller, amount)?;
        spend_allowance(env, from, caller, amount)?;
        consume_locked(env, from, caller, amount);
    } else {
        require_spendable(env, from, from, amount)?;
        consume_locked(env, from, from, amount);
    }
    debit_supply(env, from, amount)
}

#[contractimpl]
impl MeridianToken {
    /// One-shot setup. Mints `initial_supply` to `owner` and grants the
    /// owner the admin, minter and pauser roles.
    pub fn initialize(
        env: Env,
        owner: Address,
        name: String,
        symbol: String,
        decimals: u32,
        initial_supply: i128,
        cap: i128,
        bridge_proxy: Option<Address>,
        approval_pause_exempt: bool,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Owner) {
            return Err(Error::AlreadyInitialized);
        }
        owner.require_auth();
        require_non_negative(initial_supply)?;
        require_non_negative(cap)?;
        if cap == 0 {
            return Err(Error::ZeroCap);
        }
        if cap < initial_supply {
            return Err(Error::CapBelowSupply);
        }

        env.storage().instance().set(&DataKey::Name, &name);
        env.storage().instance().set(&DataKey::Symbol, &symbol);
        env.storage().instance().set(&DataKey::Decimals, &decimals);
        env.storage().instance().set(&DataKey::Cap, &cap);
        env.storage().instance().set(&DataKey::Paused, &false);
        env.storage()
            .instance()
            .set(&DataKey::ApprovalPauseExempt, &approval_pause_exempt);
        env.storage()
            .instance()
            .set(&DataKey::BridgeProxy, &bridge_proxy);
        env.storage()
            .instance()
            .set(&DataKey::Owner, &Some(owner.clone()));

        grant_role_internal(&env, &ADMIN_ROLE, &owner, &owner);
        grant_role_internal(&env, &MINTER_ROLE, &owner, &owner);
        grant_role_internal(&env, &PAUSER_ROLE, &owner, &owner);

        write_total_supply(&env, initial_supply);
        write_balance(&env, &owner, initial_supply);
        env.events()
            .publish((symbol_short!("mint"), owner.clone()), initial_supply);

        Ok(())
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        require_non_negative(amount)?;
        require_non_zero(&env, &to)?;
        require_transfer_allowed(&env, Some(&from), Some(&to), &from)?;
        // A direct transfer is instigated by its recipient: the receiver's
        // locked allocation is spendable toward them and is consumed first.
        require_spendable(&env, &from, &to, amount)?;
        consume_locked(&env, &from, &to, amount);
        move_balance(&env, &from, &to, amount)
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();
        require_non_negative(amount)?;
        require_non_zero(&env, &to)?;
        require_transfer_allowed(&env, Some(&from), Some(&to), &spender)?;
        require_spendable(&env, &from, &spender, amount)?;
        spend_allowance(&env, &from, &spender, amount)?;
        consume_locked(&env, &from, &spender, amount);
        move_balance(&env, &from, &to, amount)
    }

    pub fn approve(env: Env, owner: Address, spender: Address, amount: i128) -> Result<(), Error> {
        owner.require_auth();
        require_non_negative(amount)?;
        require_approval_allowed(&env, &spender)?;
        write_approval(&env, &owner, &spender, amount);
        Ok(())
    }

    pub fn increase_allowance(
        env: Env,
        owner: Address,
        spender: Address,
        amount: i128,
    ) -> Result<(), Error> {
        owner.require_auth();
        require_non_negative(amount)?;
        require_approval_allowed(&env, &spender)?;
        let allowance = read_allowance(&env, &owner, &spender)
            .checked_add(amount)
            .ok_or(Error::MathOverflow)?;
        write_approval(&env, &owner, &spender, allowance);
        Ok(())
    }

    pub fn decrease_allowance(
        env: Env,
        owner: Address,
        spender: Address,
        amount: i128,
    ) -> Result<(), Error> {
        owner.require_auth();
        require_non_negative(amount)?;
        require_approval_allowed(&env, &spender)?;
        let allowance = read_allowance(&env, &owner, &spender);
        if amount > allowance {
            return Err(Error::AllowanceUnderflow);
        }
        write_approval(&env, &owner, &spender, allowance - amount);
        Ok(())
    }

    pub fn mint(env: Env, caller: Address, to: Address, amount: i128) -> Result<(), Error> {
        caller.require_auth();
        require_non_negative(amount)?;
        require_transfer_allowed(&env, None, Some(&to), &caller)?;
        require_role(&env, &MINTER_ROLE, &caller)?;
        require_non_zero(&env, &to)?;
        credit_supply(&env, &to, amount)
    }

    pub fn burn(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        burn_internal(&env, &from, &from, amount)
    }

    pub fn burn_from(
        env: Env,
        spender: Address,
        owner: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();
        burn_internal(&env, &owner, &spender, amount)
    }

    // ------------------------------------------------------------------
    // Pause gate
    // ------------------------------------------------------------------

    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        require_role(&env, &PAUSER_ROLE, &caller)?;
        if is_paused(&env) {
            return Err(Error::AlreadyPaused);
        }
        env.storage().instance().set(&DataKey::Paused, &true);
        env.events().publish((symbol_short!("paused"),), caller);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        require_role(&env, &PAUSER_ROLE, &caller)?;
        if !is_paused(&env) {
            return Err(Error::NotPaused);
        }
        env.storage().instance().set(&DataKey::Paused, &false);
        env.events().publish((symbol_short!("unpaused"),), caller);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Block list
    // ------------------------------------------------------------------

    pub fn block_account(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        caller.require_auth();
        require_role(&env, &ADMIN_ROLE, &caller)?;
        if is_blocked(&env, &account) {
            return Err(Error::AlreadyBlocked);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Blocked(account.clone()), &true);
        env.events().publish(
            (symbol_short!("blocked"), account),
            env.ledger().timestamp(),
        );
        Ok(())
    }

    pub fn unblock_account(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        caller.require_auth();
        require_role(&env, &ADMIN_ROLE, &caller)?;
        if !is_blocked(&env, &account) {
            return Err(Error::NotBlocked);
        }
        env.storage()
            .persistent()
            .remove(&DataKey::Blocked(account.clone()));
        env.events().publish(
            (symbol_short!("unblocked"), account),
            env.ledger().timestamp(),
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cap
    // ------------------------------------------------------------------

    /// Lowers the supply ceiling. The cap can never be raised again once set.
    pub fn update_cap(env: Env, caller: Address, new_cap: i128) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        if is_paused(&env) {
            return Err(Error::CapUpdateWhilePaused);
        }
        require_non_negative(new_cap)?;
        if new_cap == 0 {
            return Err(Error::ZeroCap);
        }
        let cap = read_cap(&env)?;
        if new_cap > cap {
            return Err(Error::CapIncreaseForbidden);
        }
        if new_cap < read_total_supply(&env) {
            return Err(Error::CapBelowSupply);
        }
        env.storage().instance().set(&DataKey::Cap, &new_cap);
        env.events()
            .publish((symbol_short!("capupdate"), caller), (cap, new_cap));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Locked funds
    // ------------------------------------------------------------------

    /// Reserves `amount` of the caller's balance for `spender`. The reserved
    /// portion leaves general circulation and only the named spender's own
    /// transfers can consume it.
    pub fn lock_amount(
        env: Env,
        caller: Address,
        owner: Address,
        spender: Address,
        amount: i128,
    ) -> Result<(), Error> {
        caller.require_auth();
        if caller != owner {
            return Err(Error::NotOwnFunds);
        }
        require_non_negative(amount)?;
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        require_non_zero(&env, &spender)?;
        lock_internal(&env, &owner, &spender, amount)
    }

    /// Spender-initiated lock, bounded by the owner's approval: the total
    /// locked for this pair may never exceed the current allowance. The
    /// allowance itself is left untouched.
    pub fn lock_amount_from(
        env: Env,
        caller: Address,
        owner: Address,
        spender: Address,
        amount: i128,
    ) -> Result<(), Error> {
        caller.require_auth();
        if caller != spender {
            return Err(Error::NotSpender);
        }
        require_non_negative(amount)?;
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        require_non_zero(&env, &owner)?;
        let pair = read_locked_pair(&env, &owner, &spender)
            .checked_add(amount)
            .ok_or(Error::MathOverflow)?;
        if pair > read_allowance(&env, &owner, &spender) {
            return Err(Error::AllowanceExceeded);
        }
        lock_internal(&env, &owner, &spender, amount)
    }

    pub fn unlock_amount(
        env: Env,
        caller: Address,
        owner: Address,
        spender: Address,
        amount: i128,
    ) -> Result<(), Error> {
        caller.require_auth();
        if caller != spender {
            return Err(Error::NotSpender);
        }
        require_non_negative(amount)?;
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        require_non_zero(&env, &owner)?;
        let total = read_locked_total(&env, &owner);
        if amount > total {
            return Err(Error::ExceedsLockedTotal);
        }
        let pair = read_locked_pair(&env, &owner, &spender);
        if amount > pair {
            return Err(Error::ExceedsLockedForSpender);
        }
        write_locked_total(&env, &owner, total - amount);
        write_locked_pair(&env, &owner, &spender, pair - amount);
        env.events()
            .publish((symbol_short!("unlock"), owner, spender), amount);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    /// Hands the contract to `new_owner`, migrating the three canonical
    /// roles with an explicit revoke/grant sequence.
    pub fn transfer_ownership(env: Env, caller: Address, new_owner: Address) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        require_non_zero(&env, &new_owner)?;
        if new_owner != caller {
            for role in [ADMIN_ROLE, MINTER_ROLE, PAUSER_ROLE] {
                revoke_role_internal(&env, &role, &caller, &caller);
                grant_role_internal(&env, &role, &new_owner, &caller);
            }
        }
        env.storage()
            .instance()
            .set(&DataKey::Owner, &Some(new_owner.clone()));
        env.events().publish(
            (symbol_short!("ownership"),),
            (Some(caller), Some(new_owner)),
        );
        Ok(())
    }

    /// Abandons ownership entirely: the canonical roles are revoked and no
    /// owner-gated operation can succeed afterwards.
    pub fn renounce_ownership(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        for role in [ADMIN_ROLE, MINTER_ROLE, PAUSER_ROLE] {
            revoke_role_internal(&env, &role, &caller, &caller);
        }
        env.storage()
            .instance()
            .set(&DataKey::Owner, &None::<Address>);
        env.events()
            .publish((symbol_short!("ownership"),), (Some(caller), None::<Address>));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    pub fn grant_role(env: Env, caller: Address, role: Symbol, account: Address) -> Result<(), Error> {
        caller.require_auth();
        require_role(&env, &read_role_admin(&env, &role), &caller)?;
        grant_role_internal(&env, &role, &account, &caller);
        Ok(())
    }

    pub fn revoke_role(env: Env, caller: Address, role: Symbol, account: Address) -> Result<(), Error> {
        caller.require_auth();
        require_role(&env, &read_role_admin(&env, &role), &caller)?;
        revoke_role_internal(&env, &role, &account, &caller);
        Ok(())
    }

    pub fn renounce_role(env: Env, caller: Address, role: Symbol, account: Address) -> Result<(), Error> {
        caller.require_auth();
        if caller != account {
            return Err(Error::RenounceNotSelf);
        }
        revoke_role_internal(&env, &role, &account, &caller);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bridge surface
    // ------------------------------------------------------------------

    /// Bridge entry point: mints `amount` (a 32-byte big-endian word in
    /// `deposit_data`) to `account`. Restricted to the configured proxy and
    /// subject to the same pause/block/cap gates as mint.
    pub fn deposit(
        env: Env,
        caller: Address,
        account: Address,
        deposit_data: Bytes,
    ) -> Result<(), Error> {
        caller.require_auth();
        let proxy: Option<Address> = env
            .storage()
            .instance()
            .get(&DataKey::BridgeProxy)
            .ok_or(Error::NotInitialized)?;
        if proxy != Some(caller.clone()) {
            return Err(Error::OnlyProxy);
        }
        let amount = decode_deposit_amount(&deposit_data)?;
        require_transfer_allowed(&env, None, Some(&account), &caller)?;
        require_non_zero(&env, &account)?;
        credit_supply(&env, &account, amount)
    }

    /// Burn-on-self exit for the bridge. No delegated variant exists.
    pub fn withdraw(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        burn_internal(&env, &from, &from, amount)
    }

    pub fn update_bridge_proxy(env: Env, caller: Address, new_proxy: Address) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        require_non_zero(&env, &new_proxy)?;
        let previous: Option<Address> = env
            .storage()
            .instance()
            .get(&DataKey::BridgeProxy)
            .ok_or(Error::NotInitialized)?;
        env.storage()
            .instance()
            .set(&DataKey::BridgeProxy, &Some(new_proxy.clone()));
        env.events()
            .publish((symbol_short!("proxyupd"),), (previous, new_proxy));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn name(env: Env) -> Result<String, Error> {
        env.storage().instance().get(&DataKey::Name).ok_or(Error::NotInitialized)
    }

    pub fn symbol(env: Env) -> Result<String, Error> {
        env.storage().instance().get(&DataKey::Symbol).ok_or(Error::NotInitialized)
    }

    pub fn decimals(env: Env) -> Result<u32, Error> {
        env.storage().instance().get(&DataKey::Decimals).ok_or(Error::NotInitialized)
    }

    pub fn total_supply(env: Env) -> i128 {
        read_total_supply(&env)
    }

    pub fn owner(env: Env) -> Result<Option<Address>, Error> {
        read_owner(&env)
    }

    pub fn balance(env: Env, account: Address) -> i128 {
        read_balance(&env, &account)
    }

    pub fn allowance(env: Env, owner: Address, spender: Address) -> i128 {
        read_allowance(&env, &owner, &spender)
    }

    pub fn cap(env: Env) -> Result<i128, Error> {
        read_cap(&env)
    }

    pub fn paused(env: Env) -> bool {
        is_paused(&env)
    }

    pub fn is_account_blocked(env: Env, account: Address) -> bool {
        is_blocked(&env, &account)
    }

    pub fn locked_balance_of(env: Env, owner: Address) -> i128 {
        read_locked_total(&env, &owner)
    }

    pub fn locked_balance_per_account(env: Env, owner: Address, spender: Address) -> i128 {
        read_locked_pair(&env, &owner, &spender)
    }

    pub fn has_role(env: Env, role: Symbol, account: Address) -> bool {
        has_role(&env, &role, &account)
    }

    pub fn get_role_admin(env: Env, role: Symbol) -> Symbol {
        read_role_admin(&env, &role)
    }

    pub fn get_role_member_count(env: Env, role: Symbol) -> u32 {
        read_role_members(&env, &role).len()
    }

    pub fn get_role_member(env: Env, role: Symbol, index: u32) -> Option<Address> {
        read_role_members(&env, &role).get(index)
    }

    pub fn bridge_proxy(env: Env) -> Result<Option<Address>, Error> {
        env.storage()
            .instance()
            .get(&DataKey::BridgeProxy)
            .ok_or(Error::NotInitialized)
    }
}

fn lock_internal(env: &Env, owner: &Address, spender: &Address, amount: i128) -> Result<(), Error> {
    let total = read_locked_total(env, owner)
        .checked_add(amount)
        .ok_or(Error::MathOverflow)?;
    if total > read_balance(env, owner) {
        return Err(Error::ExceedsLockable);
    }
    let pair = read_locked_pair(env, owner, spender)
        .checked_add(amount)
        .ok_or(Error::MathOverflow)?;
    write_locked_total(env, owner, total);
    write_locked_pair(env, owner, spender, pair);
    env.events().publish(
        (symbol_short!("lock"), owner.clone(), spender.clone()),
        amount,
    );
    Ok(())
}

/// Bridge deposits carry the amount as a single 32-byte big-endian unsigned
/// word. Anything malformed or outside the i128 range is rejected before the
/// ledger is touched.
fn decode_deposit_amount(data: &Bytes) -> Result<i128, Error> {
    if data.len() != 32 {
        return Err(Error::InvalidAmount);
    }
    let mut buf = [0u8; 32];
    data.copy_into_slice(&mut buf);
    if buf[..16].iter().any(|b| *b != 0) {
        return Err(Error::InvalidAmount);
    }
    let mut word = [0u8; 16];
    word.copy_from_slice(&buf[16..]);
    let value = u128::from_be_bytes(word);
    i128::try_from(value).map_err(|_| Error::InvalidAmount)
}


#[cfg(test)]
mod test_locked;
