#![no_std]

use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, contracttype, symbol_short, Address,
    Env, String,
};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Strkey of the all-zero ed25519 public key, used as the zero identity.
const ZERO_ADDRESS_STRKEY: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

/// Minimal surface of the vested token. The schedule only ever reads its own
/// balance and pays out of it.
#[contractclient(name = "TokenClient")]
pub trait VestedToken {
    fn balance(env: Env, account: Address) -> i128;
    fn transfer(env: Env, from: Address, to: Address, amount: i128);
}

#[contract]
pub struct VestingSchedule;

/// Day-granular vesting state. `start_day`, `duration`, `cliff_duration` and
/// `interval` are whole days; vesting advances only at interval boundaries.
#[derive(Clone, Debug)]
#[contracttype]
pub struct Schedule {
    pub token: Address,
    pub beneficiary: Address,
    pub allocated_amount: i128,
    pub start_day: u64,
    pub duration: u64,
    pub cliff_duration: u64,
    pub interval: u64,
    pub claimed: i128,
    /// 0 means no per-day ceiling.
    pub claim_limit: i128,
    pub daily_claimed_amount: i128,
    pub last_claimed_day: u64,
    pub revocable: bool,
    pub revoked: bool,
    pub immutable_beneficiary: bool,
}

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Owner,
    Schedule,
}

#[contracterror]
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    /// Also raised while the contract holds less than the unclaimed
    /// allocation, i.e. it was never fully funded.
    NotInitialized = 2,
    NotOwner = 3,
    NotBeneficiary = 4,
    InvalidAmount = 5,
    TokenIsZero = 6,
    BeneficiaryIsZero = 7,
    CliffExceedsDuration = 8,
    IntervalTooSmall = 9,
    ZeroDuration = 10,
    Revoked = 11,
    NotRevocable = 12,
    AlreadyRevoked = 13,
    ExceedsAvailable = 14,
    ClaimLimitExceeded = 15,
    ImmutableBeneficiary = 16,
    MathOverflow = 17,
}

fn zero_address(env: &Env) -> Address {
    Address::from_string(&String::from_str(env, ZERO_ADDRESS_STRKEY))
}

fn read_owner(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Owner)
        .ok_or(Error::NotInitialized)
}

fn require_owner(env: &Env, caller: &Address) -> Result<(), Error> {
    if read_owner(env)? != *caller {
        return Err(Error::NotOwner);
    }
    Ok(())
}

fn read_schedule(env: &Env) -> Result<Schedule, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Schedule)
        .ok_or(Error::NotInitialized)
}

fn write_schedule(env: &Env, schedule: &Schedule) {
    env.storage().instance().set(&DataKey::Schedule, schedule);
}

fn current_day(env: &Env) -> u64 {
    env.ledger().timestamp() / SECONDS_PER_DAY
}

/// The contract must hold at least the unclaimed allocation, otherwise it was
/// deployed without being funded and nothing may be paid out.
fn require_funded(env: &Env, schedule: &Schedule) -> Result<i128, Error> {
    let balance = TokenClient::new(env, &schedule.token).balance(&env.current_contract_address());
    let outstanding = schedule
        .allocated_amount
        .checked_sub(schedule.claimed)
        .ok_or(Error::MathOverflow)?;
    if balance < outstanding {
        return Err(Error::NotInitialized);
    }
    Ok(balance)
}

/// Vested amount at `day`. Zero before the cliff, everything strictly after
/// `duration`, and in between the allocation accrued over whole elapsed
/// intervals, truncated toward zero. At day `start_day + duration` the
/// truncation can leave the result short of the full allocation.
fn vested_at(schedule: &Schedule, day: u64) -> Result<i128, Error> {
    let cliff_end = schedule
        .start_day
        .checked_add(schedule.cliff_duration)
        .ok_or(Error::MathOverflow)?;
    if day < cliff_end {
        return Ok(0);
    }
    let elapsed = day - schedule.start_day;
    if elapsed > schedule.duration {
        return Ok(schedule.allocated_amount);
    }
    let accrued_days = (elapsed / schedule.interval)
        .checked_mul(schedule.interval)
        .ok_or(Error::MathOverflow)?;
    let vested = schedule
        .allocated_amount
        .checked_mul(accrued_days as i128)
        .ok_or(Error::MathOverflow)?
        / schedule.duration as i128;
    Ok(vested)
}

fn available_at(schedule: &Schedule, day: u64) -> Result<i128, Error> {
    let vested = vested_at(schedule, day)?;
    vested
        .checked_sub(schedule.claimed)
        .ok_or(Error::MathOverflow)
}

#[contractimpl]
impl VestingSchedule {
    /// One-shot setup. `start_time` is a Unix timestamp truncated to day
    /// granularity; `duration`, `cliff_duration` and `interval` are whole
    /// days. `claimed` may start above zero when a schedule is migrated with
    /// part of its history already paid out.
    pub fn initialize(
        env: Env,
        owner: Address,
        token: Address,
        beneficiary: Address,
        allocated_amount: i128,
        start_time: u64,
        duration: u64,
        cliff_duration: u64,
        interval: u64,
        claimed: i128,
        claim_limit: i128,
        revocable: bool,
        immutable_beneficiary: bool,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Owner) {
            return Err(Error::AlreadyInitialized);
        }
        owner.require_auth();
        if token == zero_address(&env) {
            return Err(Error::TokenIsZero);
        }
        if beneficiary == zero_address(&env) {
            return Err(Error::BeneficiaryIsZero);
        }
        if cliff_duration > duration {
            return Err(Error::CliffExceedsDuration);
        }
        if interval < 1 {
            return Err(Error::IntervalTooSmall);
        }
        if duration < 1 {
            return Err(Error::ZeroDuration);
        }
        if allocated_amount < 0 || claimed < 0 || claim_limit < 0 {
            return Err(Error::InvalidAmount);
        }

        env.storage().instance().set(&DataKey::Owner, &owner);
        write_schedule(
            &env,
            &Schedule {
                token,
                beneficiary,
                allocated_amount,
                start_day: start_time / SECONDS_PER_DAY,
                duration,
                cliff_duration,
                interval,
                claimed,
                claim_limit,
                daily_claimed_amount: 0,
                last_claimed_day: 0,
                revocable,
                revoked: false,
                immutable_beneficiary,
            },
        );
        Ok(())
    }

    /// Pays `amount` of the vested allocation to the beneficiary. The daily
    /// counter resets on the first claim of each day; with a non-zero
    /// `claim_limit` the day's claims may not exceed it.
    pub fn claim(env: Env, caller: Address, amount: i128) -> Result<(), Error> {
        caller.require_auth();
        if amount < 0 {
            return Err(Error::InvalidAmount);
        }
        let mut schedule = read_schedule(&env)?;
        if caller != schedule.beneficiary {
            return Err(Error::NotBeneficiary);
        }
        if schedule.revoked {
            return Err(Error::Revoked);
        }
        require_funded(&env, &schedule)?;

        let day = current_day(&env);
        if amount > available_at(&schedule, day)? {
            return Err(Error::ExceedsAvailable);
        }

        let claimed_today = if day != schedule.last_claimed_day {
            0
        } else {
            schedule.daily_claimed_amount
        };
        let new_daily = claimed_today
            .checked_add(amount)
            .ok_or(Error::MathOverflow)?;
        if schedule.claim_limit != 0 && new_daily > schedule.claim_limit {
            return Err(Error::ClaimLimitExceeded);
        }

        schedule.claimed = schedule
            .claimed
            .checked_add(amount)
            .ok_or(Error::MathOverflow)?;
        schedule.daily_claimed_amount = new_daily;
        schedule.last_claimed_day = day;
        write_schedule(&env, &schedule);

        // state is committed above; the call-out comes last
        TokenClient::new(&env, &schedule.token).transfer(
            &env.current_contract_address(),
            &schedule.beneficiary,
            &amount,
        );
        env.events().publish(
            (symbol_short!("claim"), schedule.token, schedule.beneficiary),
            amount,
        );
        Ok(())
    }

    /// Terminally shuts the schedule down and refunds the entire remaining
    /// token balance to the owner. Funds already vested but not yet claimed
    /// are not preserved for the beneficiary.
    pub fn revoke(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        let mut schedule = read_schedule(&env)?;
        if !schedule.revocable {
            return Err(Error::NotRevocable);
        }
        if schedule.revoked {
            return Err(Error::AlreadyRevoked);
        }
        let refund = require_funded(&env, &schedule)?;

        schedule.revoked = true;
        write_schedule(&env, &schedule);

        if refund > 0 {
            TokenClient::new(&env, &schedule.token).transfer(
                &env.current_contract_address(),
                &caller,
                &refund,
            );
        }
        env.events().publish(
            (symbol_short!("revoke"), schedule.token, schedule.beneficiary),
            (caller, refund),
        );
        Ok(())
    }

    /// Returns any balance beyond the unclaimed allocation to the owner,
    /// leaving the schedule running. Counterpart of over-funding a deploy.
    pub fn refund_exceeding_balance(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        let schedule = read_schedule(&env)?;
        let balance = require_funded(&env, &schedule)?;
        let outstanding = schedule.allocated_amount - schedule.claimed;
        let refund = balance - outstanding;

        if refund > 0 {
            TokenClient::new(&env, &schedule.token).transfer(
                &env.current_contract_address(),
                &caller,
                &refund,
            );
        }
        env.events().publish(
            (symbol_short!("refund"), schedule.token),
            (caller, refund),
        );
        Ok(())
    }

    pub fn change_beneficiary(
        env: Env,
        caller: Address,
        new_beneficiary: Address,
    ) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        let mut schedule = read_schedule(&env)?;
        if schedule.immutable_beneficiary {
            return Err(Error::ImmutableBeneficiary);
        }
        if new_beneficiary == zero_address(&env) {
            return Err(Error::BeneficiaryIsZero);
        }
        let previous = schedule.beneficiary.clone();
        schedule.beneficiary = new_beneficiary.clone();
        write_schedule(&env, &schedule);
        env.events().publish(
            (symbol_short!("benefchg"),),
            (previous, new_beneficiary),
        );
        Ok(())
    }

    pub fn change_claim_limit(env: Env, caller: Address, new_limit: i128) -> Result<(), Error> {
        caller.require_auth();
        require_owner(&env, &caller)?;
        if new_limit < 0 {
            return Err(Error::InvalidAmount);
        }
        let mut schedule = read_schedule(&env)?;
        schedule.claim_limit = new_limit;
        write_schedule(&env, &schedule);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn calc_vested_amount(env: Env, timestamp: u64) -> Result<i128, Error> {
        let schedule = read_schedule(&env)?;
        vested_at(&schedule, timestamp / SECONDS_PER_DAY)
    }

    pub fn vested(env: Env) -> Result<i128, Error> {
        let schedule = read_schedule(&env)?;
        vested_at(&schedule, current_day(&env))
    }

    pub fn available(env: Env) -> Result<i128, Error> {
        let schedule = read_schedule(&env)?;
        available_at(&schedule, current_day(&env))
    }

    /// Portion of the allocation still gated by time.
    pub fn locked(env: Env) -> Result<i128, Error> {
        let schedule = read_schedule(&env)?;
        let vested = vested_at(&schedule, current_day(&env))?;
        schedule
            .allocated_amount
            .checked_sub(vested)
            .ok_or(Error::MathOverflow)
    }

    pub fn token(env: Env) -> Result<Address, Error> {
        Ok(read_schedule(&env)?.token)
    }

    pub fn beneficiary(env: Env) -> Result<Address, Error> {
        Ok(read_schedule(&env)?.beneficiary)
    }

    pub fn allocated_amount(env: Env) -> Result<i128, Error> {
        Ok(read_schedule(&env)?.allocated_amount)
    }

    pub fn start_day(env: Env) -> Result<u64, Error> {
        Ok(read_schedule(&env)?.start_day)
    }

    pub fn duration(env: Env) -> Result<u64, Error> {
        Ok(read_schedule(&env)?.duration)
    }

    pub fn cliff_duration(env: Env) -> Result<u64, Error> {
        Ok(read_schedule(&env)?.cliff_duration)
    }

    pub fn interval(env: Env) -> Result<u64, Error> {
        Ok(read_schedule(&env)?.interval)
    }

    pub fn claimed(env: Env) -> Result<i128, Error> {
        Ok(read_schedule(&env)?.claimed)
    }

    pub fn claim_limit(env: Env) -> Result<i128, Error> {
        Ok(read_schedule(&env)?.claim_limit)
    }

    pub fn daily_claimed_amount(env: Env) -> Result<i128, Error> {
        Ok(read_schedule(&env)?.daily_claimed_amount)
    }

    pub fn last_claimed_day(env: Env) -> Result<u64, Error> {
        Ok(read_schedule(&env)?.last_claimed_day)
    }

    pub fn revocable(env: Env) -> Result<bool, Error> {
        Ok(read_schedule(&env)?.revocable)
    }

    pub fn revoked(env: Env) -> Result<bool, Error> {
        Ok(read_schedule(&env)?.revoked)
    }

    pub fn immutable_beneficiary(env: Env) -> Result<bool, Error> {
        Ok(read_schedule(&env)?.immutable_beneficiary)
    }

    pub fn owner(env: Env) -> Result<Address, Error> {
        read_owner(&env)
    }
}
