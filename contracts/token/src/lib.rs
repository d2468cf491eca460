#![no_std]

use amm_types::TokenMetadata;
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, String, Symbol};

#[contract]
pub struct AmmToken;

/// Storage keys for the token contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Owner address, the only account allowed to mint
    Owner,
    /// Token metadata
    Meta,
    /// Total supply
    TotalSupply,
    /// account -> balance (absent means the account was never seen)
    Balance(Address),
    /// (from, spender) -> remaining allowance
    Allowance(Address, Address),
    /// account -> amount burned through `swap`
    Swapped(Address),
}

// TTL constants
const INSTANCE_TTL_THRESHOLD: u32 = 17280;
const INSTANCE_TTL_EXTEND: u32 = 518400;
const PERSISTENT_TTL_THRESHOLD: u32 = 17280;
const PERSISTENT_TTL_EXTEND: u32 = 518400;

#[contractimpl]
impl AmmToken {
    /// Initialize the token with its metadata and an optional initial
    /// supply credited to the owner
    pub fn initialize(
        env: Env,
        owner: Address,
        name: String,
        symbol: String,
        decimals: u32,
        initial_supply: Option<i128>,
    ) {
        if env.storage().instance().has(&DataKey::Owner) {
            panic!("Already initialized");
        }

        owner.require_auth();

        if name.len() < 1 {
            panic!("Name too short");
        }
        if symbol.len() < 1 {
            panic!("Symbol too short");
        }

        env.storage().instance().set(&DataKey::Owner, &owner);
        env.storage().instance().set(
            &DataKey::Meta,
            &TokenMetadata {
                name,
                symbol,
                decimals,
            },
        );

        let supply = initial_supply.unwrap_or(0);
        require_non_negative(supply);
        if supply > 0 {
            set_balance(&env, &owner, supply);
        }
        env.storage().instance().set(&DataKey::TotalSupply, &supply);

        extend_instance_ttl(&env);
    }

    pub fn meta(env: Env) -> TokenMetadata {
        extend_instance_ttl(&env);
        env.storage()
            .instance()
            .get(&DataKey::Meta)
            .expect("Not initialized")
    }

    pub fn owner(env: Env) -> Address {
        extend_instance_ttl(&env);
        env.storage()
            .instance()
            .get(&DataKey::Owner)
            .expect("Not initialized")
    }

    pub fn total_supply(env: Env) -> i128 {
        extend_instance_ttl(&env);
        env.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    /// Balance of an account, None if the account was never credited
    pub fn balance(env: Env, account: Address) -> Option<i128> {
        env.storage().persistent().get(&DataKey::Balance(account))
    }

    /// Remaining allowance for (from, spender), None if never created
    pub fn allowance(env: Env, from: Address, spender: Address) -> Option<i128> {
        env.storage()
            .persistent()
            .get(&DataKey::Allowance(from, spender))
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        do_transfer(&env, &from, &to, amount);
    }

    /// Transfer `amount` from `from` to `to` on the spender's
    /// authority, consuming the (from, spender) allowance
    pub fn transfer_allowance(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();
        do_transfer(&env, &from, &to, amount);
        do_change_allowance(&env, &from, &spender, -amount);
    }

    /// Create a fresh allowance. Fails if one already exists for the
    /// (from, spender) key, even at zero; use `change_allowance`
    pub fn create_allowance(env: Env, from: Address, spender: Address, amount: i128) {
        from.require_auth();
        require_non_negative(amount);

        let key = DataKey::Allowance(from.clone(), spender.clone());
        if env.storage().persistent().has(&key) {
            panic!("Allowance already exists");
        }
        env.storage().persistent().set(&key, &amount);
        extend_persistent_ttl(&env, &key);

        env.events().publish(
            (Symbol::new(&env, "allowance"), from, spender),
            amount,
        );
    }

    /// Adjust an existing allowance by a signed delta
    pub fn change_allowance(env: Env, from: Address, spender: Address, delta: i128) {
        from.require_auth();
        do_change_allowance(&env, &from, &spender, delta);
    }

    /// Drop an existing allowance back to zero
    pub fn reset_allowance(env: Env, from: Address, spender: Address) {
        from.require_auth();
        let current: i128 = env
            .storage()
            .persistent()
            .get(&DataKey::Allowance(from.clone(), spender.clone()))
            .unwrap_or_else(|| panic!("Allowance not existent"));
        do_change_allowance(&env, &from, &spender, -current);
    }

    /// Mint new supply to `to`, owner only
    pub fn mint(env: Env, to: Address, amount: i128) {
        let owner: Address = env
            .storage()
            .instance()
            .get(&DataKey::Owner)
            .expect("Not initialized");
        owner.require_auth();
        require_non_negative(amount);

        credit(&env, &to, amount);
        let supply = Self::total_supply(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &(supply + amount));

        env.events()
            .publish((Symbol::new(&env, "mint"), to), amount);
    }

    pub fn burn(env: Env, from: Address, amount: i128) {
        from.require_auth();
        require_non_negative(amount);

        debit(&env, &from, amount);
        let supply = Self::total_supply(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &(supply - amount));

        env.events()
            .publish((Symbol::new(&env, "burn"), from), amount);
    }

    /// Burn the caller's whole balance and record it as swapped out,
    /// e.g. to a successor token
    pub fn swap(env: Env, from: Address) {
        from.require_auth();

        let amount = Self::balance(env.clone(), from.clone()).unwrap_or(0);
        if amount > 0 {
            debit(&env, &from, amount);
            let supply = Self::total_supply(env.clone());
            env.storage()
                .instance()
                .set(&DataKey::TotalSupply, &(supply - amount));
        }

        let key = DataKey::Swapped(from.clone());
        env.storage().persistent().set(&key, &amount);
        extend_persistent_ttl(&env, &key);

        env.events()
            .publish((Symbol::new(&env, "burn"), from.clone()), amount);
        env.events()
            .publish((Symbol::new(&env, "swap"), from), amount);
    }

    /// Amount an account has swapped out, zero if it never did
    pub fn check_swap(env: Env, account: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Swapped(account))
            .unwrap_or(0)
    }
}

fn do_transfer(env: &Env, from: &Address, to: &Address, amount: i128) {
    require_non_negative(amount);
    debit(env, from, amount);
    credit(env, to, amount);

    env.events().publish(
        (Symbol::new(env, "transfer"), from.clone(), to.clone()),
        amount,
    );
}

fn do_change_allowance(env: &Env, from: &Address, spender: &Address, delta: i128) {
    let key = DataKey::Allowance(from.clone(), spender.clone());
    let current: i128 = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| panic!("Allowance not existent"));

    let updated = current + delta;
    require_non_negative(updated);
    env.storage().persistent().set(&key, &updated);
    extend_persistent_ttl(env, &key);

    env.events().publish(
        (Symbol::new(env, "allowance"), from.clone(), spender.clone()),
        updated,
    );
}

fn debit(env: &Env, account: &Address, amount: i128) {
    let balance: i128 = env
        .storage()
        .persistent()
        .get(&DataKey::Balance(account.clone()))
        .unwrap_or_else(|| panic!("Insufficient balance"));
    if balance < amount {
        panic!("Insufficient balance");
    }
    set_balance(env, account, balance - amount);
}

fn credit(env: &Env, account: &Address, amount: i128) {
    let balance: i128 = env
        .storage()
        .persistent()
        .get(&DataKey::Balance(account.clone()))
        .unwrap_or(0);
    set_balance(env, account, balance + amount);
}

fn set_balance(env: &Env, account: &Address, amount: i128) {
    let key = DataKey::Balance(account.clone());
    env.storage().persistent().set(&key, &amount);
    extend_persistent_ttl(env, &key);
}

fn require_non_negative(amount: i128) {
    if amount < 0 {
        panic!("Non-negative value required");
    }
}

fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}
