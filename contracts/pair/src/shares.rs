//! Liquidity share ledger. A pair is itself a fungible token for its
//! shares, with the same ledger semantics as the standalone token.

use soroban_sdk::{Address, Env, Symbol};

use crate::storage;

pub fn mint(env: &Env, to: &Address, amount: i128) {
    credit(env, to, amount);
    storage::set_total_supply(env, storage::get_total_supply(env) + amount);

    env.events()
        .publish((Symbol::new(env, "mint"), to.clone()), amount);
}

/// Burn shares held by `from`. The pair only ever burns its own
/// holdings, collected from liquidity providers beforehand.
pub fn burn(env: &Env, from: &Address, amount: i128) {
    debit(env, from, amount);
    storage::set_total_supply(env, storage::get_total_supply(env) - amount);

    env.events()
        .publish((Symbol::new(env, "burn"), from.clone()), amount);
}

pub fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) {
    require_non_negative(amount);
    debit(env, from, amount);
    credit(env, to, amount);

    env.events().publish(
        (Symbol::new(env, "transfer"), from.clone(), to.clone()),
        amount,
    );
}

pub fn create_allowance(env: &Env, from: &Address, spender: &Address, amount: i128) {
    require_non_negative(amount);
    if storage::has_allowance(env, from, spender) {
        panic!("Allowance already exists");
    }
    storage::set_allowance(env, from, spender, amount);

    env.events().publish(
        (Symbol::new(env, "allowance"), from.clone(), spender.clone()),
        amount,
    );
}

pub fn change_allowance(env: &Env, from: &Address, spender: &Address, delta: i128) {
    let current = match storage::get_allowance(env, from, spender) {
        Some(current) => current,
        None => panic!("Allowance not existent"),
    };

    let updated = current + delta;
    require_non_negative(updated);
    storage::set_allowance(env, from, spender, updated);

    env.events().publish(
        (Symbol::new(env, "allowance"), from.clone(), spender.clone()),
        updated,
    );
}

pub fn reset_allowance(env: &Env, from: &Address, spender: &Address) {
    let current = match storage::get_allowance(env, from, spender) {
        Some(current) => current,
        None => panic!("Allowance not existent"),
    };
    change_allowance(env, from, spender, -current);
}

fn debit(env: &Env, account: &Address, amount: i128) {
    let balance = match storage::get_balance(env, account) {
        Some(balance) => balance,
        None => panic!("Insufficient balance"),
    };
    if balance < amount {
        panic!("Insufficient balance");
    }
    storage::set_balance(env, account, balance - amount);
}

fn credit(env: &Env, account: &Address, amount: i128) {
    let balance = storage::get_balance(env, account).unwrap_or(0);
    storage::set_balance(env, account, balance + amount);
}

fn require_non_negative(amount: i128) {
    if amount < 0 {
        panic!("Non-negative value required");
    }
}
