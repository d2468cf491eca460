#![no_std]

use amm_library::{path as routing, swap_math};
use amm_types::{PairClient, TokenClient};
use soroban_sdk::{
    contract, contractimpl, contracttype, Address, Env, IntoVal, Symbol, Vec,
};

#[contract]
pub struct AmmRouter;

/// Storage keys
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Factory,
    NativeToken,
}

#[contractimpl]
impl AmmRouter {
    /// Initialize router with the factory and the token contract that
    /// stands in for the native coin
    pub fn initialize(env: Env, factory: Address, native_token: Address) {
        if env.storage().instance().has(&DataKey::Factory) {
            panic!("Already initialized");
        }
        env.storage().instance().set(&DataKey::Factory, &factory);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
    }

    // === Liquidity ===

    /// Add liquidity to the (token_a, token_b) pair, creating it
    /// first if needed. Desired amounts are upper bounds; the amount
    /// actually taken on one side is scaled down to the reserve
    /// ratio, bounded below by the min amounts. Funds are pulled from
    /// `sender` through allowances for this contract.
    /// Returns (amount_a, amount_b, liquidity).
    pub fn add_liquidity(
        env: Env,
        sender: Address,
        token_a: Address,
        token_b: Address,
        amount_a_desired: i128,
        amount_b_desired: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        minimum_liquidity: Option<i128>,
        deadline: u64,
    ) -> (i128, i128, i128) {
        sender.require_auth();
        check_deadline(&env, deadline);

        let factory = get_factory(&env);
        ensure_pair(&env, &factory, &token_a, &token_b, &minimum_liquidity);
        let (amount_a, amount_b) = compute_liquidity_amounts(
            &env,
            &factory,
            &token_a,
            &token_b,
            amount_a_desired,
            amount_b_desired,
            amount_a_min,
            amount_b_min,
        );

        let pair = routing::pair_for(&env, &factory, &token_a, &token_b);
        let current = env.current_contract_address();
        TokenClient::new(&env, &token_a).transfer_allowance(&current, &sender, &pair, &amount_a);
        TokenClient::new(&env, &token_b).transfer_allowance(&current, &sender, &pair, &amount_b);
        let liquidity = PairClient::new(&env, &pair).mint(&sender, &to);

        (amount_a, amount_b, liquidity)
    }

    /// `add_liquidity` against the native token pair.
    /// Returns (amount_token, amount_native, liquidity).
    pub fn add_liquidity_native(
        env: Env,
        sender: Address,
        token: Address,
        amount_token_desired: i128,
        amount_native_desired: i128,
        amount_token_min: i128,
        amount_native_min: i128,
        to: Address,
        minimum_liquidity: Option<i128>,
        deadline: u64,
    ) -> (i128, i128, i128) {
        sender.require_auth();
        check_deadline(&env, deadline);

        let factory = get_factory(&env);
        let native = get_native_token(&env);
        ensure_pair(&env, &factory, &token, &native, &minimum_liquidity);
        let (amount_token, amount_native) = compute_liquidity_amounts(
            &env,
            &factory,
            &token,
            &native,
            amount_token_desired,
            amount_native_desired,
            amount_token_min,
            amount_native_min,
        );

        let pair = routing::pair_for(&env, &factory, &token, &native);
        let current = env.current_contract_address();
        TokenClient::new(&env, &token).transfer_allowance(&current, &sender, &pair, &amount_token);
        TokenClient::new(&env, &native).transfer_allowance(
            &current,
            &sender,
            &pair,
            &amount_native,
        );
        let liquidity = PairClient::new(&env, &pair).mint(&sender, &to);

        (amount_token, amount_native, liquidity)
    }

    /// Burn `liquidity` shares pulled from `sender` and send both
    /// payouts to `to`. Returns (amount_a, amount_b).
    pub fn remove_liquidity(
        env: Env,
        sender: Address,
        token_a: Address,
        token_b: Address,
        liquidity: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        deadline: u64,
    ) -> (i128, i128) {
        sender.require_auth();
        check_deadline(&env, deadline);

        do_remove_liquidity(
            &env,
            &sender,
            &token_a,
            &token_b,
            liquidity,
            amount_a_min,
            amount_b_min,
            &to,
        )
    }

    /// `remove_liquidity` against the native token pair, with the
    /// payouts routed through this contract before reaching `to`.
    /// Returns (amount_token, amount_native).
    pub fn remove_liquidity_native(
        env: Env,
        sender: Address,
        token: Address,
        liquidity: i128,
        amount_token_min: i128,
        amount_native_min: i128,
        to: Address,
        deadline: u64,
    ) -> (i128, i128) {
        sender.require_auth();
        check_deadline(&env, deadline);

        let native = get_native_token(&env);
        let current = env.current_contract_address();
        let (amount_token, amount_native) = do_remove_liquidity(
            &env,
            &sender,
            &token,
            &native,
            liquidity,
            amount_token_min,
            amount_native_min,
            &current,
        );

        TokenClient::new(&env, &token).transfer(&current, &to, &amount_token);
        TokenClient::new(&env, &native).transfer(&current, &to, &amount_native);
        (amount_token, amount_native)
    }

    // === Swaps ===

    /// Swap an exact input along `path` for as much output as the
    /// pools give, at least `amount_out_min`. Returns the amount at
    /// every hop.
    pub fn swap_exact_tokens_for_tokens(
        env: Env,
        sender: Address,
        amount_in: i128,
        amount_out_min: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
        callback: Option<Address>,
    ) -> Vec<i128> {
        sender.require_auth();
        check_deadline(&env, deadline);

        let factory = get_factory(&env);
        let amounts = routing::get_amounts_out(&env, &factory, amount_in, &path);
        if amounts.get(amounts.len() - 1).unwrap() < amount_out_min {
            panic!("Insufficient output amount");
        }

        fund_first_pair(&env, &factory, &sender, &path, amounts.get(0).unwrap());
        execute_swaps(&env, &factory, &amounts, &path, &to, &sender, &callback);
        amounts
    }

    /// Swap as little input as the pools demand, at most
    /// `amount_in_max`, for an exact output along `path`
    pub fn swap_tokens_for_exact_tokens(
        env: Env,
        sender: Address,
        amount_out: i128,
        amount_in_max: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
        callback: Option<Address>,
    ) -> Vec<i128> {
        sender.require_auth();
        check_deadline(&env, deadline);

        let factory = get_factory(&env);
        let amounts = routing::get_amounts_in(&env, &factory, amount_out, &path);
        if amounts.get(0).unwrap() > amount_in_max {
            panic!("Excessive input amount");
        }

        fund_first_pair(&env, &factory, &sender, &path, amounts.get(0).unwrap());
        execute_swaps(&env, &factory, &amounts, &path, &to, &sender, &callback);
        amounts
    }

    /// `swap_exact_tokens_for_tokens` where the input is the native
    /// token, which must open the path
    pub fn swap_exact_native_for_tokens(
        env: Env,
        sender: Address,
        amount_in: i128,
        amount_out_min: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
        callback: Option<Address>,
    ) -> Vec<i128> {
        require_native_first(&env, &path);
        Self::swap_exact_tokens_for_tokens(
            env,
            sender,
            amount_in,
            amount_out_min,
            path,
            to,
            deadline,
            callback,
        )
    }

    /// `swap_tokens_for_exact_tokens` where the output is the native
    /// token, which must close the path. Proceeds pass through this
    /// contract on their way to `to`.
    pub fn swap_tokens_for_exact_native(
        env: Env,
        sender: Address,
        amount_out: i128,
        amount_in_max: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
        callback: Option<Address>,
    ) -> Vec<i128> {
        sender.require_auth();
        check_deadline(&env, deadline);
        require_native_last(&env, &path);

        let factory = get_factory(&env);
        let amounts = routing::get_amounts_in(&env, &factory, amount_out, &path);
        if amounts.get(0).unwrap() > amount_in_max {
            panic!("Excessive input amount");
        }

        fund_first_pair(&env, &factory, &sender, &path, amounts.get(0).unwrap());
        let current = env.current_contract_address();
        execute_swaps(&env, &factory, &amounts, &path, &current, &sender, &callback);
        forward_native(&env, &amounts, &to);
        amounts
    }

    /// `swap_exact_tokens_for_tokens` where the output is the native
    /// token, which must close the path. Proceeds pass through this
    /// contract on their way to `to`.
    pub fn swap_exact_tokens_for_native(
        env: Env,
        sender: Address,
        amount_in: i128,
        amount_out_min: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
        callback: Option<Address>,
    ) -> Vec<i128> {
        sender.require_auth();
        check_deadline(&env, deadline);
        require_native_last(&env, &path);

        let factory = get_factory(&env);
        let amounts = routing::get_amounts_out(&env, &factory, amount_in, &path);
        if amounts.get(amounts.len() - 1).unwrap() < amount_out_min {
            panic!("Insufficient output amount");
        }

        fund_first_pair(&env, &factory, &sender, &path, amounts.get(0).unwrap());
        let current = env.current_contract_address();
        execute_swaps(&env, &factory, &amounts, &path, &current, &sender, &callback);
        forward_native(&env, &amounts, &to);
        amounts
    }

    /// `swap_tokens_for_exact_tokens` where the input is the native
    /// token, which must open the path
    pub fn swap_native_for_exact_tokens(
        env: Env,
        sender: Address,
        amount_out: i128,
        amount_in_max: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
        callback: Option<Address>,
    ) -> Vec<i128> {
        require_native_first(&env, &path);
        Self::swap_tokens_for_exact_tokens(
            env,
            sender,
            amount_out,
            amount_in_max,
            path,
            to,
            deadline,
            callback,
        )
    }

    // === Read-only quoting ===

    pub fn quote(env: Env, amount_a: i128, reserve_a: i128, reserve_b: i128) -> i128 {
        swap_math::quote(&env, amount_a, reserve_a, reserve_b)
    }

    pub fn get_amount_out(env: Env, amount_in: i128, reserve_in: i128, reserve_out: i128) -> i128 {
        swap_math::get_amount_out(&env, amount_in, reserve_in, reserve_out)
    }

    pub fn get_amount_in(env: Env, amount_out: i128, reserve_in: i128, reserve_out: i128) -> i128 {
        swap_math::get_amount_in(&env, amount_out, reserve_in, reserve_out)
    }

    pub fn get_amounts_out(env: Env, amount_in: i128, path: Vec<Address>) -> Vec<i128> {
        let factory = get_factory(&env);
        routing::get_amounts_out(&env, &factory, amount_in, &path)
    }

    pub fn get_amounts_in(env: Env, amount_out: i128, path: Vec<Address>) -> Vec<i128> {
        let factory = get_factory(&env);
        routing::get_amounts_in(&env, &factory, amount_out, &path)
    }

    /// Reserves of the (token_a, token_b) pair, in argument order
    pub fn get_reserves(env: Env, token_a: Address, token_b: Address) -> (i128, i128) {
        let factory = get_factory(&env);
        routing::get_reserves(&env, &factory, &token_a, &token_b)
    }

    /// Get factory address
    pub fn get_factory(env: Env) -> Address {
        get_factory(&env)
    }

    /// Get the token contract standing in for the native coin
    pub fn get_native_token(env: Env) -> Address {
        get_native_token(&env)
    }
}

fn get_factory(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Factory)
        .expect("Not initialized")
}

fn get_native_token(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::NativeToken)
        .expect("Not initialized")
}

fn check_deadline(env: &Env, deadline: u64) {
    let current_time = env.ledger().timestamp();
    if current_time > deadline {
        panic!("Transaction expired");
    }
}

fn require_native_first(env: &Env, path: &Vec<Address>) {
    if path.is_empty() || path.get(0).unwrap() != get_native_token(env) {
        panic!("Path must start with native token");
    }
}

fn require_native_last(env: &Env, path: &Vec<Address>) {
    if path.is_empty() || path.get(path.len() - 1).unwrap() != get_native_token(env) {
        panic!("Path must end with native token");
    }
}

/// Create the pair through the factory unless it is registered
fn ensure_pair(
    env: &Env,
    factory: &Address,
    token_a: &Address,
    token_b: &Address,
    minimum_liquidity: &Option<i128>,
) {
    let existing: Option<Address> = env.invoke_contract(
        factory,
        &Symbol::new(env, "get_pair"),
        (token_a, token_b).into_val(env),
    );
    if existing.is_none() {
        let _: Address = env.invoke_contract(
            factory,
            &Symbol::new(env, "create_pair"),
            (token_a, token_b, minimum_liquidity).into_val(env),
        );
    }
}

/// Scale the desired amounts down to the current reserve ratio. On a
/// fresh pair both desired amounts are taken as-is.
fn compute_liquidity_amounts(
    env: &Env,
    factory: &Address,
    token_a: &Address,
    token_b: &Address,
    amount_a_desired: i128,
    amount_b_desired: i128,
    amount_a_min: i128,
    amount_b_min: i128,
) -> (i128, i128) {
    let (reserve_a, reserve_b) = routing::get_reserves(env, factory, token_a, token_b);
    if reserve_a == 0 && reserve_b == 0 {
        return (amount_a_desired, amount_b_desired);
    }

    let amount_b_optimal = swap_math::quote(env, amount_a_desired, reserve_a, reserve_b);
    if amount_b_optimal <= amount_b_desired {
        if amount_b_optimal < amount_b_min {
            panic!("Insufficient B amount");
        }
        (amount_a_desired, amount_b_optimal)
    } else {
        let amount_a_optimal = swap_math::quote(env, amount_b_desired, reserve_b, reserve_a);
        if amount_a_optimal < amount_a_min {
            panic!("Insufficient A amount");
        }
        (amount_a_optimal, amount_b_desired)
    }
}

fn do_remove_liquidity(
    env: &Env,
    sender: &Address,
    token_a: &Address,
    token_b: &Address,
    liquidity: i128,
    amount_a_min: i128,
    amount_b_min: i128,
    to: &Address,
) -> (i128, i128) {
    let factory = get_factory(env);
    let pair_address = routing::pair_for(env, &factory, token_a, token_b);
    let pair = PairClient::new(env, &pair_address);

    // Move the shares onto the pair, then burn them
    let current = env.current_contract_address();
    pair.transfer_allowance(&current, sender, &pair_address, &liquidity);
    let (amount0, amount1) = pair.burn(sender, to);

    let (token0, _) = routing::sort_tokens(token_a, token_b);
    let (amount_a, amount_b) = if token_a == &token0 {
        (amount0, amount1)
    } else {
        (amount1, amount0)
    };
    if amount_a < amount_a_min {
        panic!("Insufficient A amount");
    }
    if amount_b < amount_b_min {
        panic!("Insufficient B amount");
    }
    (amount_a, amount_b)
}

/// Pull the first hop's input from the sender into the first pair
fn fund_first_pair(env: &Env, factory: &Address, sender: &Address, path: &Vec<Address>, amount: i128) {
    let token_in = path.get(0).unwrap();
    let pair = routing::pair_for(env, factory, &token_in, &path.get(1).unwrap());
    TokenClient::new(env, &token_in).transfer_allowance(
        &env.current_contract_address(),
        sender,
        &pair,
        &amount,
    );
}

/// Run every hop, sending each output straight to the next pair and
/// the last one to `to`
fn execute_swaps(
    env: &Env,
    factory: &Address,
    amounts: &Vec<i128>,
    path: &Vec<Address>,
    to: &Address,
    sender: &Address,
    callback: &Option<Address>,
) {
    if amounts.len() != path.len() {
        panic!("Amount list is shorter");
    }

    for i in 0..(path.len() - 1) {
        let input = path.get(i).unwrap();
        let output = path.get(i + 1).unwrap();
        let (token0, _) = routing::sort_tokens(&input, &output);

        let amount_out = amounts.get(i + 1).unwrap();
        let (amount0_out, amount1_out) = if input == token0 {
            (0i128, amount_out)
        } else {
            (amount_out, 0i128)
        };

        let destination = if i + 2 < path.len() {
            routing::pair_for(env, factory, &output, &path.get(i + 2).unwrap())
        } else {
            to.clone()
        };

        let pair = routing::pair_for(env, factory, &input, &output);
        PairClient::new(env, &pair).swap(sender, &amount0_out, &amount1_out, &destination, callback);
    }
}

/// Hand native proceeds held by this contract over to the recipient
fn forward_native(env: &Env, amounts: &Vec<i128>, to: &Address) {
    let native = get_native_token(env);
    let amount_out = amounts.get(amounts.len() - 1).unwrap();
    TokenClient::new(env, &native).transfer(&env.current_contract_address(), to, &amount_out);
}
