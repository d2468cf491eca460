#![no_std]

mod shares;
mod storage;
mod swap;

use amm_library::full_math;
use amm_types::{PairConfig, Reserves, TokenClient, DEFAULT_MINIMUM_LIQUIDITY};
use soroban_sdk::{contract, contractimpl, Address, Env, Symbol, Val, Vec, U256};

#[contract]
pub struct AmmPair;

#[contractimpl]
impl AmmPair {
    /// Initialize the pair, called by the factory right after
    /// deployment. `token0` and `token1` arrive in canonical order.
    pub fn initialize(
        env: Env,
        factory: Address,
        token0: Address,
        token1: Address,
        minimum_liquidity: Option<i128>,
    ) {
        if storage::has_config(&env) {
            panic!("Already initialized");
        }

        let min_liquidity = minimum_liquidity.unwrap_or(DEFAULT_MINIMUM_LIQUIDITY);
        if min_liquidity < 0 {
            panic!("Non-negative value required");
        }

        storage::set_config(
            &env,
            &PairConfig {
                factory,
                token0,
                token1,
            },
        );
        storage::set_minimum_liquidity(&env, min_liquidity);
        storage::set_reserves(
            &env,
            &Reserves {
                reserve0: 0,
                reserve1: 0,
                block_timestamp_last: env.ledger().timestamp(),
            },
        );
    }

    pub fn factory(env: Env) -> Address {
        storage::get_config(&env).factory
    }

    pub fn token0(env: Env) -> Address {
        storage::get_config(&env).token0
    }

    pub fn token1(env: Env) -> Address {
        storage::get_config(&env).token1
    }

    pub fn minimum_liquidity(env: Env) -> i128 {
        storage::get_minimum_liquidity(&env)
    }

    pub fn get_reserves(env: Env) -> Reserves {
        storage::get_reserves(&env)
    }

    pub fn k_last(env: Env) -> U256 {
        storage::get_k_last(&env)
    }

    pub fn price0_cumulative_last(env: Env) -> U256 {
        storage::get_price0_cumulative_last(&env)
    }

    pub fn price1_cumulative_last(env: Env) -> U256 {
        storage::get_price1_cumulative_last(&env)
    }

    /// Mint shares against whatever the caller has already deposited,
    /// measured as the balance excess over the cached reserves. The
    /// first mint locks `minimum_liquidity` shares forever.
    pub fn mint(env: Env, sender: Address, to: Address) -> i128 {
        let config = storage::get_config(&env);
        let reserves = storage::get_reserves(&env);

        let current = env.current_contract_address();
        let balance0 = TokenClient::new(&env, &config.token0)
            .balance(&current)
            .unwrap_or(0);
        let balance1 = TokenClient::new(&env, &config.token1)
            .balance(&current)
            .unwrap_or(0);
        let amount0 = balance0 - reserves.reserve0;
        let amount1 = balance1 - reserves.reserve1;

        let fee_on = mint_fee(&env, &config, reserves.reserve0, reserves.reserve1);

        // Supply is read after the protocol fee mint above
        let total_supply = storage::get_total_supply(&env);
        let liquidity = if total_supply == 0 {
            let min_liquidity = storage::get_minimum_liquidity(&env);
            let liquidity =
                full_math::sqrt(&env, &full_math::u256_mul(&env, amount0, amount1)) - min_liquidity;
            if liquidity <= 0 {
                panic!("Insufficient liquidity minted");
            }
            // The locked shares sit on the factory, which has no way
            // to move them
            shares::mint(&env, &config.factory, min_liquidity);
            env.events()
                .publish((Symbol::new(&env, "lock_liquidity"),), min_liquidity);
            liquidity
        } else {
            let liquidity = full_math::mul_div(&env, amount0, total_supply, reserves.reserve0)
                .min(full_math::mul_div(&env, amount1, total_supply, reserves.reserve1));
            if liquidity <= 0 {
                panic!("Insufficient liquidity minted");
            }
            liquidity
        };

        shares::mint(&env, &to, liquidity);
        update_reserves(&env, balance0, balance1);
        if fee_on {
            storage::set_k_last(&env, &full_math::u256_mul(&env, balance0, balance1));
        }

        env.events().publish(
            (Symbol::new(&env, "pair_mint"), sender),
            (amount0, amount1),
        );
        liquidity
    }

    /// Burn the shares held by the pair itself and pay out the
    /// pro-rata cut of both balances to `to`
    pub fn burn(env: Env, sender: Address, to: Address) -> (i128, i128) {
        let config = storage::get_config(&env);
        let reserves = storage::get_reserves(&env);

        let current = env.current_contract_address();
        let token0 = TokenClient::new(&env, &config.token0);
        let token1 = TokenClient::new(&env, &config.token1);
        let balance0 = token0.balance(&current).unwrap_or(0);
        let balance1 = token1.balance(&current).unwrap_or(0);
        let liquidity = storage::get_balance(&env, &current).unwrap_or(0);

        let fee_on = mint_fee(&env, &config, reserves.reserve0, reserves.reserve1);

        let total_supply = storage::get_total_supply(&env);
        let amount0 = full_math::mul_div(&env, liquidity, balance0, total_supply);
        let amount1 = full_math::mul_div(&env, liquidity, balance1, total_supply);
        if amount0 <= 0 || amount1 <= 0 {
            panic!("Insufficient liquidity burned");
        }

        shares::burn(&env, &current, liquidity);
        token0.transfer(&current, &to, &amount0);
        token1.transfer(&current, &to, &amount1);

        let balance0 = token0.balance(&current).unwrap_or(0);
        let balance1 = token1.balance(&current).unwrap_or(0);
        update_reserves(&env, balance0, balance1);
        if fee_on {
            storage::set_k_last(&env, &full_math::u256_mul(&env, balance0, balance1));
        }

        env.events().publish(
            (Symbol::new(&env, "pair_burn"), sender, to),
            (amount0, amount1),
        );
        (amount0, amount1)
    }

    /// Pay out the requested amounts, optionally hand control to
    /// `callback`, then require the fee-adjusted product of the
    /// re-read balances to cover the old one
    pub fn swap(
        env: Env,
        sender: Address,
        amount0_out: i128,
        amount1_out: i128,
        to: Address,
        callback: Option<Address>,
    ) {
        swap::execute_swap(&env, &sender, amount0_out, amount1_out, &to, &callback);
    }

    /// Transfer any balance excess over the cached reserves to `to`
    pub fn skim(env: Env, to: Address) {
        let config = storage::get_config(&env);
        let reserves = storage::get_reserves(&env);

        let current = env.current_contract_address();
        let token0 = TokenClient::new(&env, &config.token0);
        let token1 = TokenClient::new(&env, &config.token1);

        let excess0 = token0.balance(&current).unwrap_or(0) - reserves.reserve0;
        if excess0 > 0 {
            token0.transfer(&current, &to, &excess0);
        }
        let excess1 = token1.balance(&current).unwrap_or(0) - reserves.reserve1;
        if excess1 > 0 {
            token1.transfer(&current, &to, &excess1);
        }
    }

    /// Reset the cached reserves to the actual balances
    pub fn sync(env: Env) {
        let config = storage::get_config(&env);
        let current = env.current_contract_address();
        let balance0 = TokenClient::new(&env, &config.token0)
            .balance(&current)
            .unwrap_or(0);
        let balance1 = TokenClient::new(&env, &config.token1)
            .balance(&current)
            .unwrap_or(0);
        update_reserves(&env, balance0, balance1);
    }

    // === Share token surface ===

    pub fn total_supply(env: Env) -> i128 {
        storage::get_total_supply(&env)
    }

    pub fn balance(env: Env, account: Address) -> Option<i128> {
        storage::get_balance(&env, &account)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> Option<i128> {
        storage::get_allowance(&env, &from, &spender)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        shares::transfer(&env, &from, &to, amount);
    }

    pub fn transfer_allowance(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();
        shares::transfer(&env, &from, &to, amount);
        shares::change_allowance(&env, &from, &spender, -amount);
    }

    pub fn create_allowance(env: Env, from: Address, spender: Address, amount: i128) {
        from.require_auth();
        shares::create_allowance(&env, &from, &spender, amount);
    }

    pub fn change_allowance(env: Env, from: Address, spender: Address, delta: i128) {
        from.require_auth();
        shares::change_allowance(&env, &from, &spender, delta);
    }

    pub fn reset_allowance(env: Env, from: Address, spender: Address) {
        from.require_auth();
        shares::reset_allowance(&env, &from, &spender);
    }
}

/// Commit new reserves, feeding the time-weighted price accumulators
/// with the outgoing reserves first
pub(crate) fn update_reserves(env: &Env, balance0: i128, balance1: i128) {
    let mut reserves = storage::get_reserves(env);
    let now = env.ledger().timestamp();
    let elapsed = now.saturating_sub(reserves.block_timestamp_last);

    if elapsed > 0 && reserves.reserve0 > 0 && reserves.reserve1 > 0 {
        let elapsed = U256::from_u128(env, elapsed as u128);
        let reserve0 = U256::from_u128(env, reserves.reserve0 as u128);
        let reserve1 = U256::from_u128(env, reserves.reserve1 as u128);

        // Q64.64 price of each token in terms of the other
        let price0 = reserve1.shl(64).div(&reserve0).mul(&elapsed);
        let price1 = reserve0.shl(64).div(&reserve1).mul(&elapsed);
        storage::set_price0_cumulative_last(
            env,
            &storage::get_price0_cumulative_last(env).add(&price0),
        );
        storage::set_price1_cumulative_last(
            env,
            &storage::get_price1_cumulative_last(env).add(&price1),
        );
    }

    reserves.reserve0 = balance0;
    reserves.reserve1 = balance1;
    reserves.block_timestamp_last = now;
    storage::set_reserves(env, &reserves);

    env.events()
        .publish((Symbol::new(env, "sync"),), (balance0, balance1));
}

/// When the factory names a fee recipient, mint it shares worth 1/6
/// of the pool growth since the last liquidity event. Returns whether
/// the fee is switched on.
fn mint_fee(env: &Env, config: &PairConfig, reserve0: i128, reserve1: i128) -> bool {
    let args: Vec<Val> = Vec::new(env);
    let fee_to: Option<Address> =
        env.invoke_contract(&config.factory, &Symbol::new(env, "fee_to"), args);

    let k_last = storage::get_k_last(env);
    let zero = U256::from_u32(env, 0);
    match fee_to {
        Some(fee_to) => {
            if k_last.gt(&zero) {
                let root_k = full_math::sqrt(env, &full_math::u256_mul(env, reserve0, reserve1));
                let root_k_last = full_math::sqrt(env, &k_last);
                if root_k > root_k_last {
                    let total_supply = storage::get_total_supply(env);
                    let liquidity = full_math::mul_div(
                        env,
                        total_supply,
                        root_k - root_k_last,
                        5 * root_k + root_k_last,
                    );
                    if liquidity > 0 {
                        shares::mint(env, &fee_to, liquidity);
                    }
                }
            }
            true
        }
        None => {
            if k_last.gt(&zero) {
                storage::set_k_last(env, &zero);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm_factory::AmmFactory;
    use amm_token::{AmmToken, AmmTokenClient};
    use soroban_sdk::testutils::{Address as _, Ledger};
    use soroban_sdk::{contract, contractimpl, contracttype, symbol_short, Address, Env, String};

    const SUPPLY: i128 = 1_000_000_000;

    fn setup_tokens<'a>(env: &'a Env, owner: &Address) -> (AmmTokenClient<'a>, AmmTokenClient<'a>) {
        let id_a = env.register(AmmToken, ());
        let id_b = env.register(AmmToken, ());
        let (id0, id1) = if id_a < id_b { (id_a, id_b) } else { (id_b, id_a) };

        let token0 = AmmTokenClient::new(env, &id0);
        let token1 = AmmTokenClient::new(env, &id1);
        token0.initialize(
            owner,
            &String::from_str(env, "Token Zero"),
            &String::from_str(env, "TK0"),
            &7,
            &Some(SUPPLY),
        );
        token1.initialize(
            owner,
            &String::from_str(env, "Token One"),
            &String::from_str(env, "TK1"),
            &7,
            &Some(SUPPLY),
        );
        (token0, token1)
    }

    fn setup_pair<'a>(
        env: &'a Env,
        token0: &Address,
        token1: &Address,
        minimum_liquidity: Option<i128>,
    ) -> (Address, AmmPairClient<'a>) {
        let factory = env.register(AmmFactory, ());
        let pair_id = env.register(AmmPair, ());
        let pair = AmmPairClient::new(env, &pair_id);
        pair.initialize(&factory, token0, token1, &minimum_liquidity);
        (factory, pair)
    }

    fn deposit_and_mint(
        owner: &Address,
        token0: &AmmTokenClient,
        token1: &AmmTokenClient,
        pair: &AmmPairClient,
        amount0: i128,
        amount1: i128,
    ) -> i128 {
        token0.transfer(owner, &pair.address, &amount0);
        token1.transfer(owner, &pair.address, &amount1);
        pair.mint(owner, owner)
    }

    // === Initialization Tests ===

    #[test]
    fn test_initialize() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (factory, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        assert_eq!(pair.factory(), factory);
        assert_eq!(pair.token0(), token0.address);
        assert_eq!(pair.token1(), token1.address);
        assert_eq!(pair.minimum_liquidity(), 1000);
        assert_eq!(pair.total_supply(), 0);

        let reserves = pair.get_reserves();
        assert_eq!(reserves.reserve0, 0);
        assert_eq!(reserves.reserve1, 0);
    }

    #[test]
    #[should_panic(expected = "Already initialized")]
    fn test_initialize_twice_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (factory, pair) = setup_pair(&env, &token0.address, &token1.address, None);
        pair.initialize(&factory, &token0.address, &token1.address, &None::<i128>);
    }

    // === Mint Tests ===

    #[test]
    fn test_first_mint_locks_minimum_liquidity() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (factory, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        // sqrt(1000 * 4000) = 2000, minus the 1000 locked shares
        let liquidity = deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);
        assert_eq!(liquidity, 1000);

        assert_eq!(pair.total_supply(), 2000);
        assert_eq!(pair.balance(&owner), Some(1000));
        assert_eq!(pair.balance(&factory), Some(1000));

        let reserves = pair.get_reserves();
        assert_eq!(reserves.reserve0, 1000);
        assert_eq!(reserves.reserve1, 4000);
    }

    #[test]
    fn test_first_mint_with_custom_minimum_liquidity() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (factory, pair) = setup_pair(&env, &token0.address, &token1.address, Some(10));

        let liquidity = deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 1000);
        assert_eq!(liquidity, 990);
        assert_eq!(pair.balance(&factory), Some(10));
    }

    #[test]
    #[should_panic(expected = "Insufficient liquidity minted")]
    fn test_first_mint_below_minimum_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        // sqrt(10 * 10) = 10 <= 1000 locked shares
        deposit_and_mint(&owner, &token0, &token1, &pair, 10, 10);
    }

    #[test]
    fn test_subsequent_mint_takes_min_ratio() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);

        // min(100 * 2000 / 1000, 800 * 2000 / 4000) = min(200, 400)
        let liquidity = deposit_and_mint(&owner, &token0, &token1, &pair, 100, 800);
        assert_eq!(liquidity, 200);
        assert_eq!(pair.total_supply(), 2200);
    }

    #[test]
    #[should_panic(expected = "Insufficient liquidity minted")]
    fn test_mint_without_deposit_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);
        pair.mint(&owner, &owner);
    }

    // === Burn Tests ===

    #[test]
    fn test_burn_pays_out_pro_rata() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);

        // Burn a quarter of the 2000 total shares
        pair.transfer(&owner, &pair.address, &500);
        let (amount0, amount1) = pair.burn(&owner, &owner);
        assert_eq!(amount0, 250);
        assert_eq!(amount1, 1000);

        assert_eq!(pair.total_supply(), 1500);
        assert_eq!(pair.balance(&owner), Some(500));
        assert_eq!(token0.balance(&owner), Some(SUPPLY - 1000 + 250));
        assert_eq!(token1.balance(&owner), Some(SUPPLY - 4000 + 1000));

        let reserves = pair.get_reserves();
        assert_eq!(reserves.reserve0, 750);
        assert_eq!(reserves.reserve1, 3000);
    }

    #[test]
    #[should_panic(expected = "Insufficient liquidity burned")]
    fn test_burn_without_shares_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);
        pair.burn(&owner, &owner);
    }

    // === Swap Tests ===

    #[test]
    fn test_swap_within_fee_bound() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);

        token0.transfer(&owner, &pair.address, &100);
        pair.swap(&owner, &0, &99, &owner, &None::<Address>);

        let reserves = pair.get_reserves();
        assert_eq!(reserves.reserve0, 100_100);
        assert_eq!(reserves.reserve1, 99_901);
        assert_eq!(token1.balance(&owner), Some(SUPPLY - 100_000 + 99));
    }

    #[test]
    fn test_k_never_decreases_across_swaps() {
        use amm_library::swap_math;

        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);

        let mut k = 100_000i128 * 100_000;
        for (amount0_in, amount1_in) in [(1000i128, 0i128), (0, 500), (2000, 0), (0, 1500)] {
            let reserves = pair.get_reserves();
            let (amount0_out, amount1_out) = if amount0_in > 0 {
                token0.transfer(&owner, &pair.address, &amount0_in);
                let out = swap_math::get_amount_out(
                    &env,
                    amount0_in,
                    reserves.reserve0,
                    reserves.reserve1,
                );
                (0, out)
            } else {
                token1.transfer(&owner, &pair.address, &amount1_in);
                let out = swap_math::get_amount_out(
                    &env,
                    amount1_in,
                    reserves.reserve1,
                    reserves.reserve0,
                );
                (out, 0)
            };
            pair.swap(&owner, &amount0_out, &amount1_out, &owner, &None::<Address>);

            let after = pair.get_reserves();
            let k_after = after.reserve0 * after.reserve1;
            assert!(k_after >= k);
            k = k_after;
        }
    }

    #[test]
    #[should_panic(expected = "K invariant violated")]
    fn test_swap_beyond_fee_bound_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);

        // 100 in can buy at most 99 out once the fee is counted
        token0.transfer(&owner, &pair.address, &100);
        pair.swap(&owner, &0, &100, &owner, &None::<Address>);
    }

    #[test]
    #[should_panic(expected = "Insufficient input amount")]
    fn test_swap_without_input_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);
        pair.swap(&owner, &0, &99, &owner, &None::<Address>);
    }

    #[test]
    #[should_panic(expected = "Insufficient output amount")]
    fn test_swap_zero_outputs_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);
        pair.swap(&owner, &0, &0, &owner, &None::<Address>);
    }

    #[test]
    #[should_panic(expected = "Insufficient liquidity")]
    fn test_swap_draining_reserve_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);
        pair.swap(&owner, &0, &100_000, &owner, &None::<Address>);
    }

    #[test]
    #[should_panic(expected = "Invalid to")]
    fn test_swap_to_token_address_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);
        pair.swap(&owner, &0, &99, &token0.address, &None::<Address>);
    }

    // === Flash Swap Tests ===

    #[contracttype]
    #[derive(Clone)]
    pub struct Repayment {
        pub token: Address,
        pub pair: Address,
        pub amount: i128,
    }

    #[contract]
    pub struct Borrower;

    #[contractimpl]
    impl Borrower {
        pub fn set_repayment(env: Env, token: Address, pair: Address, amount: i128) {
            env.storage()
                .instance()
                .set(&symbol_short!("repay"), &Repayment { token, pair, amount });
        }

        pub fn swap_call(env: Env, _sender: Address, _amount0_out: i128, _amount1_out: i128) {
            let repayment: Repayment = env
                .storage()
                .instance()
                .get(&symbol_short!("repay"))
                .unwrap();
            amm_types::TokenClient::new(&env, &repayment.token).transfer(
                &env.current_contract_address(),
                &repayment.pair,
                &repayment.amount,
            );
        }
    }

    #[test]
    fn test_flash_swap_repaid_with_fee() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);

        let borrower = env.register(Borrower, ());
        let borrower_client = BorrowerClient::new(&env, &borrower);
        token0.transfer(&owner, &borrower, &1000);

        // Borrow 500 of token0 with no input, repay 502 in-kind
        borrower_client.set_repayment(&token0.address, &pair.address, &502);
        pair.swap(&owner, &500, &0, &borrower, &Some(borrower.clone()));

        assert_eq!(token0.balance(&borrower), Some(998));
        let reserves = pair.get_reserves();
        assert_eq!(reserves.reserve0, 100_002);
        assert_eq!(reserves.reserve1, 100_000);
    }

    #[test]
    #[should_panic(expected = "K invariant violated")]
    fn test_flash_swap_underpaid_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 100_000, 100_000);

        let borrower = env.register(Borrower, ());
        let borrower_client = BorrowerClient::new(&env, &borrower);
        token0.transfer(&owner, &borrower, &1000);

        // Repaying exactly the principal skips the 0.3% fee
        borrower_client.set_repayment(&token0.address, &pair.address, &500);
        pair.swap(&owner, &500, &0, &borrower, &Some(borrower.clone()));
    }

    // === Skim and Sync Tests ===

    #[test]
    fn test_skim_returns_excess() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);

        token0.transfer(&owner, &pair.address, &500);
        let stranger = Address::generate(&env);
        pair.skim(&stranger);

        assert_eq!(token0.balance(&stranger), Some(500));
        assert_eq!(token0.balance(&pair.address), Some(1000));
        let reserves = pair.get_reserves();
        assert_eq!(reserves.reserve0, 1000);
        assert_eq!(reserves.reserve1, 4000);
    }

    #[test]
    fn test_sync_adopts_balances() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);

        token0.transfer(&owner, &pair.address, &500);
        pair.sync();

        let reserves = pair.get_reserves();
        assert_eq!(reserves.reserve0, 1500);
        assert_eq!(reserves.reserve1, 4000);
    }

    // === Price Accumulator Tests ===

    #[test]
    fn test_cumulative_prices_accrue_over_time() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);
        assert_eq!(pair.price0_cumulative_last(), U256::from_u32(&env, 0));

        env.ledger().with_mut(|li| li.timestamp += 100);
        pair.sync();

        // price0 = 4000/1000 = 4 in Q64.64, times 100 seconds
        assert_eq!(
            pair.price0_cumulative_last(),
            U256::from_u128(&env, 400).shl(64)
        );
        // price1 = 1000/4000 = 0.25 in Q64.64, times 100 seconds
        assert_eq!(
            pair.price1_cumulative_last(),
            U256::from_u128(&env, 25).shl(64)
        );

        let reserves = pair.get_reserves();
        assert_eq!(reserves.block_timestamp_last, 100);
    }

    // === Protocol Fee Tests ===

    #[test]
    fn test_protocol_fee_accrues_to_fee_to() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (factory, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        let factory_client = amm_factory::AmmFactoryClient::new(&env, &factory);
        let setter = Address::generate(&env);
        let collector = Address::generate(&env);
        factory_client.initialize(&setter, &soroban_sdk::BytesN::from_array(&env, &[0u8; 32]));
        factory_client.set_fee_to(&Some(collector.clone()));

        deposit_and_mint(&owner, &token0, &token1, &pair, 1_000_000, 1_000_000);
        assert!(pair.k_last().gt(&U256::from_u32(&env, 0)));

        // Grow k through swap fees
        token0.transfer(&owner, &pair.address, &100_000);
        pair.swap(&owner, &0, &90_660, &owner, &None::<Address>);

        // The next liquidity event mints the collector 1/6 of growth
        pair.transfer(&owner, &pair.address, &1000);
        let (amount0, amount1) = pair.burn(&owner, &owner);

        assert_eq!(pair.balance(&collector), Some(22));
        assert_eq!(amount0, 1099);
        assert_eq!(amount1, 909);
    }

    #[test]
    fn test_no_protocol_fee_without_fee_to() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1_000_000, 1_000_000);
        // Fee switched off: no k snapshot is kept
        assert_eq!(pair.k_last(), U256::from_u32(&env, 0));

        token0.transfer(&owner, &pair.address, &100_000);
        pair.swap(&owner, &0, &90_660, &owner, &None::<Address>);

        pair.transfer(&owner, &pair.address, &1000);
        pair.burn(&owner, &owner);
        assert_eq!(pair.total_supply(), 1_000_000 - 1000);
    }

    // === Share Ledger Tests ===

    #[test]
    fn test_share_transfer_and_allowance() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);

        let other = Address::generate(&env);
        pair.transfer(&owner, &other, &300);
        assert_eq!(pair.balance(&other), Some(300));

        let spender = Address::generate(&env);
        pair.create_allowance(&other, &spender, &200);
        pair.transfer_allowance(&spender, &other, &owner, &150);
        assert_eq!(pair.balance(&other), Some(150));
        assert_eq!(pair.allowance(&other, &spender), Some(50));
    }

    #[test]
    #[should_panic(expected = "Insufficient balance")]
    fn test_share_transfer_over_balance_fails() {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let (token0, token1) = setup_tokens(&env, &owner);
        let (_, pair) = setup_pair(&env, &token0.address, &token1.address, None);

        deposit_and_mint(&owner, &token0, &token1, &pair, 1000, 4000);
        let other = Address::generate(&env);
        pair.transfer(&owner, &other, &1001);
    }
}
