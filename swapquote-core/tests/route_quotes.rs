use std::collections::BTreeMap;

use num_bigint::{BigInt, BigUint};
use pretty_assertions::assert_eq;
use swapquote_core::{
    math::ten_pow,
    models::{
        ConcentratedState, ConstantProductState, FixedRatioState, StableFees, StableSwapState,
        TickState, UtilityCurveState,
    },
    quote, quote_exact_input, quote_exact_output,
    simulation::{
        cache::SolverCaches,
        concentrated::tick_math::{sqrt_price_at_tick, MAX_TICK, MIN_TICK},
    },
    Asset, Direction, Pool, PoolState, QuoteContext, QuoteError, QuoteMode, Route,
    SlippageTolerance,
};

fn e18(v: u64) -> BigUint {
    BigUint::from(v) * ten_pow(18)
}

fn asset(id: &str) -> Asset {
    Asset::new(id, 18).with_symbol(&id.to_uppercase())
}

fn concentrated_state() -> ConcentratedState {
    let liquidity = e18(1_000_000);
    let tick = |prev, index, next, net: BigInt| TickState {
        prev,
        next,
        sqrt_price: sqrt_price_at_tick(index).unwrap(),
        liquidity_net: net,
        tick_cumulative_outside: 0,
    };
    ConcentratedState {
        liquidity: liquidity.clone(),
        sqrt_price: sqrt_price_at_tick(0).unwrap(),
        cur_tick_index: 0,
        cur_tick_witness: -600,
        ticks: BTreeMap::from([
            (-600, tick(MIN_TICK, -600, 600, BigInt::from(liquidity.clone()))),
            (600, tick(-600, 600, MAX_TICK, -BigInt::from(liquidity))),
        ]),
        fee_bps: 5,
        last_cumulative: 0,
    }
}

/// eth -> weth -> usdc -> dai -> sdai -> gho -> lusd, one pool of every kind.
fn mixed_route() -> Route {
    Route::new(vec![
        Pool::new("wrap", asset("eth"), asset("weth"), Direction::Forward, PoolState::Identity),
        Pool::new(
            "weth-usdc",
            asset("weth"),
            asset("usdc"),
            Direction::Reverse,
            PoolState::ConstantProduct(ConstantProductState {
                reserve_a: e18(2_000_000),
                reserve_b: e18(1_000),
                fee_bps: 30,
            }),
        ),
        Pool::new(
            "3pool",
            asset("usdc"),
            asset("dai"),
            Direction::Forward,
            PoolState::StableInvariant(StableSwapState {
                coins: vec!["dai".to_string(), "usdc".to_string(), "usdt".to_string()],
                reserves: vec![e18(10_000_000), e18(9_000_000), e18(11_000_000)],
                rates: vec![ten_pow(18); 3],
                initial_a: 100_000,
                initial_a_time: 0,
                future_a: 200_000,
                future_a_time: 1_000,
                fees: StableFees { swap: 4, ..Default::default() },
            }),
        ),
        Pool::new(
            "sdai",
            asset("dai"),
            asset("sdai"),
            Direction::Reverse,
            PoolState::FixedRatio(FixedRatioState {
                numerator: BigUint::from(105u32),
                denominator: BigUint::from(100u32),
                fee_bps: 0,
            }),
        ),
        Pool::new(
            "sdai-gho",
            asset("sdai"),
            asset("gho"),
            Direction::Forward,
            PoolState::ConcentratedLiquidity(concentrated_state()),
        ),
        Pool::new(
            "gho-lusd",
            asset("gho"),
            asset("lusd"),
            Direction::Forward,
            PoolState::UtilityCurve(UtilityCurveState {
                reserve_a: e18(5_000_000),
                reserve_b: e18(5_000_000),
                rate_a: ten_pow(18),
                rate_b: ten_pow(18),
                fee_bps: 4,
            }),
        ),
    ])
    .unwrap()
}

#[test_log::test]
fn test_exact_input_through_every_kind_of_pool() {
    let route = mixed_route();
    let ctx = QuoteContext::new(500);

    let trade =
        quote_exact_input(&route, &e18(1), SlippageTolerance::from_bps(100).unwrap(), &ctx)
            .unwrap();

    assert_eq!(trade.operations.len(), 6);
    assert_eq!(trade.amount_in(), e18(1));
    for pair in trade.operations.windows(2) {
        assert_eq!(pair[0].output_amount, pair[1].input_amount);
    }
    // 1 eth buys a little under 2_000 usd, then loses 5% to the sdai exchange rate.
    let out = trade.amount_out();
    assert!(out > e18(1_800));
    assert!(out < e18(1_900));
    let price = trade.execution_price().unwrap();
    assert_eq!(price.numerator, out);
    assert_eq!(price.denominator, e18(1));
}

#[test_log::test]
fn test_exact_output_through_every_kind_of_pool() {
    let route = mixed_route();
    let ctx = QuoteContext::new(500);
    let wanted = e18(1_000);

    let trade = quote_exact_output(&route, &wanted, &ctx).unwrap();

    assert_eq!(trade.operations.len(), 6);
    assert_eq!(trade.amount_out(), wanted);
    for pair in trade.operations.windows(2) {
        assert_eq!(pair[0].output_amount, pair[1].input_amount);
    }

    let forward =
        quote_exact_input(&route, &trade.amount_in(), SlippageTolerance::zero(), &ctx).unwrap();
    assert!(forward.amount_out() >= wanted);
}

#[test]
fn test_shared_caches_do_not_change_quotes() {
    let route = mixed_route();
    let amount = e18(3);
    let slippage = SlippageTolerance::zero();

    let uncached = quote(&route, QuoteMode::ExactInput, &amount, slippage, &QuoteContext::new(500))
        .unwrap();
    let ctx = QuoteContext::new(500).with_caches(SolverCaches::shared(128));
    let cold = quote(&route, QuoteMode::ExactInput, &amount, slippage, &ctx).unwrap();
    let warm = quote(&route, QuoteMode::ExactInput, &amount, slippage, &ctx).unwrap();

    assert_eq!(cold, uncached);
    assert_eq!(warm, uncached);
}

#[test]
fn test_amplification_ramp_changes_stable_hop() {
    let mut pool = mixed_route().hops()[2].clone();
    if let PoolState::StableInvariant(state) = &mut pool.state {
        state.reserves = vec![e18(10_000_000); 3];
    }
    let route = Route::new(vec![pool]).unwrap();
    let amount = e18(1_000_000);
    let quote_at = |timestamp| {
        let ctx = QuoteContext::new(timestamp);
        quote_exact_input(&route, &amount, SlippageTolerance::zero(), &ctx)
            .unwrap()
            .amount_out()
    };

    // More amplification, flatter curve, better price for a large trade.
    assert!(quote_at(1_000) > quote_at(0));
    assert_eq!(quote_at(5_000), quote_at(1_000));
}

#[test]
fn test_oversized_trade_yields_empty_trade() {
    let route = mixed_route();
    let trade = quote_exact_input(
        &route,
        &e18(100_000),
        SlippageTolerance::zero(),
        &QuoteContext::new(500),
    )
    .unwrap();
    assert!(trade.is_empty());
    assert_eq!(trade.execution_price(), None);
}

#[test]
fn test_malformed_ticks_are_fatal() {
    let mut state = concentrated_state();
    state.ticks.get_mut(&600).unwrap().prev = 0;
    let route = Route::new(vec![Pool::new(
        "broken",
        asset("sdai"),
        asset("gho"),
        Direction::Reverse,
        PoolState::ConcentratedLiquidity(state),
    )])
    .unwrap();

    let res = quote_exact_input(&route, &e18(10), SlippageTolerance::zero(), &QuoteContext::new(0));

    assert!(matches!(res, Err(QuoteError::MalformedTicks(_))));
}

#[test]
fn test_route_from_json() {
    let raw = r#"[
        {
            "id": "wrap",
            "token_in": {"id": "eth", "decimals": 18},
            "token_out": {"id": "weth", "decimals": 18},
            "state": {"kind": "identity"}
        },
        {
            "id": "weth-usdc",
            "token_in": {"id": "weth", "decimals": 18},
            "token_out": {"id": "usdc", "decimals": 6},
            "direction": "forward",
            "state": {
                "kind": "constant_product",
                "reserve_a": "1000000000000000000000",
                "reserve_b": "2000000000000",
                "fee_bps": 30
            }
        }
    ]"#;

    let route: Route = serde_json::from_str(raw).unwrap();
    let trade = quote_exact_input(&route, &e18(1), SlippageTolerance::zero(), &QuoteContext::new(0))
        .unwrap();

    assert_eq!(route.len(), 2);
    assert_eq!(route.token_out().decimals, 6);
    // 2_000 usdc per weth, less the fee and price impact.
    let out = route
        .token_out()
        .to_decimal_string(&trade.amount_out());
    assert!(out.starts_with("1992."));
}

#[test]
fn test_disconnected_route_is_rejected() {
    let raw = r#"[
        {"id": "a", "token_in": {"id": "x", "decimals": 0}, "token_out": {"id": "y", "decimals": 0},
         "state": {"kind": "identity"}},
        {"id": "b", "token_in": {"id": "z", "decimals": 0}, "token_out": {"id": "w", "decimals": 0},
         "state": {"kind": "identity"}}
    ]"#;
    assert!(serde_json::from_str::<Route>(raw).is_err());
}
