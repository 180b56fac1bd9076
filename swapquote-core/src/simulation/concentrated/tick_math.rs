//! Exact tick to price conversion and the discrete-log tick approximator.

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::{config::TickWalkLimits, math::BPS_DENOMINATOR, simulation::errors::QuoteError};

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = -MIN_TICK;
/// Resolution of Q64.96 prices.
pub const Q96_SHIFT: u32 = 96;
const Q64_SHIFT: u32 = 64;
/// Most single ticks the approximator may walk before giving up.
pub const MAX_TICK_WALK: usize = 16;

/// `2^128 / sqrt(1.0001)^(2^k)` for every bit `k` of an absolute tick above bit 0.
const BIT_MULTIPLIERS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];
const BIT0_MULTIPLIER: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;

/// Q64.96 square root price at `tick`, i.e. `sqrt(1.0001^tick) * 2^96` rounded up.
pub fn sqrt_price_at_tick(tick: i32) -> Result<BigUint, QuoteError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK.unsigned_abs() {
        return Err(QuoteError::invalid_input(format!("tick {tick} is out of bounds")));
    }

    let mut ratio = if abs_tick & 1 != 0 {
        BigUint::from(BIT0_MULTIPLIER)
    } else {
        BigUint::one() << 128
    };
    for (bit, multiplier) in BIT_MULTIPLIERS {
        if abs_tick & bit != 0 {
            ratio = (ratio * multiplier) >> 128;
        }
    }
    if tick > 0 {
        ratio = ((BigUint::one() << 256) - 1u32) / ratio;
    }

    let round_up = !(&ratio % (1u64 << 32)).is_zero();
    Ok((ratio >> 32) + u32::from(round_up))
}

/// `1.0001^(2^j)` in Q64, for `j` in `0..21`. Enough for the distance between any two ticks.
fn q64_tick_powers() -> &'static [BigUint] {
    static POWERS: OnceLock<Vec<BigUint>> = OnceLock::new();
    POWERS.get_or_init(|| {
        let mut powers = Vec::with_capacity(21);
        let mut power = (BigUint::from(10_001u32) << Q64_SHIFT) / 10_000u32;
        for _ in 0..21 {
            let next = (&power * &power) >> Q64_SHIFT;
            powers.push(power);
            power = next;
        }
        powers
    })
}

/// Whole number of ticks in `ratio_q64 >= 1`, rounded down.
fn ticks_in_ratio(mut ratio_q64: BigUint) -> i32 {
    let mut ticks = 0i32;
    for (j, power) in q64_tick_powers()
        .iter()
        .enumerate()
        .rev()
    {
        if ratio_q64 >= *power {
            ratio_q64 = (ratio_q64 << Q64_SHIFT) / power;
            ticks += 1 << j;
        }
    }
    ticks
}

/// Checks that moving from `old_sqrt_price` to `new_sqrt_price` stays inside the configured band.
///
/// The ratio compared against the band is `new^2 / old^2` in basis points.
pub fn check_price_band(
    old_sqrt_price: &BigUint,
    new_sqrt_price: &BigUint,
    limits: &TickWalkLimits,
) -> Result<(), QuoteError> {
    if old_sqrt_price.is_zero() {
        return Err(QuoteError::invalid_input("sqrt price of zero"));
    }
    let ratio_bps = new_sqrt_price * new_sqrt_price * BPS_DENOMINATOR /
        (old_sqrt_price * old_sqrt_price);
    if ratio_bps < BigUint::from(limits.min_ratio_bps) ||
        ratio_bps > BigUint::from(limits.max_ratio_bps)
    {
        return Err(QuoteError::PriceMovedTooFar {
            ratio_bps,
            min_bps: limits.min_ratio_bps,
            max_bps: limits.max_ratio_bps,
        });
    }
    Ok(())
}

/// Tick index of `new_sqrt_price`: the greatest tick whose price does not exceed it.
///
/// `reference_tick` is a nearby tick, usually the current one. The distance to it is estimated
/// with a discrete logarithm over powers of 1.0001, then corrected one tick at a time against
/// [`sqrt_price_at_tick`].
pub fn approximate_tick(reference_tick: i32, new_sqrt_price: &BigUint) -> Result<i32, QuoteError> {
    if new_sqrt_price.is_zero() {
        return Err(QuoteError::invalid_input("sqrt price of zero"));
    }
    let reference_tick = reference_tick.clamp(MIN_TICK, MAX_TICK);
    let reference = sqrt_price_at_tick(reference_tick)?;
    let new_squared = new_sqrt_price * new_sqrt_price;
    let reference_squared = &reference * &reference;

    let estimate = if new_squared >= reference_squared {
        reference_tick + ticks_in_ratio((new_squared << Q64_SHIFT) / reference_squared)
    } else {
        reference_tick - ticks_in_ratio((reference_squared << Q64_SHIFT) / new_squared) - 1
    };
    let mut tick = estimate.clamp(MIN_TICK, MAX_TICK - 1);

    for _ in 0..MAX_TICK_WALK {
        if tick > MIN_TICK && sqrt_price_at_tick(tick)? > *new_sqrt_price {
            tick -= 1;
        } else if tick < MAX_TICK - 1 && sqrt_price_at_tick(tick + 1)? <= *new_sqrt_price {
            tick += 1;
        } else {
            return Ok(tick);
        }
    }
    Err(QuoteError::SolverDivergence(format!(
        "tick of {new_sqrt_price} not found within {MAX_TICK_WALK} ticks of {estimate}"
    )))
}
