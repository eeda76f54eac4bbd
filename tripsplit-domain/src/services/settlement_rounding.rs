//! Boundary rounding of member balances with zero-sum repair.
//!
//! Balances are accumulated at full decimal precision and rounded once, to
//! the currency's minor unit, when they leave the engine. Rounding each
//! balance on its own can leave a residue of a few minor units, so:
//! 1. The unrounded sum must already be within epsilon of zero
//! 2. Each balance is rounded to the context scale
//! 3. The residue is cancelled one unit at a time, starting with the members
//!    who gained most from rounding, with a deterministic tie-break key

use crate::model::{MemberBalances, MemberId, Money};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Rounding mode for the output boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round half away from zero (0.005 -> 0.01, -0.005 -> -0.01).
    HalfUp,
    /// Banker's rounding; half goes to the nearest even unit.
    #[default]
    HalfEven,
}

impl RoundingMode {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

impl FromStr for RoundingMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "half-up" | "half_up" | "halfup" => Ok(RoundingMode::HalfUp),
            "half-even" | "half_even" | "halfeven" | "bankers" => Ok(RoundingMode::HalfEven),
            other => Err(format!("unknown rounding mode '{other}'")),
        }
    }
}

/// Scale and rounding mode of the settlement currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementContext {
    /// Decimal places of the minor unit (2 for cents).
    pub scale: u32,
    pub rounding_mode: RoundingMode,
}

impl SettlementContext {
    /// Two decimal places, banker's rounding.
    pub fn minor_units() -> Self {
        Self {
            scale: 2,
            rounding_mode: RoundingMode::HalfEven,
        }
    }

    /// The smallest representable amount, e.g. `0.01`.
    pub fn atomic_unit(self) -> Money {
        Money::new(1, self.scale)
    }

    pub fn round(self, amount: Money) -> Money {
        amount.round_dp(self.scale, self.rounding_mode.strategy())
    }
}

impl Default for SettlementContext {
    fn default() -> Self {
        Self::minor_units()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettlementRoundingError {
    /// Unrounded balances do not sum to zero; the accumulation is broken.
    #[error("balances sum to {0} instead of zero")]
    ImbalancedTotal(Money),
    #[error("rounding residue cannot be spread over the members")]
    InvalidAdjustmentCount,
    #[error("rounded balances no longer sum to zero")]
    ZeroSumInvariantViolation,
    #[error("balance cannot be expressed in whole minor units")]
    NonIntegral,
    #[error("scale {scale} exceeds the supported maximum of {max_supported}")]
    UnsupportedScale { scale: u32, max_supported: u32 },
}

const STABLE_KEY_VERSION: u8 = 1;
const EPSILON_OP_COUNT_BUDGET: i64 = 1_000_000;
const EPSILON_SAFETY_FACTOR: i64 = 100;
const MAX_SETTLEMENT_SCALE: u32 = 22;

struct RoundedEntry<'a> {
    id: &'a MemberId,
    original: Decimal,
    units: i128,
    diff: Decimal,
}

/// Rounds every balance to the context's minor unit so that the rounded
/// balances sum to exactly zero.
///
/// When plain rounding leaves a residue of `k` units, the `k` members whose
/// rounding moved them furthest in the residue's direction give one unit
/// back. Ties are broken by a SHA-256 key of the member id, so the result
/// only depends on the input.
pub fn quantize_balances(
    balances: &MemberBalances,
    context: SettlementContext,
) -> Result<MemberBalances, SettlementRoundingError> {
    validate_scale(context.scale)?;
    let atomic_unit = context.atomic_unit().as_decimal();
    let epsilon = settlement_epsilon(context.scale);
    let original_sum: Money = balances.values().sum();
    if original_sum.abs().as_decimal() > epsilon {
        tracing::error!(
            reject_reason = "input_imbalance",
            member_count = balances.len(),
            epsilon = %epsilon,
            sum_original = %original_sum,
            "Balance rounding rejected due to input imbalance"
        );
        return Err(SettlementRoundingError::ImbalancedTotal(original_sum));
    }

    let strategy = context.rounding_mode.strategy();
    let mut entries: Vec<RoundedEntry<'_>> = balances
        .iter()
        .map(|(id, money)| {
            let original = money.as_decimal();
            let units = quantize_to_int(original, atomic_unit, strategy)?;
            let diff = Decimal::from(units) * atomic_unit - original;
            Ok(RoundedEntry {
                id,
                original,
                units,
                diff,
            })
        })
        .collect::<Result<Vec<_>, SettlementRoundingError>>()?;

    let residue = sum_units(&entries)?;
    if residue != 0 {
        let adjustment_count = usize::try_from(residue.unsigned_abs())
            .map_err(|_| SettlementRoundingError::InvalidAdjustmentCount)?;
        if adjustment_count > entries.len() {
            tracing::error!(
                reject_reason = "k_gt_n",
                residue,
                adjustment_count,
                member_count = entries.len(),
                sum_original = %original_sum,
                "Rounding residue exceeds member count"
            );
            return Err(SettlementRoundingError::InvalidAdjustmentCount);
        }

        // residue > 0: take back from those rounded up the most
        // residue < 0: give to those rounded down the most
        let score_sign = if residue > 0 {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        };
        let mut ranked: Vec<(usize, Decimal, [u8; 32])> = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, entry.diff * score_sign, stable_key(entry.id, context)))
            .collect();
        ranked.sort_by(|(_, score_a, key_a), (_, score_b, key_b)| {
            score_b.cmp(score_a).then_with(|| key_a.cmp(key_b))
        });

        let step: i128 = if residue > 0 { -1 } else { 1 };
        let selected: Vec<&MemberId> = ranked
            .iter()
            .take(adjustment_count)
            .map(|(idx, _, _)| {
                let entry = &mut entries[*idx];
                entry.units += step;
                entry.id
            })
            .collect();

        tracing::debug!(
            residue,
            adjustment_count,
            selected = ?selected,
            member_count = entries.len(),
            sum_original = %original_sum,
            "Balance rounding residue repaired"
        );

        if sum_units(&entries)? != 0 {
            tracing::error!(
                reject_reason = "zero_sum_invariant_violation",
                member_count = entries.len(),
                residue,
                "Balance rounding failed zero-sum invariant check"
            );
            return Err(SettlementRoundingError::ZeroSumInvariantViolation);
        }
    }

    let max_error = entries
        .iter()
        .map(|entry| (Decimal::from(entry.units) * atomic_unit - entry.original).abs())
        .max()
        .unwrap_or(Decimal::ZERO);
    tracing::trace!(
        member_count = entries.len(),
        max_error = %max_error,
        "Balances rounded to minor units"
    );

    Ok(entries
        .into_iter()
        .map(|entry| {
            let rounded = Decimal::from(entry.units) * atomic_unit;
            (entry.id.clone(), Money::from_decimal(rounded))
        })
        .collect())
}

fn sum_units(entries: &[RoundedEntry<'_>]) -> Result<i128, SettlementRoundingError> {
    entries.iter().try_fold(0_i128, |acc, entry| {
        acc.checked_add(entry.units)
            .ok_or(SettlementRoundingError::InvalidAdjustmentCount)
    })
}

fn settlement_epsilon(scale: u32) -> Decimal {
    let baseline = Decimal::new(1, scale + 6);
    let epsilon_min = Decimal::from(EPSILON_SAFETY_FACTOR * EPSILON_OP_COUNT_BUDGET)
        * Decimal::from_i128_with_scale(1, 28);
    baseline.max(epsilon_min)
}

fn validate_scale(scale: u32) -> Result<(), SettlementRoundingError> {
    if scale <= MAX_SETTLEMENT_SCALE {
        return Ok(());
    }
    Err(SettlementRoundingError::UnsupportedScale {
        scale,
        max_supported: MAX_SETTLEMENT_SCALE,
    })
}

fn stable_key(member_id: &MemberId, context: SettlementContext) -> [u8; 32] {
    let rounding_mode_tag = match context.rounding_mode {
        RoundingMode::HalfUp => 0_u8,
        RoundingMode::HalfEven => 1_u8,
    };
    let id = member_id.as_str().as_bytes();

    let mut hasher = Sha256::new();
    hasher.update([STABLE_KEY_VERSION]);
    hasher.update((id.len() as u64).to_be_bytes());
    hasher.update(id);
    hasher.update(context.scale.to_be_bytes());
    hasher.update([rounding_mode_tag]);
    hasher.finalize().into()
}

fn quantize_to_int(
    original: Decimal,
    atomic_unit: Decimal,
    strategy: RoundingStrategy,
) -> Result<i128, SettlementRoundingError> {
    let units = (original / atomic_unit).round_dp_with_strategy(0, strategy);
    let Some(value) = units.to_i128() else {
        tracing::warn!(
            reject_reason = "quantize_failure",
            original = %original,
            rounded_units = %units,
            "Balance could not be converted to minor units"
        );
        return Err(SettlementRoundingError::NonIntegral);
    };
    Ok(value)
}
