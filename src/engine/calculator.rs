//! Capital-allocation figures derived from an allocation and its ladder.
//!
//! Pure and synchronous. A missing or non-positive `max_amount` (fund-percent
//! mode, or a pair that is not yet configured) is a defined degenerate case:
//! every figure is zero, never an error. Amounts keep full precision here;
//! rounding happens only where figures are printed.

use rust_decimal::Decimal;

use crate::models::{AccountStockAllocation, BuyRatioConfig};

/// Derived figures for one account/stock pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationFigures {
    /// Capital used per buy order in the first block.
    pub single_amount: Decimal,
    /// Worst-case capital held across one day's unsold stack.
    pub daily_max_holding: Decimal,
    /// Worst-case capital held with the full ladder deployed.
    pub max_holding: Decimal,
}

/// `max_amount × first_share_ratio / 100`, or zero when the ceiling is unset
/// or non-positive.
pub fn single_amount(allocation: &AccountStockAllocation, config: &BuyRatioConfig) -> Decimal {
    match allocation.max_amount {
        Some(max) if max > Decimal::ZERO => max * config.first_share_ratio / Decimal::ONE_HUNDRED,
        _ => Decimal::ZERO,
    }
}

/// `single_amount × unsold_stack_limit`.
pub fn daily_max_holding(allocation: &AccountStockAllocation, config: &BuyRatioConfig) -> Decimal {
    single_amount(allocation, config) * Decimal::from(allocation.unsold_stack_limit)
}

/// `single_amount × limit_start_shares` plus the tier block:
/// `max_amount × Σ ratio/100` over the first
/// `total_fund_shares - limit_start_shares` tiers in stored order. Tiers past
/// the end of the stored ladder contribute zero. Stored order is preserved;
/// tiers are never re-sorted by `drop`.
pub fn max_holding(allocation: &AccountStockAllocation, config: &BuyRatioConfig) -> Decimal {
    let Some(max) = allocation.max_amount.filter(|m| *m > Decimal::ZERO) else {
        return Decimal::ZERO;
    };

    let extra_count = allocation
        .total_fund_shares
        .saturating_sub(allocation.limit_start_shares) as usize;

    let tier_ratio_sum: Decimal = config
        .extra_shares
        .iter()
        .take(extra_count)
        .map(|tier| tier.ratio)
        .sum();

    single_amount(allocation, config) * Decimal::from(allocation.limit_start_shares)
        + max * tier_ratio_sum / Decimal::ONE_HUNDRED
}

/// All three figures at once.
pub fn compute(allocation: &AccountStockAllocation, config: &BuyRatioConfig) -> AllocationFigures {
    AllocationFigures {
        single_amount: single_amount(allocation, config),
        daily_max_holding: daily_max_holding(allocation, config),
        max_holding: max_holding(allocation, config),
    }
}

/// Percentage of the account total a figure represents. `account_total ≤ 0`
/// means the total is unknown and the percentage is suppressed.
pub fn account_ratio(amount: Decimal, account_total: Decimal) -> Option<Decimal> {
    if account_total <= Decimal::ZERO {
        return None;
    }
    Some(amount / account_total * Decimal::ONE_HUNDRED)
}
