//! Per account × stock × strategy allocation record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Capital allocation for one account/stock pair under one strategy.
///
/// Sizing uses exactly one of two modes: an absolute ceiling (`max_amount`)
/// or a share of account equity (`fund_percent`). The referenced buy-ratio
/// config is looked up separately by strategy+stock key; this record does not
/// own it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStockAllocation {
    #[serde(default)]
    pub id: Option<String>,

    pub account_id: String,
    pub stock_code: String,
    pub strategy_id: String,

    /// Absolute capital ceiling for this pair. Exclusive with `fund_percent`.
    #[serde(default)]
    pub max_amount: Option<Decimal>,

    /// Share of account equity, in percent. Exclusive with `max_amount`.
    #[serde(default)]
    pub fund_percent: Option<Decimal>,

    /// Max concurrent unsold buy orders per day.
    #[serde(default = "default_unsold_stack_limit")]
    pub unsold_stack_limit: u32,

    /// Index from which tier-based limiting begins.
    #[serde(default = "default_limit_start_shares")]
    pub limit_start_shares: u32,

    /// Total number of capital slices the allocation divides into.
    #[serde(default = "default_total_fund_shares")]
    pub total_fund_shares: u32,
}

fn default_unsold_stack_limit() -> u32 {
    4
}

fn default_limit_start_shares() -> u32 {
    9
}

fn default_total_fund_shares() -> u32 {
    18
}

impl AccountStockAllocation {
    /// New allocation in max-amount mode with the stock defaults.
    pub fn with_max_amount(
        account_id: impl Into<String>,
        stock_code: impl Into<String>,
        strategy_id: impl Into<String>,
        max_amount: Decimal,
    ) -> Self {
        Self {
            id: None,
            account_id: account_id.into(),
            stock_code: stock_code.into(),
            strategy_id: strategy_id.into(),
            max_amount: Some(max_amount),
            fund_percent: None,
            unsold_stack_limit: default_unsold_stack_limit(),
            limit_start_shares: default_limit_start_shares(),
            total_fund_shares: default_total_fund_shares(),
        }
    }

    /// Check the exactly-one-sizing-mode invariant and the 1-based counters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.max_amount.is_some(), self.fund_percent.is_some()) {
            (true, false) | (false, true) => {}
            _ => return Err(ValidationError::FundModeAmbiguous),
        }
        if self.unsold_stack_limit < 1 {
            return Err(ValidationError::NonPositiveShares("unsoldStackLimit"));
        }
        if self.limit_start_shares < 1 {
            return Err(ValidationError::NonPositiveShares("limitStartShares"));
        }
        if self.total_fund_shares < 1 {
            return Err(ValidationError::NonPositiveShares("totalFundShares"));
        }
        Ok(())
    }

    /// Effective capital ceiling for display in fund-percent mode: the
    /// percent applied to the live account total. Derived trading figures
    /// never use this; they read `max_amount` only.
    pub fn effective_ceiling(&self, account_total: Decimal) -> Option<Decimal> {
        match (self.max_amount, self.fund_percent) {
            (Some(amount), _) => Some(amount),
            (None, Some(percent)) if account_total > Decimal::ZERO => {
                Some(account_total * percent / Decimal::ONE_HUNDRED)
            }
            _ => None,
        }
    }
}
