//! Batch operation reports.
//!
//! A batch level switch never throws for a per-target failure: every target
//! is attempted, each outcome is recorded into a [`ReportAccumulator`], and
//! the caller gets one [`LevelSwitchReport`]. Reports are transient: they
//! are rendered and dropped, never persisted.

use serde::{Deserialize, Serialize};

/// Aggregate outcome of a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchStatus {
    Success,
    PartialSuccess,
    NoConfig,
    NoData,
    Failure,
}

/// The two row kinds a switch-level batch touches. One logical action
/// cascades to the stock-level config and the per-account overrides tied to
/// it, so a selection mixes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    StrategyStock,
    StrategyUserStock,
}

/// Counts for one row kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub kind: TargetKind,
    pub process_count: u32,
    pub success_count: u32,
    pub no_config_count: u32,
    pub failure_count: u32,
}

impl CategoryBreakdown {
    fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            process_count: 0,
            success_count: 0,
            no_config_count: 0,
            failure_count: 0,
        }
    }
}

/// A target that had no matching template, recorded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoConfigEntry {
    pub stock_code: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Structured result of one batch level switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSwitchReport {
    pub status: SwitchStatus,
    pub total_process_count: u32,
    pub total_success_count: u32,
    pub total_no_config_count: u32,
    pub total_failure_count: u32,
    pub categories: Vec<CategoryBreakdown>,
    pub no_config_list: Vec<NoConfigEntry>,
}

/// Collects independent per-target outcomes, then derives the aggregate
/// status. There is no rollback path; partial application is an accepted
/// outcome of a non-transactional batch.
#[derive(Debug)]
pub struct ReportAccumulator {
    strategy_stock: CategoryBreakdown,
    strategy_user_stock: CategoryBreakdown,
    no_config_list: Vec<NoConfigEntry>,
}

impl ReportAccumulator {
    pub fn new() -> Self {
        Self {
            strategy_stock: CategoryBreakdown::new(TargetKind::StrategyStock),
            strategy_user_stock: CategoryBreakdown::new(TargetKind::StrategyUserStock),
            no_config_list: Vec::new(),
        }
    }

    fn category(&mut self, kind: TargetKind) -> &mut CategoryBreakdown {
        match kind {
            TargetKind::StrategyStock => &mut self.strategy_stock,
            TargetKind::StrategyUserStock => &mut self.strategy_user_stock,
        }
    }

    pub fn record_success(&mut self, kind: TargetKind) {
        let category = self.category(kind);
        category.process_count += 1;
        category.success_count += 1;
    }

    pub fn record_no_config(
        &mut self,
        kind: TargetKind,
        stock_code: impl Into<String>,
        account_id: Option<String>,
    ) {
        let category = self.category(kind);
        category.process_count += 1;
        category.no_config_count += 1;
        self.no_config_list.push(NoConfigEntry {
            stock_code: stock_code.into(),
            account_id,
        });
    }

    pub fn record_failure(&mut self, kind: TargetKind) {
        let category = self.category(kind);
        category.process_count += 1;
        category.failure_count += 1;
    }

    /// Derive the aggregate status and freeze the report.
    pub fn finish(self) -> LevelSwitchReport {
        let total = self.strategy_stock.process_count + self.strategy_user_stock.process_count;
        let success = self.strategy_stock.success_count + self.strategy_user_stock.success_count;
        let no_config =
            self.strategy_stock.no_config_count + self.strategy_user_stock.no_config_count;
        let failure = self.strategy_stock.failure_count + self.strategy_user_stock.failure_count;

        let status = if total == 0 {
            SwitchStatus::NoData
        } else if no_config == 0 && failure == 0 {
            SwitchStatus::Success
        } else if success == 0 && no_config > 0 {
            SwitchStatus::NoConfig
        } else if success == 0 && no_config == 0 {
            SwitchStatus::Failure
        } else {
            SwitchStatus::PartialSuccess
        };

        LevelSwitchReport {
            status,
            total_process_count: total,
            total_success_count: success,
            total_no_config_count: no_config,
            total_failure_count: failure,
            categories: vec![self.strategy_stock, self.strategy_user_stock],
            no_config_list: self.no_config_list,
        }
    }
}

impl Default for ReportAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
