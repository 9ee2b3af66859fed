//! Batch template-level switch.
//!
//! One chosen level is pushed across a batch of selected rows: for each row
//! the template registered for `(strategy, stock, level)` is resolved and
//! applied. The batch is not transactional: every row is attempted, every
//! outcome is recorded, and the caller gets one structured report.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::AdminApi;
use crate::models::{LevelSwitchReport, ReportAccumulator, TargetKind, TemplateLevel};

/// One selected row. A switch-level action cascades over stock-level configs
/// and the per-account overrides tied to them, so a batch mixes both kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchTarget {
    pub kind: TargetKind,
    /// Id of the config row the template is applied onto.
    pub target_id: String,
    pub strategy_id: String,
    pub stock_code: String,
    /// Set for strategy-user-stock rows.
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Drives a batch level switch against the remote store.
pub struct LevelSwitchEngine<'a> {
    api: &'a dyn AdminApi,
}

impl<'a> LevelSwitchEngine<'a> {
    pub fn new(api: &'a dyn AdminApi) -> Self {
        Self { api }
    }

    /// Switch every target to `level`.
    ///
    /// Targets without a registered template for their `(strategy, stock,
    /// level)` key are recorded as no-config with their identifying fields.
    /// Apply calls run with overwrite set; the switch was confirmed once for
    /// the whole batch. A per-target failure is recorded and the batch moves
    /// on.
    pub async fn switch_level(
        &self,
        targets: &[SwitchTarget],
        level: TemplateLevel,
    ) -> LevelSwitchReport {
        let mut accumulator = ReportAccumulator::new();

        for target in targets {
            let template = match self
                .api
                .find_level_template(&target.strategy_id, &target.stock_code, level)
                .await
            {
                Ok(Some(template)) => template,
                Ok(None) => {
                    debug!(
                        stock = %target.stock_code,
                        level = level.as_str(),
                        "no template registered for level"
                    );
                    accumulator.record_no_config(
                        target.kind,
                        target.stock_code.clone(),
                        target.account_id.clone(),
                    );
                    continue;
                }
                Err(err) => {
                    warn!(
                        stock = %target.stock_code,
                        error = %err,
                        "template resolution failed"
                    );
                    accumulator.record_failure(target.kind);
                    continue;
                }
            };

            let Some(template_id) = template.id.as_deref() else {
                warn!(stock = %target.stock_code, "resolved template has no id");
                accumulator.record_failure(target.kind);
                continue;
            };

            match self
                .api
                .apply_template(template_id, std::slice::from_ref(&target.target_id), true)
                .await
            {
                Ok(()) => accumulator.record_success(target.kind),
                Err(err) => {
                    warn!(
                        stock = %target.stock_code,
                        template = template_id,
                        error = %err,
                        "apply failed"
                    );
                    accumulator.record_failure(target.kind);
                }
            }
        }

        let report = accumulator.finish();
        info!(
            status = ?report.status,
            processed = report.total_process_count,
            succeeded = report.total_success_count,
            no_config = report.total_no_config_count,
            "level switch finished"
        );
        report
    }
}
