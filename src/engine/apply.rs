//! Overwrite-confirmation protocol for template operations.
//!
//! Every apply attempt walks one state machine: try without overwrite; on a
//! duplicate-identity conflict, surface the server's message and ask for
//! explicit confirmation; on yes, retry with overwrite; on no, abort with
//! nothing mutated. The machine keeps no state between runs, so a fresh
//! attempt after an abort starts over cleanly.

use std::future::Future;

use tracing::{info, warn};

use crate::api::AdminApi;
use crate::error::EngineError;
use crate::models::ConfigTemplate;

use super::template_store::TemplateStore;

/// Terminal outcome of one apply attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The operation went through (possibly after a confirmed overwrite).
    Applied,
    /// A conflict was reported and the caller declined to overwrite. Nothing
    /// was mutated.
    Aborted,
    /// The operation failed; the message is the server's, verbatim.
    Failed(String),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

/// Run `operation` through the overwrite-confirmation protocol.
///
/// `operation` receives the `force_overwrite` flag; `confirm` receives the
/// server's conflict message and decides whether to overwrite.
pub async fn run_with_overwrite<F, Fut, C>(operation: F, mut confirm: C) -> ApplyOutcome
where
    F: Fn(bool) -> Fut,
    Fut: Future<Output = Result<(), EngineError>>,
    C: FnMut(&str) -> bool,
{
    match operation(false).await {
        Ok(()) => ApplyOutcome::Applied,
        Err(EngineError::Conflict(message)) => {
            info!(conflict = %message, "overwrite confirmation required");
            if !confirm(&message) {
                info!("overwrite declined, aborting");
                return ApplyOutcome::Aborted;
            }
            match operation(true).await {
                Ok(()) => ApplyOutcome::Applied,
                Err(err) => {
                    warn!(error = %err, "forced apply failed");
                    ApplyOutcome::Failed(err.to_string())
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "apply failed");
            ApplyOutcome::Failed(err.to_string())
        }
    }
}

/// The two template operations that run under the protocol.
pub struct TemplateApplier<'a> {
    api: &'a dyn AdminApi,
}

impl<'a> TemplateApplier<'a> {
    pub fn new(api: &'a dyn AdminApi) -> Self {
        Self { api }
    }

    /// "Save as template": create through the store's uniqueness check, with
    /// the overwrite protocol on a duplicate identity.
    pub async fn save_as_template<C>(&self, template: &ConfigTemplate, confirm: C) -> ApplyOutcome
    where
        C: FnMut(&str) -> bool,
    {
        let store = TemplateStore::new(self.api);
        run_with_overwrite(|force| store.save(template, force), confirm).await
    }

    /// "Apply template": overwrite the targets' configuration from a stored
    /// template, confirming first when the server reports a conflict.
    pub async fn apply_to_targets<C>(
        &self,
        template_id: &str,
        target_ids: &[String],
        confirm: C,
    ) -> ApplyOutcome
    where
        C: FnMut(&str) -> bool,
    {
        run_with_overwrite(
            |force| self.api.apply_template(template_id, target_ids, force),
            confirm,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfigType;
    use crate::test_support::MockAdminApi;

    fn template(name: &str) -> ConfigTemplate {
        ConfigTemplate {
            id: None,
            template_name: name.to_string(),
            config_type: ConfigType::StrategyConfig,
            source_stock_code: None,
            strategy_id: None,
            min_market_cap: None,
            max_market_cap: None,
            payload: serde_json::json!({"firstShareRatio": 3}),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn clean_save_applies_without_confirmation() {
        let api = MockAdminApi::new();
        let applier = TemplateApplier::new(&api);

        let mut asked = false;
        let outcome = applier
            .save_as_template(&template("X"), |_| {
                asked = true;
                true
            })
            .await;

        assert!(outcome.is_applied());
        assert!(!asked);
    }

    #[tokio::test]
    async fn confirmed_conflict_overwrites() {
        let api = MockAdminApi::new();
        let applier = TemplateApplier::new(&api);

        applier.save_as_template(&template("X"), |_| false).await;

        let mut replacement = template("X");
        replacement.payload = serde_json::json!({"firstShareRatio": 7});

        let mut seen_message = String::new();
        let outcome = applier
            .save_as_template(&replacement, |message| {
                seen_message = message.to_string();
                true
            })
            .await;

        assert!(outcome.is_applied());
        assert!(seen_message.contains("X"), "message was {seen_message:?}");
        assert_eq!(
            api.template_named("X").unwrap().payload["firstShareRatio"],
            7
        );
    }

    #[tokio::test]
    async fn declined_conflict_aborts_without_mutation() {
        let api = MockAdminApi::new();
        let applier = TemplateApplier::new(&api);

        applier.save_as_template(&template("X"), |_| false).await;

        let mut replacement = template("X");
        replacement.payload = serde_json::json!({"firstShareRatio": 7});

        let outcome = applier.save_as_template(&replacement, |_| false).await;

        assert_eq!(outcome, ApplyOutcome::Aborted);
        assert_eq!(
            api.template_named("X").unwrap().payload["firstShareRatio"],
            3
        );
    }

    #[tokio::test]
    async fn machine_is_reentrant_after_abort() {
        let api = MockAdminApi::new();
        let applier = TemplateApplier::new(&api);

        applier.save_as_template(&template("X"), |_| false).await;

        let mut replacement = template("X");
        replacement.payload = serde_json::json!({"firstShareRatio": 9});

        let aborted = applier.save_as_template(&replacement, |_| false).await;
        assert_eq!(aborted, ApplyOutcome::Aborted);

        // Same attempt again, confirming this time: starts over from a clean
        // first attempt and succeeds.
        let applied = applier.save_as_template(&replacement, |_| true).await;
        assert!(applied.is_applied());
        assert_eq!(
            api.template_named("X").unwrap().payload["firstShareRatio"],
            9
        );
    }

    #[tokio::test]
    async fn apply_to_targets_confirms_then_forces() {
        let api = MockAdminApi::new()
            .with_level_template("strat-1", "005930", crate::models::TemplateLevel::A, "a-tpl")
            .conflict_apply_on("tpl-1");
        let applier = TemplateApplier::new(&api);

        let targets = vec!["alloc-1".to_string(), "alloc-2".to_string()];

        let outcome = applier.apply_to_targets("tpl-1", &targets, |_| true).await;
        assert!(outcome.is_applied());

        let calls = api.applied();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].force_overwrite);
        assert_eq!(calls[0].target_ids, targets);
    }

    #[tokio::test]
    async fn transport_failure_is_terminal_with_verbatim_message() {
        let api = MockAdminApi::new().fail_apply_on("tpl-9");
        let applier = TemplateApplier::new(&api);

        let mut asked = false;
        let outcome = applier
            .apply_to_targets("tpl-9", &["alloc-1".to_string()], |_| {
                asked = true;
                true
            })
            .await;

        assert_eq!(
            outcome,
            ApplyOutcome::Failed("apply failed for template tpl-9".to_string())
        );
        assert!(!asked);
        assert!(api.applied().is_empty());
    }
}
