//! Shared test doubles for the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{AdminApi, AllocationFilter, TemplateFilter};
use crate::error::EngineError;
use crate::models::{AccountStockAllocation, ConfigTemplate, ConfigType, TemplateLevel};

/// In-memory [`AdminApi`] with real duplicate-identity semantics and
/// scriptable failures, so engine tests exercise the same protocol the
/// remote store speaks.
#[derive(Default)]
pub struct MockAdminApi {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    templates: Vec<ConfigTemplate>,
    level_index: HashMap<(String, String, TemplateLevel), String>,
    allocations: Vec<AccountStockAllocation>,

    /// Template ids whose apply call fails with a transport error.
    fail_apply: HashSet<String>,
    /// Template ids whose apply call conflicts until forced.
    conflict_apply: HashSet<String>,
    /// Verbatim server error returned by every delete, when set.
    delete_error: Option<String>,

    applied: Vec<AppliedCall>,
}

/// One recorded apply call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCall {
    pub template_id: String,
    pub target_ids: Vec<String>,
    pub force_overwrite: bool,
}

impl MockAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template and index it for level resolution.
    pub fn with_level_template(
        self,
        strategy_id: &str,
        stock_code: &str,
        level: TemplateLevel,
        template_name: &str,
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.mint_id();
            state.templates.push(ConfigTemplate {
                id: Some(id.clone()),
                template_name: template_name.to_string(),
                config_type: ConfigType::TimeSegment,
                source_stock_code: Some(stock_code.to_string()),
                strategy_id: Some(strategy_id.to_string()),
                min_market_cap: None,
                max_market_cap: None,
                payload: serde_json::json!({"level": level.as_str()}),
                created_at: None,
            });
            state.level_index.insert(
                (strategy_id.to_string(), stock_code.to_string(), level),
                id,
            );
        }
        self
    }

    pub fn fail_apply_on(self, template_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_apply
            .insert(template_id.to_string());
        self
    }

    pub fn conflict_apply_on(self, template_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .conflict_apply
            .insert(template_id.to_string());
        self
    }

    pub fn with_delete_error(self, message: &str) -> Self {
        self.state.lock().unwrap().delete_error = Some(message.to_string());
        self
    }

    pub fn applied(&self) -> Vec<AppliedCall> {
        self.state.lock().unwrap().applied.clone()
    }

    pub fn template_named(&self, name: &str) -> Option<ConfigTemplate> {
        self.state
            .lock()
            .unwrap()
            .templates
            .iter()
            .find(|t| t.template_name == name)
            .cloned()
    }

    pub fn template_count(&self) -> usize {
        self.state.lock().unwrap().templates.len()
    }

    /// Id the level index assigned to `(strategy, stock, level)`.
    pub fn level_template_id(
        &self,
        strategy_id: &str,
        stock_code: &str,
        level: TemplateLevel,
    ) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .level_index
            .get(&(strategy_id.to_string(), stock_code.to_string(), level))
            .cloned()
    }
}

impl MockState {
    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("tpl-{}", self.next_id)
    }
}

#[async_trait]
impl AdminApi for MockAdminApi {
    async fn list_allocations(
        &self,
        filter: &AllocationFilter,
    ) -> Result<Vec<AccountStockAllocation>, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .allocations
            .iter()
            .filter(|a| {
                filter
                    .account_id
                    .as_ref()
                    .is_none_or(|v| &a.account_id == v)
                    && filter.stock_code.as_ref().is_none_or(|v| &a.stock_code == v)
                    && filter
                        .strategy_id
                        .as_ref()
                        .is_none_or(|v| &a.strategy_id == v)
            })
            .cloned()
            .collect())
    }

    async fn create_allocation(
        &self,
        allocation: &AccountStockAllocation,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let id = state.mint_id();
        let mut stored = allocation.clone();
        stored.id = Some(id);
        state.allocations.push(stored);
        Ok(())
    }

    async fn update_allocation(
        &self,
        id: &str,
        allocation: &AccountStockAllocation,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let Some(slot) = state
            .allocations
            .iter_mut()
            .find(|a| a.id.as_deref() == Some(id))
        else {
            return Err(EngineError::Transport(format!("allocation {id} not found")));
        };
        let mut updated = allocation.clone();
        updated.id = Some(id.to_string());
        *slot = updated;
        Ok(())
    }

    async fn delete_allocation(&self, id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let before = state.allocations.len();
        state.allocations.retain(|a| a.id.as_deref() != Some(id));
        if state.allocations.len() == before {
            return Err(EngineError::Transport(format!("allocation {id} not found")));
        }
        Ok(())
    }

    async fn list_templates(
        &self,
        config_type: ConfigType,
        filter: &TemplateFilter,
    ) -> Result<Vec<ConfigTemplate>, EngineError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .templates
            .iter()
            .filter(|t| t.config_type == config_type)
            .filter(|t| {
                filter
                    .strategy_id
                    .as_ref()
                    .is_none_or(|v| t.strategy_id.as_ref() == Some(v))
            })
            .filter(|t| {
                filter
                    .source_stock_code
                    .as_ref()
                    .is_none_or(|v| t.source_stock_code.as_ref() == Some(v))
            })
            .cloned()
            .collect())
    }

    async fn create_template(
        &self,
        template: &ConfigTemplate,
        force_overwrite: bool,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();

        let existing = state.templates.iter().position(|t| {
            t.config_type == template.config_type && t.template_name == template.template_name
        });

        match existing {
            Some(index) if force_overwrite => {
                let id = state.templates[index].id.clone();
                let mut stored = template.clone();
                stored.id = id;
                state.templates[index] = stored;
                Ok(())
            }
            Some(_) => Err(EngineError::Conflict(format!(
                "template \"{}\" already exists",
                template.template_name
            ))),
            None => {
                let id = state.mint_id();
                let mut stored = template.clone();
                stored.id = Some(id);
                state.templates.push(stored);
                Ok(())
            }
        }
    }

    async fn delete_template(&self, id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.delete_error {
            return Err(EngineError::Transport(message.clone()));
        }
        let before = state.templates.len();
        state.templates.retain(|t| t.id.as_deref() != Some(id));
        if state.templates.len() == before {
            return Err(EngineError::Transport(format!("template {id} not found")));
        }
        Ok(())
    }

    async fn apply_template(
        &self,
        template_id: &str,
        target_ids: &[String],
        force_overwrite: bool,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_apply.contains(template_id) {
            return Err(EngineError::Transport(format!(
                "apply failed for template {template_id}"
            )));
        }
        if state.conflict_apply.contains(template_id) && !force_overwrite {
            return Err(EngineError::Conflict(format!(
                "targets already configured from template {template_id}"
            )));
        }

        state.applied.push(AppliedCall {
            template_id: template_id.to_string(),
            target_ids: target_ids.to_vec(),
            force_overwrite,
        });
        Ok(())
    }

    async fn find_level_template(
        &self,
        strategy_id: &str,
        stock_code: &str,
        level: TemplateLevel,
    ) -> Result<Option<ConfigTemplate>, EngineError> {
        let state = self.state.lock().unwrap();
        let id = state
            .level_index
            .get(&(strategy_id.to_string(), stock_code.to_string(), level));
        Ok(id.and_then(|id| {
            state
                .templates
                .iter()
                .find(|t| t.id.as_deref() == Some(id))
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn allocation_crud_round_trip() {
        let api = MockAdminApi::new();

        let alloc =
            AccountStockAllocation::with_max_amount("acct-1", "005930", "strat-1", dec!(10000));
        api.create_allocation(&alloc).await.unwrap();

        let filter = AllocationFilter {
            account_id: Some("acct-1".to_string()),
            stock_code: None,
            strategy_id: None,
        };
        let listed = api.list_allocations(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        let id = listed[0].id.clone().unwrap();

        let mut updated = listed[0].clone();
        updated.max_amount = Some(dec!(20000));
        api.update_allocation(&id, &updated).await.unwrap();

        let listed = api.list_allocations(&filter).await.unwrap();
        assert_eq!(listed[0].max_amount, Some(dec!(20000)));

        api.delete_allocation(&id).await.unwrap();
        assert!(api
            .list_allocations(&AllocationFilter::default())
            .await
            .unwrap()
            .is_empty());

        // Deleting again surfaces the server error.
        assert!(api.delete_allocation(&id).await.is_err());
    }
}
