//! Template store client: uniqueness-checked save, filtered listing, delete.

use tracing::{debug, info};

use crate::api::{AdminApi, TemplateFilter};
use crate::error::EngineError;
use crate::models::{
    ConfigTemplate, ConfigType, TimeSegmentConfig, TimeSegmentTemplate,
};

/// Client-side protocol over the remote template store.
pub struct TemplateStore<'a> {
    api: &'a dyn AdminApi,
}

impl<'a> TemplateStore<'a> {
    pub fn new(api: &'a dyn AdminApi) -> Self {
        Self { api }
    }

    /// Create a template.
    ///
    /// Without `force_overwrite`, existing templates of the same config type
    /// are listed first and a duplicate name is rejected before the create is
    /// attempted. The pre-check is advisory: two callers racing on one name
    /// still meet the server's authoritative check, which reports the same
    /// conflict.
    pub async fn save(
        &self,
        template: &ConfigTemplate,
        force_overwrite: bool,
    ) -> Result<(), EngineError> {
        if !force_overwrite {
            let existing = self
                .api
                .list_templates(template.config_type, &TemplateFilter::default())
                .await?;

            if existing
                .iter()
                .any(|t| t.template_name == template.template_name)
            {
                return Err(EngineError::Conflict(format!(
                    "template \"{}\" already exists",
                    template.template_name
                )));
            }
        }

        self.api.create_template(template, force_overwrite).await?;
        info!(
            name = %template.template_name,
            config_type = template.config_type.as_str(),
            force_overwrite,
            "template saved"
        );
        Ok(())
    }

    /// Promote a time-segment config into a reusable template.
    ///
    /// The segment list is validated and canonicalized first; nothing is sent
    /// for an invalid list. The template name encodes the identity key
    /// (stock + account + level), so promoting the same identity twice runs
    /// into the same duplicate conflict as any other name collision.
    pub async fn save_time_segment_template(
        &self,
        template: &TimeSegmentTemplate,
        force_overwrite: bool,
    ) -> Result<(), EngineError> {
        let canonical = TimeSegmentConfig::new(template.entries.clone()).into_canonical()?;

        let name = format!(
            "{}:{}:{}",
            template.stock_code,
            template.account_id.as_deref().unwrap_or(""),
            template.template_level.as_str(),
        );

        let record = ConfigTemplate {
            id: None,
            template_name: name,
            config_type: ConfigType::TimeSegment,
            source_stock_code: Some(template.stock_code.clone()),
            strategy_id: None,
            min_market_cap: None,
            max_market_cap: None,
            payload: serde_json::json!({
                "useScenario": template.use_scenario,
                "entries": canonical.entries,
            }),
            created_at: template.created_at,
        };

        self.save(&record, force_overwrite).await
    }

    /// List templates, optionally narrowed to a selection of target rows.
    ///
    /// With a non-empty selection, only templates whose source stock is unset
    /// (wildcard) or matches a selected row survive. The narrowing is
    /// client-side and advisory, not a server contract.
    pub async fn list(
        &self,
        config_type: ConfigType,
        filter: &TemplateFilter,
        selected_stock_codes: &[String],
    ) -> Result<Vec<ConfigTemplate>, EngineError> {
        let mut templates = self.api.list_templates(config_type, filter).await?;

        if !selected_stock_codes.is_empty() {
            let before = templates.len();
            templates.retain(|t| t.matches_selection(selected_stock_codes));
            debug!(
                before,
                after = templates.len(),
                "narrowed templates to selection"
            );
        }

        Ok(templates)
    }

    /// Delete a template. Server errors (template still referenced, etc.)
    /// surface verbatim.
    pub async fn delete(&self, id: &str) -> Result<(), EngineError> {
        self.api.delete_template(id).await
    }
}
