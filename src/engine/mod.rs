//! Engine layer: allocation figures and the template protocol.

pub mod calculator;
mod apply;
mod level_switch;
mod template_store;

pub use apply::{run_with_overwrite, ApplyOutcome, TemplateApplier};
pub use level_switch::{LevelSwitchEngine, SwitchTarget};
pub use template_store::TemplateStore;
