//! Data models for allocations, buy-ratio ladders, time segments, and templates.

mod allocation;
mod buy_ratio;
mod time_segment;
mod template;
mod report;

pub use allocation::AccountStockAllocation;
pub use buy_ratio::{BuyRatioConfig, BuyTier};
pub use time_segment::{minute_of_day, TimeSegmentConfig, TimeSegmentEntry};
pub use template::{ConfigTemplate, ConfigType, TemplateLevel, TimeSegmentTemplate};
pub use report::{
    CategoryBreakdown, LevelSwitchReport, NoConfigEntry, ReportAccumulator, SwitchStatus,
    TargetKind,
};
