//! Remote admin-service interface and its HTTP implementation.

mod admin_client;
mod types;

pub use admin_client::{AdminApi, HttpAdminClient};
pub use types::{AllocationFilter, ApiEnvelope, TemplateFilter};
