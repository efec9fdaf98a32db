//! API resource implementations for the clinic client

/// Generic entity collection resource
pub mod collection;
/// Dashboard resource
pub mod dashboard;

pub use collection::Collection;
pub use dashboard::{Dashboard, DashboardOverview};
