//! Dashboard aggregate model.

use serde::{Deserialize, Serialize};

/// Totals shown on the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_members: u64,
    pub total_companies: u64,
    pub total_points: i64,
    /// Change-log entries written during the current UTC day
    pub recent_activity: u64,
}
