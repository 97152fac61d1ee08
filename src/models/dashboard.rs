use super::progress::WeekSlot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub goals: usize,
    pub resources: usize,
    pub weekly: i64,
    pub goal_average: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub week_label: String,
    pub slots: Vec<WeekSlot>,
}
