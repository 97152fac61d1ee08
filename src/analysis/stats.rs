use crate::models::dashboard::DashboardStats;
use crate::models::goal::Goal;
use crate::models::progress::WeekSlot;
use crate::models::resource::Resource;

/// Integer mean rounded half up (toward positive infinity). 0 when empty.
///
/// Sums in `i128`, so any stored `i64` values average without overflow; the
/// result saturates at the `i64` bounds.
pub fn rounded_mean(values: impl IntoIterator<Item = i64>) -> i64 {
    let (sum, count) = values
        .into_iter()
        .fold((0i128, 0u64), |(sum, count), v| (sum + i128::from(v), count + 1));

    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64 + 0.5).floor() as i64
}

pub fn dashboard_stats(goals: &[Goal], resources: &[Resource], week: &[WeekSlot]) -> DashboardStats {
    DashboardStats {
        goals: goals.len(),
        resources: resources.len(),
        weekly: super::weekly::weekly_average(week),
        goal_average: rounded_mean(goals.iter().map(|g| g.progress)),
    }
}
