use crate::analysis::stats::dashboard_stats;
use crate::analysis::weekly;
use crate::commands::goals::load_goals;
use crate::commands::progress::{recorded_entries, week_label};
use crate::commands::resources::load_featured_resources;
use crate::commands::settings::EffectiveSettings;
use crate::models::dashboard::DashboardOverview;
use crate::store::KeyedStore;
use chrono::NaiveDate;

/// Everything the overview page shows, derived fresh from the store.
///
/// Progress is never seeded here, so a fresh install reports an empty week.
pub fn dashboard_overview(
    store: &KeyedStore,
    settings: &EffectiveSettings,
    today: NaiveDate,
) -> DashboardOverview {
    let goals = load_goals(store, settings);
    let resources = load_featured_resources(store, settings);
    let slots = weekly::compute(&recorded_entries(store), today);

    DashboardOverview {
        stats: dashboard_stats(&goals, &resources, &slots),
        week_label: week_label(today),
        slots,
    }
}
