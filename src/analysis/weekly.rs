use crate::models::progress::{DayLabel, ProgressEntry, WeekSlot};
use chrono::{Datelike, Days, NaiveDate};

/// Monday on or before `date`. `None` when that Monday precedes the first
/// representable date.
pub fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    let offset = date.weekday().num_days_from_monday();
    date.checked_sub_days(Days::new(u64::from(offset)))
}

/// Dates whose week cannot be represented belong to no week.
pub fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    matches!((week_start(a), week_start(b)), (Some(a), Some(b)) if a == b)
}

/// The seven dates Monday..Sunday of the week containing `reference`, when
/// the whole week fits in the calendar.
pub fn week_dates(reference: NaiveDate) -> Option<[NaiveDate; 7]> {
    let days: Vec<NaiveDate> = week_start(reference)?.iter_days().take(7).collect();
    days.try_into().ok()
}

/// Week dates for `reference`, moved one week inward at either calendar edge.
fn chart_dates(reference: NaiveDate) -> Option<[NaiveDate; 7]> {
    week_dates(reference)
        .or_else(|| reference.checked_sub_days(Days::new(7)).and_then(week_dates))
        .or_else(|| reference.checked_add_days(Days::new(7)).and_then(week_dates))
}

/// Projects `entries` onto the Monday-start week containing `reference`.
///
/// A slot takes the first entry, in input order, that falls in the slot's
/// week on the slot's weekday. Slots without an entry read 0. Progress values
/// are passed through as stored. A reference in the first or last partial
/// week of the calendar charts the neighbouring full week.
pub fn compute(entries: &[ProgressEntry], reference: NaiveDate) -> Vec<WeekSlot> {
    let Some(dates) = chart_dates(reference) else {
        return Vec::new();
    };

    DayLabel::ALL
        .into_iter()
        .zip(dates)
        .map(|(day, date)| {
            let entry = entries
                .iter()
                .find(|e| same_week(e.date, date) && DayLabel::of(e.date) == day);

            WeekSlot {
                day,
                date,
                progress: entry.map(|e| e.progress).unwrap_or(0),
            }
        })
        .collect()
}

/// Mean of the slots, rounded half up. 0 for an empty week.
pub fn weekly_average(slots: &[WeekSlot]) -> i64 {
    super::stats::rounded_mean(slots.iter().map(|slot| slot.progress))
}
