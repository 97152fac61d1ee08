use crate::analysis::validation::{require_text, validate_progress};
use crate::commands::settings::EffectiveSettings;
use crate::commands::{decode_records, load_records, merge_record, next_id, record_id, to_record};
use crate::models::goal::Goal;
use crate::store::KeyedStore;
use serde_json::{json, Value};

pub const GOALS_KEY: &str = "goals";

fn default_goals() -> Vec<Goal> {
    vec![
        Goal {
            id: 1,
            title: "Learn React Hooks".to_string(),
            progress: 70,
        },
        Goal {
            id: 2,
            title: "Revise DSA concepts".to_string(),
            progress: 40,
        },
    ]
}

fn goal_records(store: &KeyedStore, settings: &EffectiveSettings) -> Vec<Value> {
    load_records(store, GOALS_KEY, || {
        if settings.seed_defaults {
            default_goals()
        } else {
            Vec::new()
        }
    })
}

pub fn load_goals(store: &KeyedStore, settings: &EffectiveSettings) -> Vec<Goal> {
    decode_records(GOALS_KEY, &goal_records(store, settings))
}

fn checked(item: Goal) -> Result<Goal, String> {
    Ok(Goal {
        id: item.id,
        title: require_text("title", &item.title).map_err(|e| e.to_string())?,
        progress: validate_progress(item.progress).map_err(|e| e.to_string())?,
    })
}

fn persist(store: &KeyedStore, goals: &[Value]) -> Result<(), String> {
    store
        .save(GOALS_KEY, goals)
        .map_err(|e| format!("Save error: {e}"))
}

pub fn goal_crud(
    store: &KeyedStore,
    settings: &EffectiveSettings,
    operation: &str,
    item: Option<Goal>,
    id: Option<i64>,
) -> Result<Value, String> {
    let mut goals = goal_records(store, settings);

    match operation {
        "list" => Ok(Value::Array(goals)),
        "read" => {
            let id = id.ok_or("ID required for read")?;
            let goal = goals.into_iter().find(|g| record_id(g) == Some(id));
            Ok(goal.unwrap_or(Value::Null))
        }
        "create" => {
            let item = checked(item.ok_or("Item required for create")?)?;
            let id = next_id(goals.iter().filter_map(record_id));
            goals.push(to_record(&Goal { id, ..item })?);
            persist(store, &goals)?;
            Ok(json!({"status": "created", "id": id}))
        }
        "update" => {
            let item = checked(item.ok_or("Item required for update")?)?;
            let slot = goals
                .iter_mut()
                .find(|g| record_id(g) == Some(item.id))
                .ok_or(format!("Goal not found: {}", item.id))?;
            merge_record(slot, to_record(&item)?);
            persist(store, &goals)?;
            Ok(json!({"status": "updated", "id": item.id}))
        }
        "delete" => {
            let id = id.ok_or("ID required for delete")?;
            goals.retain(|g| record_id(g) != Some(id));
            persist(store, &goals)?;
            Ok(json!({"status": "deleted"}))
        }
        _ => Err(format!("Unknown operation: {operation}")),
    }
}
