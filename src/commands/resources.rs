use crate::analysis::validation::{optional_text, require_text};
use crate::commands::settings::EffectiveSettings;
use crate::commands::{decode_records, load_records, merge_record, next_id, record_id, to_record};
use crate::models::resource::Resource;
use crate::store::KeyedStore;
use serde_json::{json, Value};

pub const RESOURCES_KEY: &str = "resources";

fn default_resources() -> Vec<Resource> {
    vec![
        Resource {
            id: 1,
            title: "React Docs".to_string(),
            link: "https://react.dev".to_string(),
            image: Some("https://upload.wikimedia.org/wikipedia/commons/a/a7/React-icon.svg".to_string()),
        },
        Resource {
            id: 2,
            title: "FreeCodeCamp".to_string(),
            link: "https://www.freecodecamp.org".to_string(),
            image: Some(
                "https://www.freecodecamp.org/news/content/images/size/w2000/2022/07/fcc_primary_large_1.png"
                    .to_string(),
            ),
        },
    ]
}

fn resource_records(store: &KeyedStore, settings: &EffectiveSettings) -> Vec<Value> {
    load_records(store, RESOURCES_KEY, || {
        if settings.seed_defaults {
            default_resources()
        } else {
            Vec::new()
        }
    })
}

pub fn load_resources(store: &KeyedStore, settings: &EffectiveSettings) -> Vec<Resource> {
    decode_records(RESOURCES_KEY, &resource_records(store, settings))
}

/// The overview page only seeds the first sample resource.
pub fn load_featured_resources(store: &KeyedStore, settings: &EffectiveSettings) -> Vec<Resource> {
    let records = load_records(store, RESOURCES_KEY, || {
        if settings.seed_defaults {
            default_resources().into_iter().take(1).collect()
        } else {
            Vec::new()
        }
    });
    decode_records(RESOURCES_KEY, &records)
}

fn checked(item: Resource) -> Result<Resource, String> {
    Ok(Resource {
        id: item.id,
        title: require_text("title", &item.title).map_err(|e| e.to_string())?,
        link: require_text("link", &item.link).map_err(|e| e.to_string())?,
        image: optional_text(item.image.as_deref()),
    })
}

fn persist(store: &KeyedStore, resources: &[Value]) -> Result<(), String> {
    store
        .save(RESOURCES_KEY, resources)
        .map_err(|e| format!("Save error: {e}"))
}

pub fn resource_crud(
    store: &KeyedStore,
    settings: &EffectiveSettings,
    operation: &str,
    item: Option<Resource>,
    id: Option<i64>,
) -> Result<Value, String> {
    let mut resources = resource_records(store, settings);

    match operation {
        "list" => Ok(Value::Array(resources)),
        "read" => {
            let id = id.ok_or("ID required for read")?;
            let resource = resources.into_iter().find(|r| record_id(r) == Some(id));
            Ok(resource.unwrap_or(Value::Null))
        }
        "create" => {
            let item = checked(item.ok_or("Item required for create")?)?;
            let id = next_id(resources.iter().filter_map(record_id));
            resources.push(to_record(&Resource { id, ..item })?);
            persist(store, &resources)?;
            Ok(json!({"status": "created", "id": id}))
        }
        "update" => {
            let item = checked(item.ok_or("Item required for update")?)?;
            let slot = resources
                .iter_mut()
                .find(|r| record_id(r) == Some(item.id))
                .ok_or(format!("Resource not found: {}", item.id))?;
            merge_record(slot, to_record(&item)?);
            if item.image.is_none() {
                if let Some(fields) = slot.as_object_mut() {
                    fields.remove("image");
                }
            }
            persist(store, &resources)?;
            Ok(json!({"status": "updated", "id": item.id}))
        }
        "delete" => {
            let id = id.ok_or("ID required for delete")?;
            resources.retain(|r| record_id(r) != Some(id));
            persist(store, &resources)?;
            Ok(json!({"status": "deleted"}))
        }
        _ => Err(format!("Unknown operation: {operation}")),
    }
}
