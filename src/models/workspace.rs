use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMeta {
    pub path: String,
    pub backend: String,
    pub document_count: usize,
    pub keys: Vec<String>,
}
