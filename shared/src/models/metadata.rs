use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Metadata ---

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub generation: u16,
}

impl Metadata {
    pub fn named(name: &str) -> Self {
        Metadata {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Metadata {
            id,
            name: id.to_string(),
            created_at: now,
            modified_at: now,
            generation: 0,
        }
    }
}
