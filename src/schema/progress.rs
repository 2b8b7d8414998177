use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_completed() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordProgress {
    pub lesson_id: Option<Uuid>,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub message: String,
    pub id: Uuid,
}
