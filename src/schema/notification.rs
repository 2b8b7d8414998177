use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateNotification {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct WsAuth {
    pub token: Option<String>,
}
