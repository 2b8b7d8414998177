use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use actix_ws::Session;
use serde_json::json;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    models::notification::{self, Notification},
};

/// Process-local registry of live push connections, one per user. Lost on
/// restart; notifications stay durable in the store regardless.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl ConnectionRegistry {
    /// A new connection for the same user replaces the previous one.
    pub fn register(&self, user_id: Uuid, session: Session) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(user_id, session);
        }
    }

    pub fn unregister(&self, user_id: Uuid) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&user_id);
        }
    }

    /// Best-effort delivery; returns whether a frame went out. A dead
    /// session is dropped from the registry on the way.
    pub async fn send(&self, user_id: Uuid, event: &str, payload: serde_json::Value) -> bool {
        let session = match self.sessions.lock() {
            Ok(sessions) => sessions.get(&user_id).cloned(),
            Err(_) => None,
        };

        let Some(mut session) = session else {
            return false;
        };

        let frame = json!({ "event": event, "data": payload }).to_string();
        if session.text(frame).await.is_err() {
            self.unregister(user_id);
            return false;
        }

        true
    }
}

/// Notification Dispatcher: persist first, then push. A missed push never
/// fails the record.
pub async fn dispatch(
    pool: &PgPool,
    registry: &ConnectionRegistry,
    user_id: Uuid,
    message: &str,
) -> Result<Notification, ApiError> {
    let created = notification::create_notification(pool, user_id, message).await?;

    let payload = serde_json::to_value(&created).unwrap_or(serde_json::Value::Null);
    if !registry.send(user_id, "notification", payload).await {
        warn!(user_id = %user_id, "no live connection, notification stored only");
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn send_without_a_connection_reports_undelivered() {
        let registry = ConnectionRegistry::default();
        let delivered = registry
            .send(Uuid::new_v4(), "notification", json!({"message": "hi"}))
            .await;
        assert!(!delivered);
    }

    #[actix_web::test]
    async fn unregister_of_unknown_user_is_harmless() {
        let registry = ConnectionRegistry::default();
        registry.unregister(Uuid::new_v4());
    }
}
