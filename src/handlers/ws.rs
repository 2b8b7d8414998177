use std::time::{Duration, Instant};

use actix_web::{get, rt, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use serde_json::json;
use tokio::time;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{self, AuthUser},
    errors::ApiError,
    push::ConnectionRegistry,
    schema::notification::WsAuth,
    GlobalState,
};

/// Time between heartbeats to the client.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// Max idle time before the connection is dropped.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Live notification channel. Browsers cannot set headers on websocket
/// upgrades, so the token is also accepted as a query parameter.
#[get("/notifications")]
pub async fn notifications_ws(
    data: web::Data<GlobalState>,
    req: HttpRequest,
    query: web::Query<WsAuth>,
    body: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let token = query
        .token
        .clone()
        .or_else(|| {
            req.headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .map(String::from)
        })
        .ok_or_else(|| ApiError::Unauthorized("Token Not found".to_string()))?;

    let caller: AuthUser = auth::authenticate(&token, &data.config.jwt_secret)?;

    let (response, session, stream) = actix_ws::handle(&req, body)
        .map_err(|_| ApiError::Validation("WebSocket handshake failed".to_string()))?;

    data.registry.register(caller.id, session.clone());
    rt::spawn(run_session(
        data.registry.clone(),
        caller.id,
        session,
        stream,
    ));

    Ok(response)
}

pub async fn run_session(
    registry: ConnectionRegistry,
    user_id: Uuid,
    mut session: Session,
    mut stream: MessageStream,
) {
    let greeting = json!({
        "event": "connected",
        "data": { "message": "Connected to notifications" }
    })
    .to_string();
    if session.text(greeting).await.is_err() {
        registry.unregister(user_id);
        return;
    }

    let mut last_heartbeat = Instant::now();
    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
                    debug!(user_id = %user_id, "push connection idle, dropping");
                    break;
                }
                if session.ping(b"").await.is_err() {
                    break;
                }
            }
            message = stream.recv() => {
                match message {
                    Some(Ok(Message::Ping(bytes))) => {
                        last_heartbeat = Instant::now();
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Text(_))) => {
                        last_heartbeat = Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.unregister(user_id);
    let _ = session.close(None).await;
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};

    use crate::test_init_app::init;

    #[actix_web::test]
    async fn test_ws_requires_a_token() {
        let app = init().await;

        let req = TestRequest::get()
            .uri("/api/v1/ws/notifications")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }
}
