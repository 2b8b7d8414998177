use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    models::notification,
    push,
    schema::{notification::CreateNotification, MessageResponse},
    GlobalState,
};

#[get("")]
pub async fn list_notifications(
    data: web::Data<GlobalState>,
    caller: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let notifications = notification::list_for_user(&data.pool, caller.id).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

#[post("")]
pub async fn create_notification(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    body: web::Json<CreateNotification>,
) -> Result<HttpResponse, ApiError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation("message is required".to_string()));
    }

    let created = push::dispatch(&data.pool, &data.registry, caller.id, message).await?;
    Ok(HttpResponse::Created().json(created))
}

#[post("/{id}/read")]
pub async fn mark_read(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    // A notification owned by someone else reads the same as a missing one.
    let updated = notification::mark_read(&data.pool, path.into_inner(), caller.id).await?;
    if !updated {
        return Err(ApiError::NotFound("Not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Marked as read".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};
    use serde_json::json;

    use crate::auth::Role;
    use crate::errors::ErrorBody;
    use crate::test_init_app::{init, token_for};

    #[actix_web::test]
    async fn test_notifications_require_a_token() {
        let app = init().await;

        let req = TestRequest::get().uri("/api/v1/notifications").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }

    #[actix_web::test]
    async fn test_blank_messages_are_rejected() {
        let app = init().await;

        let req = TestRequest::post()
            .set_json(json!({"message": "   "}))
            .append_header(("Authorization", token_for(Role::Student)))
            .uri("/api/v1/notifications")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
        let body: ErrorBody = test::read_body_json(res).await;
        assert_eq!(body.error, "message is required");
    }
}
