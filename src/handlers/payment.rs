use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    gateway::{self, GatewayEvent},
    models::{
        course, enrollment,
        payment::{self, PaymentStatus},
    },
    push::{self, ConnectionRegistry},
    schema::payment::{IntentResponse, WebhookAck},
    GlobalState,
};

#[post("/intent/{course_id}")]
pub async fn create_intent(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let gateway = data
        .gateway
        .as_ref()
        .ok_or_else(|| ApiError::Gateway("Payment gateway is not configured".to_string()))?;

    let course = course::get_course(&data.pool, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    // The local row is committed before the external call so an asynchronous
    // confirmation can always be correlated back, even if we crash in
    // between. No transaction is held across the network round-trip.
    let pending = payment::create_payment(
        &data.pool,
        caller.id,
        course.id,
        course.price_cents,
        "usd",
    )
    .await?;

    let intent = gateway
        .create_intent(
            pending.amount_cents,
            &pending.currency,
            pending.id,
            caller.id,
            course.id,
        )
        .await?;

    payment::set_external_ref(&data.pool, pending.id, &intent.id).await?;

    Ok(HttpResponse::Ok().json(IntentResponse {
        client_secret: intent.client_secret,
    }))
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    AlreadySettled,
    NotFound,
}

/// Applies a gateway success confirmation to local state. Safe to invoke any
/// number of times for the same reference: the conditional status update
/// keeps terminal states absorbing, and enrollment is idempotent. The enroll
/// also runs on repeat confirmations, which heals a crash between the status
/// transition and the enrollment grant.
pub async fn reconcile_succeeded(
    pool: &PgPool,
    registry: &ConnectionRegistry,
    external_ref: &str,
) -> Result<ReconcileOutcome, ApiError> {
    let Some(found) = payment::find_by_external_ref(pool, external_ref).await? else {
        return Ok(ReconcileOutcome::NotFound);
    };

    let applied =
        payment::transition_from_created(pool, found.id, PaymentStatus::Succeeded).await?;

    if applied {
        enrollment::enroll(pool, found.user_id, found.course_id).await?;

        let course_title = course::get_course(pool, found.course_id)
            .await?
            .map(|c| c.title)
            .unwrap_or_else(|| "your course".to_string());
        push::dispatch(
            pool,
            registry,
            found.user_id,
            &format!("Payment received. You are enrolled in {}.", course_title),
        )
        .await?;

        return Ok(ReconcileOutcome::Applied);
    }

    // The row was already terminal. Re-read: only a settled success still
    // grants access.
    let current = payment::find_by_external_ref(pool, external_ref).await?;
    if let Some(p) = current.filter(|p| p.status == PaymentStatus::Succeeded) {
        enrollment::enroll(pool, p.user_id, p.course_id).await?;
    }

    Ok(ReconcileOutcome::AlreadySettled)
}

pub async fn reconcile_failed(
    pool: &PgPool,
    external_ref: &str,
) -> Result<ReconcileOutcome, ApiError> {
    let Some(found) = payment::find_by_external_ref(pool, external_ref).await? else {
        return Ok(ReconcileOutcome::NotFound);
    };

    let applied = payment::transition_from_created(pool, found.id, PaymentStatus::Failed).await?;
    Ok(if applied {
        ReconcileOutcome::Applied
    } else {
        ReconcileOutcome::AlreadySettled
    })
}

#[post("/webhook")]
pub async fn webhook(
    data: web::Data<GlobalState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    if let Some(secret) = &data.config.webhook_secret {
        let header = req
            .headers()
            .get("Stripe-Signature")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        if !gateway::verify_signature(secret, &body, header, Utc::now().timestamp()) {
            warn!("webhook signature verification failed");
            return Err(ApiError::Validation("Invalid payload".to_string()));
        }
    }

    let event: GatewayEvent = serde_json::from_slice(&body)
        .map_err(|_| ApiError::Validation("Invalid payload".to_string()))?;

    match event.kind.as_str() {
        gateway::EVENT_PAYMENT_SUCCEEDED => {
            let outcome =
                reconcile_succeeded(&data.pool, &data.registry, &event.data.object.id).await?;
            if outcome == ReconcileOutcome::NotFound {
                warn!(external_ref = %event.data.object.id, "confirmation for unknown payment");
            } else {
                info!(external_ref = %event.data.object.id, ?outcome, "payment confirmed");
            }
        }
        gateway::EVENT_PAYMENT_FAILED => {
            let outcome = reconcile_failed(&data.pool, &event.data.object.id).await?;
            if outcome == ReconcileOutcome::NotFound {
                warn!(external_ref = %event.data.object.id, "failure event for unknown payment");
            }
        }
        _ => {}
    }

    Ok(HttpResponse::Ok().json(WebhookAck { received: true }))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};

    use crate::test_init_app::{init, token_for, TEST_WEBHOOK_SECRET};
    use crate::{auth::Role, gateway::signature_header};

    #[actix_web::test]
    async fn test_intent_requires_a_token() {
        let app = init().await;

        let req = TestRequest::post()
            .uri(&format!("/api/v1/payments/intent/{}", uuid::Uuid::new_v4()))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }

    #[actix_web::test]
    async fn test_intent_without_gateway_is_a_gateway_error() {
        let app = init().await;

        let req = TestRequest::post()
            .append_header(("Authorization", token_for(Role::Student)))
            .uri(&format!("/api/v1/payments/intent/{}", uuid::Uuid::new_v4()))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 502);
    }

    #[actix_web::test]
    async fn test_webhook_rejects_a_bad_signature() {
        let app = init().await;

        let payload = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_x"}}}"#;
        let req = TestRequest::post()
            .append_header(("Stripe-Signature", "t=0,v1=deadbeef"))
            .set_payload(payload.as_slice())
            .uri("/api/v1/payments/webhook")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_webhook_rejects_a_missing_signature() {
        let app = init().await;

        let req = TestRequest::post()
            .set_payload(r#"{"type":"noop","data":{"object":{"id":"x"}}}"#)
            .uri("/api/v1/payments/webhook")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_webhook_acknowledges_unhandled_event_kinds() {
        let app = init().await;

        let payload = br#"{"type":"charge.updated","data":{"object":{"id":"ch_1"}}}"#.to_vec();
        let header = signature_header(
            TEST_WEBHOOK_SECRET,
            &payload,
            chrono::Utc::now().timestamp(),
        );
        let req = TestRequest::post()
            .append_header(("Stripe-Signature", header))
            .set_payload(payload)
            .uri("/api/v1/payments/webhook")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert!(res.status().is_success());
    }
}
