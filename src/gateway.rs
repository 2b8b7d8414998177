use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

use crate::errors::ApiError;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Seconds a webhook timestamp may differ from local time before the
/// signature is refused.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// Client for the external payment provider. Constructed once at startup
/// when a secret key is configured; absent otherwise.
#[derive(Clone)]
pub struct PaymentGateway {
    secret_key: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
}

impl PaymentGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a payment intent carrying our local ids in its metadata so the
    /// asynchronous confirmation can be correlated back.
    pub async fn create_intent(
        &self,
        amount_cents: i32,
        currency: &str,
        payment_id: Uuid,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<CreatedIntent, ApiError> {
        let amount = amount_cents.to_string();
        let payment_id = payment_id.to_string();
        let user_id = user_id.to_string();
        let course_id = course_id.to_string();

        let params: &[(&str, &str)] = &[
            ("amount", &amount),
            ("currency", currency),
            ("metadata[payment_id]", &payment_id),
            ("metadata[user_id]", &user_id),
            ("metadata[course_id]", &course_id),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .http
            .post(format!("{}/payment_intents", API_BASE))
            .bearer_auth(&self.secret_key)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "payment gateway unreachable");
                ApiError::Gateway("Payment gateway unreachable".to_string())
            })?;

        if !response.status().is_success() {
            error!(status = %response.status(), "payment gateway refused intent");
            return Err(ApiError::Gateway(
                "Payment gateway refused the request".to_string(),
            ));
        }

        response.json::<CreatedIntent>().await.map_err(|e| {
            error!(error = %e, "payment gateway returned malformed intent");
            ApiError::Gateway("Payment gateway returned a malformed response".to_string())
        })
    }
}

/// Webhook event envelope: `{type, data: {object: {id, ...}}}`.
#[derive(Debug, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: GatewayEventData,
}

#[derive(Debug, Deserialize)]
pub struct GatewayEventData {
    pub object: GatewayObject,
}

#[derive(Debug, Deserialize)]
pub struct GatewayObject {
    pub id: String,
}

type HmacSha256 = Hmac<Sha256>;

fn hex_digest(secret: &str, timestamp: &str, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let digest = mac.finalize().into_bytes();
    Some(digest.iter().fold(
        String::with_capacity(digest.len() * 2),
        |mut out, byte| {
            out.push_str(&format!("{:02x}", byte));
            out
        },
    ))
}

/// Verifies a `t=...,v1=...` signature header: HMAC-SHA256 over
/// `"{t}.{payload}"`, constant-time compare, timestamp within tolerance of
/// `at`. Any malformed part fails closed.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str, at: i64) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return false;
    };
    if candidates.is_empty() {
        return false;
    }

    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };
    if (at - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    let Some(expected) = hex_digest(secret, timestamp, payload) else {
        return false;
    };

    candidates.iter().any(|candidate| {
        candidate.len() == expected.len()
            && constant_time_eq::constant_time_eq(candidate.as_bytes(), expected.as_bytes())
    })
}

#[cfg(test)]
pub fn signature_header(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let ts = timestamp.to_string();
    let digest = hex_digest(secret, &ts, payload).unwrap();
    format!("t={},v1={}", ts, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;

    #[test]
    fn valid_signature_is_accepted() {
        let now = 1_700_000_000;
        let header = signature_header(SECRET, PAYLOAD, now);
        assert!(verify_signature(SECRET, PAYLOAD, &header, now));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let now = 1_700_000_000;
        let header = signature_header(SECRET, PAYLOAD, now);
        assert!(!verify_signature(SECRET, b"{\"type\":\"other\"}", &header, now));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = 1_700_000_000;
        let header = signature_header("whsec_other", PAYLOAD, now);
        assert!(!verify_signature(SECRET, PAYLOAD, &header, now));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let signed_at = 1_700_000_000;
        let header = signature_header(SECRET, PAYLOAD, signed_at);
        assert!(!verify_signature(
            SECRET,
            PAYLOAD,
            &header,
            signed_at + SIGNATURE_TOLERANCE_SECS + 1
        ));
    }

    #[test]
    fn malformed_header_is_rejected() {
        let now = 1_700_000_000;
        assert!(!verify_signature(SECRET, PAYLOAD, "", now));
        assert!(!verify_signature(SECRET, PAYLOAD, "t=abc,v1=deadbeef", now));
        assert!(!verify_signature(SECRET, PAYLOAD, "v1=deadbeef", now));
        assert!(!verify_signature(SECRET, PAYLOAD, "t=1700000000", now));
    }

    #[test]
    fn event_envelope_parses() {
        let event: GatewayEvent = serde_json::from_slice(PAYLOAD).unwrap();
        assert_eq!(event.kind, EVENT_PAYMENT_SUCCEEDED);
        assert_eq!(event.data.object.id, "pi_1");
    }
}
