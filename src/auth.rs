use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ApiError, models::user::User, GlobalState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub fn from_name(name: &str) -> Option<Role> {
        match name {
            "admin" => Some(Role::Admin),
            "instructor" => Some(Role::Instructor),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by both token kinds. The role claim is trusted as issued;
/// destructive admin actions re-verify the role against the store.
#[derive(Debug, Serialize, Deserialize)]
pub struct JWTClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub kind: TokenKind,
    pub exp: usize,
}

const ACCESS_TOKEN_TTL_HOURS: i64 = 1;
const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

pub fn issue_token(user: &User, kind: TokenKind, secret: &str) -> Result<String, ApiError> {
    let expires_at = match kind {
        TokenKind::Access => Utc::now() + Duration::hours(ACCESS_TOKEN_TTL_HOURS),
        TokenKind::Refresh => Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS),
    };

    let claims = JWTClaims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        kind,
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| ApiError::Internal)
}

pub fn decode_token(token: &str, secret: &str) -> Result<JWTClaims, ApiError> {
    decode::<JWTClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))
}

/// Verified caller identity, extracted from the Authorization header before
/// the handler body runs. A missing or malformed credential denies the
/// request without touching any domain state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(auth_user_from_request(req))
    }
}

fn auth_user_from_request(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let state = req
        .app_data::<web::Data<GlobalState>>()
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthorized("Token Not found".to_string()))?;

    let token = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    authenticate(token, &state.config.jwt_secret)
}

/// Accepts the token either bare or with a `Bearer ` prefix.
pub fn authenticate(token: &str, secret: &str) -> Result<AuthUser, ApiError> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

    let claims = decode_token(token, secret)?;

    if claims.kind != TokenKind::Access {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    Ok(AuthUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

/// Role axis of the authorization gate: the caller's role must be a member
/// of the action's required set.
pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Insufficient permissions".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-jwt-secret";

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@test.com".to_string(),
            password_hash: "x".to_string(),
            full_name: "A Student".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let user = sample_user(Role::Student);
        let token = issue_token(&user, TokenKind::Access, SECRET).unwrap();

        let authed = authenticate(&token, SECRET).unwrap();
        assert_eq!(authed.id, user.id);
        assert_eq!(authed.email, user.email);
        assert_eq!(authed.role, Role::Student);
    }

    #[test]
    fn bearer_prefix_is_accepted() {
        let user = sample_user(Role::Instructor);
        let token = issue_token(&user, TokenKind::Access, SECRET).unwrap();

        let authed = authenticate(&format!("Bearer {}", token), SECRET).unwrap();
        assert_eq!(authed.role, Role::Instructor);
    }

    #[test]
    fn refresh_token_is_rejected_on_access_paths() {
        let user = sample_user(Role::Student);
        let token = issue_token(&user, TokenKind::Refresh, SECRET).unwrap();

        assert!(matches!(
            authenticate(&token, SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user = sample_user(Role::Student);
        let token = issue_token(&user, TokenKind::Access, SECRET).unwrap();

        assert!(matches!(
            authenticate(&token, "other-secret"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            authenticate("not.a.jwt", SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn role_gate_allows_members_and_denies_others() {
        let user = sample_user(Role::Student);
        let token = issue_token(&user, TokenKind::Access, SECRET).unwrap();
        let authed = authenticate(&token, SECRET).unwrap();

        assert!(require_role(&authed, &[Role::Student, Role::Admin]).is_ok());
        assert!(matches!(
            require_role(&authed, &[Role::Instructor, Role::Admin]),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn unknown_role_names_do_not_resolve() {
        assert_eq!(Role::from_name("student"), Some(Role::Student));
        assert_eq!(Role::from_name("superuser"), None);
    }
}
