use actix_web::{get, post, web, HttpResponse};

use crate::{
    auth::{self, AuthUser, Role, TokenKind},
    errors::ApiError,
    models::user::{self, User},
    schema::auth::{
        AccessToken, EmailAndPassword, RefreshRequest, RegisterRequest, RegisterResponse,
        TokenPair, UserResponse,
    },
    utils, GlobalState,
};

fn profile(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: user.role,
    }
}

#[post("/register")]
pub async fn register(
    data: web::Data<GlobalState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let role_name = body.role.as_deref().unwrap_or("student");
    let role = Role::from_name(role_name)
        .ok_or_else(|| ApiError::Validation(format!("Unknown role: {}", role_name)))?;

    let password_hash = utils::hash_password(&body.password).map_err(|_| ApiError::Internal)?;

    let user = user::create_user(&data.pool, &email, &password_hash, &body.full_name, role).await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "Registered".to_string(),
        user: profile(&user),
    }))
}

#[post("/login")]
pub async fn login(
    data: web::Data<GlobalState>,
    body: web::Json<EmailAndPassword>,
) -> Result<HttpResponse, ApiError> {
    let email = body.email.trim().to_lowercase();

    let user = user::find_by_email(&data.pool, &email)
        .await?
        .filter(|u| utils::verify_password(&body.password, &u.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let secret = &data.config.jwt_secret;
    Ok(HttpResponse::Ok().json(TokenPair {
        access_token: auth::issue_token(&user, TokenKind::Access, secret)?,
        refresh_token: auth::issue_token(&user, TokenKind::Refresh, secret)?,
    }))
}

#[post("/refresh")]
pub async fn refresh(
    data: web::Data<GlobalState>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::decode_token(&body.refresh_token, &data.config.jwt_secret)?;
    if claims.kind != TokenKind::Refresh {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    // Re-fetch so the fresh access token carries the current role, not the
    // one embedded when the refresh token was minted.
    let user = user::get_by_id(&data.pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(HttpResponse::Ok().json(AccessToken {
        access_token: auth::issue_token(&user, TokenKind::Access, &data.config.jwt_secret)?,
    }))
}

#[get("/me")]
pub async fn me(data: web::Data<GlobalState>, caller: AuthUser) -> Result<HttpResponse, ApiError> {
    let user = user::get_by_id(&data.pool, caller.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(profile(&user)))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};
    use serde_json::json;

    use crate::errors::ErrorBody;
    use crate::test_init_app::init;

    #[actix_web::test]
    async fn test_register_requires_email_and_password() {
        let app = init().await;

        let req = TestRequest::post()
            .set_json(json!({"email": "", "password": "", "full_name": "X"}))
            .uri("/api/v1/auth/register")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
        let body: ErrorBody = test::read_body_json(res).await;
        assert_eq!(body.error, "email and password are required");
    }

    #[actix_web::test]
    async fn test_register_rejects_unknown_role() {
        let app = init().await;

        let req = TestRequest::post()
            .set_json(json!({
                "email": "a@test.com",
                "password": "pw",
                "full_name": "X",
                "role": "superuser"
            }))
            .uri("/api/v1/auth/register")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
        let body: ErrorBody = test::read_body_json(res).await;
        assert_eq!(body.error, "Unknown role: superuser");
    }

    #[actix_web::test]
    async fn test_me_without_token_is_unauthorized() {
        let app = init().await;

        let req = TestRequest::get().uri("/api/v1/auth/me").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }
}
