use actix_web::{delete, get, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::{require_role, AuthUser, Role},
    errors::ApiError,
    models::user,
    schema::{auth::UserResponse, MessageResponse},
    GlobalState,
};

#[get("")]
pub async fn list_users(data: web::Data<GlobalState>, caller: AuthUser) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Admin])?;

    let users = user::list_users(&data.pool).await?;
    let users = users
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            role: u.role,
        })
        .collect::<Vec<UserResponse>>();

    Ok(HttpResponse::Ok().json(users))
}

#[get("/{id}")]
pub async fn get_user(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Admin])?;

    let user = user::get_by_id(&data.pool, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
    }))
}

#[delete("/{id}")]
pub async fn delete_user(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Admin])?;

    // Destructive action: the token's role claim may be stale, so check the
    // stored role as well before acting.
    let stored_role = user::get_role(&data.pool, caller.id).await?;
    if stored_role != Some(Role::Admin) {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    let deleted = user::delete_user(&data.pool, path.into_inner()).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};

    use crate::auth::Role;
    use crate::test_init_app::{init, token_for};

    #[actix_web::test]
    async fn test_listing_users_requires_admin() {
        let app = init().await;

        let req = TestRequest::get()
            .append_header(("Authorization", token_for(Role::Student)))
            .uri("/api/v1/users")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 403);
    }

    #[actix_web::test]
    async fn test_listing_users_requires_a_token() {
        let app = init().await;

        let req = TestRequest::get().uri("/api/v1/users").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }
}
