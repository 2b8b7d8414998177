use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    models::{
        course,
        enrollment::{self, EnrollmentStatus},
    },
    push, GlobalState,
};

#[get("")]
pub async fn my_enrollments(
    data: web::Data<GlobalState>,
    caller: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let enrollments = enrollment::list_for_user(&data.pool, caller.id).await?;
    Ok(HttpResponse::Ok().json(enrollments))
}

#[post("/{id}/complete")]
pub async fn complete_enrollment(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let updated = enrollment::transition(
        &data.pool,
        path.into_inner(),
        caller.id,
        EnrollmentStatus::Completed,
    )
    .await?;

    let course_title = course::get_course(&data.pool, updated.course_id)
        .await?
        .map(|c| c.title)
        .unwrap_or_else(|| "your course".to_string());
    push::dispatch(
        &data.pool,
        &data.registry,
        caller.id,
        &format!("You completed {}. Your certificate is ready.", course_title),
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[post("/{id}/cancel")]
pub async fn cancel_enrollment(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let updated = enrollment::transition(
        &data.pool,
        path.into_inner(),
        caller.id,
        EnrollmentStatus::Cancelled,
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};

    use crate::test_init_app::init;

    #[actix_web::test]
    async fn test_enrollment_listing_requires_a_token() {
        let app = init().await;

        let req = TestRequest::get().uri("/api/v1/enrollments").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }
}
