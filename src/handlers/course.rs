use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::{require_role, AuthUser, Role},
    errors::ApiError,
    models::{course, enrollment},
    schema::{
        course::{CourseFilter, CreateCourse, EnrollResponse, UpdateCourse},
        MessageResponse,
    },
    GlobalState,
};

#[get("")]
pub async fn list_courses(
    data: web::Data<GlobalState>,
    filter: web::Query<CourseFilter>,
) -> Result<HttpResponse, ApiError> {
    let courses = course::list_courses(&data.pool, filter.published).await?;
    Ok(HttpResponse::Ok().json(courses))
}

#[post("")]
pub async fn create_course(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    body: web::Json<CreateCourse>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    if body.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }

    let created = course::create_course(
        &data.pool,
        body.title.trim(),
        body.description.as_deref(),
        caller.id,
        body.price_cents,
        body.published,
    )
    .await?;

    Ok(HttpResponse::Created().json(created))
}

#[get("/{id}")]
pub async fn get_course(
    data: web::Data<GlobalState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let course = course::get_course(&data.pool, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(HttpResponse::Ok().json(course))
}

#[put("/{id}")]
pub async fn update_course(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCourse>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    let id = path.into_inner();
    let existing = course::get_course(&data.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    // Instructors may only touch their own courses; admins may touch any.
    if caller.role != Role::Admin && existing.instructor_id != caller.id {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    let updated = course::update_course(&data.pool, id, &body).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/{id}")]
pub async fn delete_course(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Admin])?;

    let deleted = course::delete_course_cascade(&data.pool, path.into_inner()).await?;
    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Deleted".to_string(),
    }))
}

#[post("/{id}/enroll")]
pub async fn enroll(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let course_id = path.into_inner();

    course::get_course(&data.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let enrollment = enrollment::enroll(&data.pool, caller.id, course_id).await?;

    Ok(HttpResponse::Created().json(EnrollResponse {
        message: "Enrolled".to_string(),
        enrollment_id: enrollment.id,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};
    use serde_json::json;

    use crate::auth::Role;
    use crate::test_init_app::{init, token_for};

    #[actix_web::test]
    async fn test_course_creation_requires_a_token() {
        let app = init().await;

        let req = TestRequest::post()
            .set_json(json!({"title": "Rust 101"}))
            .uri("/api/v1/courses")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }

    #[actix_web::test]
    async fn test_students_cannot_create_courses() {
        let app = init().await;

        let req = TestRequest::post()
            .set_json(json!({"title": "Rust 101"}))
            .append_header(("Authorization", token_for(Role::Student)))
            .uri("/api/v1/courses")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 403);
    }

    #[actix_web::test]
    async fn test_course_title_is_required() {
        let app = init().await;

        let req = TestRequest::post()
            .set_json(json!({"title": "  "}))
            .append_header(("Authorization", token_for(Role::Instructor)))
            .uri("/api/v1/courses")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_course_deletion_is_admin_only() {
        let app = init().await;

        let req = TestRequest::delete()
            .append_header(("Authorization", token_for(Role::Instructor)))
            .uri(&format!("/api/v1/courses/{}", uuid::Uuid::new_v4()))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 403);
    }
}
