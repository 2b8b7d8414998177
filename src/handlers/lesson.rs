use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::{require_role, AuthUser, Role},
    errors::ApiError,
    models::{course, lesson},
    schema::{
        course::{CreateLesson, UpdateLesson},
        MessageResponse,
    },
    GlobalState,
};

#[get("/course/{course_id}")]
pub async fn list_lessons(
    data: web::Data<GlobalState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let lessons = lesson::list_for_course(&data.pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(lessons))
}

#[post("/course/{course_id}")]
pub async fn create_lesson(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateLesson>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    let course_id = path.into_inner();
    course::get_course(&data.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let created = lesson::create_lesson(
        &data.pool,
        course_id,
        &body.title,
        body.content.as_deref(),
        body.video_url.as_deref(),
        body.position,
    )
    .await?;

    Ok(HttpResponse::Created().json(created))
}

#[get("/{id}")]
pub async fn get_lesson(
    data: web::Data<GlobalState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let lesson = lesson::get_lesson(&data.pool, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    Ok(HttpResponse::Ok().json(lesson))
}

#[put("/{id}")]
pub async fn update_lesson(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateLesson>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    let id = path.into_inner();
    lesson::get_lesson(&data.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let updated = lesson::update_lesson(&data.pool, id, &body).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/{id}")]
pub async fn delete_lesson(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    let deleted = lesson::delete_lesson(&data.pool, path.into_inner()).await?;
    if !deleted {
        return Err(ApiError::NotFound("Lesson not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Deleted".to_string(),
    }))
}
