use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::{require_role, AuthUser, Role},
    errors::ApiError,
    models::{course, resource},
    schema::course::CreateResource,
    GlobalState,
};

#[get("/course/{course_id}")]
pub async fn list_resources(
    data: web::Data<GlobalState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let resources = resource::list_for_course(&data.pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(resources))
}

#[post("/course/{course_id}")]
pub async fn create_resource(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateResource>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    let course_id = path.into_inner();
    course::get_course(&data.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let created = resource::create_resource(
        &data.pool,
        course_id,
        &body.title,
        &body.resource_type,
        &body.url,
    )
    .await?;

    Ok(HttpResponse::Created().json(created))
}
