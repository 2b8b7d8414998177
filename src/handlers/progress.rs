use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    models::progress,
    schema::progress::{RecordProgress, RecordedResponse},
    GlobalState,
};

#[get("/course/{course_id}")]
pub async fn course_progress(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let events = progress::list_for_course(&data.pool, caller.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(events))
}

#[post("/course/{course_id}")]
pub async fn record_progress(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<RecordProgress>,
) -> Result<HttpResponse, ApiError> {
    let recorded = progress::record(
        &data.pool,
        caller.id,
        path.into_inner(),
        body.lesson_id,
        body.completed,
    )
    .await?;

    Ok(HttpResponse::Created().json(RecordedResponse {
        message: "Recorded".to_string(),
        id: recorded.id,
    }))
}
