use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    models::{course, enrollment, user},
    pdf::{self, CertificateFields},
    GlobalState,
};

#[get("/course/{course_id}")]
pub async fn course_certificate(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let course_id = path.into_inner();

    enrollment::find_completed(&data.pool, caller.id, course_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotEligible("Certificate available only after course completion".to_string())
        })?;

    let holder = user::get_by_id(&data.pool, caller.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let course = course::get_course(&data.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let issued_on = Utc::now().format("%Y-%m-%d").to_string();
    let bytes = pdf::render(&CertificateFields {
        holder_name: &holder.full_name,
        course_title: &course.title,
        issuer: &data.config.certificate_issuer,
        issued_on: &issued_on,
    });

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"certificate_{}_{}.pdf\"",
                course.id, holder.id
            ),
        ))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};

    use crate::test_init_app::init;

    #[actix_web::test]
    async fn test_certificate_requires_a_token() {
        let app = init().await;

        let req = TestRequest::get()
            .uri(&format!(
                "/api/v1/certificates/course/{}",
                uuid::Uuid::new_v4()
            ))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 401);
    }
}
