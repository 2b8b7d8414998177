use actix_web::{get, web, HttpResponse};

use crate::{
    auth::{require_role, AuthUser, Role},
    errors::ApiError,
    models::{course, enrollment, submission, user},
    schema::SummaryResponse,
    GlobalState,
};

#[get("/summary")]
pub async fn summary(data: web::Data<GlobalState>, caller: AuthUser) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Admin, Role::Instructor])?;

    let (users, courses, enrollments, quiz_submissions) = futures_util::try_join!(
        user::count_users(&data.pool),
        course::count_courses(&data.pool),
        enrollment::count_enrollments(&data.pool),
        submission::count_submissions(&data.pool),
    )?;

    Ok(HttpResponse::Ok().json(SummaryResponse {
        users,
        courses,
        enrollments,
        quiz_submissions,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};

    use crate::auth::Role;
    use crate::test_init_app::{init, token_for};

    #[actix_web::test]
    async fn test_summary_is_denied_to_students() {
        let app = init().await;

        let req = TestRequest::get()
            .append_header(("Authorization", token_for(Role::Student)))
            .uri("/api/v1/analytics/summary")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 403);
    }
}
