pub mod analytics;
pub mod auth;
pub mod certificate;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod notification;
pub mod payment;
pub mod progress;
pub mod quiz;
pub mod resource;
pub mod user;
pub mod ws;

use actix_web::{get, HttpResponse, Responder};

use crate::schema::MessageResponse;

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse {
        message: "Healthy".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};

    use crate::schema::MessageResponse;
    use crate::test_init_app::init;

    #[actix_web::test]
    async fn test_health_check() {
        let app = init().await;

        let req = TestRequest::get().uri("/api/v1/health").to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());

        let body: MessageResponse = test::read_body_json(res).await;
        assert_eq!(body.message, "Healthy");
    }
}
