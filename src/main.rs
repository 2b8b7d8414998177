use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::info;
use tracing_subscriber::EnvFilter;

use errors::AppError;
use gateway::PaymentGateway;
use push::ConnectionRegistry;

mod auth;
mod errors;
mod gateway;
mod handlers;
mod models;
mod pdf;
mod push;
mod schema;
#[cfg(test)]
mod test_init_app;
mod utils;

pub struct AppConfig {
    pub jwt_secret: String,
    pub webhook_secret: Option<String>,
    pub certificate_issuer: String,
}

impl AppConfig {
    fn from_env() -> Result<Self, AppError> {
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| AppError::MissingConfig("JWT_SECRET"))?;

        // An empty webhook secret means the deployment explicitly trusts
        // gateway callbacks as-is.
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty());

        let certificate_issuer =
            std::env::var("CERTIFICATE_ISSUER").unwrap_or_else(|_| "EduTrack".to_string());

        Ok(AppConfig {
            jwt_secret,
            webhook_secret,
            certificate_issuer,
        })
    }
}

pub struct GlobalState {
    pub pool: Pool<Postgres>,
    pub config: AppConfig,
    pub gateway: Option<PaymentGateway>,
    pub registry: ConnectionRegistry,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(handlers::health_check)
            .service(
                web::scope("/auth")
                    .service(handlers::auth::register)
                    .service(handlers::auth::login)
                    .service(handlers::auth::refresh)
                    .service(handlers::auth::me),
            )
            .service(
                web::scope("/users")
                    .service(handlers::user::list_users)
                    .service(handlers::user::get_user)
                    .service(handlers::user::delete_user),
            )
            .service(
                web::scope("/courses")
                    .service(handlers::course::list_courses)
                    .service(handlers::course::create_course)
                    .service(handlers::course::get_course)
                    .service(handlers::course::update_course)
                    .service(handlers::course::delete_course)
                    .service(handlers::course::enroll),
            )
            .service(
                web::scope("/lessons")
                    .service(handlers::lesson::list_lessons)
                    .service(handlers::lesson::create_lesson)
                    .service(handlers::lesson::get_lesson)
                    .service(handlers::lesson::update_lesson)
                    .service(handlers::lesson::delete_lesson),
            )
            .service(
                web::scope("/resources")
                    .service(handlers::resource::list_resources)
                    .service(handlers::resource::create_resource),
            )
            .service(
                web::scope("/quizzes")
                    .service(handlers::quiz::list_quizzes)
                    .service(handlers::quiz::create_quiz)
                    .service(handlers::quiz::list_questions)
                    .service(handlers::quiz::add_question)
                    .service(handlers::quiz::submit_quiz),
            )
            .service(
                web::scope("/enrollments")
                    .service(handlers::enrollment::my_enrollments)
                    .service(handlers::enrollment::complete_enrollment)
                    .service(handlers::enrollment::cancel_enrollment),
            )
            .service(
                web::scope("/progress")
                    .service(handlers::progress::course_progress)
                    .service(handlers::progress::record_progress),
            )
            .service(
                web::scope("/payments")
                    .service(handlers::payment::create_intent)
                    .service(handlers::payment::webhook),
            )
            .service(
                web::scope("/certificates").service(handlers::certificate::course_certificate),
            )
            .service(
                web::scope("/notifications")
                    .service(handlers::notification::list_notifications)
                    .service(handlers::notification::create_notification)
                    .service(handlers::notification::mark_read),
            )
            .service(web::scope("/ws").service(handlers::ws::notifications_ws))
            .service(web::scope("/analytics").service(handlers::analytics::summary)),
    );
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let address = "127.0.0.1:8080";
    let config = AppConfig::from_env()?;
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| AppError::MissingConfig("DATABASE_URL"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .map_err(|_e| AppError::DbConnect)?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|_e| AppError::Migrate)?;

    let gateway = std::env::var("STRIPE_SECRET_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .map(PaymentGateway::new);
    if gateway.is_none() {
        info!("no payment gateway credential configured, intents disabled");
    }

    let global_state = GlobalState {
        pool,
        config,
        gateway,
        registry: ConnectionRegistry::default(),
    };

    let app_data = web::Data::new(global_state);

    info!("The Server is running at PORT : 8080");

    HttpServer::new(move || App::new().app_data(app_data.clone()).configure(routes))
        .bind(address)
        .map_err(|_e| AppError::SocketBind)?
        .run()
        .await
        .map_err(|_e| AppError::ServerStart)?;

    Ok(())
}
