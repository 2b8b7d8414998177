use serde::{Deserialize, Serialize};

pub mod auth;
pub mod course;
pub mod notification;
pub mod payment;
pub mod progress;
pub mod quiz;

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SummaryResponse {
    pub users: i64,
    pub courses: i64,
    pub enrollments: i64,
    pub quiz_submissions: i64,
}
