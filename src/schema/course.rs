use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCourse {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: i32,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCourse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i32>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CourseFilter {
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLesson {
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateLesson {
    pub title: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResource {
    pub title: String,
    pub resource_type: String,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub message: String,
    pub enrollment_id: Uuid,
}
