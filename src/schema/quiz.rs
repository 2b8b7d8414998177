use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_passing_score() -> i32 {
    70
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateQuiz {
    pub title: String,
    #[serde(default = "default_passing_score")]
    pub passing_score: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionInput {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddQuestion {
    pub text: String,
    #[serde(default)]
    pub options: Vec<OptionInput>,
    #[serde(default)]
    pub correct_index: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionCreated {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionView {
    pub id: Uuid,
    pub text: String,
}

/// Question as shown to a quiz taker; the correct option stays server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitQuiz {
    #[serde(default)]
    pub answers: HashMap<Uuid, Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub score: i32,
    pub passed: bool,
}
