use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::{require_role, AuthUser, Role},
    errors::ApiError,
    models::{
        course,
        quiz::{self, Question},
        submission,
    },
    schema::quiz::{
        AddQuestion, CreateQuiz, OptionView, QuestionCreated, QuestionView, SubmissionResult,
        SubmitQuiz,
    },
    GlobalState,
};

/// Grades an answer map against the stored correct options.
///
/// A quiz with no questions grades to 100. Unknown question ids in the map
/// are ignored, as are questions whose correct option was never set. The
/// result is floor(correct / total * 100).
pub fn grade(questions: &[Question], answers: &HashMap<Uuid, Uuid>) -> i32 {
    if questions.is_empty() {
        return 100;
    }

    let correct = questions
        .iter()
        .filter(|question| match (answers.get(&question.id), question.correct_option_id) {
            (Some(selected), Some(correct_id)) => *selected == correct_id,
            _ => false,
        })
        .count();

    (correct * 100 / questions.len()) as i32
}

#[get("/course/{course_id}")]
pub async fn list_quizzes(
    data: web::Data<GlobalState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let quizzes = quiz::list_for_course(&data.pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[post("/course/{course_id}")]
pub async fn create_quiz(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateQuiz>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    if !(0..=100).contains(&body.passing_score) {
        return Err(ApiError::Validation(
            "passing_score must be between 0 and 100".to_string(),
        ));
    }

    let course_id = path.into_inner();
    course::get_course(&data.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let created = quiz::create_quiz(&data.pool, course_id, &body.title, body.passing_score).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/{quiz_id}/questions")]
pub async fn list_questions(
    data: web::Data<GlobalState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let quiz_id = path.into_inner();
    quiz::get_quiz(&data.pool, quiz_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let questions = quiz::load_questions(&data.pool, quiz_id).await?;
    let mut options_by_question: HashMap<Uuid, Vec<OptionView>> = HashMap::new();
    for option in quiz::load_options(&data.pool, quiz_id).await? {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(OptionView {
                id: option.id,
                text: option.text,
            });
    }

    let views = questions
        .into_iter()
        .map(|q| QuestionView {
            options: options_by_question.remove(&q.id).unwrap_or_default(),
            id: q.id,
            text: q.text,
        })
        .collect::<Vec<QuestionView>>();

    Ok(HttpResponse::Ok().json(views))
}

#[post("/{quiz_id}/questions")]
pub async fn add_question(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<AddQuestion>,
) -> Result<HttpResponse, ApiError> {
    require_role(&caller, &[Role::Instructor, Role::Admin])?;

    if body.text.trim().is_empty() {
        return Err(ApiError::Validation("text is required".to_string()));
    }

    let quiz_id = path.into_inner();
    quiz::get_quiz(&data.pool, quiz_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let options = body
        .options
        .iter()
        .map(|o| o.text.clone())
        .collect::<Vec<String>>();

    let question = quiz::create_question_with_options(
        &data.pool,
        quiz_id,
        body.text.trim(),
        &options,
        body.correct_index,
    )
    .await?;

    Ok(HttpResponse::Created().json(QuestionCreated {
        id: question.id,
        message: "Question added".to_string(),
    }))
}

#[post("/{quiz_id}/submit")]
pub async fn submit_quiz(
    data: web::Data<GlobalState>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<SubmitQuiz>,
) -> Result<HttpResponse, ApiError> {
    let quiz_id = path.into_inner();
    let quiz = quiz::get_quiz(&data.pool, quiz_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let questions = quiz::load_questions(&data.pool, quiz_id).await?;
    let score = grade(&questions, &body.answers);

    submission::record(&data.pool, caller.id, quiz_id, score).await?;

    Ok(HttpResponse::Ok().json(SubmissionResult {
        score,
        passed: score >= quiz.passing_score,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: Option<Uuid>) -> Question {
        Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            text: "2+2?".to_string(),
            correct_option_id: correct,
        }
    }

    #[test]
    fn empty_quiz_grades_to_vacuous_pass() {
        assert_eq!(grade(&[], &HashMap::new()), 100);
    }

    #[test]
    fn all_correct_answers_grade_to_full_score() {
        let questions: Vec<Question> =
            (0..3).map(|_| question(Some(Uuid::new_v4()))).collect();
        let answers = questions
            .iter()
            .map(|q| (q.id, q.correct_option_id.unwrap()))
            .collect::<HashMap<_, _>>();

        assert_eq!(grade(&questions, &answers), 100);
    }

    #[test]
    fn score_is_floored() {
        let questions: Vec<Question> =
            (0..3).map(|_| question(Some(Uuid::new_v4()))).collect();
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, questions[0].correct_option_id.unwrap());

        // 1 of 3 correct: floor(33.33) = 33
        assert_eq!(grade(&questions, &answers), 33);
    }

    #[test]
    fn unknown_question_ids_do_not_affect_the_score() {
        let questions: Vec<Question> =
            (0..2).map(|_| question(Some(Uuid::new_v4()))).collect();
        let mut answers = questions
            .iter()
            .map(|q| (q.id, q.correct_option_id.unwrap()))
            .collect::<HashMap<_, _>>();
        answers.insert(Uuid::new_v4(), Uuid::new_v4());
        answers.insert(Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(grade(&questions, &answers), 100);
    }

    #[test]
    fn wrong_selection_does_not_count() {
        let questions = vec![question(Some(Uuid::new_v4()))];
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, Uuid::new_v4());

        assert_eq!(grade(&questions, &answers), 0);
    }

    #[test]
    fn question_without_correct_option_never_counts() {
        let questions = vec![question(None)];
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, Uuid::new_v4());

        assert_eq!(grade(&questions, &answers), 0);
    }

    #[test]
    fn unanswered_questions_count_against_the_score() {
        let questions: Vec<Question> =
            (0..2).map(|_| question(Some(Uuid::new_v4()))).collect();
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, questions[0].correct_option_id.unwrap());

        assert_eq!(grade(&questions, &answers), 50);
    }
}
