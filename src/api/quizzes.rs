use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reqwest::Method;
use serde_json::Value;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{lock_mutation, CurrentSession, CurrentStudent};
use crate::api::pagination::{list_page, ListQuery};
use crate::api::remote::{fetch_collection, snapshots, RemoteCollection};
use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::schemas::quiz::{
    AnswerInput, AttemptSubmission, DailyQuizEntry, DailySubmission, Quiz, QuizAttempt,
    QuizAvailability, QuizListItem, QuizQuestion, QuizQuestionsResponse,
};
use crate::schemas::user::Role;
use crate::schemas::CollectionBody;
use crate::services::listing::Page;
use crate::services::session::Session;

const QUIZZES: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::Quiz,
    path: "/api/quizzes",
    resource: "quizzes",
    action: "fetch quizzes",
};

const MY_ATTEMPTS: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::Quiz,
    path: "/api/quizzes/attempts/my",
    resource: "quiz_attempts",
    action: "fetch quiz attempts",
};

const DAILY_HISTORY: RemoteCollection<'static> = RemoteCollection {
    service: UpstreamService::Quiz,
    path: "/api/daily-quizzes/history",
    resource: "daily_quiz_history",
    action: "fetch daily quiz history",
};

/// Mounted under `/quizzes`.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quizzes))
        .route("/attempts/my", get(my_attempts))
        .route("/attempts/:id/review", get(review_attempt))
        .route("/:id/questions", get(quiz_questions))
        .route("/:id/attempts", post(submit_attempt))
}

/// Mounted under `/daily-quizzes`.
pub(crate) fn daily_router() -> Router<AppState> {
    Router::new()
        .route("/today", get(daily_today))
        .route("/history", get(daily_history))
        .route("/:id/submit", post(submit_daily))
}

async fn list_quizzes(
    Query(params): Query<ListQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Page<QuizListItem>>, ApiError> {
    let quizzes: Vec<Quiz> = fetch_collection(&state, &session, QUIZZES, params.refresh()).await?;

    let attempts: Vec<QuizAttempt> = if session.role() == Role::Student {
        fetch_collection(&state, &session, MY_ATTEMPTS, params.refresh()).await?
    } else {
        Vec::new()
    };

    let items = join_attempts(quizzes, &attempts);
    Ok(Json(list_page(&items, &params, state.settings())))
}

/// Marks each quiz with the caller's attempt, if there is one.
fn join_attempts(quizzes: Vec<Quiz>, attempts: &[QuizAttempt]) -> Vec<QuizListItem> {
    quizzes
        .into_iter()
        .map(|quiz| {
            let attempt_id = attempts
                .iter()
                .find(|attempt| attempt.quiz_id == quiz.id)
                .map(|attempt| attempt.id.clone());
            let availability = if attempt_id.is_some() {
                QuizAvailability::Attempted
            } else {
                QuizAvailability::Available
            };
            QuizListItem { quiz, availability, attempt_id }
        })
        .collect()
}

/// The caller's attempt on `quiz_id`, read fresh so a quiz is never offered
/// twice.
async fn existing_attempt(
    state: &AppState,
    session: &Session,
    quiz_id: &str,
) -> Result<Option<String>, ApiError> {
    let attempts: Vec<QuizAttempt> = fetch_collection(state, session, MY_ATTEMPTS, true).await?;
    Ok(attempts.into_iter().find(|attempt| attempt.quiz_id == quiz_id).map(|attempt| attempt.id))
}

async fn fetch_questions(
    state: &AppState,
    session: &Session,
    quiz_id: &str,
) -> Result<Vec<QuizQuestion>, ApiError> {
    let body: CollectionBody<QuizQuestion> = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::Quiz,
            &format!("/api/quizzes/{quiz_id}/questions"),
            "fetch quiz questions",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Quiz not found"))?;
    Ok(body.into_vec())
}

async fn quiz_questions(
    Path(quiz_id): Path<String>,
    CurrentStudent(session): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<QuizQuestionsResponse>, ApiError> {
    if let Some(attempt_id) = existing_attempt(&state, &session, &quiz_id).await? {
        return Err(ApiError::AlreadyAttempted { attempt_id });
    }

    let questions = fetch_questions(&state, &session, &quiz_id).await?;
    Ok(Json(QuizQuestionsResponse { quiz_id, questions }))
}

/// Every question answered exactly once, and nothing else.
fn check_answers(questions: &[QuizQuestion], answers: &[AnswerInput]) -> Result<(), ApiError> {
    let known: HashSet<&str> = questions.iter().map(|question| question.id.as_str()).collect();
    let mut answered = HashSet::new();

    for answer in answers {
        if !known.contains(answer.question_id.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Answer given for unknown question {}",
                answer.question_id
            )));
        }
        if !answered.insert(answer.question_id.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Question {} answered more than once",
                answer.question_id
            )));
        }
    }

    let unanswered = answers.iter().filter(|answer| answer.answer.trim().is_empty()).count()
        + known.len().saturating_sub(answered.len());
    if unanswered > 0 {
        return Err(ApiError::BadRequest(format!("{unanswered} question(s) left unanswered")));
    }

    Ok(())
}

async fn submit_attempt(
    Path(quiz_id): Path<String>,
    CurrentStudent(session): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<AttemptSubmission>,
) -> Result<(StatusCode, Json<QuizAttempt>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let _lock = lock_mutation(&state, format!("quiz:{}:{quiz_id}", session.user_id()))?;

    if let Some(attempt_id) = existing_attempt(&state, &session, &quiz_id).await? {
        return Err(ApiError::AlreadyAttempted { attempt_id });
    }

    let questions = fetch_questions(&state, &session, &quiz_id).await?;
    check_answers(&questions, &payload.answers)?;

    let attempt: QuizAttempt = state
        .upstream()
        .send_json(
            Method::POST,
            session.credentials(),
            UpstreamService::Quiz,
            &format!("/api/quizzes/attempts/{quiz_id}"),
            &payload,
            "submit quiz attempt",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Quiz not found"))?;

    snapshots(&state).invalidate(session.user_id(), MY_ATTEMPTS.resource).await;

    tracing::info!(
        user_id = %session.user_id(),
        quiz_id = %quiz_id,
        attempt_id = %attempt.id,
        score = ?attempt.score,
        action = "quiz_attempt_submit",
        "Quiz attempt submitted"
    );

    Ok((StatusCode::CREATED, Json(attempt)))
}

async fn my_attempts(
    Query(params): Query<ListQuery>,
    CurrentStudent(session): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Page<QuizAttempt>>, ApiError> {
    let attempts: Vec<QuizAttempt> =
        fetch_collection(&state, &session, MY_ATTEMPTS, params.refresh()).await?;
    Ok(Json(list_page(&attempts, &params, state.settings())))
}

async fn review_attempt(
    Path(attempt_id): Path<String>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let review: Value = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::Quiz,
            &format!("/api/quizzes/attempts/{attempt_id}/review"),
            "fetch attempt review",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Attempt not found"))?;

    Ok(Json(review))
}

async fn daily_today(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<DailyQuizEntry>, ApiError> {
    let daily: DailyQuizEntry = state
        .upstream()
        .get_json(
            session.credentials(),
            UpstreamService::Quiz,
            "/api/daily-quizzes/today",
            "fetch today's quiz",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "No daily quiz today"))?;

    Ok(Json(daily))
}

async fn daily_history(
    Query(params): Query<ListQuery>,
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Page<DailyQuizEntry>>, ApiError> {
    let history: Vec<DailyQuizEntry> =
        fetch_collection(&state, &session, DAILY_HISTORY, params.refresh()).await?;
    Ok(Json(list_page(&history, &params, state.settings())))
}

async fn submit_daily(
    Path(daily_id): Path<String>,
    CurrentStudent(session): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<DailySubmission>,
) -> Result<Json<Value>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let _lock = lock_mutation(&state, format!("daily:{}:{daily_id}", session.user_id()))?;

    let result: Value = state
        .upstream()
        .send_json(
            Method::POST,
            session.credentials(),
            UpstreamService::Quiz,
            &format!("/api/daily-quizzes/{daily_id}/submit"),
            &payload,
            "submit daily quiz",
        )
        .await
        .map_err(|err| ApiError::from_upstream(err, "Daily quiz not found"))?;

    snapshots(&state).invalidate(session.user_id(), DAILY_HISTORY.resource).await;

    tracing::info!(
        user_id = %session.user_id(),
        daily_quiz_id = %daily_id,
        action = "daily_quiz_submit",
        "Daily quiz submitted"
    );

    Ok(Json(result))
}
