use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::schemas::{deserialize_id, deserialize_optional_id};
use crate::services::listing::Listable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct Quiz {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) book: Option<String>,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    #[serde(default, alias = "questionCount")]
    pub(crate) question_count: Option<u32>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum QuizAvailability {
    Available,
    Attempted,
}

impl QuizAvailability {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Attempted => "attempted",
        }
    }
}

/// A quiz joined with the caller's own attempt, if any.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuizListItem {
    #[serde(flatten)]
    pub(crate) quiz: Quiz,
    pub(crate) availability: QuizAvailability,
    pub(crate) attempt_id: Option<String>,
}

impl Listable for QuizListItem {
    fn search_fields(&self) -> Vec<&str> {
        let quiz = &self.quiz;
        let mut fields = vec![quiz.title.as_str()];
        fields.extend(quiz.subject.as_deref());
        fields.extend(quiz.book.as_deref());
        fields.extend(quiz.topic.as_deref());
        fields
    }

    fn category(&self) -> Option<&str> {
        self.quiz.subject.as_deref()
    }

    fn status(&self) -> Option<&str> {
        Some(self.availability.as_str())
    }
}

/// A question as shown to a student. Only the listed fields are forwarded,
/// so answer keys a service might include never reach the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct QuizQuestion {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(rename = "type", alias = "question_type", default = "default_question_type")]
    pub(crate) question_type: String,
    #[serde(alias = "question_text", alias = "question")]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) options: Vec<String>,
}

fn default_question_type() -> String {
    "multiple_choice".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct QuizAttempt {
    #[serde(deserialize_with = "deserialize_id")]
    pub(crate) id: String,
    #[serde(alias = "quizId", deserialize_with = "deserialize_id")]
    pub(crate) quiz_id: String,
    #[serde(default, alias = "quizTitle")]
    pub(crate) quiz_title: Option<String>,
    /// Scores are whatever the quiz service reported, untouched.
    #[serde(default)]
    pub(crate) score: Option<Value>,
    #[serde(default, alias = "totalQuestions", alias = "total_questions")]
    pub(crate) total: Option<Value>,
    #[serde(default)]
    pub(crate) percentage: Option<Value>,
    #[serde(default, alias = "submittedAt", alias = "created_at")]
    pub(crate) submitted_at: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Listable for QuizAttempt {
    fn search_fields(&self) -> Vec<&str> {
        self.quiz_title.as_deref().into_iter().collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerInput {
    #[serde(alias = "questionId", deserialize_with = "deserialize_id")]
    pub(crate) question_id: String,
    #[validate(length(max = 5000, message = "answer must be at most 5000 characters"))]
    pub(crate) answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct AttemptSubmission {
    #[validate(length(min = 1, message = "answers must not be empty"), nested)]
    pub(crate) answers: Vec<AnswerInput>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "timeTakenSeconds")]
    pub(crate) time_taken_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizQuestionsResponse {
    pub(crate) quiz_id: String,
    pub(crate) questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct DailySubmission {
    #[validate(length(min = 1, message = "answers must not be empty"), nested)]
    pub(crate) answers: Vec<AnswerInput>,
}

/// The daily quiz is forwarded as-is apart from its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DailyQuizEntry {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) date: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Listable for DailyQuizEntry {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}
